use serde::{Deserialize, Serialize};

use crate::models::user::Role;

/// The identity on whose behalf a rule-layer operation is requested.
/// Supplied by an external authentication collaborator; the core never
/// issues or validates credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
