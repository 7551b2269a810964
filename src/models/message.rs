use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::user::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub application_id: String,
    pub sender_id: String,
    pub sender_role: Role,
    pub body: String,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
