use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendMessagePayload {
    #[validate(length(min = 1))]
    pub body: String,
}
