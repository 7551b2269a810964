use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::application::ApplicationStatus;

/// Append-only audit record of a status transition. `old_status` is absent
/// for the first entry of an application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationHistoryEntry {
    pub id: String,
    pub application_id: String,
    pub old_status: Option<ApplicationStatus>,
    pub new_status: ApplicationStatus,
    pub changed_by: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
