use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplicationStatus {
    ToApply,
    Sent,
    Interview,
    Refused,
    Accepted,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::ToApply,
        ApplicationStatus::Sent,
        ApplicationStatus::Interview,
        ApplicationStatus::Refused,
        ApplicationStatus::Accepted,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContractType {
    Permanent,
    FixedTerm,
    Internship,
    Apprenticeship,
    Freelance,
    Temporary,
    Other,
}

/// A tracked job application. Title, company and location are a snapshot
/// taken at application time so the record stays meaningful if the source
/// job is later edited or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub job_url: Option<String>,
    pub job_id: Option<String>,
    pub recruiter_id: Option<String>,
    pub contract_type: ContractType,
    pub application_date: DateTime<Utc>,
    pub status: ApplicationStatus,
    pub notes: Option<String>,
    #[serde(default)]
    pub documents: Vec<String>,
    pub user_id: String,
    pub last_follow_up: Option<DateTime<Utc>>,
    #[serde(default)]
    pub follow_up_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ApplicationFilters {
    pub status: Option<ApplicationStatus>,
    pub contract_type: Option<ContractType>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}
