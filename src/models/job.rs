use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Internship,
    Freelance,
    Temporary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub job_type: JobType,
    pub description: Option<String>,
    pub salary: Option<String>,
    pub job_url: Option<String>,
    pub posted_date: DateTime<Utc>,
    pub source: Option<String>,
    #[serde(default)]
    pub remote: bool,
    #[serde(default)]
    pub requirements: Vec<String>,
    pub recruiter_id: String,
    #[serde(default)]
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
