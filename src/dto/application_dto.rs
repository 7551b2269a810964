use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::application::{ApplicationStatus, ContractType};

/// Form fields for applying to a posted job. Title, company and location
/// are denormalized from the job itself, not taken from the form.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApplyToJobPayload {
    pub contract_type: ContractType,
    pub application_date: Option<DateTime<Utc>>,
    pub status: Option<ApplicationStatus>,
    pub notes: Option<String>,
    #[serde(default)]
    pub documents: Vec<String>,
}

/// A freeform application tracked without a job reference.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateApplicationPayload {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub company: String,
    #[validate(length(min = 1))]
    pub location: String,
    #[validate(url)]
    pub job_url: Option<String>,
    pub contract_type: ContractType,
    pub application_date: Option<DateTime<Utc>>,
    pub status: Option<ApplicationStatus>,
    pub notes: Option<String>,
    #[serde(default)]
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateApplicationPayload {
    #[validate(length(min = 1))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[validate(length(min = 1))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[validate(url)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_type: Option<ContractType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ApplicationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<String>>,
}

impl UpdateApplicationPayload {
    pub fn status_only(status: ApplicationStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}
