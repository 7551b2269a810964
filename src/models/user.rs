use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Candidate,
    Recruiter,
    Admin,
}

/// Full stored user record, including the password hash. Never hand this
/// to callers directly; convert to [`UserProfile`] first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub experience: Option<String>,
    pub education: Option<String>,
    pub linkedin_url: Option<String>,
    pub company_name: Option<String>,
    pub company_sector: Option<String>,
    pub company_website: Option<String>,
    pub company_size: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Credential-free view of a user, safe to expose to UI code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub experience: Option<String>,
    pub education: Option<String>,
    pub linkedin_url: Option<String>,
    pub company_name: Option<String>,
    pub company_sector: Option<String>,
    pub company_website: Option<String>,
    pub company_size: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            phone: user.phone,
            address: user.address,
            skills: user.skills,
            experience: user.experience,
            education: user.education,
            linkedin_url: user.linkedin_url,
            company_name: user.company_name,
            company_sector: user.company_sector,
            company_website: user.company_website,
            company_size: user.company_size,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
