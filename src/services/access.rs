use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::models::actor::Actor;
use crate::models::application::Application;
use crate::models::job::Job;
use crate::models::user::Role;

/// Which fields an actor may change on a record. Applied uniformly before
/// any mutation so every entity type inherits the same enforcement shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAccess {
    All,
    Only(&'static [&'static str]),
    None,
}

impl FieldAccess {
    /// True when every key in `changes` is within the allowed set.
    pub fn permits(&self, changes: &JsonValue) -> bool {
        match self {
            FieldAccess::All => true,
            FieldAccess::None => false,
            FieldAccess::Only(fields) => changes
                .as_object()
                .map(|map| map.keys().all(|key| fields.contains(&key.as_str())))
                .unwrap_or(false),
        }
    }
}

/// The owning candidate may change anything; the attached recruiter may
/// change the status and nothing else.
pub fn application_write_access(actor: &Actor, application: &Application) -> FieldAccess {
    if actor.id == application.user_id {
        FieldAccess::All
    } else if application.recruiter_id.as_deref() == Some(actor.id.as_str()) {
        FieldAccess::Only(&["status"])
    } else {
        FieldAccess::None
    }
}

/// Read access to an application: the owning candidate, the attached
/// recruiter (shared access), and admins.
pub fn can_view_application(actor: &Actor, application: &Application) -> bool {
    actor.id == application.user_id
        || application.recruiter_id.as_deref() == Some(actor.id.as_str())
        || actor.is_admin()
}

/// Thread participants: the owning candidate and the attached recruiter.
pub fn is_application_participant(actor: &Actor, application: &Application) -> bool {
    actor.id == application.user_id
        || application.recruiter_id.as_deref() == Some(actor.id.as_str())
}

pub fn owns_job(actor: &Actor, job: &Job) -> bool {
    actor.id == job.recruiter_id
}

pub fn require_role(actor: &Actor, role: Role) -> Result<()> {
    if actor.role == role {
        Ok(())
    } else {
        Err(Error::PermissionDenied(format!(
            "this operation requires the {:?} role",
            role
        )))
    }
}

pub fn require_admin(actor: &Actor) -> Result<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(Error::PermissionDenied(
            "this operation requires the admin role".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    use crate::models::application::{ApplicationStatus, ContractType};

    fn application(user_id: &str, recruiter_id: Option<&str>) -> Application {
        Application {
            id: "a1".to_string(),
            title: "Dev".to_string(),
            company: "Acme".to_string(),
            location: "Paris".to_string(),
            job_url: None,
            job_id: Some("j1".to_string()),
            recruiter_id: recruiter_id.map(str::to_string),
            contract_type: ContractType::Permanent,
            application_date: Utc::now(),
            status: ApplicationStatus::Sent,
            notes: None,
            documents: Vec::new(),
            user_id: user_id.to_string(),
            last_follow_up: None,
            follow_up_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn owner_gets_full_access() {
        let app = application("u1", Some("r1"));
        let owner = Actor::new("u1", Role::Candidate);
        assert_eq!(application_write_access(&owner, &app), FieldAccess::All);
        assert!(FieldAccess::All.permits(&json!({ "notes": "x", "status": "sent" })));
    }

    #[test]
    fn attached_recruiter_is_limited_to_status() {
        let app = application("u1", Some("r1"));
        let recruiter = Actor::new("r1", Role::Recruiter);
        let access = application_write_access(&recruiter, &app);
        assert!(access.permits(&json!({ "status": "interview" })));
        assert!(!access.permits(&json!({ "status": "interview", "notes": "x" })));
        assert!(!access.permits(&json!({ "notes": "x" })));
    }

    #[test]
    fn strangers_and_admins_get_no_write_access() {
        let app = application("u1", Some("r1"));
        let stranger = Actor::new("r2", Role::Recruiter);
        assert_eq!(application_write_access(&stranger, &app), FieldAccess::None);
        let admin = Actor::new("adm", Role::Admin);
        assert_eq!(application_write_access(&admin, &app), FieldAccess::None);
        assert!(can_view_application(&admin, &app));
        assert!(!is_application_participant(&admin, &app));
    }
}
