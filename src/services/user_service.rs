use std::sync::Arc;

use serde_json::json;
use serde_json::Value as JsonValue;
use tracing::info;

use crate::dto::user_dto::{SignupPayload, UpdateUserPayload};
use crate::error::{Error, Result};
use crate::models::actor::Actor;
use crate::models::user::{Role, User, UserProfile};
use crate::services::access;
use crate::storage::{EntityKind, Filter, StorageAdapter};
use crate::utils::{crypto, validation};

#[derive(Clone)]
pub struct UserService {
    adapter: Arc<dyn StorageAdapter>,
}

impl UserService {
    pub fn new(adapter: Arc<dyn StorageAdapter>) -> Self {
        Self { adapter }
    }

    /// Creates an account. The password is stored as an argon2 hash and
    /// never leaves this service.
    pub async fn signup(&self, payload: SignupPayload) -> Result<UserProfile> {
        validation::validate(&payload)?;
        if self.find_by_email(&payload.email).await?.is_some() {
            return Err(Error::Conflict(
                "an account with this email already exists".to_string(),
            ));
        }

        let password_hash = crypto::hash_password(&payload.password)?;
        let record = json!({
            "name": payload.name,
            "email": payload.email,
            "password_hash": password_hash,
            "role": payload.role,
            "phone": payload.phone,
            "address": payload.address,
            "skills": payload.skills,
            "experience": payload.experience,
            "education": payload.education,
            "linkedin_url": payload.linkedin_url,
            "company_name": payload.company_name,
            "company_sector": payload.company_sector,
            "company_website": payload.company_website,
            "company_size": payload.company_size,
        });
        let stored = self.adapter.insert(EntityKind::Users, record).await?;
        let user: User = serde_json::from_value(stored)?;
        info!(user_id = %user.id, role = ?user.role, "user account created");
        Ok(user.into())
    }

    pub async fn get(&self, user_id: &str) -> Result<UserProfile> {
        let record = self
            .adapter
            .get_by_id(EntityKind::Users, user_id, None)
            .await?
            .ok_or(Error::NotFound)?;
        let user: User = serde_json::from_value(record)?;
        Ok(user.into())
    }

    /// Email lookups are exact and case-sensitive.
    pub async fn get_by_email(&self, email: &str) -> Result<UserProfile> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or(Error::NotFound)?;
        Ok(user.into())
    }

    /// Profile edits: the user themselves, or an admin.
    pub async fn update_profile(
        &self,
        user_id: &str,
        actor: &Actor,
        changes: UpdateUserPayload,
    ) -> Result<UserProfile> {
        validation::validate(&changes)?;
        if actor.id != user_id && !actor.is_admin() {
            return Err(Error::PermissionDenied(
                "only the account owner or an admin may edit a profile".to_string(),
            ));
        }
        if let Some(email) = &changes.email {
            if let Some(existing) = self.find_by_email(email).await? {
                if existing.id != user_id {
                    return Err(Error::Conflict(
                        "an account with this email already exists".to_string(),
                    ));
                }
            }
        }
        let changes = serde_json::to_value(&changes)?;
        let updated = self
            .adapter
            .update(EntityKind::Users, user_id, changes, None)
            .await?
            .ok_or(Error::NotFound)?;
        let user: User = serde_json::from_value(updated)?;
        Ok(user.into())
    }

    pub async fn list_all(&self, actor: &Actor) -> Result<Vec<UserProfile>> {
        access::require_admin(actor)?;
        let records = self.adapter.query(EntityKind::Users, &Filter::new()).await?;
        let mut users = records
            .into_iter()
            .map(|record| serde_json::from_value::<User>(record).map(UserProfile::from))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    pub async fn update_role(&self, user_id: &str, actor: &Actor, role: Role) -> Result<UserProfile> {
        access::require_admin(actor)?;
        let changes = json!({ "role": role });
        let updated = self
            .adapter
            .update(EntityKind::Users, user_id, changes, None)
            .await?
            .ok_or(Error::NotFound)?;
        let user: User = serde_json::from_value(updated)?;
        info!(user_id = %user.id, role = ?user.role, "user role changed");
        Ok(user.into())
    }

    /// Admin-only. Deletion is unconditional: users have no
    /// dependent-record guard, unlike jobs.
    pub async fn delete(&self, user_id: &str, actor: &Actor) -> Result<()> {
        access::require_admin(actor)?;
        let deleted = self.adapter.delete(EntityKind::Users, user_id, None).await?;
        if !deleted {
            return Err(Error::NotFound);
        }
        info!(user_id = %user_id, "user account deleted");
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let filter = Filter::new().eq("email", email);
        let mut records: Vec<JsonValue> = self.adapter.query(EntityKind::Users, &filter).await?;
        // The adapter's equality match is exact and case-sensitive on
        // every backend, so at most one record comes back in practice.
        match records.pop() {
            Some(record) => Ok(Some(serde_json::from_value(record)?)),
            None => Ok(None),
        }
    }
}
