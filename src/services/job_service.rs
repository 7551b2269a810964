use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::info;

use crate::dto::job_dto::{CreateJobPayload, UpdateJobPayload};
use crate::error::{Error, Result};
use crate::models::actor::Actor;
use crate::models::job::Job;
use crate::models::user::Role;
use crate::services::access;
use crate::storage::{EntityKind, Filter, Scope, StorageAdapter};
use crate::utils::validation;

#[derive(Clone)]
pub struct JobService {
    adapter: Arc<dyn StorageAdapter>,
}

impl JobService {
    pub fn new(adapter: Arc<dyn StorageAdapter>) -> Self {
        Self { adapter }
    }

    pub async fn create(&self, actor: &Actor, payload: CreateJobPayload) -> Result<Job> {
        validation::validate(&payload)?;
        access::require_role(actor, Role::Recruiter)?;

        let posted_date = payload.posted_date.unwrap_or_else(Utc::now);
        let record = json!({
            "title": payload.title,
            "company": payload.company,
            "location": payload.location,
            "job_type": payload.job_type,
            "description": payload.description,
            "salary": payload.salary,
            "job_url": payload.job_url,
            "posted_date": posted_date,
            "source": payload.source,
            "remote": payload.remote,
            "requirements": payload.requirements,
            "recruiter_id": actor.id,
            "archived": false,
        });
        let stored = self.adapter.insert(EntityKind::Jobs, record).await?;
        let job: Job = serde_json::from_value(stored)?;
        info!(job_id = %job.id, recruiter_id = %job.recruiter_id, "job posted");
        Ok(job)
    }

    /// Open read: archived jobs stay reachable by id so the owning
    /// recruiter and candidates who already applied can still see them.
    pub async fn get(&self, job_id: &str) -> Result<Job> {
        let record = self
            .adapter
            .get_by_id(EntityKind::Jobs, job_id, None)
            .await?
            .ok_or(Error::NotFound)?;
        Ok(serde_json::from_value(record)?)
    }

    pub async fn update(
        &self,
        job_id: &str,
        actor: &Actor,
        changes: UpdateJobPayload,
    ) -> Result<Job> {
        validation::validate(&changes)?;
        let job = self.get(job_id).await?;
        if !access::owns_job(actor, &job) {
            return Err(Error::PermissionDenied(
                "only the owning recruiter may edit a job".to_string(),
            ));
        }
        let changes = serde_json::to_value(&changes)?;
        let scope = Scope::new("recruiter_id", actor.id.clone());
        let updated = self
            .adapter
            .update(EntityKind::Jobs, job_id, changes, Some(&scope))
            .await?
            .ok_or(Error::NotFound)?;
        Ok(serde_json::from_value(updated)?)
    }

    /// Deletion is blocked while any application references the job; the
    /// record is left untouched in that case.
    pub async fn delete(&self, job_id: &str, actor: &Actor) -> Result<()> {
        let job = self.get(job_id).await?;
        if !access::owns_job(actor, &job) {
            return Err(Error::PermissionDenied(
                "only the owning recruiter may delete a job".to_string(),
            ));
        }
        if self.has_applications(job_id).await? {
            return Err(Error::HasDependents);
        }
        let scope = Scope::new("recruiter_id", actor.id.clone());
        let deleted = self
            .adapter
            .delete(EntityKind::Jobs, job_id, Some(&scope))
            .await?;
        if !deleted {
            return Err(Error::NotFound);
        }
        info!(job_id = %job_id, "job deleted");
        Ok(())
    }

    pub async fn toggle_archive(&self, job_id: &str, actor: &Actor, archived: bool) -> Result<Job> {
        let job = self.get(job_id).await?;
        if !access::owns_job(actor, &job) {
            return Err(Error::PermissionDenied(
                "only the owning recruiter may archive a job".to_string(),
            ));
        }
        let scope = Scope::new("recruiter_id", actor.id.clone());
        let updated = self
            .adapter
            .update(EntityKind::Jobs, job_id, json!({ "archived": archived }), Some(&scope))
            .await?
            .ok_or(Error::NotFound)?;
        Ok(serde_json::from_value(updated)?)
    }

    /// Role-scoped listing: candidates see every non-archived job,
    /// recruiters see their own jobs including archived ones, admins see
    /// everything.
    pub async fn list_visible(&self, actor: &Actor) -> Result<Vec<Job>> {
        let filter = match actor.role {
            Role::Candidate => Filter::new().eq("archived", false),
            Role::Recruiter => Filter::new().eq("recruiter_id", actor.id.clone()),
            Role::Admin => Filter::new(),
        };
        let records = self.adapter.query(EntityKind::Jobs, &filter).await?;
        let mut jobs = records
            .into_iter()
            .map(serde_json::from_value::<Job>)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        jobs.sort_by(|a, b| b.posted_date.cmp(&a.posted_date));
        Ok(jobs)
    }

    /// Existence probe behind the deletion guard.
    pub async fn has_applications(&self, job_id: &str) -> Result<bool> {
        let filter = Filter::new().eq("job_id", job_id);
        let records = self.adapter.query(EntityKind::Applications, &filter).await?;
        Ok(!records.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::JobType;
    use crate::storage::sqlite::SqliteAdapter;

    async fn service() -> JobService {
        let adapter = SqliteAdapter::in_memory();
        adapter.initialize().await.unwrap();
        JobService::new(Arc::new(adapter))
    }

    fn payload(title: &str) -> CreateJobPayload {
        CreateJobPayload {
            title: title.to_string(),
            company: "Acme".to_string(),
            location: "Paris".to_string(),
            job_type: JobType::FullTime,
            description: Some("Build things".to_string()),
            salary: None,
            job_url: None,
            posted_date: None,
            source: None,
            remote: false,
            requirements: vec!["Rust".to_string()],
        }
    }

    #[tokio::test]
    async fn only_recruiters_create_jobs() {
        let service = service().await;
        let candidate = Actor::new("u1", Role::Candidate);
        assert!(matches!(
            service.create(&candidate, payload("Dev")).await.unwrap_err(),
            Error::PermissionDenied(_)
        ));
    }

    #[tokio::test]
    async fn updates_are_owner_only() {
        let service = service().await;
        let owner = Actor::new("r1", Role::Recruiter);
        let job = service.create(&owner, payload("Dev")).await.unwrap();

        let other = Actor::new("r2", Role::Recruiter);
        let changes = UpdateJobPayload {
            title: Some("Senior Dev".to_string()),
            ..UpdateJobPayload::default()
        };
        assert!(matches!(
            service.update(&job.id, &other, changes.clone()).await.unwrap_err(),
            Error::PermissionDenied(_)
        ));

        let updated = service.update(&job.id, &owner, changes).await.unwrap();
        assert_eq!(updated.title, "Senior Dev");
        assert_eq!(updated.requirements, vec!["Rust".to_string()]);
    }

    #[tokio::test]
    async fn archive_visibility_per_role() {
        let service = service().await;
        let owner = Actor::new("r1", Role::Recruiter);
        let job = service.create(&owner, payload("Dev")).await.unwrap();
        service.toggle_archive(&job.id, &owner, true).await.unwrap();

        let candidate = Actor::new("u1", Role::Candidate);
        assert!(service.list_visible(&candidate).await.unwrap().is_empty());
        assert_eq!(service.list_visible(&owner).await.unwrap().len(), 1);
        let admin = Actor::new("adm", Role::Admin);
        assert_eq!(service.list_visible(&admin).await.unwrap().len(), 1);
    }
}
