use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use crate::dto::application_dto::{
    ApplyToJobPayload, CreateApplicationPayload, UpdateApplicationPayload,
};
use crate::error::{Error, Result};
use crate::models::actor::Actor;
use crate::models::application::{Application, ApplicationFilters, ApplicationStatus};
use crate::models::job::Job;
use crate::models::user::Role;
use crate::services::access::{self, FieldAccess};
use crate::services::history_service::HistoryService;
use crate::storage::{EntityKind, Filter, Scope, StorageAdapter};
use crate::utils::validation;

#[derive(Clone)]
pub struct ApplicationService {
    adapter: Arc<dyn StorageAdapter>,
    history: HistoryService,
}

impl ApplicationService {
    pub fn new(adapter: Arc<dyn StorageAdapter>) -> Self {
        let history = HistoryService::new(adapter.clone());
        Self { adapter, history }
    }

    /// Applies to a posted job, denormalizing its title/company/location
    /// into the application snapshot. At most one application may exist
    /// per (candidate, job) pair.
    pub async fn apply_to_job(
        &self,
        actor: &Actor,
        job: &Job,
        payload: ApplyToJobPayload,
    ) -> Result<Application> {
        validation::validate(&payload)?;
        access::require_role(actor, Role::Candidate)?;

        let duplicate_probe = Filter::new()
            .eq("user_id", actor.id.clone())
            .eq("job_id", job.id.clone());
        let existing = self
            .adapter
            .query(EntityKind::Applications, &duplicate_probe)
            .await?;
        if !existing.is_empty() {
            return Err(Error::DuplicateApplication);
        }

        let record = json!({
            "title": job.title,
            "company": job.company,
            "location": job.location,
            "job_url": job.job_url,
            "job_id": job.id,
            "recruiter_id": job.recruiter_id,
            "contract_type": payload.contract_type,
            "application_date": payload.application_date.unwrap_or_else(Utc::now),
            "status": payload.status.unwrap_or(ApplicationStatus::ToApply),
            "notes": payload.notes,
            "documents": payload.documents,
            "user_id": actor.id,
            "last_follow_up": Option::<String>::None,
            "follow_up_count": 0,
        });
        let stored = self.adapter.insert(EntityKind::Applications, record).await?;
        let application: Application = serde_json::from_value(stored)?;
        info!(
            application_id = %application.id,
            job_id = %job.id,
            "application created from job posting"
        );
        Ok(application)
    }

    /// Freeform application with no job reference. No duplicate check
    /// applies here: only tracked-job applications carry the uniqueness
    /// invariant.
    pub async fn create(
        &self,
        actor: &Actor,
        payload: CreateApplicationPayload,
    ) -> Result<Application> {
        validation::validate(&payload)?;
        access::require_role(actor, Role::Candidate)?;

        let record = json!({
            "title": payload.title,
            "company": payload.company,
            "location": payload.location,
            "job_url": payload.job_url,
            "job_id": Option::<String>::None,
            "recruiter_id": Option::<String>::None,
            "contract_type": payload.contract_type,
            "application_date": payload.application_date.unwrap_or_else(Utc::now),
            "status": payload.status.unwrap_or(ApplicationStatus::ToApply),
            "notes": payload.notes,
            "documents": payload.documents,
            "user_id": actor.id,
            "last_follow_up": Option::<String>::None,
            "follow_up_count": 0,
        });
        let stored = self.adapter.insert(EntityKind::Applications, record).await?;
        Ok(serde_json::from_value(stored)?)
    }

    /// Readable by the owning candidate, the attached recruiter and
    /// admins; everyone else sees "not found" rather than a permission
    /// error, so record existence never leaks.
    pub async fn get(&self, application_id: &str, actor: &Actor) -> Result<Application> {
        let application = self.load(application_id).await?;
        if !access::can_view_application(actor, &application) {
            return Err(Error::NotFound);
        }
        Ok(application)
    }

    /// The owning candidate may change any field; the attached recruiter
    /// only the status. A status change appends a history entry after the
    /// primary update; the audit write is best-effort and never blocks or
    /// rolls back the update itself.
    pub async fn update(
        &self,
        application_id: &str,
        actor: &Actor,
        changes: UpdateApplicationPayload,
    ) -> Result<Application> {
        validation::validate(&changes)?;
        let current = self.load(application_id).await?;

        let change_set = serde_json::to_value(&changes)?;
        let scope = match access::application_write_access(actor, &current) {
            FieldAccess::All => Scope::new("user_id", actor.id.clone()),
            FieldAccess::Only(fields) => {
                if !FieldAccess::Only(fields).permits(&change_set) {
                    return Err(Error::PermissionDenied(
                        "recruiters may only change the application status".to_string(),
                    ));
                }
                Scope::new("recruiter_id", actor.id.clone())
            }
            FieldAccess::None => {
                return Err(Error::PermissionDenied(
                    "not allowed to modify this application".to_string(),
                ));
            }
        };

        let updated = self
            .adapter
            .update(EntityKind::Applications, application_id, change_set, Some(&scope))
            .await?
            .ok_or(Error::NotFound)?;
        let updated: Application = serde_json::from_value(updated)?;

        if let Some(new_status) = changes.status {
            if new_status != current.status {
                if let Err(err) = self
                    .history
                    .record(application_id, Some(current.status), new_status, &actor.id, None)
                    .await
                {
                    warn!(
                        application_id = %application_id,
                        error = %err,
                        "status history write failed; update kept"
                    );
                }
            }
        }
        Ok(updated)
    }

    /// Owning candidate only.
    pub async fn delete(&self, application_id: &str, actor: &Actor) -> Result<()> {
        let scope = Scope::new("user_id", actor.id.clone());
        let deleted = self
            .adapter
            .delete(EntityKind::Applications, application_id, Some(&scope))
            .await?;
        if !deleted {
            return Err(Error::NotFound);
        }
        info!(application_id = %application_id, "application deleted");
        Ok(())
    }

    /// The actor's own applications, newest application first.
    pub async fn list(&self, actor: &Actor) -> Result<Vec<Application>> {
        let filter = Filter::new().eq("user_id", actor.id.clone());
        self.query_sorted(&filter).await
    }

    /// Title/company substring search within the actor's applications.
    pub async fn search(&self, actor: &Actor, query: &str) -> Result<Vec<Application>> {
        let filter = Filter::new()
            .eq("user_id", actor.id.clone())
            .search(&["title", "company"], query);
        self.query_sorted(&filter).await
    }

    pub async fn filter(
        &self,
        actor: &Actor,
        filters: &ApplicationFilters,
    ) -> Result<Vec<Application>> {
        let mut filter = Filter::new().eq("user_id", actor.id.clone());
        if let Some(status) = filters.status {
            filter = filter.eq("status", serde_json::to_value(status)?);
        }
        if let Some(contract_type) = filters.contract_type {
            filter = filter.eq("contract_type", serde_json::to_value(contract_type)?);
        }
        filter = filter.date_between("application_date", filters.start_date, filters.end_date);
        self.query_sorted(&filter).await
    }

    /// The actor's applications reduced to their derived statistics.
    pub async fn compute_stats(&self, actor: &Actor) -> Result<crate::stats::ApplicationStats> {
        let applications = self.list(actor).await?;
        Ok(crate::stats::application_stats(&applications))
    }

    /// Bumps the follow-up bookkeeping on the candidate's own application.
    pub async fn record_follow_up(
        &self,
        application_id: &str,
        actor: &Actor,
    ) -> Result<Application> {
        let scope = Scope::new("user_id", actor.id.clone());
        let current = self
            .adapter
            .get_by_id(EntityKind::Applications, application_id, Some(&scope))
            .await?
            .ok_or(Error::NotFound)?;
        let current: Application = serde_json::from_value(current)?;

        let changes = json!({
            "last_follow_up": Utc::now(),
            "follow_up_count": current.follow_up_count + 1,
        });
        let updated = self
            .adapter
            .update(EntityKind::Applications, application_id, changes, Some(&scope))
            .await?
            .ok_or(Error::NotFound)?;
        Ok(serde_json::from_value(updated)?)
    }

    /// Applications referencing a job, for its owning recruiter or an
    /// admin.
    pub async fn list_for_job(&self, job_id: &str, actor: &Actor) -> Result<Vec<Application>> {
        let record = self
            .adapter
            .get_by_id(EntityKind::Jobs, job_id, None)
            .await?
            .ok_or(Error::NotFound)?;
        let job: Job = serde_json::from_value(record)?;
        if !access::owns_job(actor, &job) && !actor.is_admin() {
            return Err(Error::PermissionDenied(
                "only the owning recruiter may list a job's applications".to_string(),
            ));
        }
        let filter = Filter::new().eq("job_id", job_id);
        self.query_sorted(&filter).await
    }

    /// Every application in the store; admin dashboards only.
    pub async fn list_all(&self, actor: &Actor) -> Result<Vec<Application>> {
        access::require_admin(actor)?;
        self.query_sorted(&Filter::new()).await
    }

    async fn load(&self, application_id: &str) -> Result<Application> {
        let record = self
            .adapter
            .get_by_id(EntityKind::Applications, application_id, None)
            .await?
            .ok_or(Error::NotFound)?;
        Ok(serde_json::from_value(record)?)
    }

    async fn query_sorted(&self, filter: &Filter) -> Result<Vec<Application>> {
        let records = self.adapter.query(EntityKind::Applications, filter).await?;
        let mut applications = records
            .into_iter()
            .map(serde_json::from_value::<Application>)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        applications.sort_by(|a, b| b.application_date.cmp(&a.application_date));
        Ok(applications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::storage::adapter::MockStorageAdapter;

    fn stored_application(user_id: &str, recruiter_id: Option<&str>) -> serde_json::Value {
        json!({
            "id": "a1",
            "title": "Dev",
            "company": "Acme",
            "location": "Paris",
            "job_url": null,
            "job_id": "j1",
            "recruiter_id": recruiter_id,
            "contract_type": "permanent",
            "application_date": "2026-03-01T09:00:00Z",
            "status": "sent",
            "notes": null,
            "documents": [],
            "user_id": user_id,
            "last_follow_up": null,
            "follow_up_count": 0,
            "created_at": "2026-03-01T09:00:00Z",
            "updated_at": "2026-03-01T09:00:00Z",
        })
    }

    #[tokio::test]
    async fn unrelated_recruiter_cannot_touch_an_application() {
        let mut mock = MockStorageAdapter::new();
        mock.expect_get_by_id()
            .returning(|_, _, _| Ok(Some(stored_application("u1", Some("r1")))));
        // No update expectation: the permission check must fail first.
        let service = ApplicationService::new(Arc::new(mock));

        let stranger = Actor::new("r2", Role::Recruiter);
        let err = service
            .update(
                "a1",
                &stranger,
                UpdateApplicationPayload::status_only(ApplicationStatus::Interview),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn attached_recruiter_cannot_change_other_fields() {
        let mut mock = MockStorageAdapter::new();
        mock.expect_get_by_id()
            .returning(|_, _, _| Ok(Some(stored_application("u1", Some("r1")))));
        let service = ApplicationService::new(Arc::new(mock));

        let recruiter = Actor::new("r1", Role::Recruiter);
        let changes = UpdateApplicationPayload {
            status: Some(ApplicationStatus::Interview),
            notes: Some("sneaky".to_string()),
            ..UpdateApplicationPayload::default()
        };
        let err = service.update("a1", &recruiter, changes).await.unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn duplicate_application_is_rejected_before_insert() {
        let mut mock = MockStorageAdapter::new();
        mock.expect_query()
            .returning(|_, _| Ok(vec![stored_application("u1", Some("r1"))]));
        // No insert expectation: the duplicate probe must short-circuit.
        let service = ApplicationService::new(Arc::new(mock));

        let candidate = Actor::new("u1", Role::Candidate);
        let job: Job = serde_json::from_value(json!({
            "id": "j1",
            "title": "Dev",
            "company": "Acme",
            "location": "Paris",
            "job_type": "full-time",
            "description": null,
            "salary": null,
            "job_url": null,
            "posted_date": "2026-02-01T09:00:00Z",
            "source": null,
            "remote": false,
            "requirements": [],
            "recruiter_id": "r1",
            "archived": false,
            "created_at": "2026-02-01T09:00:00Z",
            "updated_at": "2026-02-01T09:00:00Z",
        }))
        .unwrap();
        let payload = ApplyToJobPayload {
            contract_type: crate::models::application::ContractType::Permanent,
            application_date: None,
            status: None,
            notes: None,
            documents: Vec::new(),
        };
        let err = service
            .apply_to_job(&candidate, &job, payload)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateApplication));
    }

    #[tokio::test]
    async fn history_failure_never_blocks_the_update() {
        let mut mock = MockStorageAdapter::new();
        mock.expect_get_by_id()
            .returning(|_, _, _| Ok(Some(stored_application("u1", Some("r1")))));
        mock.expect_update().returning(|_, _, changes, _| {
            let mut record = stored_application("u1", Some("r1"));
            crate::storage::adapter::apply_changes(&mut record, &changes)?;
            Ok(Some(record))
        });
        mock.expect_insert().returning(|_, _| {
            Err(Error::BackendUnavailable(crate::error::BackendError::Other(
                anyhow::anyhow!("audit store down"),
            )))
        });
        let service = ApplicationService::new(Arc::new(mock));

        let recruiter = Actor::new("r1", Role::Recruiter);
        let updated = service
            .update(
                "a1",
                &recruiter,
                UpdateApplicationPayload::status_only(ApplicationStatus::Interview),
            )
            .await
            .unwrap();
        assert_eq!(updated.status, ApplicationStatus::Interview);
    }
}
