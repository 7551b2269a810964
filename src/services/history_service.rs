use std::sync::Arc;

use serde_json::json;

use crate::error::{Error, Result};
use crate::models::actor::Actor;
use crate::models::application::{Application, ApplicationStatus};
use crate::models::history::ApplicationHistoryEntry;
use crate::services::access;
use crate::storage::{EntityKind, Filter, StorageAdapter};

/// Append-only audit trail of status transitions. Entries are never
/// mutated or deleted.
#[derive(Clone)]
pub struct HistoryService {
    adapter: Arc<dyn StorageAdapter>,
}

impl HistoryService {
    pub fn new(adapter: Arc<dyn StorageAdapter>) -> Self {
        Self { adapter }
    }

    /// Callers treat this as best-effort: a failed audit write is logged
    /// and swallowed, never rolled into the primary operation's outcome.
    pub async fn record(
        &self,
        application_id: &str,
        old_status: Option<ApplicationStatus>,
        new_status: ApplicationStatus,
        changed_by: &str,
        note: Option<String>,
    ) -> Result<ApplicationHistoryEntry> {
        let record = json!({
            "application_id": application_id,
            "old_status": old_status,
            "new_status": new_status,
            "changed_by": changed_by,
            "note": note,
        });
        let stored = self
            .adapter
            .insert(EntityKind::ApplicationHistory, record)
            .await?;
        Ok(serde_json::from_value(stored)?)
    }

    /// Newest first. Visible to the application's participants and admins.
    pub async fn list(
        &self,
        application_id: &str,
        actor: &Actor,
    ) -> Result<Vec<ApplicationHistoryEntry>> {
        let record = self
            .adapter
            .get_by_id(EntityKind::Applications, application_id, None)
            .await?
            .ok_or(Error::NotFound)?;
        let application: Application = serde_json::from_value(record)?;
        if !access::can_view_application(actor, &application) {
            return Err(Error::NotFound);
        }

        let filter = Filter::new().eq("application_id", application_id);
        let records = self
            .adapter
            .query(EntityKind::ApplicationHistory, &filter)
            .await?;
        let mut entries = records
            .into_iter()
            .map(serde_json::from_value::<ApplicationHistoryEntry>)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }
}
