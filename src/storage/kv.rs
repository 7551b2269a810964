use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio::fs;
use tracing::warn;

use crate::error::Result;
use crate::storage::adapter::{
    apply_changes, matches_filter, matches_scope, record_id, stamp_new, EntityKind, Filter, Scope,
    StorageAdapter,
};
use crate::utils::ids;

/// Flat key-value backend: one JSON file per entity kind holding the whole
/// collection. There is no partial-update primitive, so every mutation is
/// a read-modify-write of the entire collection; a missing or corrupt file
/// is treated as an empty collection in every operation.
pub struct KvStoreAdapter {
    root: PathBuf,
}

impl KvStoreAdapter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn collection_path(&self, kind: EntityKind) -> PathBuf {
        self.root.join(format!("{}.json", kind.collection()))
    }

    async fn load(&self, kind: EntityKind) -> Vec<JsonValue> {
        match fs::read(self.collection_path(kind)).await {
            Ok(bytes) => match serde_json::from_slice::<Vec<JsonValue>>(&bytes) {
                Ok(items) => items,
                Err(err) => {
                    warn!(
                        collection = kind.collection(),
                        error = %err,
                        "corrupt collection file, treating as empty"
                    );
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        }
    }

    async fn store(&self, kind: EntityKind, items: &[JsonValue]) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        let raw = serde_json::to_vec(items)?;
        fs::write(self.collection_path(kind), raw).await?;
        Ok(())
    }
}

async fn file_missing(path: &Path) -> bool {
    !fs::try_exists(path).await.unwrap_or(false)
}

#[async_trait]
impl StorageAdapter for KvStoreAdapter {
    async fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        for kind in EntityKind::ALL {
            if file_missing(&self.collection_path(kind)).await {
                self.store(kind, &[]).await?;
            }
        }
        Ok(())
    }

    async fn insert(&self, kind: EntityKind, record: JsonValue) -> Result<JsonValue> {
        let mut record = record;
        stamp_new(&mut record, ids::generate_id())?;
        let mut items = self.load(kind).await;
        items.push(record.clone());
        self.store(kind, &items).await?;
        Ok(record)
    }

    async fn get_by_id<'a>(
        &self,
        kind: EntityKind,
        id: &str,
        scope: Option<&'a Scope>,
    ) -> Result<Option<JsonValue>> {
        let items = self.load(kind).await;
        Ok(items
            .into_iter()
            .find(|item| record_id(item) == Some(id) && matches_scope(item, scope)))
    }

    async fn query(&self, kind: EntityKind, filter: &Filter) -> Result<Vec<JsonValue>> {
        let mut items = self.load(kind).await;
        items.retain(|item| matches_filter(item, filter));
        Ok(items)
    }

    async fn update<'a>(
        &self,
        kind: EntityKind,
        id: &str,
        changes: JsonValue,
        scope: Option<&'a Scope>,
    ) -> Result<Option<JsonValue>> {
        let mut items = self.load(kind).await;
        let Some(item) = items
            .iter_mut()
            .find(|item| record_id(item) == Some(id) && matches_scope(item, scope))
        else {
            return Ok(None);
        };
        apply_changes(item, &changes)?;
        let updated = item.clone();
        self.store(kind, &items).await?;
        Ok(Some(updated))
    }

    async fn delete<'a>(&self, kind: EntityKind, id: &str, scope: Option<&'a Scope>) -> Result<bool> {
        let mut items = self.load(kind).await;
        let before = items.len();
        items.retain(|item| !(record_id(item) == Some(id) && matches_scope(item, scope)));
        if items.len() == before {
            return Ok(false);
        }
        self.store(kind, &items).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn adapter() -> (tempfile::TempDir, KvStoreAdapter) {
        let dir = tempfile::tempdir().unwrap();
        let adapter = KvStoreAdapter::new(dir.path());
        (dir, adapter)
    }

    #[tokio::test]
    async fn treats_corrupt_collection_as_empty_and_repairs_on_write() {
        let (dir, adapter) = adapter();
        adapter.initialize().await.unwrap();
        std::fs::write(dir.path().join("jobs.json"), b"{ not json").unwrap();

        let empty = adapter
            .query(EntityKind::Jobs, &Filter::new())
            .await
            .unwrap();
        assert!(empty.is_empty());

        adapter
            .insert(
                EntityKind::Jobs,
                json!({
                    "title": "Dev",
                    "company": "Acme",
                    "location": "Paris",
                    "job_type": "full-time",
                    "posted_date": "2026-03-01T09:00:00Z",
                    "remote": false,
                    "requirements": [],
                    "recruiter_id": "r1",
                    "archived": false,
                }),
            )
            .await
            .unwrap();
        let repaired = adapter
            .query(EntityKind::Jobs, &Filter::new())
            .await
            .unwrap();
        assert_eq!(repaired.len(), 1);
    }

    #[tokio::test]
    async fn read_modify_write_round_trip() {
        let (_dir, adapter) = adapter();
        adapter.initialize().await.unwrap();

        let stored = adapter
            .insert(
                EntityKind::Messages,
                json!({
                    "application_id": "a1",
                    "sender_id": "u1",
                    "sender_role": "candidate",
                    "body": "hello",
                    "read": false,
                }),
            )
            .await
            .unwrap();
        let id = stored["id"].as_str().unwrap();

        let updated = adapter
            .update(EntityKind::Messages, id, json!({ "read": true }), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["read"], json!(true));
        assert_eq!(updated["body"], json!("hello"));

        assert!(adapter.delete(EntityKind::Messages, id, None).await.unwrap());
        assert!(!adapter.delete(EntityKind::Messages, id, None).await.unwrap());
    }

    #[tokio::test]
    async fn scope_is_enforced_on_every_mutation() {
        let (_dir, adapter) = adapter();
        adapter.initialize().await.unwrap();
        let stored = adapter
            .insert(
                EntityKind::Applications,
                json!({
                    "title": "Dev",
                    "company": "Acme",
                    "location": "Paris",
                    "contract_type": "permanent",
                    "application_date": "2026-03-01T09:00:00Z",
                    "status": "sent",
                    "documents": [],
                    "user_id": "u1",
                    "follow_up_count": 0,
                }),
            )
            .await
            .unwrap();
        let id = stored["id"].as_str().unwrap();
        let foreign = Scope::new("user_id", "u2");

        assert!(adapter
            .get_by_id(EntityKind::Applications, id, Some(&foreign))
            .await
            .unwrap()
            .is_none());
        assert!(adapter
            .update(EntityKind::Applications, id, json!({ "status": "sent" }), Some(&foreign))
            .await
            .unwrap()
            .is_none());
        assert!(!adapter
            .delete(EntityKind::Applications, id, Some(&foreign))
            .await
            .unwrap());
    }
}
