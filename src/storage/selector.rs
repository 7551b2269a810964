use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::config::{BackendKind, Config};
use crate::storage::adapter::StorageAdapter;
use crate::storage::kv::KvStoreAdapter;
use crate::storage::remote::RemoteDocAdapter;
use crate::storage::sqlite::SqliteAdapter;

static ADAPTER: OnceCell<Arc<dyn StorageAdapter>> = OnceCell::const_new();

/// Returns the process-wide storage adapter, constructing and initializing
/// it on first use. A failed initialization is logged and the adapter is
/// cached anyway: the process keeps running degraded and callers see the
/// failure on their first actual read or write.
pub async fn active() -> Arc<dyn StorageAdapter> {
    ADAPTER
        .get_or_init(|| async {
            let config = crate::config::get_config();
            let adapter = build_adapter(config);
            match adapter.initialize().await {
                Ok(()) => info!(backend = ?config.backend, "storage backend ready"),
                Err(err) => warn!(
                    backend = ?config.backend,
                    error = %err,
                    "storage initialization failed; continuing degraded"
                ),
            }
            adapter
        })
        .await
        .clone()
}

/// Builds the adapter the configuration selects, without touching the
/// process-wide cache. Used directly by tests and embedders that manage
/// their own lifetimes.
pub fn build_adapter(config: &Config) -> Arc<dyn StorageAdapter> {
    match config.backend {
        BackendKind::Sqlite => match SqliteAdapter::new(&config.database_url) {
            Ok(adapter) => Arc::new(adapter),
            Err(err) => {
                warn!(error = %err, "invalid sqlite url, falling back to in-memory store");
                Arc::new(SqliteAdapter::in_memory())
            }
        },
        BackendKind::KvStore => Arc::new(KvStoreAdapter::new(config.data_dir.clone())),
        BackendKind::RemoteDoc => Arc::new(RemoteDocAdapter::new(
            config
                .remote_url
                .clone()
                .expect("remote url presence is validated at config load"),
            config.remote_api_key.clone(),
        )),
    }
}
