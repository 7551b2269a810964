pub mod config;
pub mod dto;
pub mod error;
pub mod models;
pub mod seed;
pub mod services;
pub mod stats;
pub mod storage;
pub mod utils;

use std::sync::Arc;

use crate::services::application_service::ApplicationService;
use crate::services::history_service::HistoryService;
use crate::services::job_service::JobService;
use crate::services::message_service::MessageService;
use crate::services::user_service::UserService;
use crate::storage::StorageAdapter;

/// The rule-layer services wired over one storage adapter. UI code holds
/// one of these and never talks to an adapter directly.
#[derive(Clone)]
pub struct AppState {
    pub adapter: Arc<dyn StorageAdapter>,
    pub users: UserService,
    pub jobs: JobService,
    pub applications: ApplicationService,
    pub history: HistoryService,
    pub messages: MessageService,
}

impl AppState {
    pub fn new(adapter: Arc<dyn StorageAdapter>) -> Self {
        let users = UserService::new(adapter.clone());
        let jobs = JobService::new(adapter.clone());
        let applications = ApplicationService::new(adapter.clone());
        let history = HistoryService::new(adapter.clone());
        let messages = MessageService::new(adapter.clone());

        Self {
            adapter,
            users,
            jobs,
            applications,
            history,
            messages,
        }
    }

    /// Wires the services over the process-wide adapter the backend
    /// selector activates. Requires `config::init_config` to have run.
    pub async fn from_env() -> Self {
        Self::new(storage::selector::active().await)
    }
}

/// Log setup for binary consumers; library code only emits `tracing`
/// events and never installs a subscriber on its own.
pub fn init_tracing() {
    tracing_subscriber::fmt::init();
}
