use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;
use url::Url;

/// Which storage technology the backend selector should activate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Sqlite,
    KvStore,
    RemoteDoc,
}

impl BackendKind {
    fn parse(raw: &str) -> Result<Self> {
        match raw {
            "sqlite" => Ok(BackendKind::Sqlite),
            "kv" => Ok(BackendKind::KvStore),
            "remote" => Ok(BackendKind::RemoteDoc),
            other => Err(Error::Config(format!(
                "Unknown backend kind: {} (expected sqlite, kv or remote)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendKind,
    pub database_url: String,
    pub data_dir: String,
    pub remote_url: Option<Url>,
    pub remote_api_key: Option<String>,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    /// Reads configuration from the environment. Only the selected
    /// backend's settings are required.
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let backend = match env::var("JOBTRACK_BACKEND") {
            Ok(raw) => BackendKind::parse(&raw)?,
            Err(_) => BackendKind::Sqlite,
        };

        let database_url = env::var("JOBTRACK_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://jobtrack.db?mode=rwc".to_string());
        let data_dir =
            env::var("JOBTRACK_DATA_DIR").unwrap_or_else(|_| ".jobtrack".to_string());

        let remote_url = match env::var("JOBTRACK_REMOTE_URL") {
            Ok(raw) => Some(
                Url::parse(&raw)
                    .map_err(|e| Error::Config(format!("Invalid JOBTRACK_REMOTE_URL: {}", e)))?,
            ),
            Err(_) => None,
        };
        let remote_api_key = env::var("JOBTRACK_REMOTE_API_KEY").ok();

        if backend == BackendKind::RemoteDoc && remote_url.is_none() {
            return Err(Error::Config(
                "Missing environment variable: JOBTRACK_REMOTE_URL".to_string(),
            ));
        }

        Ok(Self {
            backend,
            database_url,
            data_dir,
            remote_url,
            remote_api_key,
        })
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
