use std::env;
use std::path::PathBuf;
use uuid::Uuid;

const DEFAULT_DATA_DIR: &str = "data/node";

/// Runtime configuration for the dashboard service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Location of the sled database backing all collections.
    pub data_dir: PathBuf,
    pub build_id: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        let data_dir = env::var_os("DSEFS_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let build_id = env::var("DSEFS_BUILD_ID").unwrap_or_else(|_| Uuid::new_v4().to_string());
        Ok(Self {
            host,
            port,
            data_dir,
            build_id,
        })
    }

    /// Configuration for tests and embedding, rooted at `data_dir`.
    pub fn local(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            data_dir: data_dir.into(),
            build_id: Uuid::new_v4().to_string(),
        }
    }
}
