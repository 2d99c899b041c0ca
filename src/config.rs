//! Application Configuration
//!
//! JSON file plus `PLANES_*` environment overrides. Example:
//!
//! ```json
//! {
//!   "backend": { "kind": "rest", "url": "https://db.example.org", "apiKey": "..." },
//!   "storage": { "kind": "rest", "bucket": "documentos", "signedUrlTtl": 600 },
//!   "log": { "dir": "/var/log/planes", "appName": "PlanesAccion", "level": "debug" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::{DomainError, DomainResult};

pub const ENV_BACKEND_URL: &str = "PLANES_BACKEND_URL";
pub const ENV_API_KEY: &str = "PLANES_API_KEY";
pub const ENV_DB_PATH: &str = "PLANES_DB_PATH";
pub const ENV_STORAGE_BUCKET: &str = "PLANES_STORAGE_BUCKET";
pub const ENV_LOG_DIR: &str = "PLANES_LOG_DIR";

/// Where plans, areas, folders and checklist rows live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    Sqlite {
        path: PathBuf,
    },
    Rest {
        url: String,
        #[serde(rename = "apiKey")]
        api_key: String,
    },
}

/// Where uploaded files live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StorageConfig {
    Local {
        root: PathBuf,
        #[serde(rename = "baseUrl")]
        base_url: String,
    },
    /// `url` and `api_key` fall back to the REST backend's
    #[serde(rename_all = "camelCase")]
    Rest {
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        api_key: Option<String>,
        bucket: String,
        #[serde(default)]
        signed_url_ttl: Option<u64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogConfig {
    pub dir: PathBuf,
    pub app_name: String,
    /// `error`, `warn`, `info`, `debug` or `trace`
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            app_name: "PlanesAccion".to_string(),
            level: "info".to_string(),
        }
    }
}

impl LogConfig {
    pub fn level(&self) -> DomainResult<rolling_logger::Level> {
        self.level
            .trim()
            .parse()
            .map_err(|_| DomainError::Config(format!("unknown log level: {}", self.level)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub storage: StorageConfig,
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::Sqlite {
                path: PathBuf::from("planes.db"),
            },
            storage: StorageConfig::Local {
                root: PathBuf::from("documentos"),
                base_url: "http://localhost:8080/documentos".to_string(),
            },
            log: LogConfig::default(),
        }
    }
}

/// Resolved endpoint of the REST object store
#[derive(Debug, Clone, PartialEq)]
pub struct RestStorageTarget {
    pub url: String,
    pub api_key: String,
    pub bucket: String,
    pub signed_url_ttl: Option<u64>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AppConfig {
    /// Read a JSON config file. Missing sections take their defaults.
    pub fn from_file(path: &Path) -> DomainResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            DomainError::Config(format!("failed to read config {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            DomainError::Config(format!("invalid config {}: {}", path.display(), e))
        })
    }

    /// File, then environment, then validation
    pub fn load(path: &Path) -> DomainResult<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any lookup; blank values are ignored
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| non_blank(lookup(key));

        if let Some(url) = get(ENV_BACKEND_URL) {
            let api_key = match &self.backend {
                BackendConfig::Rest { api_key, .. } => api_key.clone(),
                BackendConfig::Sqlite { .. } => String::new(),
            };
            log::debug!("backend url overridden from {}", ENV_BACKEND_URL);
            self.backend = BackendConfig::Rest { url, api_key };
        }

        if let Some(key) = get(ENV_API_KEY) {
            if let BackendConfig::Rest { api_key, .. } = &mut self.backend {
                *api_key = key;
            }
        }

        if let Some(path) = get(ENV_DB_PATH) {
            match &mut self.backend {
                BackendConfig::Sqlite { path: current } => *current = PathBuf::from(path),
                BackendConfig::Rest { .. } => {
                    log::warn!("{} ignored: backend is REST", ENV_DB_PATH);
                }
            }
        }

        if let Some(name) = get(ENV_STORAGE_BUCKET) {
            match &mut self.storage {
                StorageConfig::Rest { bucket, .. } => *bucket = name,
                StorageConfig::Local { .. } => {
                    self.storage = StorageConfig::Rest {
                        url: None,
                        api_key: None,
                        bucket: name,
                        signed_url_ttl: None,
                    };
                }
            }
        }

        if let Some(dir) = get(ENV_LOG_DIR) {
            self.log.dir = PathBuf::from(dir);
        }
    }

    /// REST storage endpoint with backend fallbacks applied; `None` for local storage
    pub fn rest_storage(&self) -> DomainResult<Option<RestStorageTarget>> {
        let StorageConfig::Rest {
            url,
            api_key,
            bucket,
            signed_url_ttl,
        } = &self.storage
        else {
            return Ok(None);
        };

        let (backend_url, backend_key) = match &self.backend {
            BackendConfig::Rest { url, api_key } => (Some(url.clone()), Some(api_key.clone())),
            BackendConfig::Sqlite { .. } => (None, None),
        };

        let url = non_blank(url.clone())
            .or(non_blank(backend_url))
            .ok_or_else(|| DomainError::Config("storage url is not configured".into()))?;
        let api_key = non_blank(api_key.clone())
            .or(non_blank(backend_key))
            .ok_or_else(|| DomainError::Config("storage api key is not configured".into()))?;

        Ok(Some(RestStorageTarget {
            url,
            api_key,
            bucket: bucket.trim().to_string(),
            signed_url_ttl: *signed_url_ttl,
        }))
    }

    pub fn validate(&self) -> DomainResult<()> {
        match &self.backend {
            BackendConfig::Rest { url, api_key } => {
                if url.trim().is_empty() {
                    return Err(DomainError::Config("backend url is empty".into()));
                }
                if api_key.trim().is_empty() {
                    return Err(DomainError::Config("backend api key is empty".into()));
                }
            }
            BackendConfig::Sqlite { path } => {
                if path.as_os_str().is_empty() {
                    return Err(DomainError::Config("database path is empty".into()));
                }
            }
        }

        if let Some(target) = self.rest_storage()? {
            if target.bucket.is_empty() {
                return Err(DomainError::Config("storage bucket is empty".into()));
            }
        }

        self.log.level()?;
        Ok(())
    }
}
