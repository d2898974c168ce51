//! Runtime configuration: TOML file, environment overrides, defaults.
//!
//! ```toml
//! log_filter = "info"
//!
//! [store]
//! backend = "dir"            # or "sqlite"
//! data_dir = "./data"
//! sqlite_path = "agents.db"  # relative paths resolve against data_dir
//!
//! [ingest]
//! id_field = "uuid"
//! ```
//!
//! `AGENT_TRENDS_DATA_DIR` and `AGENT_TRENDS_BACKEND` override the file.

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ingest::{DEFAULT_ID_FIELD, RecordDecoder};

pub const DATA_DIR_ENV: &str = "AGENT_TRENDS_DATA_DIR";
pub const BACKEND_ENV: &str = "AGENT_TRENDS_BACKEND";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("unknown store backend {0:?} (expected \"dir\" or \"sqlite\")")]
    UnknownBackend(String),
}

/// Which [`crate::persist::SnapshotStore`] implementation to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Dir,
    Sqlite,
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dir" | "directory" => Ok(Self::Dir),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub backend: Backend,
    pub data_dir: PathBuf,
    pub sqlite_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Dir,
            data_dir: PathBuf::from("./data"),
            sqlite_path: PathBuf::from("agents.db"),
        }
    }
}

impl StoreConfig {
    /// SQLite database path, resolved against `data_dir` when relative.
    pub fn resolved_sqlite_path(&self) -> PathBuf {
        if self.sqlite_path.is_absolute() {
            self.sqlite_path.clone()
        } else {
            self.data_dir.join(&self.sqlite_path)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestConfig {
    pub id_field: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            id_field: DEFAULT_ID_FIELD.to_string(),
        }
    }
}

impl IngestConfig {
    pub fn decoder(&self) -> RecordDecoder {
        RecordDecoder::new(self.id_field.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,
    pub store: StoreConfig,
    pub ingest: IngestConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            store: StoreConfig::default(),
            ingest: IngestConfig::default(),
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let s = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&s, path)
    }

    /// Loads `path` if given (defaults otherwise) and applies environment
    /// overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut cfg = match path {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };
        cfg.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(cfg)
    }

    /// Applies `AGENT_TRENDS_*` overrides read through `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            self.store.data_dir = PathBuf::from(dir);
        }
        if let Some(backend) = lookup(BACKEND_ENV).filter(|v| !v.trim().is_empty()) {
            self.store.backend = backend.parse()?;
        }
        Ok(())
    }
}
