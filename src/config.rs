//! Configuration System
//!
//! Layered repository configuration: built-in defaults, the user's global
//! config file, the repository's `config.toml` and `FILECHAIN_` environment
//! variables, in increasing order of precedence.

use crate::error::HistoryError;
use crate::logging::{self, LoggingConfig};
use crate::store::BackendKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::repo_file::REPO_CONFIG_FILE;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilechainConfig {
    /// Identity that owns the repository
    #[serde(default)]
    pub owner: Option<String>,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where and how histories are stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: BackendKind,

    /// Directory holding one database per owner, relative to the repository root
    #[serde(default = "default_metadata_dir")]
    pub metadata_dir: PathBuf,

    /// Background flush interval for disk stores; 0 disables it
    #[serde(default = "default_flush_every_ms")]
    pub flush_every_ms: u64,
}

fn default_metadata_dir() -> PathBuf {
    PathBuf::from("metadata")
}

fn default_flush_every_ms() -> u64 {
    500
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            metadata_dir: default_metadata_dir(),
            flush_every_ms: default_flush_every_ms(),
        }
    }
}

impl StorageConfig {
    pub fn flush_interval(&self) -> Option<u64> {
        (self.flush_every_ms > 0).then_some(self.flush_every_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.metadata_dir.as_os_str().is_empty() {
            return Err("Metadata directory cannot be empty".to_string());
        }
        if self.metadata_dir.is_absolute() {
            return Err(format!(
                "Metadata directory must be relative to the repository root: {}",
                self.metadata_dir.display()
            ));
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Owner(String),
    Storage(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Owner(msg) => write!(f, "Owner: {}", msg),
            ValidationError::Storage(msg) => write!(f, "Storage: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl FilechainConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        match &self.owner {
            Some(owner) if owner.trim().is_empty() => {
                errors.push(ValidationError::Owner("Owner cannot be blank".to_string()));
            }
            None => errors.push(ValidationError::Owner("No owner configured".to_string())),
            _ => {}
        }

        if let Err(e) = self.storage.validate() {
            errors.push(ValidationError::Storage(e));
        }

        if let Err(e) = logging::validate_format(&self.logging.format) {
            errors.push(ValidationError::Logging(e.to_string()));
        }
        if let Err(e) = logging::validate_output(&self.logging.output) {
            errors.push(ValidationError::Logging(e.to_string()));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate, folding every problem into one error.
    pub fn check(&self) -> Result<(), HistoryError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            HistoryError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }

    /// Configuration written into a freshly initialized repository.
    pub fn for_owner(owner: &str, backend: BackendKind) -> Self {
        Self {
            owner: Some(owner.to_string()),
            storage: StorageConfig {
                backend,
                ..StorageConfig::default()
            },
            logging: LoggingConfig::default(),
        }
    }

    pub fn to_toml(&self) -> Result<String, HistoryError> {
        toml::to_string_pretty(self)
            .map_err(|e| HistoryError::ConfigError(format!("Failed to serialize config: {}", e)))
    }
}
