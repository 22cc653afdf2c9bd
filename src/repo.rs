//! Repository
//!
//! A repository is a directory holding `config.toml` and a metadata directory
//! with one history store per owner. Engines are opened on first use and
//! shared afterwards, so every caller asking for the same owner writes
//! through the same lock.

use crate::config::{ConfigLoader, FilechainConfig, REPO_CONFIG_FILE};
use crate::engine::Engine;
use crate::error::{HistoryError, StorageError};
use crate::hash::ContentHash;
use crate::store::{BackendKind, StorageBackend};
use crate::types::Identity;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub struct Repository {
    root: PathBuf,
    config: FilechainConfig,
    owner: Identity,
    engines: Mutex<HashMap<Identity, Arc<Engine>>>,
}

impl Repository {
    /// Create a repository at `root` owned by `owner` and open it.
    ///
    /// Fails if `root` already holds a repository config.
    pub fn init(root: &Path, owner: &Identity, backend: BackendKind) -> Result<Self, HistoryError> {
        let config_path = root.join(REPO_CONFIG_FILE);
        if config_path.exists() {
            return Err(HistoryError::InvalidArguments(format!(
                "Repository already initialized at {}",
                root.display()
            )));
        }

        let config = FilechainConfig::for_owner(owner.as_str(), backend);
        std::fs::create_dir_all(root.join(&config.storage.metadata_dir))
            .map_err(StorageError::from)?;
        std::fs::write(&config_path, config.to_toml()?).map_err(StorageError::from)?;
        info!(root = %root.display(), owner = %owner, "Initialized repository");

        Self::open(root)
    }

    /// Open an existing repository, loading its layered configuration.
    pub fn open(root: &Path) -> Result<Self, HistoryError> {
        let config = ConfigLoader::load(root)?;
        Self::with_config(root, config)
    }

    /// Open with an already loaded configuration.
    pub fn with_config(root: &Path, config: FilechainConfig) -> Result<Self, HistoryError> {
        config.check()?;
        let owner = Identity::new(config.owner.clone().unwrap_or_default())?;
        debug!(
            root = %root.display(),
            owner = %owner,
            backend = ?config.storage.backend,
            "Opened repository"
        );

        Ok(Self {
            root: root.to_path_buf(),
            config,
            owner,
            engines: Mutex::new(HashMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &FilechainConfig {
        &self.config
    }

    pub fn owner(&self) -> &Identity {
        &self.owner
    }

    /// Storage location of `owner`'s histories.
    pub fn backend_for(&self, owner: &Identity) -> StorageBackend {
        match self.config.storage.backend {
            BackendKind::Disk => StorageBackend::Disk {
                path: self
                    .root
                    .join(&self.config.storage.metadata_dir)
                    .join(store_dir_name(owner)),
                flush_every_ms: self.config.storage.flush_interval(),
            },
            BackendKind::Memory => StorageBackend::Memory,
        }
    }

    /// The engine for `owner`, opening it on first use.
    pub fn engine(&self, owner: &Identity) -> Result<Arc<Engine>, HistoryError> {
        let mut engines = self.engines.lock();
        if let Some(engine) = engines.get(owner) {
            return Ok(Arc::clone(engine));
        }

        let engine = Arc::new(Engine::open(&self.backend_for(owner), owner.clone())?);
        engines.insert(owner.clone(), Arc::clone(&engine));
        debug!(owner = %owner, "Opened history engine");
        Ok(engine)
    }

    /// The engine for the repository owner.
    pub fn own_engine(&self) -> Result<Arc<Engine>, HistoryError> {
        self.engine(&self.owner)
    }

    /// Owners with an open engine, sorted.
    pub fn open_owners(&self) -> Vec<Identity> {
        let mut owners: Vec<Identity> = self.engines.lock().keys().cloned().collect();
        owners.sort();
        owners
    }

    /// Flush every open engine.
    pub fn flush(&self) -> Result<(), HistoryError> {
        let engines: Vec<Arc<Engine>> = self.engines.lock().values().cloned().collect();
        for engine in engines {
            engine.flush()?;
        }
        Ok(())
    }
}

/// Directory name for an owner's store: a readable prefix plus a digest so
/// distinct identities never share a directory.
fn store_dir_name(owner: &Identity) -> String {
    let readable: String = owner
        .as_str()
        .chars()
        .take(32)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let digest = ContentHash::of(owner.as_str().as_bytes());
    format!("{}-{}", readable, hex::encode(&digest.digest()[..5]))
}
