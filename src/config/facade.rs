//! Single entry point for loading repository configuration.

use super::merge::merge_policy;
use super::sources::{global_file, repo_file};
use super::FilechainConfig;
use config::{ConfigError, Environment, File};
use std::path::{Path, PathBuf};

/// Loads [`FilechainConfig`] from its layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for the repository at `repo_root`.
    ///
    /// Sources, lowest precedence first: defaults, global config file,
    /// `<root>/config.toml`, `<root>/config.{FILECHAIN_ENV}.toml`,
    /// `FILECHAIN_*` environment variables (`__` separates nested keys, e.g.
    /// `FILECHAIN_STORAGE__BACKEND=memory`).
    pub fn load(repo_root: &Path) -> Result<FilechainConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = repo_file::add_to_builder(builder, repo_root)?;
        let builder = builder.add_source(
            Environment::with_prefix("FILECHAIN")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Load configuration from a single file on top of the defaults.
    pub fn load_from_file(path: &Path) -> Result<FilechainConfig, ConfigError> {
        merge_policy::builder_with_defaults()?
            .add_source(File::from(path))
            .build()?
            .try_deserialize()
    }

    /// Path of the user's global config file, if the platform has one.
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
