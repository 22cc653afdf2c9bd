//! Repository config file source: <root>/config.toml and <root>/config.{env}.toml

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::Path;

pub const REPO_CONFIG_FILE: &str = "config.toml";

/// Add repository config files to builder.
/// Precedence: config.toml (base) then config.{FILECHAIN_ENV}.toml when the
/// variable is set.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    repo_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let mut builder = builder;

    let base_config_path = repo_root.join(REPO_CONFIG_FILE);
    if base_config_path.exists() {
        builder = builder.add_source(File::from(base_config_path).required(false));
    }

    if let Ok(env_name) = std::env::var("FILECHAIN_ENV") {
        let env_config_path = repo_root.join(format!("config.{}.toml", env_name));
        if env_config_path.exists() {
            builder = builder.add_source(File::from(env_config_path).required(false));
        }
    }

    Ok(builder)
}
