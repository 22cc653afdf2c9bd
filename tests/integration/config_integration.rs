//! Integration tests for layered configuration loading

use super::test_utils::with_config_env;
use filechain::config::{ConfigLoader, FilechainConfig, REPO_CONFIG_FILE};
use filechain::store::BackendKind;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_repo_config(root: &std::path::Path, contents: &str) {
    std::fs::create_dir_all(root).unwrap();
    std::fs::write(root.join(REPO_CONFIG_FILE), contents).unwrap();
}

#[test]
fn test_defaults_without_any_file() {
    let test_dir = TempDir::new().unwrap();
    let root = test_dir.path().join("repo");
    std::fs::create_dir_all(&root).unwrap();

    let config = with_config_env(&test_dir, &[], || ConfigLoader::load(&root).unwrap());
    assert_eq!(config.owner, None);
    assert_eq!(config.storage.backend, BackendKind::Disk);
    assert_eq!(config.storage.metadata_dir, PathBuf::from("metadata"));
    assert_eq!(config.storage.flush_every_ms, 500);
}

#[test]
fn test_repo_file_overrides_global_file() {
    let test_dir = TempDir::new().unwrap();
    let root = test_dir.path().join("repo");
    write_repo_config(&root, "owner = \"alice\"\n");

    let config = with_config_env(&test_dir, &[], || {
        let global = ConfigLoader::global_config_path().unwrap();
        std::fs::create_dir_all(global.parent().unwrap()).unwrap();
        std::fs::write(
            &global,
            "owner = \"global-owner\"\n\n[storage]\nbackend = \"memory\"\n",
        )
        .unwrap();

        ConfigLoader::load(&root).unwrap()
    });

    assert_eq!(config.owner.as_deref(), Some("alice"));
    assert_eq!(config.storage.backend, BackendKind::Memory);
}

#[test]
fn test_environment_overrides_files() {
    let test_dir = TempDir::new().unwrap();
    let root = test_dir.path().join("repo");
    write_repo_config(&root, "owner = \"alice\"\n\n[storage]\nbackend = \"disk\"\n");

    let config = with_config_env(
        &test_dir,
        &[
            ("FILECHAIN_STORAGE__BACKEND", "memory"),
            ("FILECHAIN_STORAGE__FLUSH_EVERY_MS", "0"),
        ],
        || ConfigLoader::load(&root).unwrap(),
    );

    assert_eq!(config.storage.backend, BackendKind::Memory);
    assert_eq!(config.storage.flush_interval(), None);
    assert_eq!(config.owner.as_deref(), Some("alice"));
}

#[test]
fn test_env_specific_file_layers_on_base() {
    let test_dir = TempDir::new().unwrap();
    let root = test_dir.path().join("repo");
    write_repo_config(&root, "owner = \"alice\"\n");
    std::fs::write(
        root.join("config.ci.toml"),
        "[logging]\nlevel = \"debug\"\nformat = \"json\"\n",
    )
    .unwrap();

    let config = with_config_env(&test_dir, &[("FILECHAIN_ENV", "ci")], || {
        ConfigLoader::load(&root).unwrap()
    });

    assert_eq!(config.owner.as_deref(), Some("alice"));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, "json");
}

#[test]
fn test_initialized_config_validates() {
    let config = FilechainConfig::for_owner("alice", BackendKind::Disk);
    assert!(config.validate().is_ok());
    assert!(config.to_toml().unwrap().contains("owner = \"alice\""));
}
