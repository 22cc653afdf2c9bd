//! History ordering and rename continuity

use super::test_utils::{alice, memory_engine, state};
use filechain::{ChangeType, ContentHash, HistoryError, StorageBackend};
use tempfile::TempDir;

#[test]
fn test_history_follows_chain_of_renames() {
    let engine = memory_engine();
    let v1 = state(b"v1");
    let v2 = state(b"v2");

    engine
        .make_checkpoint(None, Some(&v1), "/a", "/a", &alice())
        .unwrap();
    engine.commit("create").unwrap();
    engine
        .make_checkpoint(Some(&v1), Some(&v2), "/a", "/a", &alice())
        .unwrap();
    engine.commit("edit").unwrap();
    engine
        .make_checkpoint(Some(&v2), Some(&v2), "/a", "/b", &alice())
        .unwrap();
    engine.commit("rename").unwrap();
    engine
        .make_checkpoint(Some(&v2), Some(&v2), "/b", "/c", &alice())
        .unwrap();
    engine.commit("rename again").unwrap();

    let history = engine.history("/c").unwrap();
    let changes: Vec<ChangeType> = history
        .iter()
        .map(|cp| cp.unwrap().change())
        .collect();
    assert_eq!(
        changes,
        vec![
            ChangeType::Add,
            ChangeType::Modify,
            ChangeType::Move,
            ChangeType::Move
        ]
    );

    for gone in ["/a", "/b"] {
        assert!(matches!(engine.history(gone), Err(HistoryError::NoSuchPath(_))));
    }
    let paths: Vec<String> = engine.paths().map(|p| p.unwrap()).collect();
    assert_eq!(paths, vec!["/c".to_string()]);
}

#[test]
fn test_latest_checkpoint() {
    let engine = memory_engine();
    engine
        .make_checkpoint(None, Some(&state(b"1")), "/f", "/f", &alice())
        .unwrap();
    engine.commit("one").unwrap();
    engine
        .make_checkpoint(Some(&state(b"1")), Some(&state(b"22")), "/f", "/f", &alice())
        .unwrap();

    let latest = engine.history("/f").unwrap().latest().unwrap().unwrap();
    assert_eq!(latest.size(), 2);
    assert_eq!(latest.change(), ChangeType::Modify);
}

#[test]
fn test_history_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let backend = StorageBackend::disk(temp_dir.path().join("db"));

    {
        let engine = filechain::Engine::open(&backend, alice()).unwrap();
        engine
            .make_checkpoint(None, Some(&state(b"persisted")), "/f", "/f", &alice())
            .unwrap();
        engine.commit("persist").unwrap();
        engine.flush().unwrap();
    }

    let engine = filechain::Engine::open(&backend, alice()).unwrap();
    let history = engine.history("/f").unwrap().to_vec().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].hash(), &ContentHash::of(b"persisted"));
    assert!(engine.head().unwrap().is_some());

    // the clock resumes after the last commit, so new checkpoints sort last
    engine
        .make_checkpoint(
            Some(&state(b"persisted")),
            Some(&state(b"again")),
            "/f",
            "/f",
            &alice(),
        )
        .unwrap();
    let history = engine.history("/f").unwrap().to_vec().unwrap();
    assert_eq!(history[1].change(), ChangeType::Modify);
    assert!(history[0].mod_time() < history[1].mod_time());
}
