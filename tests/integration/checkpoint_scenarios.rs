//! Classification scenarios driven through the engine

use super::test_utils::{alice, memory_engine, state};
use filechain::{ChangeType, CheckpointOutcome, ContentHash, FileState, HistoryError};

#[test]
fn test_add_creates_checkpoint() {
    let engine = memory_engine();
    let h1 = ContentHash::of(b"one");
    let new = FileState::new(h1.clone(), 10);

    let outcome = engine
        .make_checkpoint(None, Some(&new), "/f", "/f", &alice())
        .unwrap();

    let cp = outcome.checkpoint().unwrap();
    assert_eq!(cp.change(), ChangeType::Add);
    assert_eq!(cp.hash(), &h1);
    assert_eq!(cp.size(), 10);
    assert_eq!(cp.author(), &alice());
}

#[test]
fn test_modify_keeps_new_state() {
    let engine = memory_engine();
    let old = FileState::new(ContentHash::of(b"one"), 10);
    let new = FileState::new(ContentHash::of(b"two"), 20);
    engine
        .make_checkpoint(None, Some(&old), "/f", "/f", &alice())
        .unwrap();
    engine.commit("add").unwrap();

    let outcome = engine
        .make_checkpoint(Some(&old), Some(&new), "/f", "/f", &alice())
        .unwrap();

    let cp = outcome.checkpoint().unwrap();
    assert_eq!(cp.change(), ChangeType::Modify);
    assert_eq!(cp.hash(), &ContentHash::of(b"two"));
    assert_eq!(cp.size(), 20);
}

#[test]
fn test_move_relocates_history() {
    let engine = memory_engine();
    let s = FileState::new(ContentHash::of(b"one"), 10);
    engine
        .make_checkpoint(None, Some(&s), "/f", "/f", &alice())
        .unwrap();
    engine.commit("add").unwrap();

    let outcome = engine
        .make_checkpoint(Some(&s), Some(&s), "/f", "/g", &alice())
        .unwrap();

    match &outcome {
        CheckpointOutcome::Created {
            path,
            moved_from,
            checkpoint,
        } => {
            assert_eq!(path, "/g");
            assert_eq!(moved_from.as_deref(), Some("/f"));
            assert_eq!(checkpoint.change(), ChangeType::Move);
            assert_eq!(checkpoint.hash(), &ContentHash::of(b"one"));
            assert_eq!(checkpoint.size(), 10);
        }
        CheckpointOutcome::NoChange => panic!("expected a checkpoint"),
    }

    let history = engine.history("/g").unwrap().to_vec().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].change(), ChangeType::Add);
    assert_eq!(history[1].change(), ChangeType::Move);
    assert!(matches!(engine.history("/f"), Err(HistoryError::NoSuchPath(_))));
}

#[test]
fn test_remove_records_last_known_state() {
    let engine = memory_engine();
    let s = state(b"gone soon");
    engine
        .make_checkpoint(None, Some(&s), "/f", "/f", &alice())
        .unwrap();
    engine.commit("add").unwrap();

    let outcome = engine
        .make_checkpoint(Some(&s), None, "/f", "/f", &alice())
        .unwrap();
    let cp = outcome.checkpoint().unwrap();
    assert_eq!(cp.change(), ChangeType::Remove);
    assert_eq!(cp.hash(), &s.hash);
    assert_eq!(engine.history("/f").unwrap().to_vec().unwrap().len(), 2);
}

#[test]
fn test_identical_states_are_no_change() {
    let engine = memory_engine();
    let s = state(b"same");
    let outcome = engine
        .make_checkpoint(Some(&s), Some(&s), "/f", "/f", &alice())
        .unwrap();
    assert_eq!(outcome, CheckpointOutcome::NoChange);
    assert!(matches!(engine.history("/f"), Err(HistoryError::NoSuchPath(_))));
}

#[test]
fn test_missing_states_are_rejected() {
    let engine = memory_engine();
    assert!(matches!(
        engine.make_checkpoint(None, None, "/f", "/f", &alice()),
        Err(HistoryError::InvalidArguments(_))
    ));
}

#[test]
fn test_invalid_path_is_rejected() {
    let engine = memory_engine();
    assert!(matches!(
        engine.make_checkpoint(None, Some(&state(b"x")), "", "", &alice()),
        Err(HistoryError::InvalidArguments(_))
    ));
    assert!(matches!(
        engine.make_checkpoint(None, Some(&state(b"x")), "/a\0b", "/a\0b", &alice()),
        Err(HistoryError::InvalidArguments(_))
    ));
}
