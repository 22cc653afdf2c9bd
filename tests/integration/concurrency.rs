//! Many threads checkpointing through one shared engine

use super::test_utils::{alice, memory_engine, state};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

const THREADS: usize = 8;

#[test]
fn test_parallel_checkpoints_share_one_engine() {
    let engine = Arc::new(memory_engine());

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let path = format!("/thread/{}", i);
                let content = format!("written by {}", i);
                engine
                    .make_checkpoint(None, Some(&state(content.as_bytes())), &path, &path, &alice())
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let staged = engine.staged();
    assert_eq!(staged.changes().len(), THREADS);

    let mut mod_times = HashSet::new();
    for i in 0..THREADS {
        let path = format!("/thread/{}", i);
        let history = engine.history(&path).unwrap().to_vec().unwrap();
        assert_eq!(history.len(), 1, "history of {}", path);
        assert!(staged.contains(&path), "{} should be staged", path);
        mod_times.insert(history[0].mod_time());
    }
    assert_eq!(mod_times.len(), THREADS);

    let sealed = engine.commit("parallel").unwrap();
    assert_eq!(sealed.changes().len(), THREADS);
}

#[test]
fn test_parallel_edits_to_one_path_stage_once() {
    let engine = Arc::new(memory_engine());

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let content = format!("version {}", i);
                engine
                    .make_checkpoint(None, Some(&state(content.as_bytes())), "/shared", "/shared", &alice())
                    .is_ok()
            })
        })
        .collect();
    let succeeded = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(succeeded, 1);
    assert_eq!(engine.history("/shared").unwrap().to_vec().unwrap().len(), 1);
}
