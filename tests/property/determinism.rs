//! Determinism of content hashes and sealing

use super::codec::checkpoint;
use filechain::{Commit, ContentHash, Identity, Timestamp};
use proptest::prelude::*;

proptest! {
    #[test]
    fn content_hash_is_deterministic(a in any::<Vec<u8>>(), b in any::<Vec<u8>>()) {
        prop_assert_eq!(ContentHash::of(&a), ContentHash::of(&a));
        if a != b {
            prop_assert_ne!(ContentHash::of(&a), ContentHash::of(&b));
        }
    }

    #[test]
    fn sealing_is_deterministic(
        changes in prop::collection::btree_map("/[a-z]{1,8}", checkpoint(), 1..5),
        message in ".{0,20}",
        parent in prop::option::of(any::<[u8; 8]>()),
    ) {
        let build = || {
            let mut commit = Commit::new_at(Identity::new("alice").unwrap(), Timestamp::from_nanos(7))
                .with_message(message.clone());
            for (path, cp) in &changes {
                commit.record(path, cp.clone()).unwrap();
            }
            commit
        };
        let parent = parent.map(|p| ContentHash::of(&p));

        let first = build().seal(parent.clone()).unwrap();
        let second = build().seal(parent.clone()).unwrap();
        prop_assert_eq!(first.hash(), second.hash());

        let other_message = build().with_message(format!("{}!", message)).seal(parent).unwrap();
        prop_assert_ne!(other_message.hash(), first.hash());
    }
}
