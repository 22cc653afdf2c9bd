//! Encoding properties for checkpoints and commits

use filechain::codec::{decode_checkpoint, decode_commit, encode_checkpoint, encode_commit};
use filechain::{ChangeType, Checkpoint, Commit, ContentHash, Identity, Timestamp};
use proptest::prelude::*;

fn change_type() -> impl Strategy<Value = ChangeType> {
    prop::sample::select(vec![
        ChangeType::Add,
        ChangeType::Modify,
        ChangeType::Move,
        ChangeType::Remove,
    ])
}

fn identity() -> impl Strategy<Value = Identity> {
    "[a-z][a-z0-9@.]{0,15}".prop_map(|s| Identity::new(s).unwrap())
}

pub fn checkpoint() -> impl Strategy<Value = Checkpoint> {
    (
        prop::collection::vec(any::<u8>(), 0..64),
        any::<u64>(),
        any::<u64>(),
        change_type(),
        identity(),
    )
        .prop_map(|(content, nanos, size, change, author)| {
            Checkpoint::new(
                ContentHash::of(&content),
                Timestamp::from_nanos(nanos),
                size,
                change,
                author,
            )
        })
}

proptest! {
    #[test]
    fn checkpoint_survives_encoding(cp in checkpoint()) {
        let decoded = decode_checkpoint(&encode_checkpoint(&cp).unwrap()).unwrap();
        prop_assert_eq!(decoded, cp);
    }

    #[test]
    fn commit_survives_encoding(
        author in identity(),
        nanos in any::<u64>(),
        message in ".{0,40}",
        changes in prop::collection::btree_map("/[a-z]{1,8}", checkpoint(), 0..6),
        parent in prop::option::of(prop::collection::vec(any::<u8>(), 0..16)),
        sealed in any::<bool>(),
    ) {
        let mut commit = Commit::new_at(author, Timestamp::from_nanos(nanos)).with_message(message);
        for (path, cp) in changes {
            commit.record(&path, cp).unwrap();
        }
        if sealed {
            commit = commit.seal(parent.map(|p| ContentHash::of(&p))).unwrap();
        }

        let decoded = decode_commit(&encode_commit(&commit).unwrap()).unwrap();
        prop_assert_eq!(decoded, commit);
    }

    #[test]
    fn hash_bytes_survive_parsing(content in prop::collection::vec(any::<u8>(), 0..128)) {
        let hash = ContentHash::of(&content);
        prop_assert_eq!(ContentHash::from_bytes(&hash.to_bytes()).unwrap(), hash);
    }

    #[test]
    fn truncated_hash_bytes_are_rejected(content in prop::collection::vec(any::<u8>(), 0..16), cut in 1usize..34) {
        let bytes = ContentHash::of(&content).to_bytes();
        prop_assert!(ContentHash::from_bytes(&bytes[..bytes.len() - cut]).is_err());
    }
}
