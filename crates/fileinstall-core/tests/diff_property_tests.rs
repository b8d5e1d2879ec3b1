use fileinstall_core::snapshot::diff;
use fileinstall_core::{ChangeKind, DirectorySnapshot, Fingerprint};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, SystemTime};

fn fingerprint(stamp: u8) -> Fingerprint {
    Fingerprint {
        modified: Some(SystemTime::UNIX_EPOCH + Duration::from_secs(u64::from(stamp))),
        len: u64::from(stamp % 4),
    }
}

fn state() -> impl Strategy<Value = BTreeMap<String, u8>> {
    prop::collection::btree_map("[a-c]{1,2}(/[a-c]{1,2})?", any::<u8>(), 0..12)
}

fn snapshot(state: &BTreeMap<String, u8>) -> DirectorySnapshot {
    state
        .iter()
        .map(|(path, stamp)| (path.clone(), fingerprint(*stamp)))
        .collect()
}

proptest! {
    #[test]
    fn diff_matches_set_difference(before in state(), after in state()) {
        let changes = diff(&snapshot(&before), &snapshot(&after));

        let of_kind = |kind: ChangeKind| -> BTreeSet<String> {
            changes.iter().filter(|c| c.kind == kind).map(|c| c.path.clone()).collect()
        };

        let added: BTreeSet<String> = after.keys().filter(|p| !before.contains_key(*p)).cloned().collect();
        let removed: BTreeSet<String> = before.keys().filter(|p| !after.contains_key(*p)).cloned().collect();
        let updated: BTreeSet<String> = after
            .iter()
            .filter(|(p, stamp)| before.get(*p).is_some_and(|old| fingerprint(*old) != fingerprint(**stamp)))
            .map(|(p, _)| p.clone())
            .collect();

        prop_assert_eq!(of_kind(ChangeKind::Added), added);
        prop_assert_eq!(of_kind(ChangeKind::Removed), removed);
        prop_assert_eq!(of_kind(ChangeKind::Updated), updated);

        let paths: Vec<&String> = changes.iter().map(|c| &c.path).collect();
        let mut sorted = paths.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(paths, sorted);
    }

    #[test]
    fn applying_the_same_state_twice_is_quiet(state in state()) {
        let snapshot = snapshot(&state);
        prop_assert!(diff(&snapshot, &snapshot.clone()).is_empty());
    }
}
