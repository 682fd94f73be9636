use std::fs;
use std::io::{Cursor, Read};

use proptest::prelude::*;
use filebox::testing::Sandbox;
use filebox::{Action, PermissionRecord, RoleSet, Verdict};

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![Just(Action::Read), Just(Action::Write)]
}

fn role_set() -> impl Strategy<Value = RoleSet> {
    prop::collection::vec("[a-z]{1,6}", 0..4).prop_map(|names| names.into_iter().collect())
}

fn logical_file() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z]{1,6}", 1..4).prop_map(|segments| segments.join("/") + ".txt")
}

fn parent_of(logical: &str) -> &str {
    logical.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Without any record, every caller may read.
    #[test]
    fn prop_no_records_allow_read(path in logical_file(), roles in role_set()) {
        let sb = Sandbox::new().unwrap();
        let file = sb.filebox().access_file(&path, roles).unwrap();
        prop_assert_eq!(file.has_permission(Action::Read), Verdict::Allow);
    }

    /// A file record denying one of the caller's roles wins over any directory record.
    #[test]
    fn prop_own_deny_is_authoritative(
        path in logical_file(),
        roles in role_set(),
        extra in "[a-z]{1,6}",
        action in action(),
        dir_allows_everyone in any::<bool>(),
    ) {
        let sb = Sandbox::new().unwrap();
        let mut caller = roles;
        caller.insert(extra.as_str());

        if dir_allows_everyone {
            let open = PermissionRecord::new().allow(Action::All, ["*"]);
            sb.dir_record(parent_of(&path), &open).unwrap();
        }
        sb.file_record(&path, &PermissionRecord::new().deny(action, [extra.as_str()])).unwrap();

        let file = sb.filebox().access_file(&path, caller).unwrap();
        prop_assert_eq!(file.has_permission(action), Verdict::Deny);
    }

    /// A file without its own record resolves exactly as its directory does.
    #[test]
    fn prop_file_delegates_to_dir(
        path in logical_file(),
        roles in role_set(),
        allowed in prop::collection::vec("[a-z]{1,6}", 0..3),
        denied in prop::collection::vec("[a-z]{1,6}", 0..3),
        action in action(),
    ) {
        let sb = Sandbox::new().unwrap();
        let record = PermissionRecord::new().allow(action, allowed).deny(action, denied);
        sb.dir_record(parent_of(&path), &record).unwrap();

        let file = sb.filebox().access_file(&path, roles.clone()).unwrap();
        let dir = sb.filebox().access_dir(parent_of(&path), roles).unwrap();
        prop_assert_eq!(file.has_permission(action), dir.has_permission(action));
        prop_assert_eq!(file.has_permission(action), file.dir().has_permission(action));
    }

    /// Bytes that are not a valid record deny at either level.
    #[test]
    fn prop_unparseable_records_deny(
        path in logical_file(),
        roles in role_set(),
        garbage in prop::collection::vec(any::<u8>(), 0..64),
        at_dir in any::<bool>(),
        action in action(),
    ) {
        prop_assume!(PermissionRecord::from_json(&garbage).is_err());
        let sb = Sandbox::new().unwrap();
        let file = sb.filebox().access_file(&path, roles).unwrap();
        let sidecar = if at_dir {
            file.dir().path().join(".meta")
        } else {
            sb.path(&format!("{path}.meta"))
        };
        fs::create_dir_all(sidecar.parent().unwrap()).unwrap();
        fs::write(&sidecar, &garbage).unwrap();

        prop_assert_eq!(file.has_permission(action), Verdict::Deny);
    }

    /// Writes replace content; the last write is what reads return.
    #[test]
    fn prop_write_overwrites(
        path in logical_file(),
        first in prop::collection::vec(any::<u8>(), 0..256),
        second in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        let sb = Sandbox::new().unwrap();
        let file = sb.filebox().access_file(&path, RoleSet::anonymous()).unwrap();
        file.write(&mut Cursor::new(&first)).unwrap();
        file.write(&mut Cursor::new(&second)).unwrap();
        file.write(&mut Cursor::new(&second)).unwrap();

        let mut back = Vec::new();
        file.read().unwrap().read_to_end(&mut back).unwrap();
        prop_assert_eq!(back, second);
    }
}
