#![no_main]

// Feeds arbitrary bytes as a directory record and checks that anything the
// record parser rejects resolves to Deny, never Allow.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use filebox::{Action, Filebox, PermissionRecord, RoleSet, Verdict};

#[derive(Arbitrary, Debug)]
struct Input {
    record: Vec<u8>,
    roles: Vec<String>,
    write: bool,
}

fuzz_target!(|input: Input| {
    let tmp = tempfile::tempdir().expect("tempdir");
    std::fs::write(tmp.path().join(".meta"), &input.record).expect("write sidecar");

    let filebox = Filebox::new(tmp.path());
    let roles: RoleSet = input.roles.into_iter().collect();
    let file = filebox.access_file("target.bin", roles).expect("valid path");
    let action = if input.write { Action::Write } else { Action::Read };

    let verdict = file.has_permission(action);
    if PermissionRecord::from_json(&input.record).is_err() {
        assert_eq!(verdict, Verdict::Deny);
    }
});
