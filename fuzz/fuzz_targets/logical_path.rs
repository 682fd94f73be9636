#![no_main]

// Any accepted request path must map to a physical path inside the base
// directory and must never name a sidecar record.

use libfuzzer_sys::fuzz_target;
use filebox::{Filebox, RoleSet};

fuzz_target!(|raw: &str| {
    let filebox = Filebox::new("/base");
    if let Ok(file) = filebox.access_file(raw, RoleSet::anonymous()) {
        assert!(file.path().starts_with("/base"));
        assert!(!file.path().components().any(|c| c.as_os_str() == ".."));
        assert!(!filebox.layout().is_reserved(file.file_name()));
    }
    if let Ok(dir) = filebox.access_dir(raw, RoleSet::anonymous()) {
        assert!(dir.path().starts_with("/base"));
    }
});
