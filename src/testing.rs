//!
//! Helpers for tests that need a real base directory on disk.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::MetaError;
use crate::filebox::Filebox;
use crate::record::PermissionRecord;
use crate::roles::RoleSet;
use crate::store::Resource;

/// Role set from string literals.
pub fn roles(names: &[&str]) -> RoleSet {
    names.iter().copied().collect()
}

/// A filebox over a fresh temporary directory, removed on drop.
#[derive(Debug)]
pub struct Sandbox {
    dir: TempDir,
    filebox: Filebox,
}

impl Sandbox {
    pub fn new() -> std::io::Result<Self> {
        let dir = tempfile::tempdir()?;
        let filebox = Filebox::new(dir.path());
        Ok(Sandbox { dir, filebox })
    }

    pub fn filebox(&self) -> &Filebox {
        &self.filebox
    }

    pub fn base(&self) -> &Path {
        self.dir.path()
    }

    /// Physical path of `rel` under the base directory.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel.trim_start_matches('/'))
    }

    /// Writes raw bytes, bypassing permission checks.
    pub fn put(&self, rel: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        Ok(path)
    }

    pub fn file_record(&self, rel: &str, record: &PermissionRecord) -> Result<PathBuf, MetaError> {
        self.filebox.store().save(Resource::File(&self.path(rel)), record)
    }

    pub fn dir_record(&self, rel: &str, record: &PermissionRecord) -> Result<PathBuf, MetaError> {
        self.filebox.store().save(Resource::Dir(&self.path(rel)), record)
    }
}
