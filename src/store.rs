//!
//! Sidecar metadata store.
//!
//! Every governed file `f` may have a record at `f.meta`; every governed
//! directory `d` may have one at `d/.meta`. Both hold the same
//! [`PermissionRecord`] JSON. Administrators and migration tooling rely on this
//! naming, so it only changes through [`SidecarLayout`].

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::MetaError;
use crate::record::PermissionRecord;

pub const DEFAULT_FILE_SUFFIX: &str = ".meta";
pub const DEFAULT_DIR_RECORD: &str = ".meta";

/// Naming of sidecar records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidecarLayout {
    /// Appended to a file name to form its record name.
    pub file_suffix: String,
    /// Fixed record name inside a governed directory.
    pub dir_record: String,
}

impl Default for SidecarLayout {
    fn default() -> Self {
        SidecarLayout {
            file_suffix: DEFAULT_FILE_SUFFIX.to_owned(),
            dir_record: DEFAULT_DIR_RECORD.to_owned(),
        }
    }
}

impl SidecarLayout {
    /// Location of the record governing `resource`.
    pub fn sidecar(&self, resource: Resource<'_>) -> PathBuf {
        match resource {
            Resource::File(path) => {
                let mut name = path.as_os_str().to_os_string();
                name.push(&self.file_suffix);
                PathBuf::from(name)
            }
            Resource::Dir(path) => path.join(&self.dir_record),
        }
    }

    /// Whether a path component with this name would be a sidecar record.
    pub fn is_reserved(&self, name: &str) -> bool {
        name == self.dir_record || name.ends_with(&self.file_suffix)
    }
}

/// A physical path together with the kind of record that governs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource<'a> {
    File(&'a Path),
    Dir(&'a Path),
}

impl<'a> Resource<'a> {
    pub fn path(&self) -> &'a Path {
        match self {
            Resource::File(path) | Resource::Dir(path) => path,
        }
    }
}

/// Loads and saves permission records. Holds no records in memory.
#[derive(Debug, Clone, Default)]
pub struct MetadataStore {
    layout: SidecarLayout,
}

impl MetadataStore {
    pub fn new(layout: SidecarLayout) -> Self {
        MetadataStore { layout }
    }

    pub fn layout(&self) -> &SidecarLayout {
        &self.layout
    }

    /// Loads the record governing `resource`.
    ///
    /// Returns `Ok(None)` when no sidecar exists. A sidecar that exists but
    /// cannot be read or parsed is an error, never `None`.
    pub fn load(&self, resource: Resource<'_>) -> Result<Option<PermissionRecord>, MetaError> {
        let sidecar = self.layout.sidecar(resource);
        match fs::metadata(&sidecar) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(MetaError::Read { path: sidecar, source }),
        }

        let bytes = match fs::read(&sidecar) {
            Ok(bytes) => bytes,
            // Removed between the stat and the read.
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(MetaError::Read { path: sidecar, source }),
        };

        PermissionRecord::from_json(&bytes)
            .map(Some)
            .map_err(|source| MetaError::Corrupt { path: sidecar, source })
    }

    /// Writes `record` as the sidecar for `resource`, creating missing parent
    /// directories. The record is written to a temporary file in the target
    /// directory and renamed into place, so readers see the old record or the
    /// new one, never a partial write.
    pub fn save(
        &self,
        resource: Resource<'_>,
        record: &PermissionRecord,
    ) -> Result<PathBuf, MetaError> {
        let sidecar = self.layout.sidecar(resource);
        let bytes = record.to_json().map_err(MetaError::Encode)?;
        let write_err = |source| MetaError::Write { path: sidecar.clone(), source };

        let parent = sidecar
            .parent()
            .ok_or_else(|| write_err(io::Error::other("sidecar path has no parent")))?;
        fs::create_dir_all(parent).map_err(write_err)?;

        let mut temp = NamedTempFile::new_in(parent).map_err(write_err)?;
        temp.write_all(&bytes).map_err(write_err)?;
        temp.as_file().sync_all().map_err(write_err)?;
        temp.persist(&sidecar).map_err(|err| write_err(err.error))?;

        tracing::info!(sidecar = %sidecar.display(), "permission record saved");
        Ok(sidecar)
    }
}
