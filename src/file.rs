//!
//! File accessor.

use std::fs;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::dir::Dir;
use crate::error::FileboxError;
use crate::evaluator::Verdict;
use crate::filebox::Filebox;
use crate::path::LogicalPath;
use crate::record::PermissionRecord;
use crate::resolver::{Decision, Target};
use crate::roles::{Action, RoleSet};
use crate::store::Resource;

/// One file under the base directory, as seen by one caller.
///
/// Holds its owning [`Dir`] by value. Both are rebuilt for every request, so
/// there is no state to invalidate when records change.
#[derive(Debug, Clone)]
pub struct File<'a> {
    filebox: &'a Filebox,
    logical: LogicalPath,
    physical: PathBuf,
    roles: RoleSet,
    dir: Dir<'a>,
}

impl<'a> File<'a> {
    pub(crate) fn new(
        filebox: &'a Filebox,
        logical: LogicalPath,
        roles: RoleSet,
        dir: Dir<'a>,
    ) -> Self {
        let physical = filebox.physical(&logical);
        File { filebox, logical, physical, roles, dir }
    }

    pub fn logical_path(&self) -> &LogicalPath {
        &self.logical
    }

    /// Physical path under the base directory.
    pub fn path(&self) -> &Path {
        &self.physical
    }

    pub fn roles(&self) -> &RoleSet {
        &self.roles
    }

    pub fn dir(&self) -> &Dir<'a> {
        &self.dir
    }

    pub fn file_name(&self) -> &str {
        self.logical.file_name().unwrap_or_default()
    }

    /// Resolves `action` for this caller: own record first, then the owning
    /// directory's record, then the default.
    pub fn decide(&self, action: Action) -> Decision {
        let target = Target::File { file: &self.physical, dir: self.dir.path() };
        self.filebox.resolver().decide(target, &self.roles, action)
    }

    pub fn has_permission(&self, action: Action) -> Verdict {
        self.decide(action).verdict
    }

    fn require(&self, action: Action) -> Result<(), FileboxError> {
        match self.has_permission(action) {
            Verdict::Allow => Ok(()),
            Verdict::Deny => {
                Err(FileboxError::PermissionDenied { path: self.physical.clone(), action })
            }
        }
    }

    /// Opens the file for reading once `Read` is allowed.
    ///
    /// The handle is closed when the returned reader is dropped.
    pub fn read(&self) -> Result<FileReader, FileboxError> {
        self.require(Action::Read)?;

        let not_found = || FileboxError::NotFoundOnDisk { path: self.physical.clone() };
        let inner = match fs::File::open(&self.physical) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(FileboxError::io(&self.physical, e)),
        };
        let metadata = inner.metadata().map_err(|e| FileboxError::io(&self.physical, e))?;
        if !metadata.is_file() {
            return Err(not_found());
        }

        tracing::debug!(
            path = %self.physical.display(),
            len = metadata.len(),
            "file opened for read"
        );
        Ok(FileReader {
            inner,
            file_name: self.file_name().to_owned(),
            len: metadata.len(),
        })
    }

    /// Replaces the file content with everything read from `reader` once
    /// `Write` is allowed, creating missing parent directories.
    ///
    /// Returns the number of bytes written.
    pub fn write<R: Read + ?Sized>(&self, reader: &mut R) -> Result<u64, FileboxError> {
        self.require(Action::Write)?;

        if let Some(parent) = self.physical.parent() {
            fs::create_dir_all(parent).map_err(|e| FileboxError::io(parent, e))?;
        }
        let mut dst =
            fs::File::create(&self.physical).map_err(|e| FileboxError::io(&self.physical, e))?;
        let written = io::copy(reader, &mut dst).map_err(|e| FileboxError::io(&self.physical, e))?;

        tracing::debug!(path = %self.physical.display(), written, "file written");
        Ok(written)
    }

    /// Persists `record` as this file's own permission record.
    ///
    /// Unconditional: deciding who may change permissions is up to the caller.
    pub fn set_permission(&self, record: &PermissionRecord) -> Result<(), FileboxError> {
        self.filebox.store().save(Resource::File(&self.physical), record)?;
        Ok(())
    }

    /// This file's own record, if it has one. Does not consult the directory.
    pub fn permission(&self) -> Result<Option<PermissionRecord>, FileboxError> {
        Ok(self.filebox.store().load(Resource::File(&self.physical))?)
    }
}

/// Open read handle returned by [`File::read`].
#[derive(Debug)]
pub struct FileReader {
    inner: fs::File,
    file_name: String,
    len: u64,
}

impl FileReader {
    /// Base name of the file, for `Content-Disposition`.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Size at the time the file was opened.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn into_inner(self) -> fs::File {
        self.inner
    }
}

impl Read for FileReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for FileReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}
