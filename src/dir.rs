//!
//! Directory accessor.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::error::FileboxError;
use crate::evaluator::Verdict;
use crate::file::File;
use crate::filebox::Filebox;
use crate::path::LogicalPath;
use crate::record::PermissionRecord;
use crate::resolver::{Decision, Target};
use crate::roles::{Action, RoleSet};
use crate::store::Resource;

/// One directory under the base directory, as seen by one caller.
#[derive(Debug, Clone)]
pub struct Dir<'a> {
    filebox: &'a Filebox,
    logical: LogicalPath,
    physical: PathBuf,
    roles: RoleSet,
}

impl<'a> Dir<'a> {
    pub(crate) fn new(filebox: &'a Filebox, logical: LogicalPath, roles: RoleSet) -> Self {
        let physical = filebox.physical(&logical);
        Dir { filebox, logical, physical, roles }
    }

    pub fn logical_path(&self) -> &LogicalPath {
        &self.logical
    }

    pub fn path(&self) -> &Path {
        &self.physical
    }

    pub fn roles(&self) -> &RoleSet {
        &self.roles
    }

    pub fn decide(&self, action: Action) -> Decision {
        self.filebox
            .resolver()
            .decide(Target::Dir(&self.physical), &self.roles, action)
    }

    /// Resolves `action` against this directory's record, or the default when
    /// it has none.
    pub fn has_permission(&self, action: Action) -> Verdict {
        self.decide(action).verdict
    }

    /// The file `name` inside this directory, carrying this directory's role set.
    pub fn file(&self, name: &str) -> Result<File<'a>, FileboxError> {
        let logical = self.logical.child(name)?;
        self.filebox.check_reserved(&logical, name)?;
        Ok(File::new(self.filebox, logical, self.roles.clone(), self.clone()))
    }

    /// Writes `name` inside this directory with content from `reader`.
    ///
    /// The file's own record (or this directory's) must allow `Write`. The
    /// directory is created only after that check passes.
    pub fn write_file<R: Read + ?Sized>(
        &self,
        name: &str,
        reader: &mut R,
    ) -> Result<File<'a>, FileboxError> {
        let file = self.file(name)?;
        file.write(reader)?;
        Ok(file)
    }

    /// Persists `record` as this directory's record, creating the directory
    /// if needed. Unconditional, like [`File::set_permission`].
    pub fn set_permission(&self, record: &PermissionRecord) -> Result<(), FileboxError> {
        self.create_if_missing()?;
        self.filebox.store().save(Resource::Dir(&self.physical), record)?;
        Ok(())
    }

    /// This directory's own record, if any.
    pub fn permission(&self) -> Result<Option<PermissionRecord>, FileboxError> {
        Ok(self.filebox.store().load(Resource::Dir(&self.physical))?)
    }

    pub fn exists(&self) -> bool {
        self.physical.is_dir()
    }

    fn create_if_missing(&self) -> Result<(), FileboxError> {
        match fs::create_dir_all(&self.physical) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && self.exists() => Ok(()),
            Err(e) => Err(FileboxError::io(&self.physical, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn roles(names: &[&str]) -> RoleSet {
        names.iter().copied().collect()
    }

    #[test]
    fn test_write_file_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let filebox = Filebox::new(tmp.path());
        let dir = filebox.access_dir("uploads/2024", roles(&["staff"])).unwrap();
        assert!(!dir.exists());

        let file = dir.write_file("a.csv", &mut Cursor::new(b"1,2,3")).unwrap();
        assert!(dir.exists());
        assert_eq!(file.roles(), &roles(&["staff"]));
        assert_eq!(file.dir().path(), dir.path());
        assert_eq!(fs::read(tmp.path().join("uploads/2024/a.csv")).unwrap(), b"1,2,3");
    }

    #[test]
    fn test_write_file_respects_dir_record() {
        let tmp = tempfile::tempdir().unwrap();
        let filebox = Filebox::new(tmp.path());
        filebox
            .access_dir("inbox", roles(&[]))
            .unwrap()
            .set_permission(&PermissionRecord::new().allow(Action::Write, ["staff"]))
            .unwrap();

        let as_guest = filebox.access_dir("inbox", roles(&["guest"])).unwrap();
        let err = as_guest.write_file("x.txt", &mut Cursor::new(b"x")).unwrap_err();
        assert!(err.is_permission_denied());

        let as_staff = filebox.access_dir("inbox", roles(&["staff"])).unwrap();
        assert!(as_staff.write_file("x.txt", &mut Cursor::new(b"x")).is_ok());
    }

    #[test]
    fn test_write_file_rejects_bad_names() {
        let tmp = tempfile::tempdir().unwrap();
        let filebox = Filebox::new(tmp.path());
        let dir = filebox.access_dir("d", roles(&[])).unwrap();
        for name in ["../escape.txt", "a/b", ".meta", "x.txt.meta", ""] {
            let err = dir.write_file(name, &mut Cursor::new(b"x")).unwrap_err();
            assert!(matches!(err, FileboxError::InvalidPath { .. }), "{name:?}");
        }
    }

    #[test]
    fn test_set_permission_creates_directory_and_sidecar() {
        let tmp = tempfile::tempdir().unwrap();
        let filebox = Filebox::new(tmp.path());
        let dir = filebox.access_dir("private", roles(&["guest"])).unwrap();
        assert_eq!(dir.has_permission(Action::Read), Verdict::Allow);

        let record = PermissionRecord::new().deny(Action::Read, ["guest"]);
        dir.set_permission(&record).unwrap();
        assert!(tmp.path().join("private/.meta").is_file());
        assert_eq!(dir.permission().unwrap(), Some(record));
        assert_eq!(dir.has_permission(Action::Read), Verdict::Deny);
    }

    #[test]
    fn test_root_dir_without_record_allows() {
        let tmp = tempfile::tempdir().unwrap();
        let filebox = Filebox::new(tmp.path());
        let root = filebox.access_dir("/", roles(&[])).unwrap();
        assert_eq!(root.has_permission(Action::Read), Verdict::Allow);
        assert_eq!(root.path(), tmp.path());
    }
}
