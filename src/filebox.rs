//!
//! The filebox: a base directory plus the resolver that guards it.

use std::path::{Path, PathBuf};

use crate::dir::Dir;
use crate::error::FileboxError;
use crate::file::File;
use crate::path::LogicalPath;
use crate::resolver::PermissionResolver;
use crate::roles::RoleSet;
use crate::store::{MetadataStore, SidecarLayout};

/// Binds logical request paths to physical paths under one base directory.
///
/// A `Filebox` holds no per-request state and can be shared between threads.
/// Every [`File`] and [`Dir`] it hands out is a fresh value scoped to one
/// caller's role set.
#[derive(Debug, Clone)]
pub struct Filebox {
    base: PathBuf,
    resolver: PermissionResolver,
}

impl Filebox {
    /// A filebox over `base` with the default sidecar layout and role matcher.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self::with_resolver(base, PermissionResolver::new(MetadataStore::default()))
    }

    pub fn with_resolver(base: impl Into<PathBuf>, resolver: PermissionResolver) -> Self {
        Filebox { base: base.into(), resolver }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    pub fn resolver(&self) -> &PermissionResolver {
        &self.resolver
    }

    pub fn store(&self) -> &MetadataStore {
        self.resolver.store()
    }

    pub fn layout(&self) -> &SidecarLayout {
        self.store().layout()
    }

    /// Binds `logical` to a file for a caller holding `roles`.
    ///
    /// Does no I/O. Fails only when the path escapes the base directory, names
    /// the base directory itself, or names a sidecar record.
    pub fn access_file(&self, logical: &str, roles: RoleSet) -> Result<File<'_>, FileboxError> {
        let path = self.checked(logical)?;
        if path.is_root() {
            return Err(FileboxError::InvalidPath {
                path: logical.to_owned(),
                reason: "names the base directory, not a file",
            });
        }
        let dir = Dir::new(self, path.parent(), roles.clone());
        Ok(File::new(self, path, roles, dir))
    }

    /// Binds `logical` to a directory for a caller holding `roles`. Does no I/O.
    pub fn access_dir(&self, logical: &str, roles: RoleSet) -> Result<Dir<'_>, FileboxError> {
        let path = self.checked(logical)?;
        Ok(Dir::new(self, path, roles))
    }

    pub(crate) fn checked(&self, logical: &str) -> Result<LogicalPath, FileboxError> {
        let path = LogicalPath::parse(logical)?;
        self.check_reserved(&path, logical)?;
        Ok(path)
    }

    pub(crate) fn check_reserved(&self, path: &LogicalPath, raw: &str) -> Result<(), FileboxError> {
        if path.segments().any(|segment| self.layout().is_reserved(segment)) {
            return Err(FileboxError::InvalidPath {
                path: raw.to_owned(),
                reason: "names a permission record",
            });
        }
        Ok(())
    }

    pub(crate) fn physical(&self, path: &LogicalPath) -> PathBuf {
        path.to_physical(&self.base)
    }
}
