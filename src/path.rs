//!
//! Logical request paths.
//!
//! A logical path is what the caller asks for, relative to the base directory.
//! Normalization is purely lexical and never touches the filesystem, so building
//! a `File` or `Dir` does no I/O.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::FileboxError;

/// A normalized path below the base directory. The empty path is the base
/// directory itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LogicalPath {
    segments: Vec<String>,
}

impl LogicalPath {
    /// The base directory.
    pub fn root() -> Self {
        LogicalPath::default()
    }

    /// Normalizes a raw request path.
    ///
    /// Leading slashes, empty segments and `.` are dropped and `..` removes the
    /// previous segment. A `..` that would climb above the base directory is
    /// rejected, as are backslashes and NUL bytes.
    pub fn parse(raw: &str) -> Result<Self, FileboxError> {
        let invalid = |reason| FileboxError::InvalidPath { path: raw.to_owned(), reason };

        if raw.contains(char::is_control) {
            return Err(invalid("contains a control character"));
        }
        if raw.contains('\\') {
            return Err(invalid("contains a backslash"));
        }

        let mut segments: Vec<String> = Vec::new();
        for segment in raw.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(invalid("escapes the base directory"));
                    }
                }
                name => segments.push(name.to_owned()),
            }
        }
        Ok(LogicalPath { segments })
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment, `None` for the base directory.
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The containing directory. The base directory is its own parent.
    pub fn parent(&self) -> LogicalPath {
        let mut segments = self.segments.clone();
        segments.pop();
        LogicalPath { segments }
    }

    /// Appends a single name. The name must not contain separators or be `.`/`..`.
    pub fn child(&self, name: &str) -> Result<LogicalPath, FileboxError> {
        let single = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\'])
            && !name.contains(char::is_control);
        if !single {
            return Err(FileboxError::InvalidPath {
                path: name.to_owned(),
                reason: "not a single path component",
            });
        }
        let mut segments = self.segments.clone();
        segments.push(name.to_owned());
        Ok(LogicalPath { segments })
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// Physical location under `base`.
    pub fn to_physical(&self, base: &Path) -> PathBuf {
        let mut physical = base.to_path_buf();
        physical.extend(&self.segments);
        physical
    }
}

impl fmt::Display for LogicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}
