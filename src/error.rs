//!
//! Error types for the filebox.
//!
//! An absent permission record is never an error: the store reports it as
//! `Ok(None)`. Everything here is a real failure.

use std::io;
use std::path::PathBuf;

use crate::roles::Action;

/// Failures of the sidecar metadata store.
#[derive(Debug, thiserror::Error)]
pub enum MetaError {
    /// The sidecar exists but could not be read.
    #[error("failed to read permission record {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    /// The sidecar was read but is not a valid permission record.
    #[error("corrupt permission record {}: {source}", .path.display())]
    Corrupt { path: PathBuf, source: serde_json::Error },
    /// The record could not be serialized.
    #[error("failed to encode permission record: {0}")]
    Encode(#[source] serde_json::Error),
    /// Writing or renaming the sidecar failed.
    #[error("failed to write permission record {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Errors surfaced by file and directory accessors.
#[derive(Debug, thiserror::Error)]
pub enum FileboxError {
    /// The governing record denies the action, or could not be trusted.
    #[error("permission denied: {action} on {}", .path.display())]
    PermissionDenied { path: PathBuf, action: Action },
    /// Permission was granted but nothing exists at the physical path.
    #[error("not found on disk: {}", .path.display())]
    NotFoundOnDisk { path: PathBuf },
    /// The logical path escapes the base directory or names a reserved sidecar.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },
    /// Session resolution was required but failed.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    /// Filesystem failure unrelated to permissions.
    #[error("I/O error on {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Meta(#[from] MetaError),
}

impl FileboxError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        FileboxError::Io { path: path.into(), source }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, FileboxError::PermissionDenied { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FileboxError::NotFoundOnDisk { .. })
    }
}

/// Returned by a [`crate::dispatch::SessionProvider`] that cannot resolve the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("session resolution failed: {reason}")]
pub struct SessionError {
    pub reason: String,
}

impl SessionError {
    pub fn new(reason: impl Into<String>) -> Self {
        SessionError { reason: reason.into() }
    }
}

impl From<SessionError> for FileboxError {
    fn from(err: SessionError) -> Self {
        FileboxError::Unauthenticated(err.reason)
    }
}

/// Configuration could not be loaded or failed validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
