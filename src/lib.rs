#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(deprecated)]

//!
//! Filebox serves files out of a directory tree and decides, per request,
//! whether a caller may read or write them.
//!
//! Access rules are JSON permission records stored beside the resource they
//! govern: `<file>.meta` for a file and `<dir>/.meta` for a directory. A file
//! without its own record is governed by its immediate parent directory's
//! record; a directory without a record falls back to the default policy,
//! which allows. Corrupt records deny. Records are read on every request and
//! never cached.
//!
//! All filesystem access is blocking.

// Role names, role sets and actions.
pub mod roles;

// Permission record format.
pub mod record;

// Role matching against a record.
pub mod evaluator;

// Sidecar persistence.
pub mod store;

// File-then-directory resolution.
pub mod resolver;

// Logical path normalization.
pub mod path;

pub mod filebox;
pub mod file;
pub mod dir;

// Transport boundary.
pub mod dispatch;

pub mod config;

pub mod error;

#[cfg(feature = "tracing-subscriber")]
pub mod logging;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use config::FileboxConfig;
pub use dir::Dir;
pub use dispatch::{RequestDispatcher, Response, SessionProvider};
pub use error::{FileboxError, MetaError, SessionError};
pub use evaluator::{PermissionEvaluator, RoleMatcher, Verdict};
pub use file::{File, FileReader};
pub use filebox::Filebox;
pub use record::{PermissionRecord, Rule};
pub use resolver::{DefaultPolicy, PermissionResolver, Target};
pub use roles::{Action, RoleName, RoleSet, ANYONE};
pub use store::{MetadataStore, Resource, SidecarLayout};
