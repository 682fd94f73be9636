//!
//! Filebox configuration.
//!
//! Loaded from a JSON document. Every field except `base_dir` has a default:
//!
//! ```json
//! {
//!   "base_dir": "/srv/files",
//!   "file_meta_suffix": ".meta",
//!   "dir_meta_name": ".meta",
//!   "mount_prefix": "/downloads/",
//!   "default_policy": { "read": "allow", "write": "allow" }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dispatch::{RequestDispatcher, DEFAULT_MOUNT_PREFIX};
use crate::error::ConfigError;
use crate::filebox::Filebox;
use crate::resolver::{DefaultPolicy, PermissionResolver};
use crate::store::{MetadataStore, SidecarLayout, DEFAULT_DIR_RECORD, DEFAULT_FILE_SUFFIX};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileboxConfig {
    pub base_dir: PathBuf,
    #[serde(default = "default_file_suffix")]
    pub file_meta_suffix: String,
    #[serde(default = "default_dir_record")]
    pub dir_meta_name: String,
    #[serde(default = "default_mount_prefix")]
    pub mount_prefix: String,
    #[serde(default)]
    pub default_policy: DefaultPolicy,
}

fn default_file_suffix() -> String {
    DEFAULT_FILE_SUFFIX.to_owned()
}

fn default_dir_record() -> String {
    DEFAULT_DIR_RECORD.to_owned()
}

fn default_mount_prefix() -> String {
    DEFAULT_MOUNT_PREFIX.to_owned()
}

impl FileboxConfig {
    /// Config with defaults for everything but the base directory.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        FileboxConfig {
            base_dir: base_dir.into(),
            file_meta_suffix: default_file_suffix(),
            dir_meta_name: default_dir_record(),
            mount_prefix: default_mount_prefix(),
            default_policy: DefaultPolicy::default(),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: FileboxConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("base_dir must not be empty".into()));
        }
        if self.file_meta_suffix.len() < 2 || !self.file_meta_suffix.starts_with('.') {
            return Err(ConfigError::Invalid(format!(
                "file_meta_suffix {:?} must be a dot followed by at least one character",
                self.file_meta_suffix
            )));
        }
        if self.file_meta_suffix.contains(['/', '\\']) {
            return Err(ConfigError::Invalid("file_meta_suffix must not contain separators".into()));
        }
        let name = self.dir_meta_name.as_str();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(ConfigError::Invalid(format!(
                "dir_meta_name {:?} must be a single path component",
                name
            )));
        }
        Ok(())
    }

    pub fn layout(&self) -> SidecarLayout {
        SidecarLayout {
            file_suffix: self.file_meta_suffix.clone(),
            dir_record: self.dir_meta_name.clone(),
        }
    }

    pub fn build(&self) -> Result<Filebox, ConfigError> {
        self.validate()?;
        let resolver = PermissionResolver::new(MetadataStore::new(self.layout()))
            .with_defaults(self.default_policy);
        tracing::info!(
            base_dir = %self.base_dir.display(),
            file_meta_suffix = %self.file_meta_suffix,
            dir_meta_name = %self.dir_meta_name,
            "filebox configured"
        );
        Ok(Filebox::with_resolver(&self.base_dir, resolver))
    }

    /// A dispatcher over [`build`](Self::build) mounted at `mount_prefix`.
    pub fn dispatcher<Req>(&self) -> Result<RequestDispatcher<Req>, ConfigError> {
        Ok(RequestDispatcher::new(self.build()?).with_mount_prefix(self.mount_prefix.clone()))
    }
}
