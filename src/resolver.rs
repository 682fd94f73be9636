//!
//! Permission resolution.
//!
//! For a file, the file's own sidecar is consulted first; if it has none, the
//! record of the immediately owning directory decides. Only that one fallback
//! step exists: no other ancestor is ever read. A directory without a record
//! falls through to the [`DefaultPolicy`].
//!
//! Nothing is cached. Every call reads the sidecars again, so a record written
//! by an administrator applies to the very next request.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::evaluator::{PermissionEvaluator, RoleMatcher, Verdict};
use crate::roles::{Action, RoleSet};
use crate::store::{MetadataStore, Resource};

/// What a permission check is being made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    /// A file and the directory that owns it.
    File { file: &'a Path, dir: &'a Path },
    Dir(&'a Path),
}

/// Which level produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionSource {
    FileRecord,
    DirRecord,
    /// Neither level had a record.
    Default,
    /// A record existed but could not be read or parsed.
    Untrusted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub verdict: Verdict,
    pub source: DecisionSource,
}

/// Verdicts used when no record governs a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultPolicy {
    pub read: Verdict,
    pub write: Verdict,
}

impl Default for DefaultPolicy {
    fn default() -> Self {
        DefaultPolicy { read: Verdict::Allow, write: Verdict::Allow }
    }
}

impl DefaultPolicy {
    pub fn verdict(&self, action: Action) -> Verdict {
        match action {
            Action::Read => self.read,
            Action::Write => self.write,
            Action::All if self.read.is_allowed() && self.write.is_allowed() => Verdict::Allow,
            Action::All => Verdict::Deny,
        }
    }
}

/// Finds the governing record for a target and evaluates it.
#[derive(Clone)]
pub struct PermissionResolver {
    store: MetadataStore,
    evaluator: Arc<dyn PermissionEvaluator>,
    defaults: DefaultPolicy,
}

impl std::fmt::Debug for PermissionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionResolver")
            .field("store", &self.store)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl PermissionResolver {
    /// Resolver using the default [`RoleMatcher`].
    pub fn new(store: MetadataStore) -> Self {
        Self::with_evaluator(store, Arc::new(RoleMatcher))
    }

    pub fn with_evaluator(store: MetadataStore, evaluator: Arc<dyn PermissionEvaluator>) -> Self {
        PermissionResolver { store, evaluator, defaults: DefaultPolicy::default() }
    }

    pub fn with_defaults(mut self, defaults: DefaultPolicy) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    pub fn defaults(&self) -> DefaultPolicy {
        self.defaults
    }

    pub fn resolve(&self, target: Target<'_>, roles: &RoleSet, action: Action) -> Verdict {
        self.decide(target, roles, action).verdict
    }

    /// Like [`resolve`](Self::resolve) but also reports which level decided.
    pub fn decide(&self, target: Target<'_>, roles: &RoleSet, action: Action) -> Decision {
        let decision = match target {
            Target::File { file, dir } => self
                .consult(Resource::File(file), roles, action, DecisionSource::FileRecord)
                .unwrap_or_else(|| self.decide_dir(dir, roles, action)),
            Target::Dir(dir) => self.decide_dir(dir, roles, action),
        };
        tracing::debug!(
            target_path = %target_path(target).display(),
            %roles,
            %action,
            verdict = ?decision.verdict,
            source = ?decision.source,
            "permission resolved"
        );
        decision
    }

    fn decide_dir(&self, dir: &Path, roles: &RoleSet, action: Action) -> Decision {
        self.consult(Resource::Dir(dir), roles, action, DecisionSource::DirRecord)
            .unwrap_or(Decision {
                verdict: self.defaults.verdict(action),
                source: DecisionSource::Default,
            })
    }

    /// `None` means no record at this level.
    fn consult(
        &self,
        resource: Resource<'_>,
        roles: &RoleSet,
        action: Action,
        source: DecisionSource,
    ) -> Option<Decision> {
        match self.store.load(resource) {
            Ok(Some(record)) => Some(Decision {
                verdict: self.evaluator.evaluate(&record, roles, action),
                source,
            }),
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(error = %err, "untrusted permission record, denying");
                Some(Decision { verdict: Verdict::Deny, source: DecisionSource::Untrusted })
            }
        }
    }
}

fn target_path(target: Target<'_>) -> &Path {
    match target {
        Target::File { file, .. } => file,
        Target::Dir(dir) => dir,
    }
}
