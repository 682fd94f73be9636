//!
//! Permission records: the access-control list stored beside a file or directory.
//!
//! A record maps each [`Action`] to a [`Rule`] listing the roles allowed and the
//! roles explicitly denied for that action. On disk it is a single JSON object:
//!
//! ```json
//! { "read": { "allow": ["admin"], "deny": ["guest"] } }
//! ```
//!
//! A record carries no path of its own. It only means something relative to the
//! sidecar location it was loaded from.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::roles::{Action, RoleName};

/// Allowed and denied roles for one action.
///
/// Unknown fields are rejected so a misspelt `"deny"` makes the whole record
/// unreadable instead of silently granting access.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub allow: BTreeSet<RoleName>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub deny: BTreeSet<RoleName>,
}

/// Access-control list keyed by action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionRecord {
    rules: BTreeMap<Action, Rule>,
}

impl PermissionRecord {
    /// An empty record. It restricts nothing, but as an explicit record it
    /// still stops fallback to the parent directory.
    pub fn new() -> Self {
        PermissionRecord::default()
    }

    /// Adds `roles` to the allow list of `action`.
    pub fn allow<I, R>(mut self, action: Action, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleName>,
    {
        self.rules
            .entry(action)
            .or_default()
            .allow
            .extend(roles.into_iter().map(Into::into));
        self
    }

    /// Adds `roles` to the deny list of `action`.
    pub fn deny<I, R>(mut self, action: Action, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleName>,
    {
        self.rules
            .entry(action)
            .or_default()
            .deny
            .extend(roles.into_iter().map(Into::into));
        self
    }

    pub fn rule(&self, action: Action) -> Option<&Rule> {
        self.rules.get(&action)
    }

    pub fn rules(&self) -> impl Iterator<Item = (Action, &Rule)> {
        self.rules.iter().map(|(action, rule)| (*action, rule))
    }

    /// Whether any action carries a non-empty allow list. A record with no
    /// allow lists at all only restricts through its deny lists.
    pub fn has_allow_lists(&self) -> bool {
        self.rules.values().any(|rule| !rule.allow.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.rules
            .values()
            .all(|rule| rule.allow.is_empty() && rule.deny.is_empty())
    }

    /// Parses a record from its JSON form.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Serializes the record to its JSON form.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
