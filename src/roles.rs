//!
//! Role names, role sets and the actions a permission record can govern.
//!
//! Roles are opaque strings handed to us by whatever identity system sits in
//! front of the box. The only name with built-in meaning is [`ANYONE`].

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Wildcard role. Listed in a rule, it matches every caller, including one
/// with an empty role set.
pub const ANYONE: &str = "*";

/// A single role identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleName(String);

impl RoleName {
    pub fn new(name: impl Into<String>) -> Self {
        RoleName(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the [`ANYONE`] wildcard.
    pub fn is_anyone(&self) -> bool {
        self.0 == ANYONE
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoleName {
    fn from(s: &str) -> Self {
        RoleName(s.to_owned())
    }
}

impl From<String> for RoleName {
    fn from(s: String) -> Self {
        RoleName(s)
    }
}

/// The set of roles a caller holds for one request.
///
/// Built fresh per request from the session provider; never stored on the
/// filesystem side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSet(BTreeSet<RoleName>);

impl RoleSet {
    /// The empty set, used for anonymous callers.
    pub fn anonymous() -> Self {
        RoleSet::default()
    }

    pub fn contains(&self, role: &RoleName) -> bool {
        self.0.contains(role)
    }

    pub fn insert(&mut self, role: impl Into<RoleName>) -> bool {
        self.0.insert(role.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoleName> {
        self.0.iter()
    }

    /// True if any entry of `listed` names one of our roles or is [`ANYONE`].
    pub fn matches_any<'a, I>(&self, listed: I) -> bool
    where
        I: IntoIterator<Item = &'a RoleName>,
    {
        listed
            .into_iter()
            .any(|role| role.is_anyone() || self.0.contains(role))
    }
}

impl<R: Into<RoleName>> FromIterator<R> for RoleSet {
    fn from_iter<T: IntoIterator<Item = R>>(iter: T) -> Self {
        RoleSet(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, role) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(role.as_str())?;
        }
        f.write_str("]")
    }
}

/// An operation a permission record can allow or deny.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Download / open for reading.
    Read,
    /// Create or overwrite file content.
    Write,
    /// Applies to every action. Stored as `all`; `crud` is accepted on input.
    #[serde(alias = "crud")]
    All,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Write => "write",
            Action::All => "all",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anyone_matches_empty_set() {
        let roles = RoleSet::anonymous();
        let listed = vec![RoleName::from(ANYONE)];
        assert!(roles.matches_any(&listed));
    }

    #[test]
    fn test_matches_any_requires_overlap() {
        let roles: RoleSet = ["guest", "viewer"].into_iter().collect();
        let admins = vec![RoleName::from("admin")];
        let viewers = vec![RoleName::from("admin"), RoleName::from("viewer")];
        assert!(!roles.matches_any(&admins));
        assert!(roles.matches_any(&viewers));
        assert!(!roles.matches_any(&Vec::<RoleName>::new()));
    }

    #[test]
    fn test_action_serde_names() {
        assert_eq!(serde_json::to_string(&Action::Read).unwrap(), "\"read\"");
        assert_eq!(serde_json::to_string(&Action::All).unwrap(), "\"all\"");
        let crud: Action = serde_json::from_str("\"crud\"").unwrap();
        assert_eq!(crud, Action::All);
        assert!(serde_json::from_str::<Action>("\"reed\"").is_err());
    }

    #[test]
    fn test_role_set_display_is_sorted() {
        let roles: RoleSet = ["b", "a"].into_iter().collect();
        assert_eq!(roles.to_string(), "[a, b]");
    }
}
