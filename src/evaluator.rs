//!
//! Role matching: answers allow/deny for one record, one role set and one action.
//!
//! The resolver never interprets a record itself. It hands the record to a
//! [`PermissionEvaluator`], so the ACL format stays decoupled from whatever
//! identity system supplies the roles.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::record::{PermissionRecord, Rule};
use crate::roles::{Action, RoleName, RoleSet};

/// Outcome of a permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Allow,
    Deny,
}

impl Verdict {
    pub fn is_allowed(self) -> bool {
        self == Verdict::Allow
    }
}

/// Trait implemented by pluggable role matchers.
///
/// `evaluate` must be a pure function of its arguments.
pub trait PermissionEvaluator: Send + Sync + 'static {
    fn evaluate(&self, record: &PermissionRecord, roles: &RoleSet, action: Action) -> Verdict;
}

/// Default evaluator.
///
/// 1. A role in `deny[action]` or `deny[all]` denies. Deny wins over allow.
/// 2. If the record has any allow list, a role in `allow[action]` or
///    `allow[all]` is required.
/// 3. A record without allow lists allows everything it does not deny.
///
/// The wildcard role `*` matches every caller in both lists. A caller with no
/// roles at all is only admitted by a `*` allow entry: any record that exists
/// shuts out anonymous callers unless it opens up to everyone.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoleMatcher;

impl RoleMatcher {
    fn listed<'r>(
        record: &'r PermissionRecord,
        action: Action,
        pick: fn(&'r Rule) -> &'r BTreeSet<RoleName>,
    ) -> impl Iterator<Item = &'r RoleName> {
        let specific = record.rule(action).map(pick);
        let blanket = if action == Action::All {
            None
        } else {
            record.rule(Action::All).map(pick)
        };
        specific.into_iter().chain(blanket).flatten()
    }
}

impl PermissionEvaluator for RoleMatcher {
    fn evaluate(&self, record: &PermissionRecord, roles: &RoleSet, action: Action) -> Verdict {
        if roles.matches_any(Self::listed(record, action, |rule| &rule.deny)) {
            return Verdict::Deny;
        }
        if !roles.is_empty() && !record.has_allow_lists() {
            return Verdict::Allow;
        }
        if roles.matches_any(Self::listed(record, action, |rule| &rule.allow)) {
            Verdict::Allow
        } else {
            Verdict::Deny
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(names: &[&str]) -> RoleSet {
        names.iter().copied().collect()
    }

    fn check(record: &PermissionRecord, caller: &RoleSet, action: Action) -> Verdict {
        RoleMatcher.evaluate(record, caller, action)
    }

    #[test]
    fn test_allow_list_restricts_to_listed_roles() {
        let record = PermissionRecord::new().allow(Action::Read, ["admin"]);
        assert_eq!(check(&record, &roles(&["admin"]), Action::Read), Verdict::Allow);
        assert_eq!(check(&record, &roles(&["guest"]), Action::Read), Verdict::Deny);
        assert_eq!(check(&record, &RoleSet::anonymous(), Action::Read), Verdict::Deny);
    }

    #[test]
    fn test_allow_list_on_other_action_still_restricts() {
        // Having any allow list turns the record into an allow-list record.
        let record = PermissionRecord::new().allow(Action::Write, ["editor"]);
        assert_eq!(check(&record, &roles(&["guest"]), Action::Read), Verdict::Deny);
        assert_eq!(check(&record, &roles(&["editor"]), Action::Write), Verdict::Allow);
    }

    #[test]
    fn test_deny_wins_over_allow() {
        let record = PermissionRecord::new()
            .allow(Action::Read, ["staff"])
            .deny(Action::Read, ["contractor"]);
        let caller = roles(&["staff", "contractor"]);
        assert_eq!(check(&record, &caller, Action::Read), Verdict::Deny);
    }

    #[test]
    fn test_deny_only_record_allows_others() {
        let record = PermissionRecord::new().deny(Action::Read, ["guest"]);
        assert_eq!(check(&record, &roles(&["guest"]), Action::Read), Verdict::Deny);
        assert_eq!(check(&record, &roles(&["staff"]), Action::Read), Verdict::Allow);
        assert_eq!(check(&record, &roles(&["guest"]), Action::Write), Verdict::Allow);
    }

    #[test]
    fn test_anonymous_caller_denied_by_existing_record() {
        let anonymous = RoleSet::anonymous();
        let deny_only = PermissionRecord::new().deny(Action::Read, ["guest"]);
        assert_eq!(check(&deny_only, &anonymous, Action::Read), Verdict::Deny);
        assert_eq!(check(&deny_only, &anonymous, Action::Write), Verdict::Deny);
        assert_eq!(check(&PermissionRecord::new(), &anonymous, Action::Read), Verdict::Deny);

        let public_read = PermissionRecord::new().allow(Action::Read, ["*"]);
        assert_eq!(check(&public_read, &anonymous, Action::Read), Verdict::Allow);
        assert_eq!(check(&public_read, &anonymous, Action::Write), Verdict::Deny);

        let public_all = PermissionRecord::new().allow(Action::All, ["*"]);
        assert_eq!(check(&public_all, &anonymous, Action::Write), Verdict::Allow);
    }

    #[test]
    fn test_all_action_applies_to_every_action() {
        let record = PermissionRecord::new().deny(Action::All, ["banned"]);
        for action in [Action::Read, Action::Write, Action::All] {
            assert_eq!(check(&record, &roles(&["banned"]), action), Verdict::Deny);
        }
        let record = PermissionRecord::new().allow(Action::All, ["admin"]);
        assert_eq!(check(&record, &roles(&["admin"]), Action::Write), Verdict::Allow);
    }

    #[test]
    fn test_wildcard_roles() {
        let public = PermissionRecord::new().allow(Action::Read, ["*"]);
        assert_eq!(check(&public, &RoleSet::anonymous(), Action::Read), Verdict::Allow);
        let locked = PermissionRecord::new()
            .deny(Action::Read, ["*"])
            .allow(Action::Read, ["admin"]);
        assert_eq!(check(&locked, &roles(&["admin"]), Action::Read), Verdict::Deny);
    }

    #[test]
    fn test_empty_record_allows() {
        let record = PermissionRecord::new();
        assert_eq!(check(&record, &roles(&["guest"]), Action::Write), Verdict::Allow);
    }
}
