//! Decision combination over a compiled policy set.
//!
//! # Purpose
//! Turns the set of records matching a request into a single ALLOW or DENY.
//!
//! # How it fits
//! The engine snapshots its compiled record set and hands it to [`decide`];
//! no other component ranks or filters records.
//!
//! # Key invariants
//! - Explicit deny overrides allow; no matching record at all is DENY.
//! - The decision is independent of record order, so append order and grant
//!   order can never flip an outcome.
//! - One documented exception to deny-override: a matching ALLOW whose tag
//!   role is Owner outranks matching deny records. Without it the deny-all
//!   record synthesized for a private resource would lock out the creator it
//!   was written alongside. Revoking an owner therefore goes through record
//!   removal, not through a deny rule.
use crate::{CompiledPolicy, Effect, TagRole};

/// Authorization outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

/// Evaluate a request against every record and combine the matching effects.
///
/// Ranking: owner-role ALLOW, then DENY, then ALLOW, then default DENY.
pub fn decide(
    policies: &[CompiledPolicy],
    subject: &str,
    resource_key: &str,
    action: &str,
    context: &str,
) -> Decision {
    let mut any_allow = false;
    let mut any_deny = false;

    for policy in policies {
        if !policy.matches(subject, resource_key, action, context) {
            continue;
        }
        match policy.effect() {
            Effect::Allow if policy.tag().role == TagRole::Owner => return Decision::Allow,
            Effect::Allow => any_allow = true,
            Effect::Deny => any_deny = true,
        }
    }

    if any_deny {
        Decision::Deny
    } else if any_allow {
        Decision::Allow
    } else {
        Decision::Deny
    }
}
