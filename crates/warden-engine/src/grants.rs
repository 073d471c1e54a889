//! Policy record synthesis for resource creation and programmatic grants.
//!
//! # Purpose
//! Builds the records the enforcer writes when a resource is created (owner
//! grant, optional deny-all) and when access is granted or denied after the
//! fact.
//!
//! # Key invariants
//! - Subject identifiers are regex-escaped; a creator named `a.b` never
//!   matches `aXb`.
//! - Every synthesized resource pattern is the node's sub-tree pattern, so
//!   one record covers the node and all of its descendants.
//! - Deny-write rules constrain only the mutating verbs; reads pass through.
use warden_authz::{AccessTag, AuthzError, AuthzResult, Effect, PolicyRecord, ResourceKey, TagRole};

const ANY: &str = ".*";
const MUTATING_VERBS: &str = "(POST|PUT|PATCH|DELETE)";

/// Owner grant stamped at resource creation: full access to the node and its
/// sub-tree for the creator.
pub fn owner_grant(creator: &str, key: &ResourceKey) -> PolicyRecord {
    PolicyRecord::new(
        AccessTag::owner(key.kind().tier()),
        regex::escape(creator),
        key.subtree_pattern(),
        ANY,
        ANY,
        Effect::Allow,
    )
}

/// Deny-all stamped at private-resource creation: every subject, the whole
/// sub-tree. The owner carve-out in decision combination keeps the creator's
/// own grant effective.
pub fn private_deny(key: &ResourceKey) -> PolicyRecord {
    PolicyRecord::new(
        AccessTag::deny_all(key.kind().tier()),
        ANY,
        key.subtree_pattern(),
        ANY,
        ANY,
        Effect::Deny,
    )
}

/// Collaborator grant over a sub-tree. Writers get every verb; readers only
/// GET.
///
/// # Errors
/// - [`AuthzError::InvalidTag`] if `role` is not `Writer` or `Reader`.
pub fn collaborator_grant(
    subject: &str,
    key: &ResourceKey,
    role: TagRole,
) -> AuthzResult<PolicyRecord> {
    let action = match role {
        TagRole::Writer => ANY,
        TagRole::Reader => "GET",
        other => {
            return Err(AuthzError::InvalidTag(format!(
                "{other:?} is not a collaborator role"
            )))
        }
    };
    Ok(PolicyRecord::new(
        AccessTag::new(key.kind().tier(), role),
        regex::escape(subject),
        key.subtree_pattern(),
        action,
        ANY,
        Effect::Allow,
    ))
}

/// Explicit deny over a sub-tree for whatever the subject pattern matches.
///
/// # Errors
/// - [`AuthzError::InvalidTag`] if `role` is not `DenyAll` or `DenyWrite`.
pub fn deny_rule(
    subject_pattern: &str,
    key: &ResourceKey,
    role: TagRole,
) -> AuthzResult<PolicyRecord> {
    let action = match role {
        TagRole::DenyAll => ANY,
        TagRole::DenyWrite => MUTATING_VERBS,
        other => {
            return Err(AuthzError::InvalidTag(format!(
                "{other:?} is not a deny role"
            )))
        }
    };
    Ok(PolicyRecord::new(
        AccessTag::new(key.kind().tier(), role),
        subject_pattern,
        key.subtree_pattern(),
        action,
        ANY,
        Effect::Deny,
    ))
}
