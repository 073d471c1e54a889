//! Warden authz core: policy records, access tags, resource keys, and the
//! deny-overrides decision engine.
//!
//! # Purpose
//! Centralizes the rule model for a hierarchical namespace ACL: a flat set of
//! pattern records (subject, resource, action, context, effect) that behaves
//! like a multi-level ACL over organizations, buckets, workspaces, catalogs,
//! jobs, files, schemas, and tables.
//!
//! # How it fits
//! Route layers build canonical resource keys with the builders in
//! [`resource`]; the engine compiles stored records once and evaluates
//! requests with [`decide`]. The store and engine crates sit on top of these
//! types.
//!
//! # Key invariants
//! - Patterns fully match or not at all; prefix matches never grant access.
//! - Explicit deny overrides allow, and no match at all is a deny.
//! - Access tags are classification metadata with a fixed numeric encoding;
//!   the owner carve-out in [`decide`] is the only decision they influence.
//!
//! # Examples
//! ```rust
//! use warden_authz::{catalog_key, AccessTag, CompiledPolicy, Effect, PolicyRecord, TierLevel};
//!
//! let key = catalog_key("ws1", "catalog1").expect("key");
//! let record = PolicyRecord::new(
//!     AccessTag::owner(TierLevel::Catalog),
//!     "alice",
//!     key.subtree_pattern(),
//!     ".*",
//!     ".*",
//!     Effect::Allow,
//! );
//! let compiled = CompiledPolicy::compile(record).expect("compile");
//! assert!(compiled.matches("alice", "ws1.catalog1.schema1", "GET", ""));
//! ```
//!
//! # Common pitfalls
//! - Writing resource patterns by hand instead of using
//!   [`ResourceKey::subtree_pattern`] loses the escaping that keeps
//!   `ws1.catalog1` from matching `ws1.catalog10`.
//! - Skipping pattern validation lets malformed rules reach the store, where
//!   they become fatal at the next load.
mod decision;
mod errors;
mod record;
mod resource;
mod tier;

pub use decision::{decide, Decision};
pub use errors::{AuthzError, AuthzResult};
pub use record::{CompiledPolicy, Effect, PolicyRecord};
pub use resource::{
    bucket_key, catalog_key, file_key, job_key, organization_key, schema_key, table_key,
    workspace_key, ResourceKey, ResourceKind,
};
pub use tier::{AccessTag, TagRole, TierLevel};

/// Subject identity as supplied by the external resolver.
///
/// The engine consumes only `subject_id`; callers reject inactive subjects
/// before asking for a decision.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Subject {
    pub subject_id: String,
    pub active: bool,
}

impl Subject {
    pub fn new(subject_id: impl Into<String>, active: bool) -> Self {
        Self {
            subject_id: subject_id.into(),
            active,
        }
    }
}
