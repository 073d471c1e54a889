//! Canonical resource keys and sub-tree patterns.
//!
//! # Purpose
//! Builds the single string form that identifies a node in the resource
//! hierarchy, plus the pattern that covers the node and everything below it.
//!
//! # How it fits
//! Route layers hand the engine ordered hierarchy segments; the builders here
//! turn them into keys that policy patterns are matched against. The policy
//! synthesizer uses [`ResourceKey::subtree_pattern`] so one record covers a
//! whole sub-tree.
//!
//! # Key invariants
//! - Two separator conventions exist: the colon branch
//!   (`org`, `org:bucket`, `org:bucket/file`) and the dot branch
//!   (`ws`, `ws.catalog`, `ws.catalog.schema`, `ws.catalog.schema.table`).
//! - Keys are case-sensitive and denote exactly one node.
//! - Segments never contain a reserved separator; building is pure and has
//!   no side effects.
//!
//! # Common pitfalls
//! - Concatenating raw strings instead of using these builders drifts from
//!   the pattern format and breaks sub-tree matching.
//! - A sub-tree pattern must come from the node's own kind; the separator
//!   its descendants use depends on the branch.
use crate::{AuthzError, AuthzResult, TierLevel};
use serde::{Deserialize, Serialize};

// Comma is reserved by the policy store line format.
const RESERVED: [char; 4] = [':', '/', '.', ','];

/// Kind of node a key addresses. Decides the separator convention, the
/// expected segment count, and the tier digit stamped on synthesized tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Organization,
    Bucket,
    File,
    Workspace,
    Catalog,
    Job,
    Schema,
    Table,
}

impl ResourceKind {
    pub fn tier(self) -> TierLevel {
        match self {
            ResourceKind::Organization => TierLevel::Organization,
            ResourceKind::Bucket | ResourceKind::Workspace => TierLevel::Workspace,
            ResourceKind::File | ResourceKind::Catalog | ResourceKind::Job => TierLevel::Catalog,
            ResourceKind::Schema => TierLevel::Schema,
            ResourceKind::Table => TierLevel::Table,
        }
    }

    // Separator used between this node's key and its descendants.
    fn child_separator(self) -> char {
        match self {
            ResourceKind::Organization => ':',
            ResourceKind::Bucket | ResourceKind::File => '/',
            ResourceKind::Workspace
            | ResourceKind::Catalog
            | ResourceKind::Job
            | ResourceKind::Schema
            | ResourceKind::Table => '.',
        }
    }

    // (minimum segments, exact arity?) for key building.
    fn arity(self) -> (usize, bool) {
        match self {
            ResourceKind::Organization | ResourceKind::Workspace => (1, true),
            ResourceKind::Bucket | ResourceKind::Catalog | ResourceKind::Job => (2, true),
            // Files sit under a folder path of arbitrary depth.
            ResourceKind::File => (3, false),
            ResourceKind::Schema => (3, true),
            ResourceKind::Table => (4, true),
        }
    }
}

/// Canonical position of one node in the hierarchy.
///
/// # Example
/// ```rust
/// use warden_authz::{ResourceKey, ResourceKind};
///
/// let key = ResourceKey::build(ResourceKind::Table, &["ws1", "catalog1", "schema1", "t1"])
///     .expect("build key");
/// assert_eq!(key.as_str(), "ws1.catalog1.schema1.t1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceKey {
    kind: ResourceKind,
    key: String,
}

impl ResourceKey {
    /// Build the canonical key for `kind` from ordered hierarchy segments.
    ///
    /// # Errors
    /// - [`AuthzError::InvalidSegment`] if the segment list is empty, a
    ///   segment is empty or contains a reserved separator, or the count
    ///   does not fit the kind.
    pub fn build(kind: ResourceKind, segments: &[&str]) -> AuthzResult<Self> {
        let (min, exact) = kind.arity();
        if segments.len() < min || (exact && segments.len() != min) {
            return Err(AuthzError::InvalidSegment(format!(
                "{} segments for {kind:?} key",
                segments.len()
            )));
        }
        for segment in segments {
            if segment.is_empty() {
                return Err(AuthzError::InvalidSegment("empty segment".to_string()));
            }
            if segment.contains(|c| RESERVED.contains(&c)) {
                return Err(AuthzError::InvalidSegment(format!(
                    "segment {segment:?} contains a reserved separator"
                )));
            }
        }

        let key = match kind {
            // Colon branch: organization separator first, slashes below it.
            ResourceKind::Bucket | ResourceKind::File => {
                format!("{}:{}", segments[0], segments[1..].join("/"))
            }
            _ => segments.join("."),
        };
        Ok(Self { kind, key })
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Pattern matching this node and every descendant under it.
    ///
    /// The key is regex-escaped, then the descendant separator plus any
    /// suffix is made optional and the whole pattern is end-anchored, so
    /// `ws1.catalog1` covers `ws1.catalog1.schema1` but not `ws1.catalog10`.
    pub fn subtree_pattern(&self) -> String {
        let sep = regex::escape(&self.kind.child_separator().to_string());
        format!("{}({sep}.*)?$", regex::escape(&self.key))
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key)
    }
}

/// Build the canonical organization key.
pub fn organization_key(organization: &str) -> AuthzResult<ResourceKey> {
    ResourceKey::build(ResourceKind::Organization, &[organization])
}

/// Build the canonical bucket key, `org:bucket`.
pub fn bucket_key(organization: &str, bucket: &str) -> AuthzResult<ResourceKey> {
    ResourceKey::build(ResourceKind::Bucket, &[organization, bucket])
}

/// Build the canonical file key, `org:folder/.../file`.
pub fn file_key(organization: &str, folders: &[&str], file: &str) -> AuthzResult<ResourceKey> {
    let mut segments = Vec::with_capacity(folders.len() + 2);
    segments.push(organization);
    segments.extend_from_slice(folders);
    segments.push(file);
    ResourceKey::build(ResourceKind::File, &segments)
}

/// Build the canonical workspace key.
pub fn workspace_key(workspace: &str) -> AuthzResult<ResourceKey> {
    ResourceKey::build(ResourceKind::Workspace, &[workspace])
}

/// Build the canonical catalog key, `ws.catalog`.
pub fn catalog_key(workspace: &str, catalog: &str) -> AuthzResult<ResourceKey> {
    ResourceKey::build(ResourceKind::Catalog, &[workspace, catalog])
}

/// Build the canonical job key, `ws.job`.
pub fn job_key(workspace: &str, job: &str) -> AuthzResult<ResourceKey> {
    ResourceKey::build(ResourceKind::Job, &[workspace, job])
}

/// Build the canonical schema key, `ws.catalog.schema`.
pub fn schema_key(workspace: &str, catalog: &str, schema: &str) -> AuthzResult<ResourceKey> {
    ResourceKey::build(ResourceKind::Schema, &[workspace, catalog, schema])
}

/// Build the canonical table key, `ws.catalog.schema.table`.
pub fn table_key(
    workspace: &str,
    catalog: &str,
    schema: &str,
    table: &str,
) -> AuthzResult<ResourceKey> {
    ResourceKey::build(ResourceKind::Table, &[workspace, catalog, schema, table])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_builders() {
        assert_eq!(organization_key("org1").expect("org").as_str(), "org1");
        assert_eq!(
            bucket_key("org1", "b1").expect("bucket").as_str(),
            "org1:b1"
        );
        assert_eq!(
            file_key("org1", &["b1"], "file1").expect("file").as_str(),
            "org1:b1/file1"
        );
        assert_eq!(
            file_key("org1", &["b1", "sub"], "file1")
                .expect("nested file")
                .as_str(),
            "org1:b1/sub/file1"
        );
        assert_eq!(workspace_key("ws1").expect("ws").as_str(), "ws1");
        assert_eq!(
            catalog_key("ws1", "catalog1").expect("catalog").as_str(),
            "ws1.catalog1"
        );
        assert_eq!(job_key("ws1", "job_1").expect("job").as_str(), "ws1.job_1");
        assert_eq!(
            schema_key("ws1", "catalog1", "schema1")
                .expect("schema")
                .as_str(),
            "ws1.catalog1.schema1"
        );
        assert_eq!(
            table_key("ws1", "catalog1", "schema1", "t1")
                .expect("table")
                .as_str(),
            "ws1.catalog1.schema1.t1"
        );
    }

    #[test]
    fn build_rejects_bad_segments() {
        let empty: &[&str] = &[];
        assert!(matches!(
            ResourceKey::build(ResourceKind::Organization, empty),
            Err(AuthzError::InvalidSegment(_))
        ));
        assert!(matches!(
            organization_key(""),
            Err(AuthzError::InvalidSegment(_))
        ));
        for bad in ["a:b", "a/b", "a.b", "a,b"] {
            assert!(
                matches!(workspace_key(bad), Err(AuthzError::InvalidSegment(_))),
                "segment {bad:?}"
            );
        }
    }

    #[test]
    fn build_rejects_wrong_arity() {
        assert!(matches!(
            ResourceKey::build(ResourceKind::Table, &["ws1", "c1", "s1"]),
            Err(AuthzError::InvalidSegment(_))
        ));
        assert!(matches!(
            ResourceKey::build(ResourceKind::Bucket, &["org1", "b1", "extra"]),
            Err(AuthzError::InvalidSegment(_))
        ));
        assert!(matches!(
            ResourceKey::build(ResourceKind::File, &["org1", "f1"]),
            Err(AuthzError::InvalidSegment(_))
        ));
    }

    #[test]
    fn subtree_pattern_uses_branch_separator() {
        assert_eq!(
            organization_key("org1").expect("org").subtree_pattern(),
            "org1(:.*)?$"
        );
        assert_eq!(
            bucket_key("org1", "b1").expect("bucket").subtree_pattern(),
            "org1:b1(/.*)?$"
        );
        assert_eq!(
            catalog_key("ws1", "catalog1")
                .expect("catalog")
                .subtree_pattern(),
            "ws1\\.catalog1(\\..*)?$"
        );
    }

    #[test]
    fn display_matches_as_str() {
        let key = schema_key("ws1", "c1", "s1").expect("schema");
        assert_eq!(key.to_string(), key.as_str());
    }
}
