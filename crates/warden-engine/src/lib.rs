//! Warden enforcer: the single, explicitly-owned policy engine instance.
//!
//! # Purpose and responsibility
//! Owns the policy store and the compiled record snapshot, evaluates
//! authorization requests, and synthesizes the records that resource
//! creation and programmatic grants write.
//!
//! # Where it fits
//! Constructed once at process start from [`EngineConfig`] and passed by
//! reference to every caller; route layers build resource keys with
//! `warden-authz` and ask this component for ALLOW/DENY.
//!
//! # Key invariants and assumptions
//! - Readers evaluate against an immutable snapshot cloned under a brief
//!   read lock; they never wait on persistence I/O.
//! - Writers serialize on the store lock, persist to disk, and only then
//!   swap the published snapshot, so a half-applied mutation is never
//!   observable.
//! - A failed persist rolls the in-memory store back; memory and disk never
//!   diverge.
//!
//! # Security considerations
//! - Every ambiguous path fails closed: no matching record, an inactive
//!   subject, an empty store, all decide DENY.
//! - Malformed patterns are rejected before they reach the store; a stored
//!   record that no longer compiles is a fatal corruption at load, never a
//!   silently skipped rule.
use std::path::Path;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use warden_authz::{
    decide, AuthzError, CompiledPolicy, Decision, PolicyRecord, ResourceKey, Subject, TagRole,
};
use warden_store::{PolicyStore, StoreError};

mod config;
pub mod grants;

pub use config::EngineConfig;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("policy rejected: {0}")]
    Policy(#[from] AuthzError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("config error: {0}")]
    Config(String),
}

/// Policy engine over a file-backed store.
///
/// ```
/// use warden_authz::{workspace_key, Decision};
/// use warden_engine::{Enforcer, EngineConfig};
///
/// let dir = tempfile::tempdir().expect("tempdir");
/// let config = EngineConfig::new(dir.path().join("policies.csv"));
/// let rt = tokio::runtime::Runtime::new().expect("rt");
/// rt.block_on(async {
///     let enforcer = Enforcer::open(config).expect("open");
///     let key = workspace_key("ws1").expect("key");
///     enforcer
///         .on_resource_created("alice", &key, false)
///         .await
///         .expect("create");
///     assert_eq!(
///         enforcer.authorize("alice", "ws1", "GET", "").await,
///         Decision::Allow
///     );
/// });
/// ```
#[derive(Debug)]
pub struct Enforcer {
    // Writer serialization plus the durable record set.
    store: Mutex<PolicyStore>,
    // Read path: cloned per authorize call, swapped whole after mutations.
    snapshot: RwLock<Arc<Vec<CompiledPolicy>>>,
}

impl Enforcer {
    /// Load the store and compile the first snapshot.
    ///
    /// # Errors
    /// - [`StoreError::Corrupt`] if a persisted record cannot be parsed or
    ///   its patterns no longer compile; startup must not proceed.
    pub fn open(config: EngineConfig) -> Result<Self> {
        let store = PolicyStore::load(&config.policy_path)?;
        let compiled = compile_stored(store.records())?;
        info!(
            records = store.len(),
            path = %config.policy_path.display(),
            "policy store loaded"
        );
        Ok(Self {
            store: Mutex::new(store),
            snapshot: RwLock::new(Arc::new(compiled)),
        })
    }

    /// Decide ALLOW or DENY for one request.
    pub async fn authorize(
        &self,
        subject: &str,
        resource_key: &str,
        action: &str,
        context: &str,
    ) -> Decision {
        let snapshot = self.snapshot.read().await.clone();
        let decision = decide(&snapshot, subject, resource_key, action, context);
        debug!(subject, resource = resource_key, action, ?decision, "authorize");
        decision
    }

    /// Decide for a resolved subject; inactive subjects are denied outright.
    pub async fn authorize_subject(
        &self,
        subject: &Subject,
        resource_key: &str,
        action: &str,
        context: &str,
    ) -> Decision {
        if !subject.active {
            return Decision::Deny;
        }
        self.authorize(&subject.subject_id, resource_key, action, context)
            .await
    }

    /// Append records in one logical transaction: validate, persist, then
    /// publish. Nothing is observable until the whole batch is durable.
    ///
    /// # Errors
    /// - [`AuthzError::InvalidPattern`] before any state change.
    /// - [`StoreError::Persistence`] after rolling the append back.
    pub async fn add_policies(&self, records: Vec<PolicyRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let compiled = records
            .iter()
            .cloned()
            .map(CompiledPolicy::compile)
            .collect::<warden_authz::AuthzResult<Vec<_>>>()?;

        let mut store = self.store.lock().await;
        let committed = store.len();
        store.append_all(records);
        if let Err(err) = store.persist() {
            store.truncate(committed);
            return Err(err.into());
        }

        let mut snapshot = self.snapshot.write().await;
        let mut next = Vec::with_capacity(snapshot.len() + compiled.len());
        next.extend(snapshot.iter().cloned());
        next.extend(compiled);
        *snapshot = Arc::new(next);
        info!(total = store.len(), "policy records appended");
        Ok(())
    }

    pub async fn add_policy(&self, record: PolicyRecord) -> Result<()> {
        self.add_policies(vec![record]).await
    }

    /// Synthesize creation-time policies: an owner grant over the new
    /// node's sub-tree, plus a deny-all when the resource is private. The
    /// resource must not come into existence without them, so a persist
    /// failure fails the creation as a whole.
    pub async fn on_resource_created(
        &self,
        creator: &str,
        key: &ResourceKey,
        is_private: bool,
    ) -> Result<()> {
        let mut records = vec![grants::owner_grant(creator, key)];
        if is_private {
            records.push(grants::private_deny(key));
        }
        self.add_policies(records).await?;
        info!(creator, key = key.as_str(), is_private, "creation policies synthesized");
        Ok(())
    }

    /// Programmatic collaborator grant (writer or reader) over a sub-tree.
    pub async fn grant(&self, subject: &str, key: &ResourceKey, role: TagRole) -> Result<()> {
        let record = grants::collaborator_grant(subject, key, role)?;
        self.add_policy(record).await
    }

    /// Programmatic deny (deny-all or deny-write) over a sub-tree.
    pub async fn deny(
        &self,
        subject_pattern: &str,
        key: &ResourceKey,
        role: TagRole,
    ) -> Result<()> {
        let record = grants::deny_rule(subject_pattern, key, role)?;
        self.add_policy(record).await
    }

    /// Remove every record written for this node's sub-tree pattern.
    /// This is how an owner grant is revoked; deny rules do not outrank it.
    pub async fn revoke_node(&self, key: &ResourceKey) -> Result<usize> {
        let pattern = key.subtree_pattern();
        let mut store = self.store.lock().await;
        let before = store.snapshot();
        let removed = store.remove_matching(|record| record.resource == pattern);
        if removed == 0 {
            return Ok(0);
        }
        if let Err(err) = store.persist() {
            store.restore(before);
            return Err(err.into());
        }

        let mut snapshot = self.snapshot.write().await;
        let next: Vec<CompiledPolicy> = snapshot
            .iter()
            .filter(|policy| policy.record().resource != pattern)
            .cloned()
            .collect();
        *snapshot = Arc::new(next);
        info!(removed, key = key.as_str(), "node policies revoked");
        Ok(removed)
    }

    /// Re-persist the current record set. Shutdown hook; every mutation has
    /// already persisted, so this is a safety net.
    pub async fn flush(&self) -> Result<()> {
        let store = self.store.lock().await;
        store.persist()?;
        Ok(())
    }

    /// Owned copy of the stored records, for admin listing.
    pub async fn records(&self) -> Vec<PolicyRecord> {
        self.store.lock().await.snapshot()
    }

    /// Open an enforcer straight from a store path with default settings.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(EngineConfig::new(path.as_ref()))
    }
}

// A stored record that fails to compile is store corruption, not a rule to
// skip: skipping could turn a DENY into an ALLOW.
fn compile_stored(records: &[PolicyRecord]) -> Result<Vec<CompiledPolicy>> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            CompiledPolicy::compile(record.clone()).map_err(|err| {
                EngineError::Store(StoreError::Corrupt {
                    line: index + 1,
                    reason: err.to_string(),
                })
            })
        })
        .collect()
}
