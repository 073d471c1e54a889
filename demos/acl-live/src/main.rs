//! # Purpose
//! Demonstrate a full end-to-end hierarchical ACL flow in Warden: creation
//! grants, broad public reads, narrow deny overrides, and durable policies,
//! all against a real file-backed store.
//!
//! # What this demo proves
//! - Resource creation synthesizes owner (and deny-all) records that take
//!   effect immediately.
//! - A broad workspace-wide allow coexists with a later sub-tree deny
//!   regardless of write order.
//! - Policies survive an engine restart byte-for-byte.
//!
//! # High-level flow
//! 1. Open the enforcer on an empty store and verify default deny.
//! 2. `supreme` creates the private bucket `org_1:reports`.
//! 3. `employee` creates the job `default.job_1`.
//! 4. Publish a workspace-wide public read of `default`.
//! 5. Deny everyone on `default.job_1`; its siblings stay readable.
//! 6. Grant `learner` read on the bucket, then deny-write the workspace.
//! 7. Reopen the store and check the same decisions hold.
//!
//! # Notes on determinism
//! - Decisions depend only on the record set, never on write order, so every
//!   step asserts exact ALLOW/DENY outcomes.
use anyhow::{ensure, Context, Result};
use tracing_subscriber::EnvFilter;

use warden_authz::{
    bucket_key, job_key, workspace_key, AccessTag, Decision, Effect, PolicyRecord, TagRole,
    TierLevel,
};
use warden_engine::{Enforcer, EngineConfig};

const ORG_ADMIN: &str = "supreme";
const WORKSPACE_ADMIN: &str = "cto";
const DEVELOPER: &str = "employee";
const INTERN: &str = "learner";

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    run_demo().await
}

async fn run_demo() -> Result<()> {
    println!("== Warden Demo: Hierarchical ACL with Live Policy Mutation ==");

    let dir = tempfile::tempdir().context("create demo store dir")?;
    let path = dir.path().join("policies.csv");
    let enforcer = Enforcer::open(EngineConfig::new(&path)).context("open enforcer")?;

    ensure!(
        !enforcer
            .authorize(INTERN, "default", "GET", "")
            .await
            .is_allowed(),
        "empty store must default-deny"
    );
    println!("STEP 0 empty store default-denies: PASS");

    // Private bucket: the creator keeps access, everyone else is shut out of
    // the whole sub-tree.
    let reports = bucket_key("org_1", "reports")?;
    enforcer
        .on_resource_created(ORG_ADMIN, &reports, true)
        .await
        .context("create private bucket")?;
    ensure!(
        enforcer
            .authorize(ORG_ADMIN, "org_1:reports/q3/summary", "PUT", "")
            .await
            == Decision::Allow,
        "bucket owner must keep write access"
    );
    ensure!(
        enforcer
            .authorize(INTERN, "org_1:reports/q3/summary", "GET", "")
            .await
            == Decision::Deny,
        "private bucket must deny strangers"
    );
    println!("STEP 1 private bucket created by {ORG_ADMIN}: PASS");

    let job_1 = job_key("default", "job_1")?;
    enforcer
        .on_resource_created(DEVELOPER, &job_1, false)
        .await
        .context("create job")?;
    ensure!(
        enforcer.authorize(DEVELOPER, "default.job_1", "POST", "").await == Decision::Allow,
        "job owner must have full access"
    );
    ensure!(
        enforcer.authorize(INTERN, "default.job_1", "GET", "").await == Decision::Deny,
        "job must not be public before the workspace grant"
    );
    println!("STEP 2 job created by {DEVELOPER}: PASS");

    // Workspace-wide public read, the broad grant in front of the narrow
    // deny that follows.
    let default_ws = workspace_key("default")?;
    enforcer
        .add_policy(PolicyRecord::new(
            AccessTag::reader(TierLevel::Schema),
            ".*",
            default_ws.subtree_pattern(),
            ".*",
            ".*",
            Effect::Allow,
        ))
        .await
        .context("publish workspace read")?;
    ensure!(
        enforcer.authorize(INTERN, "default.job_1", "GET", "").await == Decision::Allow,
        "workspace read must reach the job"
    );
    println!("STEP 3 workspace-wide public read: PASS");

    enforcer
        .deny(".*", &job_1, TagRole::DenyAll)
        .await
        .context("deny job_1")?;
    ensure!(
        enforcer
            .authorize(INTERN, "default.job_1.taskA", "GET", "")
            .await
            == Decision::Deny,
        "deny-all must cover job_1 descendants"
    );
    ensure!(
        enforcer.authorize(WORKSPACE_ADMIN, "default.job_2", "GET", "").await == Decision::Allow,
        "sibling jobs must stay readable"
    );
    ensure!(
        enforcer.authorize(DEVELOPER, "default.job_1", "POST", "").await == Decision::Allow,
        "the owner must survive the deny-all"
    );
    println!("STEP 4 narrow deny overrides broad allow: PASS");

    enforcer
        .grant(INTERN, &reports, TagRole::Reader)
        .await
        .context("grant bucket read")?;
    enforcer
        .deny(INTERN, &default_ws, TagRole::DenyWrite)
        .await
        .context("deny workspace writes")?;
    ensure!(
        enforcer
            .authorize(INTERN, "org_1:reports/q3/summary", "GET", "")
            .await
            == Decision::Deny,
        "the private deny-all still outranks a reader grant"
    );
    ensure!(
        enforcer.authorize(INTERN, "default.job_2", "POST", "").await == Decision::Deny,
        "deny-write must block mutation"
    );
    ensure!(
        enforcer.authorize(INTERN, "default.job_2", "GET", "").await == Decision::Allow,
        "deny-write must spare reads"
    );
    println!("STEP 5 collaborator grant and deny-write: PASS");

    enforcer.flush().await.context("flush before reopen")?;
    drop(enforcer);
    let reopened = Enforcer::open(EngineConfig::new(&path)).context("reopen enforcer")?;
    ensure!(
        reopened
            .authorize(INTERN, "default.job_1.taskA", "GET", "")
            .await
            == Decision::Deny,
        "reopened store must keep the deny"
    );
    ensure!(
        reopened
            .authorize(ORG_ADMIN, "org_1:reports/q3/summary", "PUT", "")
            .await
            == Decision::Allow,
        "reopened store must keep the owner grant"
    );
    println!(
        "STEP 6 policies survive restart ({} records): PASS",
        reopened.records().await.len()
    );

    println!("== Demo complete ==");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn acl_live_demo_end_to_end() -> Result<()> {
        tokio::time::timeout(Duration::from_secs(10), run_demo())
            .await
            .context("acl-live demo timeout")?
    }
}
