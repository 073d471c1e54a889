//! Policy records and their compiled form.
//!
//! # Purpose
//! Defines the immutable rule tuple (tag, subject, resource, action, context,
//! effect) and the compiled variant that caches the four pattern regexes so
//! evaluation never recompiles.
//!
//! # How it fits
//! The policy store persists plain [`PolicyRecord`] values; the engine
//! compiles each into a [`CompiledPolicy`] once, at write or load time, and
//! evaluates requests against the compiled set.
//!
//! # Key invariants
//! - Every pattern fully matches or the record does not apply: patterns are
//!   compiled wrapped as `^(?:pat)$`, so a prefix match never counts.
//! - Pattern fields never contain the store delimiter (`,`) or a newline;
//!   that is rejected before a record reaches the store.
//! - `.*` denotes "any subject" / "any action" / "no context constraint".
use crate::{AccessTag, AuthzError, AuthzResult};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Outcome a record contributes to the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    pub fn as_str(self) -> &'static str {
        match self {
            Effect::Allow => "allow",
            Effect::Deny => "deny",
        }
    }
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Effect {
    type Err = AuthzError;

    fn from_str(value: &str) -> AuthzResult<Self> {
        match value {
            "allow" => Ok(Effect::Allow),
            "deny" => Ok(Effect::Deny),
            other => Err(AuthzError::InvalidEffect(other.to_string())),
        }
    }
}

/// One immutable policy rule.
///
/// # Example
/// ```rust
/// use warden_authz::{AccessTag, Effect, PolicyRecord, TierLevel};
///
/// let record = PolicyRecord::new(
///     AccessTag::reader(TierLevel::Schema),
///     ".*",
///     "default(\\..*)?$",
///     ".*",
///     ".*",
///     Effect::Allow,
/// );
/// assert_eq!(record.effect, Effect::Allow);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyRecord {
    pub tag: AccessTag,
    pub subject: String,
    pub resource: String,
    pub action: String,
    pub context: String,
    pub effect: Effect,
}

impl PolicyRecord {
    pub fn new(
        tag: AccessTag,
        subject: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
        context: impl Into<String>,
        effect: Effect,
    ) -> Self {
        Self {
            tag,
            subject: subject.into(),
            resource: resource.into(),
            action: action.into(),
            context: context.into(),
            effect,
        }
    }
}

// Compile one pattern field with full-match anchoring.
fn compile_field(name: &str, pattern: &str) -> AuthzResult<Regex> {
    if pattern.contains(',') || pattern.contains('\n') {
        return Err(AuthzError::InvalidPattern(format!(
            "{name} pattern {pattern:?} contains a reserved delimiter"
        )));
    }
    Regex::new(&format!("^(?:{pattern})$"))
        .map_err(|err| AuthzError::InvalidPattern(format!("{name} pattern {pattern:?}: {err}")))
}

/// A policy record plus its four compiled patterns.
///
/// Compilation happens once per record; `matches` is a pure, bounded
/// computation over the cached regexes.
#[derive(Debug, Clone)]
pub struct CompiledPolicy {
    record: PolicyRecord,
    subject: Regex,
    resource: Regex,
    action: Regex,
    context: Regex,
}

impl CompiledPolicy {
    /// Compile a record's pattern fields.
    ///
    /// # Errors
    /// - [`AuthzError::InvalidPattern`] naming the offending field if a
    ///   pattern does not compile or contains the store delimiter.
    pub fn compile(record: PolicyRecord) -> AuthzResult<Self> {
        let subject = compile_field("subject", &record.subject)?;
        let resource = compile_field("resource", &record.resource)?;
        let action = compile_field("action", &record.action)?;
        let context = compile_field("context", &record.context)?;
        Ok(Self {
            record,
            subject,
            resource,
            action,
            context,
        })
    }

    pub fn record(&self) -> &PolicyRecord {
        &self.record
    }

    pub fn effect(&self) -> Effect {
        self.record.effect
    }

    pub fn tag(&self) -> AccessTag {
        self.record.tag
    }

    /// Whether this record applies to the request. All four patterns must
    /// fully match.
    pub fn matches(&self, subject: &str, resource_key: &str, action: &str, context: &str) -> bool {
        self.subject.is_match(subject)
            && self.resource.is_match(resource_key)
            && self.action.is_match(action)
            && self.context.is_match(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TierLevel;

    fn reader_record(resource: &str) -> PolicyRecord {
        PolicyRecord::new(
            AccessTag::reader(TierLevel::Schema),
            ".*",
            resource,
            ".*",
            ".*",
            Effect::Allow,
        )
    }

    #[test]
    fn effect_string_roundtrip() {
        for effect in [Effect::Allow, Effect::Deny] {
            let parsed: Effect = effect.as_str().parse().expect("parse effect");
            assert_eq!(parsed, effect);
        }
        assert!("ALLOW".parse::<Effect>().is_err());
        assert!("maybe".parse::<Effect>().is_err());
    }

    #[test]
    fn matches_is_full_anchored() {
        let compiled = CompiledPolicy::compile(reader_record("ws1\\.catalog1")).expect("compile");
        assert!(compiled.matches("alice", "ws1.catalog1", "GET", ""));
        // Prefix and suffix matches are rejected without an explicit
        // descendant suffix in the pattern.
        assert!(!compiled.matches("alice", "ws1.catalog1.schema1", "GET", ""));
        assert!(!compiled.matches("alice", "xws1.catalog1", "GET", ""));
    }

    #[test]
    fn matches_requires_all_four_fields() {
        let record = PolicyRecord::new(
            AccessTag::writer(TierLevel::Workspace),
            "alice",
            "ws1(\\..*)?$",
            "GET|POST",
            ".*",
            Effect::Allow,
        );
        let compiled = CompiledPolicy::compile(record).expect("compile");
        assert!(compiled.matches("alice", "ws1.job_1", "POST", "{}"));
        assert!(!compiled.matches("bob", "ws1.job_1", "POST", "{}"));
        assert!(!compiled.matches("alice", "ws2.job_1", "POST", "{}"));
        assert!(!compiled.matches("alice", "ws1.job_1", "DELETE", "{}"));
    }

    #[test]
    fn context_pattern_constrains_body() {
        let record = PolicyRecord::new(
            AccessTag::writer(TierLevel::Table),
            "alice",
            "ws1\\.c1\\.s1\\.t1",
            "POST",
            ".*\"dryRun\":true.*",
            Effect::Allow,
        );
        let compiled = CompiledPolicy::compile(record).expect("compile");
        assert!(compiled.matches("alice", "ws1.c1.s1.t1", "POST", "{\"dryRun\":true}"));
        assert!(!compiled.matches("alice", "ws1.c1.s1.t1", "POST", "{\"dryRun\":false}"));
    }

    #[test]
    fn compile_rejects_bad_patterns() {
        let err = CompiledPolicy::compile(reader_record("ws1(")).expect_err("unbalanced paren");
        assert!(matches!(err, AuthzError::InvalidPattern(_)));

        let err = CompiledPolicy::compile(reader_record("a{1,3}")).expect_err("delimiter");
        assert!(matches!(err, AuthzError::InvalidPattern(_)));
    }
}
