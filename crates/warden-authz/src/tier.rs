//! Access tags: the tier/role/polarity token stamped on every policy record.
//!
//! # Purpose
//! Encodes which hierarchy level a record was written for and what kind of
//! grant or denial it represents. The tag is classification metadata carried
//! by the record; the match predicate never reads it. The decision engine
//! consults only the owner role, for the carve-out documented on
//! [`crate::decide`].
//!
//! # How it fits
//! The policy synthesizer stamps tags when resources are created, and
//! administrative tooling can select records by tag (for example, revoking
//! everything written for one node).
//!
//! # Key invariants
//! - A tag's meaning is fixed by the numeric encoding table below and never
//!   re-derived from the record's patterns.
//! - Tier digits reflect nesting depth: organization=2, bucket/workspace=3,
//!   file/catalog/job=4, schema=5, table=6.
//! - Deny tags prefix the tier digit with `1` (deny-all ends in 0, deny-write
//!   in 1), so `120` is organization deny-all and `161` is table deny-write.
use crate::{AuthzError, AuthzResult};
use serde::{Deserialize, Serialize};

/// Level in the resource hierarchy a tag applies to.
///
/// Bucket shares the workspace digit; file and job share the catalog digit.
/// The legacy token keeps only the digit, so the distinction between the
/// colon and dot branches lives in the resource key, not in the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierLevel {
    Organization,
    Workspace,
    Catalog,
    Schema,
    Table,
}

impl TierLevel {
    pub fn digit(self) -> char {
        match self {
            TierLevel::Organization => '2',
            TierLevel::Workspace => '3',
            TierLevel::Catalog => '4',
            TierLevel::Schema => '5',
            TierLevel::Table => '6',
        }
    }

    fn from_digit(digit: char) -> Option<Self> {
        match digit {
            '2' => Some(TierLevel::Organization),
            '3' => Some(TierLevel::Workspace),
            '4' => Some(TierLevel::Catalog),
            '5' => Some(TierLevel::Schema),
            '6' => Some(TierLevel::Table),
            _ => None,
        }
    }
}

/// Grant or denial role within a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagRole {
    Owner,
    Writer,
    Reader,
    DenyAll,
    DenyWrite,
}

impl TagRole {
    pub fn is_deny(self) -> bool {
        matches!(self, TagRole::DenyAll | TagRole::DenyWrite)
    }
}

/// Tier/role token carried by every policy record.
///
/// # Example
/// ```rust
/// use warden_authz::{AccessTag, TagRole, TierLevel};
///
/// let tag = AccessTag::new(TierLevel::Schema, TagRole::Reader);
/// assert_eq!(tag.encode(), "52");
/// assert_eq!(AccessTag::decode("52").expect("decode"), tag);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessTag {
    pub tier: TierLevel,
    pub role: TagRole,
}

impl AccessTag {
    pub fn new(tier: TierLevel, role: TagRole) -> Self {
        Self { tier, role }
    }

    pub fn owner(tier: TierLevel) -> Self {
        Self::new(tier, TagRole::Owner)
    }

    pub fn writer(tier: TierLevel) -> Self {
        Self::new(tier, TagRole::Writer)
    }

    pub fn reader(tier: TierLevel) -> Self {
        Self::new(tier, TagRole::Reader)
    }

    pub fn deny_all(tier: TierLevel) -> Self {
        Self::new(tier, TagRole::DenyAll)
    }

    pub fn deny_write(tier: TierLevel) -> Self {
        Self::new(tier, TagRole::DenyWrite)
    }

    /// Render the legacy numeric token used at the store boundary.
    pub fn encode(&self) -> String {
        let tier = self.tier.digit();
        match self.role {
            TagRole::Owner => format!("{tier}0"),
            TagRole::Writer => format!("{tier}1"),
            TagRole::Reader => format!("{tier}2"),
            TagRole::DenyAll => format!("1{tier}0"),
            TagRole::DenyWrite => format!("1{tier}1"),
        }
    }

    /// Parse the legacy numeric token.
    ///
    /// # Errors
    /// - [`AuthzError::InvalidTag`] if the token does not appear in the
    ///   encoding table.
    pub fn decode(token: &str) -> AuthzResult<Self> {
        let invalid = || AuthzError::InvalidTag(token.to_string());
        let mut chars = token.chars();
        let (deny, tier_digit) = match (token.len(), chars.next()) {
            (2, Some(digit)) => (false, digit),
            (3, Some('1')) => (true, chars.next().ok_or_else(invalid)?),
            _ => return Err(invalid()),
        };
        let tier = TierLevel::from_digit(tier_digit).ok_or_else(invalid)?;
        let role = match (deny, chars.next()) {
            (false, Some('0')) => TagRole::Owner,
            (false, Some('1')) => TagRole::Writer,
            (false, Some('2')) => TagRole::Reader,
            (true, Some('0')) => TagRole::DenyAll,
            (true, Some('1')) => TagRole::DenyWrite,
            _ => return Err(invalid()),
        };
        Ok(Self { tier, role })
    }
}

impl std::fmt::Display for AccessTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

impl std::str::FromStr for AccessTag {
    type Err = AuthzError;

    fn from_str(value: &str) -> AuthzResult<Self> {
        Self::decode(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{AccessTag, TagRole, TierLevel};

    const TIERS: [TierLevel; 5] = [
        TierLevel::Organization,
        TierLevel::Workspace,
        TierLevel::Catalog,
        TierLevel::Schema,
        TierLevel::Table,
    ];

    const ROLES: [TagRole; 5] = [
        TagRole::Owner,
        TagRole::Writer,
        TagRole::Reader,
        TagRole::DenyAll,
        TagRole::DenyWrite,
    ];

    #[test]
    fn tag_token_roundtrip() {
        for tier in TIERS {
            for role in ROLES {
                let tag = AccessTag::new(tier, role);
                let token = tag.encode();
                assert_eq!(AccessTag::decode(&token).expect("decode"), tag);
            }
        }
    }

    #[test]
    fn legacy_tokens_decode_to_expected_tags() {
        assert_eq!(
            AccessTag::decode("20").expect("decode"),
            AccessTag::owner(TierLevel::Organization)
        );
        assert_eq!(
            AccessTag::decode("31").expect("decode"),
            AccessTag::writer(TierLevel::Workspace)
        );
        assert_eq!(
            AccessTag::decode("52").expect("decode"),
            AccessTag::reader(TierLevel::Schema)
        );
        assert_eq!(
            AccessTag::decode("140").expect("decode"),
            AccessTag::deny_all(TierLevel::Catalog)
        );
        assert_eq!(
            AccessTag::decode("161").expect("decode"),
            AccessTag::deny_write(TierLevel::Table)
        );
    }

    #[test]
    fn decode_rejects_unknown_tokens() {
        for token in ["", "2", "7", "70", "23", "170", "162", "1200", "ab"] {
            assert!(AccessTag::decode(token).is_err(), "token {token:?}");
        }
    }

    #[test]
    fn deny_roles_are_flagged() {
        assert!(TagRole::DenyAll.is_deny());
        assert!(TagRole::DenyWrite.is_deny());
        assert!(!TagRole::Owner.is_deny());
        assert!(!TagRole::Reader.is_deny());
    }
}
