//! Routing rules.
//!
//! An [`ApiConfig`] is one access rule for a specific method and path of a
//! specific service, scoped to a calling application and its gateway group.
//! Rules are immutable values: an update replaces the whole record.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CoreError, Result};
use crate::ids::GroupId;

/// Stable identity of a routing rule.
pub type ApiId = i64;

/// Whether a routing rule allows or denies the call.
///
/// Encoded on the wire as `1` (allow) or `0` (deny).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RuleAccess {
    /// The application may invoke the API.
    Allow,
    /// The application may not invoke the API.
    Deny,
}

impl TryFrom<u8> for RuleAccess {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Allow),
            0 => Ok(Self::Deny),
            other => Err(format!("access must be 0 or 1, got {other}")),
        }
    }
}

impl From<RuleAccess> for u8 {
    fn from(access: RuleAccess) -> Self {
        match access {
            RuleAccess::Allow => 1,
            RuleAccess::Deny => 0,
        }
    }
}

/// A routing/access rule as published by the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    /// Unique, stable rule id.
    pub id: ApiId,
    /// The calling application this rule applies to.
    pub app: String,
    /// The gateway group the application is routed through.
    pub gateway_group: GroupId,
    /// The backend service id.
    pub service: String,
    /// HTTP method name, matched exactly.
    pub method: String,
    /// Request path, matched exactly.
    pub path: String,
    /// Allow or deny.
    pub access: RuleAccess,
    /// Tombstone flag; a deleted rule is never stored.
    #[serde(rename = "isDeleted", with = "flag", default)]
    pub deleted: bool,
}

impl ApiConfig {
    /// Decode a rule from its JSON wire representation.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Decode` if the payload is not a valid rule.
    pub fn decode(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|source| CoreError::Decode {
            raw: raw.to_string(),
            source,
        })
    }

    /// Encode the rule into its JSON wire representation.
    #[must_use]
    pub fn encode(&self) -> String {
        // A struct of strings and integers always serializes.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Returns `true` if the rule grants access.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.access == RuleAccess::Allow
    }
}

/// `0|1` integer encoding for boolean flags.
mod flag {
    use super::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(serde::de::Error::custom(format!(
                "flag must be 0 or 1, got {other}"
            ))),
        }
    }
}
