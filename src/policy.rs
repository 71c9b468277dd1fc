//! Hierarchical configuration (policy) lookup for the correction stage.
//!
//! The pipeline hands this stage opaque policy trees; only the `darkPolicy`
//! subtree is consulted. Keys are resolved once at configuration-load time into
//! a [`DarkPolicy`], so the correction itself never branches on raw strings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::DarkCorrectionError;

/// Policy subtree holding dark correction configuration.
pub const DARK_POLICY_KEY: &str = "darkPolicy";

/// Key selecting the detector-identity comparison granularity.
pub const CHUNK_TYPE_KEY: &str = "chunkType";

/// Key holding the optional calibration scale factor.
pub const DARK_SCALE_KEY: &str = "darkScale";

/// A single policy value: a leaf scalar or a nested policy subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PolicyValue {
    /// Integer leaf
    Int(i64),
    /// Floating point leaf
    Double(f64),
    /// String leaf
    Text(String),
    /// Nested subtree
    Subtree(Policy),
}

impl From<i64> for PolicyValue {
    fn from(v: i64) -> Self {
        PolicyValue::Int(v)
    }
}

impl From<f64> for PolicyValue {
    fn from(v: f64) -> Self {
        PolicyValue::Double(v)
    }
}

impl From<&str> for PolicyValue {
    fn from(v: &str) -> Self {
        PolicyValue::Text(v.to_string())
    }
}

impl From<Policy> for PolicyValue {
    fn from(v: Policy) -> Self {
        PolicyValue::Subtree(v)
    }
}

/// Hierarchical string-keyed configuration source.
///
/// Absent keys (or keys of the wrong type) surface as
/// [`DarkCorrectionError::MissingConfiguration`] so callers see exactly which
/// key could not be resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Policy {
    entries: BTreeMap<String, PolicyValue>,
}

impl Policy {
    /// Create an empty policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a policy tree from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Set a key, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<PolicyValue>) {
        self.entries.insert(key.into(), value.into());
    }

    fn get(&self, key: &str) -> Result<&PolicyValue, DarkCorrectionError> {
        self.entries
            .get(key)
            .ok_or_else(|| DarkCorrectionError::MissingConfiguration {
                key: key.to_string(),
            })
    }

    /// Look up a nested policy subtree.
    pub fn get_policy(&self, key: &str) -> Result<&Policy, DarkCorrectionError> {
        match self.get(key)? {
            PolicyValue::Subtree(policy) => Ok(policy),
            _ => Err(DarkCorrectionError::MissingConfiguration {
                key: key.to_string(),
            }),
        }
    }

    /// Look up a string value.
    pub fn get_string(&self, key: &str) -> Result<&str, DarkCorrectionError> {
        match self.get(key)? {
            PolicyValue::Text(s) => Ok(s),
            _ => Err(DarkCorrectionError::MissingConfiguration {
                key: key.to_string(),
            }),
        }
    }

    /// Look up a numeric value. Integer leaves coerce to double.
    pub fn get_double(&self, key: &str) -> Result<f64, DarkCorrectionError> {
        match self.get(key)? {
            PolicyValue::Int(v) => Ok(*v as f64),
            PolicyValue::Double(v) => Ok(*v),
            _ => Err(DarkCorrectionError::MissingConfiguration {
                key: key.to_string(),
            }),
        }
    }
}

/// Granularity at which detector identity is compared.
///
/// Resolved once from the `chunkType` policy string. Raft-level grouping is
/// not implemented upstream; any unrecognized chunk type maps to
/// [`ChunkKind::Unverified`], which skips the identity check and is reported
/// as such rather than passing silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    /// Compare amplifier region identifiers (`AMPID`).
    Amp,
    /// Compare sensor identifiers (`CCDID`).
    Ccd,
    /// No identity comparison performed.
    Unverified,
}

impl ChunkKind {
    /// Dispatch a `chunkType` policy string to a closed variant.
    pub fn from_chunk_type(chunk_type: &str) -> Self {
        match chunk_type {
            "amp" => ChunkKind::Amp,
            "ccd" => ChunkKind::Ccd,
            _ => ChunkKind::Unverified,
        }
    }
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChunkKind::Amp => write!(f, "amp"),
            ChunkKind::Ccd => write!(f, "ccd"),
            ChunkKind::Unverified => write!(f, "unverified"),
        }
    }
}

/// Resolved dark correction configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DarkPolicy {
    /// Detector-identity comparison granularity.
    pub chunk_kind: ChunkKind,
    /// Calibration scale factor. `None` means not applied; a configured value
    /// of zero is treated the same way.
    pub dark_scale: Option<f64>,
}

impl DarkPolicy {
    /// Resolve the `darkPolicy` subtree of an ISR policy.
    ///
    /// The subtree and its `chunkType` key are required. `darkScale` is
    /// optional; absent or zero means no calibration scaling.
    pub fn from_policy(isr_policy: &Policy) -> Result<Self, DarkCorrectionError> {
        let dark_policy = isr_policy.get_policy(DARK_POLICY_KEY)?;
        let chunk_kind = ChunkKind::from_chunk_type(dark_policy.get_string(CHUNK_TYPE_KEY)?);
        let dark_scale = match dark_policy.get_double(DARK_SCALE_KEY) {
            Ok(scale) if scale != 0.0 => Some(scale),
            _ => None,
        };

        Ok(Self {
            chunk_kind,
            dark_scale,
        })
    }
}
