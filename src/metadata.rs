//! Exposure metadata as an ordered, typed property bag.
//!
//! Calibration stages read instrument keywords (exposure time, detector
//! identifiers) from exposure metadata and append provenance markers to it.
//! Lookups are by unique key; insertion order is preserved so metadata can be
//! written back out in the order it was accumulated.

use serde::{Deserialize, Serialize};

/// Metadata key for the exposure integration time in seconds.
pub const EXPTIME_KEY: &str = "EXPTIME";

/// Metadata key for the amplifier region identifier.
pub const AMP_ID_KEY: &str = "AMPID";

/// Metadata key for the sensor (CCD) identifier.
pub const CCD_ID_KEY: &str = "CCDID";

/// A single typed metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetadataValue {
    /// Integer keyword (detector identifiers, counters)
    Int(i64),
    /// Floating point keyword (exposure times, temperatures)
    Float(f64),
    /// String keyword (provenance markers, descriptive fields)
    Text(String),
}

impl MetadataValue {
    /// Read the value as an integer, if it is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetadataValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Read the value numerically. Integer keywords coerce to float, which is
    /// common for time-like keywords written by different instrument software.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Int(v) => Some(*v as f64),
            MetadataValue::Float(v) => Some(*v),
            MetadataValue::Text(_) => None,
        }
    }

    /// Read the value as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for MetadataValue {
    fn from(v: i64) -> Self {
        MetadataValue::Int(v)
    }
}

impl From<f64> for MetadataValue {
    fn from(v: f64) -> Self {
        MetadataValue::Float(v)
    }
}

impl From<&str> for MetadataValue {
    fn from(v: &str) -> Self {
        MetadataValue::Text(v.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(v: String) -> Self {
        MetadataValue::Text(v)
    }
}

/// Ordered key/value metadata attached to an exposure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    entries: Vec<(String, MetadataValue)>,
}

impl Metadata {
    /// Create an empty metadata bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a value by its unique key.
    ///
    /// If the same key was added more than once, the earliest entry wins.
    pub fn find_unique(&self, key: &str) -> Option<&MetadataValue> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v)
    }

    /// Append a property, preserving insertion order.
    pub fn add_property(&mut self, key: impl Into<String>, value: impl Into<MetadataValue>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Whether a key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.find_unique(key).is_some()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bag holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exposure integration time in seconds (`EXPTIME`).
    pub fn exposure_time(&self) -> Option<f64> {
        self.find_unique(EXPTIME_KEY).and_then(MetadataValue::as_f64)
    }

    /// Amplifier region identifier (`AMPID`).
    pub fn amp_id(&self) -> Option<i64> {
        self.find_unique(AMP_ID_KEY).and_then(MetadataValue::as_i64)
    }

    /// Sensor identifier (`CCDID`).
    pub fn ccd_id(&self) -> Option<i64> {
        self.find_unique(CCD_ID_KEY).and_then(MetadataValue::as_i64)
    }
}
