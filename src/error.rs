//! Error taxonomy for dark current correction.
//!
//! All of these are precondition violations or missing required data, not
//! transient faults: the stage fails fast, performs no retries, and surfaces
//! the failure to the pipeline orchestrator unhandled.

use std::fmt;
use thiserror::Error;

use crate::image_size::ImageSize;
use crate::policy::ChunkKind;

/// Which exposure a metadata lookup failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposureSide {
    /// The chunk exposure under correction.
    Chunk,
    /// The master dark reference exposure.
    Master,
}

impl fmt::Display for ExposureSide {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExposureSide::Chunk => write!(f, "chunk exposure"),
            ExposureSide::Master => write!(f, "master dark exposure"),
        }
    }
}

/// Errors produced by the dark current correction stage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DarkCorrectionError {
    /// The chunk already carries the dark correction provenance marker.
    #[error("dark current correction already applied to this chunk exposure")]
    AlreadyCorrected,

    /// Chunk and master pixel planes differ in size.
    #[error("chunk exposure ({chunk}) and master dark exposure ({master}) are not the same size")]
    DimensionMismatch {
        /// Chunk exposure dimensions.
        chunk: ImageSize,
        /// Master dark exposure dimensions.
        master: ImageSize,
    },

    /// Chunk and master are not derived from the same detector region.
    #[error(
        "chunk exposure and master dark exposure are not derived from the same pixels \
         ({kind} id {chunk_id} vs {master_id})"
    )]
    IdentityMismatch {
        /// Granularity the identifiers were compared at.
        kind: ChunkKind,
        /// Identifier read from the chunk exposure.
        chunk_id: i64,
        /// Identifier read from the master dark exposure.
        master_id: i64,
    },

    /// A required metadata keyword is absent or has the wrong type.
    #[error("could not get {key} from the {side} metadata")]
    MissingMetadata {
        /// The metadata key that was looked up.
        key: &'static str,
        /// Which exposure the lookup failed on.
        side: ExposureSide,
    },

    /// A required configuration key is absent or has the wrong type.
    #[error("missing configuration key: {key}")]
    MissingConfiguration {
        /// The policy key that was looked up.
        key: String,
    },
}
