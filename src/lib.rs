//! Dark current correction for detector chunk exposures.
//!
//! One sub-stage of instrument signature removal (ISR): a previously measured
//! master dark exposure is scaled to match a chunk exposure's integration time
//! and calibration factor, then subtracted pixel-wise to remove the thermal
//! noise contribution of the sensor electronics.
//!
//! The correction runs five checks and transformations in strict order:
//!
//! 1. **Idempotency gate** - refuse to correct a chunk twice
//! 2. **Geometry match** - chunk and master must have identical dimensions
//! 3. **Identity match** - chunk and master must come from the same detector region
//! 4. **Signal scaling** - exposure-time ratio and configured dark scale factor
//! 5. **Subtraction and provenance** - pixel subtraction plus a completion marker
//!
//! Failures in steps 1-3 leave the chunk exposure untouched. The master dark
//! exposure is never mutated; scaling happens on a private working copy, so a
//! single master can be shared read-only across concurrent corrections.

pub mod correct;
pub mod error;
pub mod exposure;
pub mod image_size;
pub mod metadata;
pub mod policy;

pub use correct::{
    correct_dark_current, CorrectionReport, DarkCorrection, IdentityOutcome, DARK_PROVENANCE_KEY,
    DARK_PROVENANCE_MARKER,
};
pub use error::{DarkCorrectionError, ExposureSide};
pub use exposure::Exposure;
pub use image_size::ImageSize;
pub use metadata::{Metadata, MetadataValue};
pub use policy::{ChunkKind, DarkPolicy, Policy, PolicyValue};
