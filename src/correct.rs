//! Dark current correction of a chunk exposure against a master dark.
//!
//! The stage runs five responsibilities in strict order: idempotency gate,
//! geometry match, detector identity match, signal scaling, and subtraction
//! with provenance stamping. The first three are side-effect free, so any
//! failure there leaves the chunk exactly as it was handed in.
//!
//! The master dark is never written. Scaling is applied to a private working
//! copy, which keeps a single master safely shareable (read-only) across
//! concurrent corrections of different chunks. Scaling multiplies the working
//! copy's pixels by the factor and its variance by the factor squared, so the
//! subtraction's additive variance combination yields
//! `var_chunk + k^2 * var_master` overall.

use log::{debug, warn};
use ndarray::NdFloat;
use serde::Serialize;

use crate::error::{DarkCorrectionError, ExposureSide};
use crate::exposure::Exposure;
use crate::metadata::{AMP_ID_KEY, CCD_ID_KEY, EXPTIME_KEY};
use crate::policy::{ChunkKind, DarkPolicy, Policy};

/// Provenance metadata key recording that dark correction has run.
pub const DARK_PROVENANCE_KEY: &str = "ISR_DARKCOR";

/// Marker value written under [`DARK_PROVENANCE_KEY`] on success.
pub const DARK_PROVENANCE_MARKER: &str = "Completed Successfully";

/// Result of the detector identity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IdentityOutcome {
    /// Identifiers were compared and matched.
    Verified {
        /// Granularity the comparison ran at.
        kind: ChunkKind,
        /// The matching identifier value.
        id: i64,
    },
    /// No identity comparison was performed (unrecognized chunk type).
    /// This is a known gap, not a verification.
    Unverified,
}

/// What a successful correction applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CorrectionReport {
    /// Outcome of the detector identity check.
    pub identity: IdentityOutcome,
    /// Ratio of chunk to master exposure time. Applied to the working copy
    /// only when the two exposure times differ.
    pub time_scale: f64,
    /// Calibration scale factor, when configured non-zero.
    pub dark_scale: Option<f64>,
}

impl CorrectionReport {
    /// The total multiplier applied to the master dark before subtraction.
    pub fn effective_scale(&self) -> f64 {
        self.time_scale * self.dark_scale.unwrap_or(1.0)
    }
}

/// Dark current correction configured from a resolved [`DarkPolicy`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DarkCorrection {
    policy: DarkPolicy,
}

impl DarkCorrection {
    /// Create a correction from an already-resolved policy.
    pub fn new(policy: DarkPolicy) -> Self {
        Self { policy }
    }

    /// Resolve the `darkPolicy` subtree of an ISR policy and build a correction.
    pub fn from_policy(isr_policy: &Policy) -> Result<Self, DarkCorrectionError> {
        Ok(Self::new(DarkPolicy::from_policy(isr_policy)?))
    }

    /// The resolved configuration this correction applies.
    pub fn policy(&self) -> &DarkPolicy {
        &self.policy
    }

    /// Correct `chunk` for dark current using `master` as the reference.
    ///
    /// On success the chunk's pixel plane has the scaled master subtracted,
    /// its variance and mask planes carry the combined values, and its
    /// metadata gains the [`DARK_PROVENANCE_KEY`] marker as the final
    /// mutation. On any error before scaling the chunk is untouched.
    pub fn apply<P: NdFloat>(
        &self,
        chunk: &mut Exposure<P>,
        master: &Exposure<P>,
    ) -> Result<CorrectionReport, DarkCorrectionError> {
        // Idempotency gate: dark subtraction is not repeatable, a second
        // application would double-subtract the reference signal.
        if chunk.metadata().contains(DARK_PROVENANCE_KEY) {
            debug!("chunk exposure already dark-corrected, refusing to run again");
            return Err(DarkCorrectionError::AlreadyCorrected);
        }

        // Geometry: exact dimension equality, no partial overlap correction.
        if chunk.size() != master.size() {
            return Err(DarkCorrectionError::DimensionMismatch {
                chunk: chunk.size(),
                master: master.size(),
            });
        }

        let identity = self.check_identity(chunk, master)?;

        let chunk_exptime = chunk
            .metadata()
            .exposure_time()
            .ok_or(DarkCorrectionError::MissingMetadata {
                key: EXPTIME_KEY,
                side: ExposureSide::Chunk,
            })?;
        let master_exptime = master
            .metadata()
            .exposure_time()
            .ok_or(DarkCorrectionError::MissingMetadata {
                key: EXPTIME_KEY,
                side: ExposureSide::Master,
            })?;
        let time_scale = chunk_exptime / master_exptime;

        // Scale a private copy; the shared master stays read-only.
        let mut working = master.clone();
        if chunk_exptime != master_exptime {
            debug!("scaling master dark by exposure time ratio {time_scale}");
            working.scale(time_scale);
        }
        if let Some(dark_scale) = self.policy.dark_scale {
            debug!("scaling master dark by calibration factor {dark_scale}");
            working.scale(dark_scale);
        }

        chunk.subtract(&working);
        chunk
            .metadata_mut()
            .add_property(DARK_PROVENANCE_KEY, DARK_PROVENANCE_MARKER);

        debug!("dark current correction completed successfully");
        Ok(CorrectionReport {
            identity,
            time_scale,
            dark_scale: self.policy.dark_scale,
        })
    }

    /// Verify that chunk and master are derived from the same pixels.
    fn check_identity<P: NdFloat>(
        &self,
        chunk: &Exposure<P>,
        master: &Exposure<P>,
    ) -> Result<IdentityOutcome, DarkCorrectionError> {
        let kind = self.policy.chunk_kind;
        let (key, chunk_id, master_id) = match kind {
            ChunkKind::Amp => (AMP_ID_KEY, chunk.metadata().amp_id(), master.metadata().amp_id()),
            ChunkKind::Ccd => (CCD_ID_KEY, chunk.metadata().ccd_id(), master.metadata().ccd_id()),
            ChunkKind::Unverified => {
                warn!("chunk type is neither amp nor ccd, detector identity left unverified");
                return Ok(IdentityOutcome::Unverified);
            }
        };

        let chunk_id = chunk_id.ok_or(DarkCorrectionError::MissingMetadata {
            key,
            side: ExposureSide::Chunk,
        })?;
        let master_id = master_id.ok_or(DarkCorrectionError::MissingMetadata {
            key,
            side: ExposureSide::Master,
        })?;

        if chunk_id != master_id {
            return Err(DarkCorrectionError::IdentityMismatch {
                kind,
                chunk_id,
                master_id,
            });
        }

        Ok(IdentityOutcome::Verified { kind, id: chunk_id })
    }
}

/// Resolve the dark policy and correct a chunk exposure in one call.
pub fn correct_dark_current<P: NdFloat>(
    chunk: &mut Exposure<P>,
    master: &Exposure<P>,
    isr_policy: &Policy,
) -> Result<CorrectionReport, DarkCorrectionError> {
    DarkCorrection::from_policy(isr_policy)?.apply(chunk, master)
}
