#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use crate::batch::BatchOptions;
use crate::mx::ResolverOptions;
use crate::smtp::ProbeOptions;
use crate::validator::ValidationMode;

/// Everything needed to build a [`VerificationPipeline`](super::VerificationPipeline)
/// and run batches over it.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(default))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifierConfig {
    pub mode: ValidationMode,
    pub resolver: ResolverOptions,
    pub probe: ProbeOptions,
    pub batch: BatchOptions,
}
