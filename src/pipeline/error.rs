use thiserror::Error;

use crate::mx::Error as MxError;
use crate::smtp::ProbeError;

/// Failures while building a pipeline. Verifying an address never fails.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("DNS resolver setup failed: {0}")]
    Resolver(#[from] MxError),
    #[error("SMTP prober setup failed: {0}")]
    Prober(#[from] ProbeError),
}
