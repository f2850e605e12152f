//! Per-address verification: syntax, then MX lookup, then SMTP probe.
//!
//! Each stage gates the next one. An address that fails the syntax check never
//! reaches DNS, and a domain without mail routing is never probed.

mod config;
mod error;
mod types;

pub use config::VerifierConfig;
pub use error::PipelineError;
pub use types::{Rejection, Status, Verification};

use trust_dns_resolver::Resolver;

use crate::mx::{LookupMx, MxResolver, MxStatus};
use crate::smtp::{MailboxProbe, ProbeOutcome, SmtpProber};
use crate::validator::{ValidationMode, validate};

/// The three-stage decision procedure, generic over its DNS and SMTP seams.
pub struct VerificationPipeline<L = Resolver, P = SmtpProber> {
    mode: ValidationMode,
    resolver: MxResolver<L>,
    prober: P,
}

impl VerificationPipeline {
    /// Pipeline backed by the system resolver configuration and a real SMTP
    /// prober.
    pub fn from_config(config: &VerifierConfig) -> Result<Self, PipelineError> {
        let resolver = MxResolver::from_system_conf(&config.resolver)?;
        let prober = SmtpProber::new(config.probe.clone())?;
        Ok(Self::new(config.mode, resolver, prober))
    }
}

impl<L: LookupMx, P: MailboxProbe> VerificationPipeline<L, P> {
    pub fn new(mode: ValidationMode, resolver: MxResolver<L>, prober: P) -> Self {
        Self {
            mode,
            resolver,
            prober,
        }
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    pub fn resolver(&self) -> &MxResolver<L> {
        &self.resolver
    }

    pub fn prober(&self) -> &P {
        &self.prober
    }

    pub fn verify(&self, raw: &str) -> Status {
        self.verify_detailed(raw).status
    }

    pub fn verify_detailed(&self, raw: &str) -> Verification {
        let address = match validate(raw, self.mode) {
            Ok(address) => address,
            Err(err) => {
                tracing::debug!(input = raw, error = %err, "syntax check failed");
                let rejection = Rejection::SyntaxInvalid {
                    reasons: err.reasons().to_vec(),
                };
                return Verification::invalid(raw, None, rejection, Vec::new());
            }
        };

        let hosts = match self.resolver.resolve(address.domain()) {
            MxStatus::Records(hosts) => hosts,
            MxStatus::Absent(reason) => {
                tracing::debug!(%address, %reason, "no mail route");
                let rejection = Rejection::NoRoute {
                    domain: address.domain().to_string(),
                    reason,
                };
                return Verification::invalid(raw, Some(address), rejection, Vec::new());
            }
        };

        let report = self.prober.probe(&address, &hosts);
        match report.outcome {
            ProbeOutcome::Accepted { .. } => {
                Verification::valid(raw, address, report.transcript)
            }
            ProbeOutcome::Rejected { host, stage, reply } => Verification::invalid(
                raw,
                Some(address),
                Rejection::ProbeRejected { host, stage, reply },
                report.transcript,
            ),
            ProbeOutcome::Unreachable { host, reason } => Verification::invalid(
                raw,
                Some(address),
                Rejection::ProbeUnreachable { host, reason },
                report.transcript,
            ),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests;
