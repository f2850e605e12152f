use std::fmt;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use crate::mx::AbsentReason;
use crate::smtp::{ProbeStage, SmtpReply};
use crate::validator::EmailAddress;

/// Terminal classification of one address.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "UPPERCASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Valid,
    Invalid,
}

impl Status {
    pub fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "VALID",
            Self::Invalid => "INVALID",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an address ended up [`Status::Invalid`].
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(tag = "kind", rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    SyntaxInvalid {
        reasons: Vec<String>,
    },
    NoRoute {
        domain: String,
        reason: AbsentReason,
    },
    ProbeRejected {
        host: String,
        stage: ProbeStage,
        reply: SmtpReply,
    },
    ProbeUnreachable {
        host: Option<String>,
        reason: String,
    },
    /// The verification itself failed unexpectedly (for instance a panic
    /// caught by the batch runner).
    Internal {
        message: String,
    },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SyntaxInvalid { reasons } => write!(f, "syntax: {}", reasons.join("; ")),
            Self::NoRoute { domain, reason } => write!(f, "no mail route for {domain}: {reason}"),
            Self::ProbeRejected { host, stage, reply } => {
                write!(f, "{host} rejected {stage}: {reply}")
            }
            Self::ProbeUnreachable {
                host: Some(host),
                reason,
            } => write!(f, "{host} unreachable: {reason}"),
            Self::ProbeUnreachable { host: None, reason } => write!(f, "unreachable: {reason}"),
            Self::Internal { message } => write!(f, "internal error: {message}"),
        }
    }
}

/// Full result of one pipeline run.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub input: String,
    /// Present once the syntax stage passed.
    pub address: Option<EmailAddress>,
    pub status: Status,
    pub rejection: Option<Rejection>,
    /// SMTP dialogue, empty when no probe ran.
    pub transcript: Vec<String>,
}

impl Verification {
    pub(crate) fn valid(input: &str, address: EmailAddress, transcript: Vec<String>) -> Self {
        Self {
            input: input.to_string(),
            address: Some(address),
            status: Status::Valid,
            rejection: None,
            transcript,
        }
    }

    pub(crate) fn invalid(
        input: &str,
        address: Option<EmailAddress>,
        rejection: Rejection,
        transcript: Vec<String>,
    ) -> Self {
        Self {
            input: input.to_string(),
            address,
            status: Status::Invalid,
            rejection: Some(rejection),
            transcript,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status.is_valid()
    }
}
