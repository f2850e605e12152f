use std::fmt;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStage {
    Connect,
    Greeting,
    Ehlo,
    StartTls,
    MailFrom,
    RcptTo,
    Quit,
}

impl fmt::Display for ProbeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connect => "connect",
            Self::Greeting => "greeting",
            Self::Ehlo => "EHLO/HELO",
            Self::StartTls => "STARTTLS",
            Self::MailFrom => "MAIL FROM",
            Self::RcptTo => "RCPT TO",
            Self::Quit => "QUIT",
        })
    }
}

/// A raw SMTP reply: status code plus one entry per reply line.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpReply {
    pub code: u16,
    pub lines: Vec<String>,
}

impl SmtpReply {
    pub fn is_positive_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }

    pub fn is_transient_failure(&self) -> bool {
        (400..500).contains(&self.code)
    }

    pub fn is_permanent_failure(&self) -> bool {
        (500..600).contains(&self.code)
    }

    /// 250 accepted, 251 will forward, 252 cannot verify but will accept.
    pub fn accepts_recipient(&self) -> bool {
        matches!(self.code, 250..=252)
    }

    pub fn has_capability(&self, cap: &str) -> bool {
        self.lines.iter().any(|line| {
            line.split_whitespace()
                .next()
                .is_some_and(|token| token.eq_ignore_ascii_case(cap))
        })
    }

    pub fn message(&self) -> String {
        self.lines.join(" ")
    }
}

impl fmt::Display for SmtpReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.message())
    }
}

/// What the probed server said about the recipient.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// RCPT TO answered 250, 251 or 252.
    Accepted { host: String, reply: SmtpReply },
    /// The server answered, but not with acceptance.
    Rejected {
        host: String,
        stage: ProbeStage,
        reply: SmtpReply,
    },
    /// No conclusive answer: DNS, connect, TLS, timeout or protocol failure.
    Unreachable {
        host: Option<String>,
        reason: String,
    },
}

impl ProbeOutcome {
    pub fn exists(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted { host, reply } => write!(f, "accepted by {host} ({reply})"),
            Self::Rejected { host, stage, reply } => {
                write!(f, "{stage} rejected by {host} ({reply})")
            }
            Self::Unreachable {
                host: Some(host),
                reason,
            } => write!(f, "{host} unreachable: {reason}"),
            Self::Unreachable { host: None, reason } => write!(f, "unreachable: {reason}"),
        }
    }
}

/// Final report of a probe: outcome, hosts tried, and the SMTP transcript.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub outcome: ProbeOutcome,
    pub hosts_tried: Vec<String>,
    pub transcript: Vec<String>,
}

impl ProbeReport {
    pub fn new(outcome: ProbeOutcome) -> Self {
        Self {
            outcome,
            hosts_tried: Vec::new(),
            transcript: Vec::new(),
        }
    }

    pub fn exists(&self) -> bool {
        self.outcome.exists()
    }
}
