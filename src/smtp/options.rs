use std::time::Duration;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

/// Sender used in `MAIL FROM` unless configured otherwise.
pub const DEFAULT_MAIL_FROM: &str = "verify@mydomain.com";

/// Configuration knobs for [`SmtpProber`](crate::smtp::SmtpProber).
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOptions {
    pub port: u16,
    /// Applies to the TCP connect and to every command round-trip.
    pub timeout: Duration,
    pub helo_domain: String,
    pub mail_from: String,
    /// How many exchangers may be tried, in preference order. The next one is
    /// only tried when the previous one could not be reached. 1 = top host only.
    pub max_hosts: usize,
    pub verify_certificates: bool,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            port: 25,
            timeout: Duration::from_secs(10),
            helo_domain: "localhost".to_string(),
            mail_from: DEFAULT_MAIL_FROM.to_string(),
            max_hosts: 1,
            verify_certificates: false,
        }
    }
}

impl ProbeOptions {
    pub fn helo_name(&self) -> &str {
        let trimmed = self.helo_domain.trim();
        if trimmed.is_empty() {
            "localhost"
        } else {
            trimmed
        }
    }

    /// `MAIL FROM` argument; an empty sender yields the null reverse-path.
    pub fn envelope(&self) -> String {
        format!("MAIL FROM:<{}>", self.mail_from.trim())
    }
}
