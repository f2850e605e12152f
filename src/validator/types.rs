use std::fmt;

use thiserror::Error;

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationMode {
    #[default]
    Strict,
    Relaxed,
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub ok: bool,
    pub reasons: Vec<String>,
}

/// A syntactically valid address, normalized for the later pipeline stages.
///
/// The local part is NFC-normalized and otherwise kept as typed; the domain is
/// lowercased and kept both in its Unicode and IDNA (ASCII) forms.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress {
    local: String,
    domain: String,
    ascii_domain: String,
}

impl EmailAddress {
    pub(crate) fn new(local: String, domain: String, ascii_domain: String) -> Self {
        Self {
            local,
            domain,
            ascii_domain,
        }
    }

    pub fn local(&self) -> &str {
        &self.local
    }

    /// ASCII form of the domain, the one handed to DNS and SMTP.
    pub fn domain(&self) -> &str {
        &self.ascii_domain
    }

    pub fn unicode_domain(&self) -> &str {
        &self.domain
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.local, self.ascii_domain)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("invalid email address: {}", reasons.join("; "))]
    Invalid { reasons: Vec<String> },
}

impl SyntaxError {
    pub(crate) fn invalid(reasons: Vec<String>) -> Self {
        Self::Invalid { reasons }
    }

    pub fn reasons(&self) -> &[String] {
        match self {
            Self::Invalid { reasons } => reasons,
        }
    }
}
