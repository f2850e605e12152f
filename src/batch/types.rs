#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use crate::pipeline::{Rejection, Status, Verification};

/// One input address with its classification.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub input: String,
    pub status: Status,
    pub rejection: Option<Rejection>,
}

impl BatchEntry {
    pub(crate) fn internal(input: &str, message: String) -> Self {
        Self {
            input: input.to_string(),
            status: Status::Invalid,
            rejection: Some(Rejection::Internal { message }),
        }
    }
}

impl From<Verification> for BatchEntry {
    fn from(verification: Verification) -> Self {
        Self {
            input: verification.input,
            status: verification.status,
            rejection: verification.rejection,
        }
    }
}

/// Results of a batch, in input order.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchJob {
    pub entries: Vec<BatchEntry>,
    pub completed: usize,
}

impl BatchJob {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fraction of addresses verified, 1.0 for a finished (or empty) job.
    pub fn progress(&self) -> f64 {
        if self.entries.is_empty() {
            1.0
        } else {
            self.completed as f64 / self.entries.len() as f64
        }
    }

    pub fn statuses(&self) -> impl Iterator<Item = Status> + '_ {
        self.entries.iter().map(|entry| entry.status)
    }

    pub fn valid_count(&self) -> usize {
        self.statuses().filter(|status| status.is_valid()).count()
    }

    pub fn invalid_count(&self) -> usize {
        self.entries.len() - self.valid_count()
    }

    pub fn all_valid(&self) -> bool {
        self.invalid_count() == 0
    }
}
