#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

/// Worker pool sizing for [`BatchRunner`](super::BatchRunner).
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Number of verification threads. 1 verifies addresses one at a time.
    pub workers: usize,
    /// Capacity of the job queue feeding the workers.
    pub back_pressure: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            workers: 4,
            back_pressure: 64,
        }
    }
}

impl BatchOptions {
    pub fn sequential() -> Self {
        Self {
            workers: 1,
            ..Self::default()
        }
    }

    pub(crate) fn effective_workers(&self, jobs: usize) -> usize {
        self.workers.max(1).min(jobs.max(1))
    }
}
