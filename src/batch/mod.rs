//! Bulk verification over a bounded worker pool.
//!
//! Jobs travel as `(index, address)` pairs on a bounded queue; results come
//! back tagged with their index and land in their slot, so output order never
//! depends on completion order. Progress is only reported from the calling
//! thread.

mod options;
#[cfg(feature = "with-csv")]
mod table;
mod types;

pub use options::BatchOptions;
#[cfg(feature = "with-csv")]
pub use table::{AddressTable, BatchInputError, EMAIL_COLUMN, RowStatus, STATUS_COLUMN};
pub use types::{BatchEntry, BatchJob};

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::thread;

use flume::{Receiver, Sender, TrySendError};

use crate::mx::LookupMx;
use crate::pipeline::VerificationPipeline;
use crate::smtp::MailboxProbe;

type Job<'a> = (usize, &'a str);

/// Runs many addresses through one shared [`VerificationPipeline`].
pub struct BatchRunner<'p, L, P> {
    pipeline: &'p VerificationPipeline<L, P>,
    options: BatchOptions,
}

impl<'p, L: LookupMx, P: MailboxProbe> BatchRunner<'p, L, P> {
    pub fn new(pipeline: &'p VerificationPipeline<L, P>, options: BatchOptions) -> Self {
        Self { pipeline, options }
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Verifies every address and calls `on_progress(completed / total)` once
    /// per address. The last call reports exactly 1.0.
    pub fn run<S, F>(&self, addresses: &[S], mut on_progress: F) -> BatchJob
    where
        S: AsRef<str> + Sync,
        F: FnMut(f64),
    {
        let total = addresses.len();
        if total == 0 {
            return BatchJob::default();
        }
        let workers = self.options.effective_workers(total);
        tracing::info!(total, workers, "batch verification starting");

        let mut slots: Vec<Option<BatchEntry>> = (0..total).map(|_| None).collect();
        let mut completed = 0usize;
        let mut record = |index: usize, entry: BatchEntry| {
            if let Some(slot) = slots.get_mut(index) {
                if slot.replace(entry).is_none() {
                    completed += 1;
                    on_progress(completed as f64 / total as f64);
                }
            }
        };

        thread::scope(|scope| {
            let (job_tx, job_rx) = flume::bounded::<Job<'_>>(self.options.back_pressure.max(1));
            let (result_tx, result_rx) = flume::unbounded::<(usize, BatchEntry)>();

            let mut spawned = 0usize;
            for id in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                let pipeline = self.pipeline;
                let spawn = thread::Builder::new()
                    .name(format!("mailverify-{id}"))
                    .spawn_scoped(scope, move || work(pipeline, job_rx, result_tx));
                match spawn {
                    Ok(_) => spawned += 1,
                    Err(err) => {
                        tracing::warn!(error = %err, "could not spawn verification worker");
                        break;
                    }
                }
            }
            drop(job_rx);
            drop(result_tx);

            if spawned == 0 {
                tracing::warn!("no worker threads, verifying on the calling thread");
                for (index, address) in addresses.iter().enumerate() {
                    record(index, verify_guarded(self.pipeline, address.as_ref()));
                }
                return;
            }

            feed_and_collect(addresses, job_tx, &result_rx, &mut record);
        });

        let entries: Vec<BatchEntry> = slots
            .into_iter()
            .zip(addresses)
            .map(|(slot, address)| {
                slot.unwrap_or_else(|| {
                    tracing::warn!(address = address.as_ref(), "address was never verified");
                    BatchEntry::internal(address.as_ref(), "worker exited early".to_string())
                })
            })
            .collect();
        let job = BatchJob {
            completed: entries.len(),
            entries,
        };
        if completed < total {
            on_progress(1.0);
        }
        tracing::info!(
            total,
            valid = job.valid_count(),
            invalid = job.invalid_count(),
            "batch verification finished"
        );
        job
    }
}

/// Keeps the job queue topped up while draining results, so progress is
/// reported as results arrive rather than after the last job was queued.
fn feed_and_collect<'a, S, R>(
    addresses: &'a [S],
    job_tx: Sender<Job<'a>>,
    result_rx: &Receiver<(usize, BatchEntry)>,
    record: &mut R,
) where
    S: AsRef<str>,
    R: FnMut(usize, BatchEntry),
{
    let mut pending = addresses
        .iter()
        .enumerate()
        .map(|(index, address)| (index, address.as_ref()));
    let mut next = pending.next();
    let mut job_tx = Some(job_tx);

    loop {
        if let (Some(job), Some(tx)) = (next, job_tx.as_ref()) {
            match tx.try_send(job) {
                Ok(()) => {
                    next = pending.next();
                    continue;
                }
                Err(TrySendError::Full(_)) => {}
                Err(TrySendError::Disconnected(_)) => {
                    tracing::warn!("all verification workers exited");
                    next = None;
                }
            }
        }
        if next.is_none() {
            // closing the queue lets idle workers exit
            job_tx = None;
        }

        match result_rx.recv() {
            Ok((index, entry)) => record(index, entry),
            Err(_) => break,
        }
    }
}

fn work<L, P>(
    pipeline: &VerificationPipeline<L, P>,
    jobs: Receiver<Job<'_>>,
    results: Sender<(usize, BatchEntry)>,
) where
    L: LookupMx,
    P: MailboxProbe,
{
    while let Ok((index, address)) = jobs.recv() {
        let entry = verify_guarded(pipeline, address);
        if results.send((index, entry)).is_err() {
            break;
        }
    }
}

/// A panic while verifying one address classifies it INVALID instead of
/// taking the batch down.
fn verify_guarded<L, P>(pipeline: &VerificationPipeline<L, P>, address: &str) -> BatchEntry
where
    L: LookupMx,
    P: MailboxProbe,
{
    match catch_unwind(AssertUnwindSafe(|| pipeline.verify_detailed(address))) {
        Ok(verification) => verification.into(),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::warn!(address, panic = %message, "verification panicked");
            BatchEntry::internal(address, message)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests;
