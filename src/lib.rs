#![forbid(unsafe_code)]
//! mailverify_lib: email deliverability verification without sending mail.
//!
//! An address goes through three gates: syntax ([`validate`]), mail routing
//! ([`MxResolver`], cached), and a single SMTP `RCPT TO` probe
//! ([`SmtpProber`]). [`VerificationPipeline`] chains them for one address and
//! [`BatchRunner`] fans a list out over a worker pool.

pub mod batch;
pub mod mx;
pub mod pipeline;
pub mod smtp;
pub mod validator;

pub use validator::{
    EmailAddress, SyntaxError, ValidationMode, ValidationReport, validate, validate_email,
};

pub use mx::{
    AbsentReason, Clock, Error as MxError, LookupMx, MxCache, MxRecord, MxRecordSet, MxResolver,
    MxStatus, ResolverOptions, SystemClock, check_mx, check_mx_with,
};

pub use smtp::{
    DEFAULT_MAIL_FROM, MailboxProbe, ProbeError, ProbeOptions, ProbeOutcome, ProbeReport,
    ProbeStage, SmtpProber, SmtpReply,
};

pub use pipeline::{
    PipelineError, Rejection, Status, Verification, VerificationPipeline, VerifierConfig,
};

pub use batch::{BatchEntry, BatchJob, BatchOptions, BatchRunner};
#[cfg(feature = "with-csv")]
pub use batch::{AddressTable, BatchInputError, RowStatus};
