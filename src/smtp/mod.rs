//! SMTP recipient probing.
//!
//! [`SmtpProber`] runs a minimal dialogue (greeting, EHLO/HELO, opportunistic
//! STARTTLS, MAIL FROM, RCPT TO, QUIT) against the preferred exchanger and
//! reports whether the server accepted the recipient.

mod error;
mod options;
mod probe;
mod session;
mod types;

pub use error::ProbeError;
pub use options::{DEFAULT_MAIL_FROM, ProbeOptions};
pub use probe::{MailboxProbe, SmtpProber};
pub use types::{ProbeOutcome, ProbeReport, ProbeStage, SmtpReply};
