//! DNS MX resolution with a process-lifetime cache.
//!
//! [`MxResolver`] wraps any [`LookupMx`] source (the system resolver by
//! default) and an [`MxCache`] that may be shared between resolvers and
//! worker threads.

mod cache;
mod error;
mod resolver;
mod types;

pub use cache::{Clock, MxCache, SystemClock};
pub use error::MxError as Error;
pub use resolver::{LookupMx, MxResolver, ResolverOptions, check_mx, check_mx_with, system_resolver};
pub use types::{AbsentReason, MxRecord, MxRecordSet, MxStatus};
