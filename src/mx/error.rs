use thiserror::Error;
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};
use trust_dns_resolver::proto::op::ResponseCode;

use super::AbsentReason;

#[derive(Debug, Error)]
pub enum MxError {
    #[error("domain is empty")]
    EmptyDomain,
    #[error("domain IDNA conversion failed")]
    IdnaConversion {
        #[source]
        source: idna::Errors,
    },
    #[error("resolver initialization failed: {source}")]
    ResolverInit {
        #[source]
        source: std::io::Error,
    },
    #[error("no MX records found")]
    NoRecords,
    #[error("domain does not exist")]
    NxDomain,
    #[error("no nameservers available")]
    NoNameservers,
    #[error("MX lookup timed out")]
    Timeout,
    #[error("MX lookup failed: {source}")]
    Lookup {
        #[source]
        source: ResolveError,
    },
}

impl MxError {
    pub(crate) fn idna(source: idna::Errors) -> Self {
        Self::IdnaConversion { source }
    }

    pub(crate) fn resolver_init(source: std::io::Error) -> Self {
        Self::ResolverInit { source }
    }

    /// Splits resolver failures into the "no route" family and the rest.
    pub(crate) fn lookup(source: ResolveError) -> Self {
        let mapped = match source.kind() {
            ResolveErrorKind::NoRecordsFound { response_code, .. }
                if *response_code == ResponseCode::NXDomain =>
            {
                Some(Self::NxDomain)
            }
            ResolveErrorKind::NoRecordsFound { .. } => Some(Self::NoRecords),
            ResolveErrorKind::NoConnections => Some(Self::NoNameservers),
            ResolveErrorKind::Timeout => Some(Self::Timeout),
            _ => None,
        };
        mapped.unwrap_or(Self::Lookup { source })
    }

    /// Whether the failure means "the domain has no mail routing" rather than
    /// "the lookup itself broke".
    pub fn is_unroutable(&self) -> bool {
        matches!(self, Self::NoRecords | Self::NxDomain | Self::NoNameservers)
    }

    pub(crate) fn absent_reason(&self) -> AbsentReason {
        match self {
            Self::NoRecords => AbsentReason::NoRecords,
            Self::NxDomain => AbsentReason::NxDomain,
            Self::NoNameservers => AbsentReason::NoNameservers,
            Self::Timeout => AbsentReason::Timeout,
            other => AbsentReason::Failed(other.to_string()),
        }
    }
}
