use thiserror::Error;

use super::ProbeStage;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("no mail exchanger to probe")]
    NoHosts,
    #[error("could not resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: std::io::Error,
    },
    #[error("connection to {host} failed: {source}")]
    Connect {
        host: String,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },
    #[error("TLS setup failed: {source}")]
    Tls {
        #[source]
        source: native_tls::Error,
    },
    #[error("{stage} answered {code}")]
    UnexpectedReply { stage: ProbeStage, code: u16 },
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl ProbeError {
    pub(crate) fn io(source: std::io::Error) -> Self {
        Self::Io { source }
    }

    pub(crate) fn unexpected(stage: ProbeStage, code: u16) -> Self {
        Self::UnexpectedReply { stage, code }
    }
}
