use native_tls::TlsConnector;

use crate::mx::MxRecordSet;
use crate::validator::EmailAddress;

use super::error::ProbeError;
use super::options::ProbeOptions;
use super::session::SmtpSession;
use super::types::{ProbeOutcome, ProbeReport, ProbeStage};

/// Asks a mail exchanger whether it would accept mail for an address.
pub trait MailboxProbe: Send + Sync {
    fn probe(&self, address: &EmailAddress, hosts: &MxRecordSet) -> ProbeReport;
}

/// RCPT probe over a real SMTP connection. Never sends DATA.
pub struct SmtpProber {
    options: ProbeOptions,
    connector: TlsConnector,
}

impl SmtpProber {
    pub fn new(options: ProbeOptions) -> Result<Self, ProbeError> {
        let connector = TlsConnector::builder()
            .danger_accept_invalid_certs(!options.verify_certificates)
            .danger_accept_invalid_hostnames(!options.verify_certificates)
            .build()
            .map_err(|source| ProbeError::Tls { source })?;
        Ok(Self { options, connector })
    }

    pub fn options(&self) -> &ProbeOptions {
        &self.options
    }

    fn probe_host(
        &self,
        host: &str,
        address: &EmailAddress,
        transcript: &mut Vec<String>,
    ) -> ProbeOutcome {
        match self.converse(host, address, transcript) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::debug!(host, error = %err, "probe failed");
                transcript.push(format!("[{host}] ! error: {err}"));
                ProbeOutcome::Unreachable {
                    host: Some(host.to_string()),
                    reason: err.to_string(),
                }
            }
        }
    }

    fn converse(
        &self,
        host: &str,
        address: &EmailAddress,
        transcript: &mut Vec<String>,
    ) -> Result<ProbeOutcome, ProbeError> {
        let options = &self.options;
        let mut session = SmtpSession::connect(host, options.port, options.timeout, transcript)?;

        let greeting = session.read_greeting()?;
        if greeting.code != 220 {
            session.quit().ok();
            return Err(ProbeError::unexpected(ProbeStage::Greeting, greeting.code));
        }

        let helo = options.helo_name();
        let capabilities = session.hello(helo)?;
        if capabilities.is_some_and(|ehlo| ehlo.has_capability("STARTTLS")) {
            if session.starttls(&self.connector)? {
                session.send_command(&format!("EHLO {helo}"))?;
            } else {
                tracing::debug!(host, "STARTTLS refused, continuing in plaintext");
            }
        }

        let mail = session.send_command(&options.envelope())?;
        if !mail.is_positive_completion() {
            session.quit().ok();
            return Ok(ProbeOutcome::Rejected {
                host: host.to_string(),
                stage: ProbeStage::MailFrom,
                reply: mail,
            });
        }

        let rcpt = session.send_command(&format!("RCPT TO:<{address}>"))?;
        session.quit()?;

        if rcpt.accepts_recipient() {
            Ok(ProbeOutcome::Accepted {
                host: host.to_string(),
                reply: rcpt,
            })
        } else {
            Ok(ProbeOutcome::Rejected {
                host: host.to_string(),
                stage: ProbeStage::RcptTo,
                reply: rcpt,
            })
        }
    }
}

impl MailboxProbe for SmtpProber {
    /// Probes the top exchanger. Further exchangers are only tried, up to
    /// `max_hosts`, while the previous ones were unreachable.
    fn probe(&self, address: &EmailAddress, hosts: &MxRecordSet) -> ProbeReport {
        let mut report = ProbeReport::new(ProbeOutcome::Unreachable {
            host: None,
            reason: ProbeError::NoHosts.to_string(),
        });

        for host in hosts.hosts().take(self.options.max_hosts.max(1)) {
            report.hosts_tried.push(host.to_string());
            let outcome = self.probe_host(host, address, &mut report.transcript);
            let unreachable = matches!(outcome, ProbeOutcome::Unreachable { .. });
            report.outcome = outcome;
            if !unreachable {
                break;
            }
        }

        tracing::debug!(%address, outcome = %report.outcome, "probe finished");
        report
    }
}
