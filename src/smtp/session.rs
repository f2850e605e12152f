use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use native_tls::{HandshakeError, TlsConnector, TlsStream};

use super::error::ProbeError;
use super::types::{ProbeStage, SmtpReply};

// replies longer than this without a line break are treated as garbage
const MAX_LINE: usize = 4096;

enum StreamState {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
    Invalid,
}

/// A line-oriented SMTP stream that can be upgraded to TLS in place.
struct SmtpStream {
    state: StreamState,
    buffer: Vec<u8>,
}

impl SmtpStream {
    fn connect(addr: &SocketAddr, timeout: Duration) -> io::Result<Self> {
        let stream = TcpStream::connect_timeout(addr, timeout)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        Ok(Self {
            state: StreamState::Plain(stream),
            buffer: Vec::new(),
        })
    }

    fn upgrade_tls(
        &mut self,
        host: &str,
        connector: &TlsConnector,
        timeout: Duration,
    ) -> Result<(), ProbeError> {
        let plain = match std::mem::replace(&mut self.state, StreamState::Invalid) {
            StreamState::Plain(stream) => stream,
            StreamState::Tls(stream) => {
                self.state = StreamState::Tls(stream);
                return Ok(());
            }
            StreamState::Invalid => {
                return Err(ProbeError::Protocol("invalid stream state".into()));
            }
        };
        // anything buffered before the handshake belongs to the plaintext session
        self.buffer.clear();

        let tls = match connector.connect(host, plain) {
            Ok(tls) => tls,
            Err(HandshakeError::Failure(source)) => return Err(ProbeError::Tls { source }),
            Err(HandshakeError::WouldBlock(_)) => {
                return Err(ProbeError::Protocol("TLS handshake timed out".into()));
            }
        };
        tls.get_ref()
            .set_read_timeout(Some(timeout))
            .map_err(ProbeError::io)?;
        tls.get_ref()
            .set_write_timeout(Some(timeout))
            .map_err(ProbeError::io)?;
        self.state = StreamState::Tls(Box::new(tls));
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> Result<(), ProbeError> {
        let mut data = line.as_bytes().to_vec();
        data.extend_from_slice(b"\r\n");
        let result = match &mut self.state {
            StreamState::Plain(stream) => stream.write_all(&data).and_then(|()| stream.flush()),
            StreamState::Tls(stream) => stream.write_all(&data).and_then(|()| stream.flush()),
            StreamState::Invalid => {
                return Err(ProbeError::Protocol("invalid stream state".into()));
            }
        };
        result.map_err(ProbeError::io)
    }

    fn read_reply(&mut self) -> Result<SmtpReply, ProbeError> {
        let mut lines = Vec::new();
        let mut code: Option<u16> = None;
        loop {
            let line = self.read_line()?;
            let parsed_code = line
                .get(..3)
                .and_then(|digits| digits.parse::<u16>().ok())
                .ok_or_else(|| ProbeError::Protocol(format!("invalid reply line: {line}")))?;
            match code {
                Some(existing) if existing != parsed_code => {
                    return Err(ProbeError::Protocol(format!(
                        "inconsistent reply codes: {existing} vs {parsed_code}"
                    )));
                }
                Some(_) => {}
                None => code = Some(parsed_code),
            }
            let continued = line.as_bytes().get(3) == Some(&b'-');
            lines.push(line.get(4..).unwrap_or_default().to_string());
            if !continued {
                break;
            }
        }
        Ok(SmtpReply {
            code: code.unwrap_or_default(),
            lines,
        })
    }

    fn read_line(&mut self) -> Result<String, ProbeError> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|byte| *byte == b'\n') {
                let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                return Ok(String::from_utf8_lossy(&line).into_owned());
            }
            if self.buffer.len() > MAX_LINE {
                return Err(ProbeError::Protocol("reply line too long".into()));
            }

            let mut buf = [0u8; 512];
            let read = match &mut self.state {
                StreamState::Plain(stream) => stream.read(&mut buf),
                StreamState::Tls(stream) => stream.read(&mut buf),
                StreamState::Invalid => {
                    return Err(ProbeError::Protocol("invalid stream state".into()));
                }
            };
            let read = read.map_err(ProbeError::io)?;
            if read == 0 {
                return Err(ProbeError::io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed",
                )));
            }
            self.buffer.extend_from_slice(&buf[..read]);
        }
    }
}

/// One SMTP conversation with one exchanger, recording every exchanged line
/// into the caller's transcript.
pub(crate) struct SmtpSession<'t> {
    host: String,
    stream: SmtpStream,
    timeout: Duration,
    transcript: &'t mut Vec<String>,
}

impl<'t> SmtpSession<'t> {
    pub(crate) fn connect(
        host: &str,
        port: u16,
        timeout: Duration,
        transcript: &'t mut Vec<String>,
    ) -> Result<Self, ProbeError> {
        let addrs: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(|source| ProbeError::Resolve {
                host: host.to_string(),
                source,
            })?
            .collect();

        let mut last_err = None;
        for addr in &addrs {
            match SmtpStream::connect(addr, timeout) {
                Ok(stream) => {
                    tracing::debug!(host, %addr, "connected");
                    return Ok(Self {
                        host: host.to_string(),
                        stream,
                        timeout,
                        transcript,
                    });
                }
                Err(err) => last_err = Some(err),
            }
        }
        Err(ProbeError::Connect {
            host: host.to_string(),
            source: last_err.unwrap_or_else(|| {
                io::Error::new(io::ErrorKind::AddrNotAvailable, "no socket address")
            }),
        })
    }

    pub(crate) fn read_greeting(&mut self) -> Result<SmtpReply, ProbeError> {
        let reply = self.stream.read_reply()?;
        self.record_reply(&reply);
        Ok(reply)
    }

    pub(crate) fn send_command(&mut self, command: &str) -> Result<SmtpReply, ProbeError> {
        self.record("C", command);
        self.stream.write_line(command)?;
        let reply = self.stream.read_reply()?;
        self.record_reply(&reply);
        Ok(reply)
    }

    /// EHLO, falling back to HELO when EHLO is refused. Returns the EHLO
    /// reply (capabilities) or `None` when the session fell back to HELO.
    pub(crate) fn hello(&mut self, name: &str) -> Result<Option<SmtpReply>, ProbeError> {
        let ehlo = self.send_command(&format!("EHLO {name}"))?;
        if ehlo.is_positive_completion() {
            return Ok(Some(ehlo));
        }
        let helo = self.send_command(&format!("HELO {name}"))?;
        if helo.is_positive_completion() {
            Ok(None)
        } else {
            Err(ProbeError::unexpected(ProbeStage::Ehlo, helo.code))
        }
    }

    /// Sends STARTTLS and upgrades the stream. Returns `false` when the server
    /// refuses the command; the session then stays in plaintext.
    pub(crate) fn starttls(&mut self, connector: &TlsConnector) -> Result<bool, ProbeError> {
        let reply = self.send_command("STARTTLS")?;
        if !reply.is_positive_completion() {
            return Ok(false);
        }
        self.stream
            .upgrade_tls(&self.host, connector, self.timeout)?;
        self.record("*", "TLS established");
        Ok(true)
    }

    /// QUIT must be answered; a dropped connection is a failure.
    pub(crate) fn quit(&mut self) -> Result<SmtpReply, ProbeError> {
        self.send_command("QUIT")
    }

    fn record(&mut self, direction: &str, message: &str) {
        tracing::trace!(host = %self.host, "{direction}: {message}");
        self.transcript
            .push(format!("[{}] {direction}: {message}", self.host));
    }

    fn record_reply(&mut self, reply: &SmtpReply) {
        if reply.lines.is_empty() {
            self.record("S", &reply.code.to_string());
        } else {
            for line in &reply.lines {
                let entry = format!("{} {}", reply.code, line);
                self.record("S", &entry);
            }
        }
    }
}
