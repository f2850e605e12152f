use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use mailverify_lib::{
    BatchOptions, DEFAULT_MAIL_FROM, ProbeOptions, ResolverOptions, ValidationMode, VerifierConfig,
};

#[derive(Parser)]
#[command(name = "mailverify-cli", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,

    /// syntax mode
    #[arg(long, global = true, value_enum, default_value_t = Mode::Strict)]
    pub mode: Mode,

    /// MAIL FROM sender used for probes
    #[arg(long = "from", global = true, default_value = DEFAULT_MAIL_FROM)]
    pub mail_from: String,

    /// name announced in EHLO/HELO
    #[arg(long, global = true, default_value = "localhost")]
    pub helo: String,

    /// SMTP port
    #[arg(long, global = true, default_value_t = 25)]
    pub port: u16,

    /// SMTP connect and per-command timeout (ms)
    #[arg(long = "timeout-ms", global = true, default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// exchangers to try when the preferred one is unreachable
    #[arg(long = "max-hosts", global = true, default_value_t = 1)]
    pub max_hosts: usize,

    /// verify exchanger TLS certificates on STARTTLS
    #[arg(long = "verify-certs", global = true)]
    pub verify_certs: bool,

    /// DNS query timeout (ms)
    #[arg(long = "dns-timeout-ms", global = true, default_value_t = 5_000)]
    pub dns_timeout_ms: u64,

    /// expire cached MX answers after this many seconds (default: never)
    #[arg(long = "mx-ttl-secs", global = true)]
    pub mx_ttl_secs: Option<u64>,

    /// tracing filter, overrides MAILVERIFY_LOG
    #[arg(long = "log-filter", global = true)]
    pub log_filter: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// verify one address
    Verify {
        email: String,
        #[arg(long, value_enum, default_value_t = Format::Human)]
        format: Format,
        /// print the SMTP dialogue
        #[arg(long)]
        transcript: bool,
    },
    /// verify the `email` column of a CSV file
    Batch {
        input: PathBuf,
        /// write the annotated CSV here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, default_value_t = 4)]
        workers: usize,
        /// no progress on stderr
        #[arg(long)]
        quiet: bool,
    },
    /// show the MX records of a domain
    Mx {
        domain: String,
        #[arg(long, value_enum, default_value_t = Format::Human)]
        format: Format,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Strict,
    Relaxed,
}

impl From<Mode> for ValidationMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Strict => ValidationMode::Strict,
            Mode::Relaxed => ValidationMode::Relaxed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Human,
    Json,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            timeout: Duration::from_millis(self.dns_timeout_ms),
            cache_ttl: self.mx_ttl_secs.map(Duration::from_secs),
            ..ResolverOptions::default()
        }
    }

    pub fn config(&self) -> VerifierConfig {
        let workers = match &self.cmd {
            Commands::Batch { workers, .. } => *workers,
            _ => BatchOptions::default().workers,
        };
        VerifierConfig {
            mode: self.mode.into(),
            resolver: self.resolver_options(),
            probe: ProbeOptions {
                port: self.port,
                timeout: Duration::from_millis(self.timeout_ms),
                helo_domain: self.helo.clone(),
                mail_from: self.mail_from.clone(),
                max_hosts: self.max_hosts,
                verify_certificates: self.verify_certs,
            },
            batch: BatchOptions {
                workers,
                ..BatchOptions::default()
            },
        }
    }
}
