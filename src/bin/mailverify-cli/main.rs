use anyhow::{Context, Result};
use mailverify_lib::{Status, VerificationPipeline, VerifierConfig, check_mx_with};

mod args;
mod logging;
mod output;

use args::{Cli, Commands, Format};

// exit codes: 0 all valid, 2 at least one invalid, 1 fatal
const EXIT_INVALID: i32 = 2;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_filter.as_deref())?;
    let config = cli.config();

    let all_valid = match &cli.cmd {
        Commands::Verify {
            email,
            format,
            transcript,
        } => verify(&config, email, *format, *transcript)?,
        Commands::Batch {
            input, out, quiet, ..
        } => batch(&config, input, out.as_deref(), *quiet)?,
        Commands::Mx { domain, format } => mx(&cli, domain, *format)?,
    };

    if !all_valid {
        std::process::exit(EXIT_INVALID);
    }
    Ok(())
}

fn verify(config: &VerifierConfig, email: &str, format: Format, transcript: bool) -> Result<bool> {
    let pipeline = VerificationPipeline::from_config(config).context("building verifier")?;
    let verification = pipeline.verify_detailed(email);

    match format {
        Format::Human => {
            println!("{}", output::human_verification(&verification));
            if transcript {
                for line in &verification.transcript {
                    println!("    {line}");
                }
            }
        }
        Format::Json => println!("{}", output::json(&verification)?),
    }
    Ok(verification.status == Status::Valid)
}

#[cfg(feature = "with-csv")]
fn batch(
    config: &VerifierConfig,
    input: &std::path::Path,
    out: Option<&std::path::Path>,
    quiet: bool,
) -> Result<bool> {
    use mailverify_lib::{AddressTable, BatchRunner};

    // a bad file is reported before any address is verified
    let mut table = AddressTable::from_path(input)?;
    let pipeline = VerificationPipeline::from_config(config).context("building verifier")?;

    let addresses = table.addresses();
    let total = addresses.len();
    let job = BatchRunner::new(&pipeline, config.batch).run(&addresses, |fraction| {
        if !quiet {
            eprintln!("{}", output::progress_line(fraction, total));
        }
    });
    table.apply(&job)?;

    let bytes = table.to_csv_bytes()?;
    match out {
        Some(path) => output::write_all_atomically(path, &bytes)?,
        None => {
            use std::io::Write;
            std::io::stdout()
                .write_all(&bytes)
                .context("writing CSV to stdout")?;
        }
    }
    if !quiet {
        eprintln!(
            "{} valid, {} invalid",
            job.valid_count(),
            job.invalid_count()
        );
    }
    Ok(job.all_valid())
}

#[cfg(not(feature = "with-csv"))]
fn batch(
    _config: &VerifierConfig,
    _input: &std::path::Path,
    _out: Option<&std::path::Path>,
    _quiet: bool,
) -> Result<bool> {
    anyhow::bail!("batch needs the 'with-csv' feature")
}

fn mx(cli: &Cli, domain: &str, format: Format) -> Result<bool> {
    let status = check_mx_with(domain, &cli.resolver_options())
        .with_context(|| format!("resolving MX for {domain}"))?;
    match format {
        Format::Human => println!("{}", output::human_mx(domain, &status)),
        Format::Json => println!("{}", output::json(&status)?),
    }
    Ok(!status.is_absent())
}
