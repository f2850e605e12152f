use anyhow::Context;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

pub const FILTER_ENV_VAR: &str = "MAILVERIFY_LOG";
pub const DEFAULT_FILTER: &str = "warn";

/// Installs the stderr subscriber. `--log-filter` wins over the environment.
pub fn init(filter_override: Option<&str>) -> anyhow::Result<()> {
    let env_value = std::env::var(FILTER_ENV_VAR).ok();
    let directives = filter_override
        .or(env_value.as_deref())
        .unwrap_or(DEFAULT_FILTER);
    let env_filter = EnvFilter::try_new(directives)
        .with_context(|| format!("parsing log filter '{directives}'"))?;

    let layer = fmt::layer()
        .with_thread_names(true)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(layer.with_filter(env_filter))
        .try_init()
        .context("installing log subscriber")?;
    Ok(())
}
