//! Logging bootstrap.
//!
//! Diagnostics go through the `log` facade to stderr, so they never mix
//! with the report on stdout. The level comes from `--log-level`, then the
//! `NBCHECK_LOG` environment variable, then defaults to `warn`. Any
//! flexi_logger spec is accepted (e.g. `info,nbcheck::execute=debug`).

use anyhow::Context;
use flexi_logger::{Logger, LoggerHandle};
use log::debug;

pub const LOG_ENV: &str = "NBCHECK_LOG";
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Pick the effective level spec: CLI first, then env, then the default.
pub fn resolve_level(cli: Option<&str>, env: Option<&str>) -> String {
    cli.or(env)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_LOG_LEVEL)
        .to_string()
}

/// Start the stderr logger. Keep the returned handle alive for the run.
pub fn init_logging(cli_level: Option<&str>) -> anyhow::Result<LoggerHandle> {
    let env = std::env::var(LOG_ENV).ok();
    let level = resolve_level(cli_level, env.as_deref());
    let handle = Logger::try_with_str(&level)
        .with_context(|| format!("invalid log level `{level}`"))?
        .log_to_stderr()
        .start()
        .context("failed to start logger")?;
    debug!("logging initialized at `{level}`");
    Ok(handle)
}
