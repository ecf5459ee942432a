//! crates/logging/src/tracing_bridge.rs
//! Installs the process-wide `tracing` subscriber.

use std::io;

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;

use super::verbosity::Verbosity;

/// Failure to install the subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The override directives could not be parsed.
    #[error("invalid log filter {directives:?}: {source}")]
    InvalidFilter {
        /// Directives as supplied.
        directives: String,
        /// Parser error.
        #[source]
        source: ParseError,
    },

    /// A global subscriber is already installed.
    #[error("a tracing subscriber is already installed")]
    AlreadyInitialized,
}

/// Builds the filter for `verbosity`, or from `override_directives` when given.
pub fn build_filter(
    verbosity: Verbosity,
    override_directives: Option<&str>,
) -> Result<EnvFilter, LoggingError> {
    let directives = override_directives
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map_or_else(|| verbosity.directives(), str::to_owned);

    EnvFilter::try_new(&directives).map_err(|source| LoggingError::InvalidFilter { directives, source })
}

/// Installs a `fmt` subscriber writing to stderr.
///
/// Event targets are only printed from [`Verbosity::Verbose`] upwards, so the
/// default output stays a plain `LEVEL message fields` line.
///
/// # Example
///
/// ```rust,ignore
/// use logging::{Verbosity, init_tracing};
///
/// init_tracing(Verbosity::from_flags(1, false), std::env::var("SFTP_PULL_LOG").ok().as_deref())?;
/// tracing::info!(target: "sftp_pull::fetch", "fetched");
/// ```
pub fn init_tracing(
    verbosity: Verbosity,
    override_directives: Option<&str>,
) -> Result<(), LoggingError> {
    let filter = build_filter(verbosity, override_directives)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(verbosity >= Verbosity::Verbose)
        .without_time()
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)
}
