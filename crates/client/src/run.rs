//! Run orchestration: one session, one timestamp, every destination.

use engine::FetchError;
use engine::fetch::{Destination, FetchOptions, fetch_into};
use engine::timestamp::RunTimestamp;
use logging::targets;
use tracing::{info, instrument, warn};
use transport::{ConnectOptions, ConnectionError, RemoteSession, RemoteSource};

use crate::config::PullConfig;
use crate::error::ClientError;
use crate::summary::PullSummary;

/// Run-wide switches set from the command line.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RunOptions {
    keep_going: bool,
}

impl RunOptions {
    /// Abort on the first transfer failure.
    pub const fn new() -> Self {
        Self { keep_going: false }
    }

    /// Record transfer failures and fetch the remaining files.
    #[must_use]
    pub const fn keep_going(mut self, enabled: bool) -> Self {
        self.keep_going = enabled;
        self
    }

    /// Reports whether keep-going mode is on.
    pub const fn keeps_going(&self) -> bool {
        self.keep_going
    }
}

/// Connects over SFTP, serves every destination and disconnects.
#[cfg(feature = "sftp")]
pub fn run_pull(config: &PullConfig, options: &RunOptions) -> Result<PullSummary, ClientError> {
    run_pull_with(config, options, transport::SftpSession::connect)
}

/// Always fails: the binary was built without the `sftp` feature.
#[cfg(not(feature = "sftp"))]
pub fn run_pull(_config: &PullConfig, _options: &RunOptions) -> Result<PullSummary, ClientError> {
    Err(ConnectionError::Unsupported.into())
}

/// Opens a session with `connect`, serves every destination and disconnects.
///
/// The run timestamp is captured once before connecting so that all archive
/// entries of the run share it. The session is released exactly once on
/// every path after a successful connect, including when a destination
/// fails. A failed release is logged and never replaces the run outcome.
#[instrument(skip_all, target = "sftp_pull::run", fields(host = config.connect_options().host()))]
pub fn run_pull_with<S, C>(
    config: &PullConfig,
    options: &RunOptions,
    connect: C,
) -> Result<PullSummary, ClientError>
where
    S: RemoteSession,
    C: FnOnce(&ConnectOptions) -> Result<S, ConnectionError>,
{
    let timestamp = RunTimestamp::now()?;
    info!(target: targets::RUN, timestamp = %timestamp, "run started");

    let mut session = connect(config.connect_options())?;
    let outcome = run_with_source(&mut session, config, &timestamp, options);
    if let Err(error) = session.disconnect() {
        warn!(target: targets::CONNECT, %error, "session did not close cleanly");
    }
    outcome
}

/// Serves every configured destination from `remote`, in configuration order.
///
/// A listing or (outside keep-going mode) transfer failure stops the run;
/// destinations after the failing one are not touched. In keep-going mode
/// the run completes and reports [`ClientError::Partial`] when any file was
/// not fetched.
pub fn run_with_source<R>(
    remote: &mut R,
    config: &PullConfig,
    timestamp: &RunTimestamp,
    options: &RunOptions,
) -> Result<PullSummary, ClientError>
where
    R: RemoteSource + ?Sized,
{
    let fetch_options = FetchOptions::new(config.remote_dir()).keep_going(options.keeps_going());
    let mut summary = PullSummary::new(timestamp.clone());

    for base_dir in config.destinations() {
        let destination = Destination::new(base_dir.clone(), config.archive_dir());
        let report =
            fetch_into(remote, &destination, timestamp, &fetch_options).map_err(|error| match error {
                FetchError::List(source) => ClientError::List {
                    destination: base_dir.clone(),
                    source,
                },
                FetchError::Transfer(source) => ClientError::Transfer {
                    destination: base_dir.clone(),
                    source,
                },
            })?;
        info!(
            target: targets::RUN,
            destination = %base_dir.display(),
            fetched = report.files().len(),
            archived = report.archived_count(),
            bytes = report.total_bytes(),
            "destination served"
        );
        summary.push(report);
    }

    info!(
        target: targets::RUN,
        timestamp = %summary.timestamp(),
        fetched = summary.files_fetched(),
        archived = summary.files_archived(),
        archive_warnings = summary.archive_warnings(),
        bytes = summary.total_bytes(),
        "run finished"
    );

    let failed = summary.transfer_failures();
    if failed > 0 {
        return Err(ClientError::Partial {
            failed,
            listed: summary.files_listed(),
            summary: Box::new(summary),
        });
    }
    Ok(summary)
}
