//! Run-level failure classification.

use std::path::PathBuf;

use thiserror::Error;
use transport::{ConnectionError, ListError, TransferError};

use crate::config::ConfigError;
use crate::exit_code::ExitCode;
use crate::message::Message;
use crate::summary::PullSummary;

/// A run that did not serve every destination completely.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration was rejected before connecting.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No session could be established.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Listing failed for `destination`; later destinations were not served.
    #[error("{source} (destination {})", destination.display())]
    List {
        /// Destination whose routine was running.
        destination: PathBuf,
        /// Underlying failure.
        #[source]
        source: ListError,
    },

    /// A download failed for `destination` and the run was aborted.
    #[error("{source} (destination {})", destination.display())]
    Transfer {
        /// Destination whose routine was running.
        destination: PathBuf,
        /// Underlying failure.
        #[source]
        source: TransferError,
    },

    /// Keep-going mode finished with some files not fetched.
    #[error("{failed} of {listed} listed files could not be fetched")]
    Partial {
        /// Number of failed transfers.
        failed: usize,
        /// Number of names listed across destinations.
        listed: usize,
        /// What was achieved.
        summary: Box<PullSummary>,
    },

    /// The run timestamp could not be rendered.
    #[error("cannot render run timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

impl ClientError {
    /// Exit code reported for this failure.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) => ExitCode::Config,
            Self::Connection(_) => ExitCode::Connection,
            Self::List { .. } => ExitCode::List,
            Self::Transfer { .. } => ExitCode::Transfer,
            Self::Partial { .. } => ExitCode::PartialTransfer,
            Self::Timestamp(_) => ExitCode::FileIo,
        }
    }

    /// Failure class shown at the start of the diagnostic.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "ConfigError",
            Self::Connection(_) => "ConnectionError",
            Self::List { .. } => "ListError",
            Self::Transfer { .. } => "TransferError",
            Self::Partial { .. } => "PartialTransfer",
            Self::Timestamp(_) => "TimestampError",
        }
    }

    /// Renders the single error line for this failure.
    #[must_use]
    pub fn to_message(&self) -> Message {
        Message::error(self.exit_code(), format!("{}: {self}", self.kind()))
    }

    /// Summary of the work done before a partial failure.
    #[must_use]
    pub fn summary(&self) -> Option<&PullSummary> {
        match self {
            Self::Partial { summary, .. } => Some(&**summary),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_failure_names_remote_dir_and_destination() {
        let error = ClientError::List {
            destination: PathBuf::from("/srv/share"),
            source: ListError::new("/files", "permission denied"),
        };
        assert_eq!(error.exit_code(), ExitCode::List);
        assert_eq!(
            error.to_message().to_string(),
            "sftp-pull error: ListError: cannot list remote directory /files: permission denied \
             (destination /srv/share) (code 4)"
        );
    }

    #[test]
    fn config_failure_maps_to_code_two() {
        let error = ClientError::from(ConfigError::Missing {
            name: "SFTP_PULL_HOST",
        });
        assert_eq!(error.exit_code().as_i32(), 2);
        assert!(error.to_message().to_string().starts_with("sftp-pull error: ConfigError: "));
    }

    #[test]
    fn transfer_failure_names_remote_path() {
        let error = ClientError::Transfer {
            destination: PathBuf::from("/srv/share"),
            source: TransferError::RemoteMissing {
                remote_path: "/files/gone.csv".to_owned(),
            },
        };
        assert_eq!(error.exit_code(), ExitCode::Transfer);
        assert!(error.to_string().contains("/files/gone.csv"));
    }

    #[test]
    fn connection_failures_map_to_code_three() {
        let error = ClientError::from(ConnectionError::AuthenticationRejected {
            address: "files.example:22".to_owned(),
            username: "pickup".to_owned(),
        });
        assert_eq!(error.exit_code(), ExitCode::Connection);
        assert_eq!(error.kind(), "ConnectionError");
    }
}
