//! Error types for remote session set-up, listing and downloads.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failure to establish or release an authenticated remote session.
///
/// Every variant is fatal to a run: without a session no listing is possible.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The host could not be reached or the SSH handshake failed.
    #[error("cannot reach {address}: {detail}")]
    Unreachable {
        /// `host:port` that was dialled.
        address: String,
        /// Description reported by the SSH layer.
        detail: String,
    },

    /// Connecting did not complete within the configured timeout.
    #[error("timed out after {}s connecting to {address}", timeout.as_secs())]
    Timeout {
        /// `host:port` that was dialled.
        address: String,
        /// Timeout that elapsed.
        timeout: Duration,
    },

    /// The server presented a key that does not match the pinned fingerprint.
    #[error("host key for {address} is {actual}, expected {expected}")]
    HostKeyMismatch {
        /// `host:port` that was dialled.
        address: String,
        /// Pinned fingerprint from the configuration.
        expected: String,
        /// Fingerprint offered by the server.
        actual: String,
    },

    /// The server rejected the username/password pair.
    #[error("authentication rejected for user {username} at {address}")]
    AuthenticationRejected {
        /// `host:port` that was dialled.
        address: String,
        /// User that attempted to log in.
        username: String,
    },

    /// The session opened but the `sftp` subsystem could not be started.
    #[error("sftp subsystem unavailable on {address}: {detail}")]
    Subsystem {
        /// `host:port` that was dialled.
        address: String,
        /// Description reported by the SSH or SFTP layer.
        detail: String,
    },

    /// Closing the session failed.
    #[error("failed to close session with {address}: {detail}")]
    Disconnect {
        /// `host:port` of the session being closed.
        address: String,
        /// Description reported by the SSH layer.
        detail: String,
    },

    /// The I/O runtime driving the SSH client could not be started.
    #[error("failed to start I/O runtime: {0}")]
    Runtime(#[source] io::Error),

    /// The binary was built without SFTP support.
    #[error("SFTP support was not compiled in (enable the `sftp` feature)")]
    Unsupported,
}

/// Failure to enumerate the remote directory.
#[derive(Debug, Error)]
#[error("cannot list remote directory {remote_dir}: {detail}")]
pub struct ListError {
    remote_dir: String,
    detail: String,
}

impl ListError {
    /// Creates a listing error for `remote_dir`.
    pub fn new(remote_dir: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            remote_dir: remote_dir.into(),
            detail: detail.into(),
        }
    }

    /// Returns the remote directory that could not be listed.
    pub fn remote_dir(&self) -> &str {
        &self.remote_dir
    }
}

/// Failure to download a single remote file.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The file was listed but no longer exists on the server.
    #[error("remote file {remote_path} vanished before it could be fetched")]
    RemoteMissing {
        /// Remote path that was requested.
        remote_path: String,
    },

    /// The server refused or failed the read.
    #[error("failed to read remote file {remote_path}: {detail}")]
    Remote {
        /// Remote path that was requested.
        remote_path: String,
        /// Description reported by the SFTP layer.
        detail: String,
    },

    /// The local file could not be created or written.
    #[error("failed to write {} (fetching {remote_path}): {source}", local_path.display())]
    Local {
        /// Remote path being fetched.
        remote_path: String,
        /// Local path being written.
        local_path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The byte stream broke off mid-transfer.
    #[error("transfer of {remote_path} to {} interrupted: {source}", local_path.display())]
    Interrupted {
        /// Remote path being fetched.
        remote_path: String,
        /// Local path being written.
        local_path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The remote entry name cannot be used as a local file name.
    #[error("refusing unsafe remote file name {name:?} from {remote_path}")]
    UnsafeName {
        /// Remote path of the entry.
        remote_path: String,
        /// Offending entry name.
        name: String,
    },

    /// The remote entry would land on the local archive directory.
    #[error("refusing {remote_path}: it would replace the archive directory {}", archive_dir.display())]
    ArchiveCollision {
        /// Remote path of the entry.
        remote_path: String,
        /// Archive directory the entry collides with.
        archive_dir: PathBuf,
    },

    /// The session was already closed when the download was requested.
    #[error("session closed before {remote_path} could be fetched")]
    SessionClosed {
        /// Remote path that was requested.
        remote_path: String,
    },
}

impl TransferError {
    /// Returns the remote path involved in the failure.
    pub fn remote_path(&self) -> &str {
        match self {
            Self::RemoteMissing { remote_path }
            | Self::Remote { remote_path, .. }
            | Self::Local { remote_path, .. }
            | Self::Interrupted { remote_path, .. }
            | Self::UnsafeName { remote_path, .. }
            | Self::ArchiveCollision { remote_path, .. }
            | Self::SessionClosed { remote_path } => remote_path,
        }
    }

    /// Reports whether the remote file disappeared between listing and fetch.
    pub const fn is_remote_missing(&self) -> bool {
        matches!(self, Self::RemoteMissing { .. })
    }
}
