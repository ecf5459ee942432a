//! Run configuration loaded from `SFTP_PULL_*` environment variables.
//!
//! Credentials never appear in source: host, user and password must be
//! supplied by the environment. [`PullConfig::from_lookup`] takes the lookup as
//! a closure so tests can feed a map instead of mutating the process
//! environment.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use transport::{ConnectOptions, DEFAULT_PORT, DEFAULT_TIMEOUT};
use zeroize::Zeroizing;

/// Names of the environment variables read by [`PullConfig::from_env`].
pub mod vars {
    /// Server host name or address.
    pub const HOST: &str = "SFTP_PULL_HOST";
    /// TCP port.
    pub const PORT: &str = "SFTP_PULL_PORT";
    /// Login user.
    pub const USERNAME: &str = "SFTP_PULL_USERNAME";
    /// Login password.
    pub const PASSWORD: &str = "SFTP_PULL_PASSWORD";
    /// Destination base directories, separated like `PATH`.
    pub const LOCAL_DIRS: &str = "SFTP_PULL_LOCAL_DIRS";
    /// Remote directory to list.
    pub const REMOTE_DIR: &str = "SFTP_PULL_REMOTE_DIR";
    /// Archive subdirectory (relative to each destination) or absolute path.
    pub const ARCHIVE_DIR: &str = "SFTP_PULL_ARCHIVE_DIR";
    /// Pinned `SHA256:` host key fingerprint.
    pub const HOST_KEY: &str = "SFTP_PULL_HOST_KEY";
    /// Connect and inactivity timeout in seconds.
    pub const TIMEOUT: &str = "SFTP_PULL_TIMEOUT";
    /// `tracing` filter directives overriding the verbosity flags.
    pub const LOG: &str = "SFTP_PULL_LOG";
}

/// Remote directory used when [`vars::REMOTE_DIR`] is unset.
pub const DEFAULT_REMOTE_DIR: &str = "/files";

/// Archive subdirectory used when [`vars::ARCHIVE_DIR`] is unset.
pub const DEFAULT_ARCHIVE_DIR: &str = "Archive";

/// A configuration variable is missing or malformed.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// A required variable is unset.
    #[error("required environment variable {name} is not set")]
    Missing {
        /// Variable name.
        name: &'static str,
    },

    /// The value is not valid UTF-8.
    #[error("environment variable {name} is not valid UTF-8")]
    NotUnicode {
        /// Variable name.
        name: &'static str,
    },

    /// The value could not be interpreted.
    #[error("environment variable {name} is invalid: {reason}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// What is wrong with it. Never contains the password.
        reason: String,
    },
}

impl ConfigError {
    /// Returns the offending variable.
    #[must_use]
    pub const fn variable(&self) -> &'static str {
        match self {
            Self::Missing { name } | Self::NotUnicode { name } | Self::Invalid { name, .. } => name,
        }
    }

    fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            name,
            reason: reason.into(),
        }
    }
}

/// Everything a run needs besides the run timestamp.
#[derive(Clone, Debug)]
pub struct PullConfig {
    connect: ConnectOptions,
    remote_dir: String,
    destinations: Vec<PathBuf>,
    archive_dir: PathBuf,
}

impl PullConfig {
    /// Builds a configuration with default remote and archive directories.
    pub fn new(connect: ConnectOptions, destinations: Vec<PathBuf>) -> Self {
        Self {
            connect,
            remote_dir: DEFAULT_REMOTE_DIR.to_owned(),
            destinations,
            archive_dir: PathBuf::from(DEFAULT_ARCHIVE_DIR),
        }
    }

    /// Overrides the remote directory.
    #[must_use]
    pub fn with_remote_dir(mut self, remote_dir: impl Into<String>) -> Self {
        self.remote_dir = remote_dir.into();
        self
    }

    /// Overrides the archive directory.
    #[must_use]
    pub fn with_archive_dir(mut self, archive_dir: impl Into<PathBuf>) -> Self {
        self.archive_dir = archive_dir.into();
        self
    }

    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var_os(name))
    }

    /// Reads the configuration through `lookup`.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let reader = Reader { lookup };

        let host = reader.required(vars::HOST)?;
        let username = reader.required(vars::USERNAME)?;
        let password = Zeroizing::new(reader.required_secret(vars::PASSWORD)?);
        let port = reader.text(vars::PORT)?.map_or(Ok(DEFAULT_PORT), |value| parse_port(&value))?;
        let timeout = reader
            .text(vars::TIMEOUT)?
            .map_or(Ok(DEFAULT_TIMEOUT), |value| parse_timeout(&value))?;
        let host_key = reader.text(vars::HOST_KEY)?;

        let destinations = parse_destinations(reader.raw(vars::LOCAL_DIRS))?;
        let remote_dir = reader
            .text(vars::REMOTE_DIR)?
            .unwrap_or_else(|| DEFAULT_REMOTE_DIR.to_owned());
        let archive_dir = reader
            .raw(vars::ARCHIVE_DIR)
            .map_or_else(|| PathBuf::from(DEFAULT_ARCHIVE_DIR), PathBuf::from);

        let connect = ConnectOptions::new(host, username, password.as_str())
            .with_port(port)
            .with_timeout(timeout)
            .with_host_key_fingerprint(host_key);

        Ok(Self::new(connect, destinations)
            .with_remote_dir(remote_dir)
            .with_archive_dir(archive_dir))
    }

    /// Returns the session parameters.
    pub const fn connect_options(&self) -> &ConnectOptions {
        &self.connect
    }

    /// Returns the remote directory.
    pub fn remote_dir(&self) -> &str {
        &self.remote_dir
    }

    /// Returns the destination base directories in configuration order.
    pub fn destinations(&self) -> &[PathBuf] {
        &self.destinations
    }

    /// Returns the archive directory as configured.
    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }
}

struct Reader<F> {
    lookup: F,
}

impl<F> Reader<F>
where
    F: Fn(&str) -> Option<OsString>,
{
    fn raw(&self, name: &'static str) -> Option<OsString> {
        (self.lookup)(name).filter(|value| !value.is_empty())
    }

    fn text(&self, name: &'static str) -> Result<Option<String>, ConfigError> {
        self.raw(name)
            .map(|value| value.into_string().map_err(|_| ConfigError::NotUnicode { name }))
            .transpose()
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.text(name)?.ok_or(ConfigError::Missing { name })
    }

    // Unlike `required`, an empty password is passed through as given.
    fn required_secret(&self, name: &'static str) -> Result<String, ConfigError> {
        (self.lookup)(name)
            .ok_or(ConfigError::Missing { name })?
            .into_string()
            .map_err(|_| ConfigError::NotUnicode { name })
    }
}

fn parse_port(value: &str) -> Result<u16, ConfigError> {
    match value.trim().parse::<u16>() {
        Ok(0) => Err(ConfigError::invalid(vars::PORT, "port must be between 1 and 65535")),
        Ok(port) => Ok(port),
        Err(error) => Err(ConfigError::invalid(vars::PORT, format!("{value:?}: {error}"))),
    }
}

fn parse_timeout(value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::invalid(vars::TIMEOUT, "timeout must be at least one second")),
        Ok(seconds) => Ok(Duration::from_secs(seconds)),
        Err(error) => Err(ConfigError::invalid(vars::TIMEOUT, format!("{value:?}: {error}"))),
    }
}

fn parse_destinations(value: Option<OsString>) -> Result<Vec<PathBuf>, ConfigError> {
    let value = value.ok_or(ConfigError::Missing {
        name: vars::LOCAL_DIRS,
    })?;
    let destinations: Vec<PathBuf> = env::split_paths(&value)
        .filter(|path| !path.as_os_str().is_empty())
        .collect();
    if destinations.is_empty() {
        return Err(ConfigError::invalid(vars::LOCAL_DIRS, "no destination directory given"));
    }
    Ok(destinations)
}
