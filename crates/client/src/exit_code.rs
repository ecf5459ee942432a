//! Process exit codes reported by `sftp-pull`.
//!
//! Each fatal error class of a run maps to one code so that schedulers can
//! tell a refused login from an unreadable remote directory without parsing
//! stderr.
//!
//! # Examples
//!
//! ```
//! use client::exit_code::ExitCode;
//!
//! assert_eq!(ExitCode::Connection.as_i32(), 3);
//! assert_eq!(ExitCode::PartialTransfer.description(), "partial transfer");
//! ```

use std::fmt;

/// Exit codes returned by a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ExitCode {
    /// Every destination was served.
    Ok = 0,

    /// Invalid command-line arguments.
    Syntax = 1,

    /// Missing or malformed configuration variable.
    Config = 2,

    /// The SFTP session could not be established.
    ///
    /// Covers unreachable hosts, rejected host keys, refused credentials and
    /// a server without the `sftp` subsystem.
    Connection = 3,

    /// The remote directory could not be listed.
    List = 4,

    /// A download failed and the run was aborted.
    Transfer = 5,

    /// Local failure outside a transfer.
    FileIo = 11,

    /// Keep-going mode finished with some files not fetched.
    PartialTransfer = 23,
}

impl ExitCode {
    /// Returns the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Returns a human-readable description of this exit code.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Ok => "success",
            Self::Syntax => "syntax or usage error",
            Self::Config => "configuration error",
            Self::Connection => "error establishing SFTP session",
            Self::List => "error listing remote directory",
            Self::Transfer => "error transferring file",
            Self::FileIo => "error in file IO",
            Self::PartialTransfer => "partial transfer",
        }
    }

    /// Creates an exit code from an i32 value.
    ///
    /// Returns `None` if the value doesn't correspond to a known exit code.
    #[must_use]
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Ok),
            1 => Some(Self::Syntax),
            2 => Some(Self::Config),
            3 => Some(Self::Connection),
            4 => Some(Self::List),
            5 => Some(Self::Transfer),
            11 => Some(Self::FileIo),
            23 => Some(Self::PartialTransfer),
            _ => None,
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        // Every variant fits in a u8.
        let value = u8::try_from(code.as_i32()).unwrap_or(u8::MAX);
        Self::from(value)
    }
}
