#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` turns the command-line verbosity flags into a `tracing`
//! subscriber. Call sites across the workspace use the standard `tracing`
//! macros with one of the [`targets`] below; this crate decides which of those
//! events reach stderr.
//!
//! # Design
//!
//! - [`Verbosity`] is derived from the `-q`/`-v` flags and renders a set of
//!   `EnvFilter` directives: the tool's own targets at the requested level and
//!   the SSH libraries one notch quieter.
//! - [`init_tracing`] installs a `fmt` subscriber writing to stderr. An
//!   override string (the `SFTP_PULL_LOG` variable) replaces the generated
//!   directives entirely.
//!
//! # Errors
//!
//! [`LoggingError`] reports an unparsable override or a second installation
//! attempt. Callers that may initialise more than once (tests driving the CLI
//! repeatedly) can ignore [`LoggingError::AlreadyInitialized`].

mod tracing_bridge;
mod verbosity;

pub use tracing_bridge::{LoggingError, build_filter, init_tracing};
pub use verbosity::Verbosity;

/// `tracing` targets used by the workspace.
pub mod targets {
    /// Session set-up and tear-down.
    pub const CONNECT: &str = "sftp_pull::connect";
    /// Remote directory enumeration.
    pub const LIST: &str = "sftp_pull::list";
    /// Archive moves.
    pub const ARCHIVE: &str = "sftp_pull::archive";
    /// Downloads.
    pub const FETCH: &str = "sftp_pull::fetch";
    /// Run orchestration and summaries.
    pub const RUN: &str = "sftp_pull::run";
    /// Common prefix of every target above.
    pub const ROOT: &str = "sftp_pull";
}
