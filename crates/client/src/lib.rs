#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `client` runs one pickup: it reads [`PullConfig`] from the environment,
//! captures a single [`RunTimestamp`](engine::timestamp::RunTimestamp),
//! opens the SFTP session and drives the archive-then-fetch routine for every
//! configured destination before releasing the session.
//!
//! # Design
//!
//! - [`run_pull_with`] owns the session lifecycle for any connector returning
//!   a [`RemoteSession`](transport::RemoteSession); [`run_pull`] passes the
//!   SFTP connector. [`run_with_source`] does the per-destination work against
//!   any [`RemoteSource`](transport::RemoteSource), which is how the tests
//!   exercise the full run without a server.
//! - Failures are classified by [`ClientError`], each mapping to an
//!   [`ExitCode`] and rendering to a single [`Message`] line.
//!
//! # Features
//!
//! `sftp` (default) links the SSH transport. Without it [`run_pull`] fails
//! with [`ConnectionError::Unsupported`](transport::ConnectionError::Unsupported).

pub mod config;
mod error;
pub mod exit_code;
pub mod message;
mod run;
mod summary;

pub use config::{ConfigError, PullConfig};
pub use error::ClientError;
pub use exit_code::ExitCode;
pub use message::{Message, Severity};
pub use run::{RunOptions, run_pull, run_pull_with, run_with_source};
pub use summary::{PullSummary, describe_report};
