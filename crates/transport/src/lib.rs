#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_docs)]

//! # Overview
//!
//! `transport` houses the remote side of `sftp-pull`: a blocking client that
//! enumerates a remote directory and downloads individual files to local
//! paths.
//!
//! # Design
//!
//! - [`RemoteSource`] is the seam the fetch engine is written against. It has
//!   two operations, [`RemoteSource::list_files`] and
//!   [`RemoteSource::download`], so tests can substitute an in-memory server.
//! - [`RemoteSession`] adds the release step, so a run can be driven from
//!   any connector that hands back an open session.
//! - [`SftpSession`] (behind the default `sftp` feature) implements both traits
//!   on top of `russh` and `russh-sftp`. The async SSH stack is driven by a
//!   private current-thread runtime, so every call blocks until complete and
//!   no worker threads are spawned.
//! - [`ConnectOptions`] carries the connection parameters. The password is
//!   held in a zeroizing buffer and never rendered by `Debug`.
//!
//! # Invariants
//!
//! - Listings preserve the order reported by the server and exclude
//!   directories and the `.`/`..` pseudo-entries.
//! - A session is released exactly once: [`RemoteSession::disconnect`] consumes
//!   it, and dropping an open session performs the same release.
//!
//! # Errors
//!
//! Each stage has its own error type: [`ConnectionError`] for session set-up,
//! [`ListError`] for enumeration and [`TransferError`] for downloads. A file
//! that was listed but removed before it could be fetched surfaces as
//! [`TransferError::RemoteMissing`] rather than being skipped.

mod error;
mod options;
mod source;

#[cfg(feature = "sftp")]
mod sftp;

pub use error::{ConnectionError, ListError, TransferError};
pub use options::{ConnectOptions, DEFAULT_PORT, DEFAULT_TIMEOUT};
pub use source::{RemoteSession, RemoteSource, remote_path};

#[cfg(feature = "sftp")]
pub use sftp::SftpSession;
