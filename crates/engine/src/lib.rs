#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `engine` implements the local half of `sftp-pull`: moving an existing
//! destination file into the archive directory and then landing the freshly
//! downloaded copy in its place.
//!
//! # Design
//!
//! - [`timestamp::RunTimestamp`] is captured once per run and shared by every
//!   archive entry the run creates.
//! - [`archive::archive_if_present`] relocates the current destination file to
//!   `<archive_dir>/<timestamp>_<name>`. A missing destination is not an
//!   error; every other failure is returned as [`archive::ArchiveError`].
//! - [`fetch::fetch_into`] is the per-destination routine: list the remote
//!   directory, then archive and fetch each entry in listing order. Downloads
//!   land in a hidden temporary file that is renamed over the destination
//!   only once complete.
//!
//! # Invariants
//!
//! - Archiving for a name finishes before that name's download starts.
//! - An existing archive entry is never overwritten.
//! - A failed download never leaves a partial file at the destination path.
//!
//! # Errors
//!
//! [`FetchError`] wraps the fatal listing and transfer failures from the
//! `transport` crate. Archive failures are non-fatal and are collected in the
//! [`fetch::FetchReport`] instead.

pub mod archive;
mod error;
pub mod fetch;
mod temp_guard;
pub mod timestamp;

pub use error::FetchError;
