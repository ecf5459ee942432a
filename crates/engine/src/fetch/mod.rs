//! Per-destination archive-then-fetch routine.

mod destination;
mod report;

use std::path::Path;

use logging::targets;
use tracing::{debug, info, warn};
use transport::{RemoteSource, TransferError, remote_path};

use crate::archive::{ArchiveOutcome, archive_if_present};
use crate::error::FetchError;
use crate::temp_guard::reserve_tmpfile;
use crate::timestamp::RunTimestamp;

pub use destination::Destination;
pub use report::{FetchReport, FetchedFile};

/// Remote directory and failure policy for [`fetch_into`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FetchOptions {
    remote_dir: String,
    keep_going: bool,
}

impl FetchOptions {
    /// Fetches from `remote_dir`, aborting on the first transfer failure.
    pub fn new(remote_dir: impl Into<String>) -> Self {
        Self {
            remote_dir: remote_dir.into(),
            keep_going: false,
        }
    }

    /// Records transfer failures and continues with the remaining files.
    #[must_use]
    pub const fn keep_going(mut self, enabled: bool) -> Self {
        self.keep_going = enabled;
        self
    }

    /// Returns the remote directory.
    pub fn remote_dir(&self) -> &str {
        &self.remote_dir
    }

    /// Reports whether keep-going mode is on.
    pub const fn keeps_going(&self) -> bool {
        self.keep_going
    }
}

/// Lists the remote directory and lands every entry in `destination`.
///
/// Entries are processed in listing order. For each one the current
/// destination file, if any, is archived first; an archive failure is logged
/// and recorded but the download still happens.
///
/// An entry whose local path is the archive directory itself is never
/// fetched. It is recorded as a transfer failure in every mode and the
/// remaining entries are still served.
pub fn fetch_into<R>(
    remote: &mut R,
    destination: &Destination,
    timestamp: &RunTimestamp,
    options: &FetchOptions,
) -> Result<FetchReport, FetchError>
where
    R: RemoteSource + ?Sized,
{
    let names = remote.list_files(options.remote_dir())?;
    info!(
        target: targets::LIST,
        remote_dir = options.remote_dir(),
        count = names.len(),
        destination = %destination.base_dir().display(),
        "listed remote directory"
    );

    let mut report = FetchReport::new(destination.base_dir(), names.len());
    for name in names {
        let remote_path = remote_path(options.remote_dir(), &name);
        if destination.local_path(&name) == destination.archive_dir() {
            let error = TransferError::ArchiveCollision {
                remote_path,
                archive_dir: destination.archive_dir().to_path_buf(),
            };
            warn!(target: targets::FETCH, %error, "skipping entry");
            report.record_transfer_failure(error);
            continue;
        }
        match fetch_one(remote, destination, timestamp, &name, &remote_path, &mut report) {
            Ok(()) => {}
            Err(error) if options.keeps_going() => {
                warn!(target: targets::FETCH, %remote_path, %error, "transfer failed; continuing");
                report.record_transfer_failure(error);
            }
            Err(error) => return Err(error.into()),
        }
    }

    Ok(report)
}

fn fetch_one<R>(
    remote: &mut R,
    destination: &Destination,
    timestamp: &RunTimestamp,
    name: &str,
    remote_path: &str,
    report: &mut FetchReport,
) -> Result<(), TransferError>
where
    R: RemoteSource + ?Sized,
{
    if !is_plain_file_name(name) {
        return Err(TransferError::UnsafeName {
            remote_path: remote_path.to_owned(),
            name: name.to_owned(),
        });
    }
    let local_path = destination.local_path(name);

    let archived_to = match archive_if_present(&local_path, destination.archive_dir(), timestamp, name) {
        Ok(ArchiveOutcome::Archived { archive_path }) => Some(archive_path),
        Ok(ArchiveOutcome::NothingToArchive) => None,
        Err(warning) => {
            warn!(
                target: targets::ARCHIVE,
                destination = %warning.destination().display(),
                %warning,
                "archive failed; existing file will be overwritten"
            );
            report.record_archive_warning(warning);
            None
        }
    };

    let local_error = |source| TransferError::Local {
        remote_path: remote_path.to_owned(),
        local_path: local_path.clone(),
        source,
    };
    let temp = reserve_tmpfile(&local_path).map_err(local_error)?;
    let bytes = remote.download(remote_path, temp.path())?;
    temp.persist(&local_path).map_err(local_error)?;

    debug!(target: targets::FETCH, %remote_path, local = %local_path.display(), bytes, "fetched");
    report.record_file(FetchedFile::new(
        name.to_owned(),
        local_path,
        bytes,
        archived_to,
    ));
    Ok(())
}

/// Accepts names that stay inside the destination directory.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
        && Path::new(name).file_name().is_some()
}
