//! Archive-before-overwrite for destination files.
//!
//! Before a fetched file lands, whatever currently occupies its destination
//! path is moved to `<archive_dir>/<timestamp>_<name>`, with `<name>`
//! shortened when the entry would not fit in one path component. A destination that
//! does not exist yet is the normal first-run case and is not an error.
//! Every other failure is reported to the caller, which decides whether the
//! fetch should still proceed.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use logging::targets;
use thiserror::Error;
use tracing::{debug, info};

use crate::temp_guard::{NAME_MAX, truncate_to_fit};
use crate::timestamp::RunTimestamp;

/// Upper bound on `.N` suffixes tried when an archive name is already taken.
const MAX_ARCHIVE_SUFFIX: u32 = 999;

/// Bytes kept free for the longest `.N` suffix.
const SUFFIX_RESERVE: usize = ".999".len();

/// Result of an archive attempt.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ArchiveOutcome {
    /// The destination existed and was moved to `archive_path`.
    Archived {
        /// Location of the new archive entry.
        archive_path: PathBuf,
    },
    /// There was no destination file; nothing was moved.
    NothingToArchive,
}

impl ArchiveOutcome {
    /// Returns the archive entry path when something was archived.
    pub fn archive_path(&self) -> Option<&Path> {
        match self {
            Self::Archived { archive_path } => Some(archive_path),
            Self::NothingToArchive => None,
        }
    }
}

/// A destination file existed but could not be moved into the archive.
#[derive(Debug, Error)]
#[error("failed to {operation} while archiving {} to {}: {source}", destination.display(), archive_path.display())]
pub struct ArchiveError {
    operation: &'static str,
    destination: PathBuf,
    archive_path: PathBuf,
    #[source]
    source: io::Error,
}

impl ArchiveError {
    fn new(operation: &'static str, destination: &Path, archive_path: &Path, source: io::Error) -> Self {
        Self {
            operation,
            destination: destination.to_path_buf(),
            archive_path: archive_path.to_path_buf(),
            source,
        }
    }

    /// Returns the destination file that was left in place.
    pub fn destination(&self) -> &Path {
        &self.destination
    }
}

/// Computes `<archive_dir>/<timestamp>_<file_name>`.
///
/// `file_name` is cut on a character boundary so that the entry, including
/// any `.N` suffix, stays within `NAME_MAX` bytes.
pub fn archive_path_for(archive_dir: &Path, timestamp: &RunTimestamp, file_name: &str) -> PathBuf {
    let stamp = timestamp.as_str();
    let budget = NAME_MAX.saturating_sub(stamp.len() + 1 + SUFFIX_RESERVE);
    archive_dir.join(format!("{stamp}_{}", truncate_to_fit(file_name, budget)))
}

/// Moves `destination` into `archive_dir` if it exists.
///
/// The archive directory is created on demand. When the computed entry name
/// is already taken, `.1`, `.2`, ... is appended so an earlier entry is never
/// replaced.
pub fn archive_if_present(
    destination: &Path,
    archive_dir: &Path,
    timestamp: &RunTimestamp,
    file_name: &str,
) -> Result<ArchiveOutcome, ArchiveError> {
    let planned = archive_path_for(archive_dir, timestamp, file_name);

    // Probe first: a rename onto a missing archive directory also reports
    // NotFound, and that case must not be mistaken for an absent destination.
    match fs::symlink_metadata(destination) {
        Ok(_) => {}
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            debug!(target: targets::ARCHIVE, destination = %destination.display(), "nothing to archive");
            return Ok(ArchiveOutcome::NothingToArchive);
        }
        Err(error) => return Err(ArchiveError::new("inspect destination", destination, &planned, error)),
    }

    fs::create_dir_all(archive_dir).map_err(|error| {
        ArchiveError::new("create archive directory", destination, &planned, error)
    })?;

    let archive_path = free_archive_path(planned)
        .map_err(|(planned, error)| ArchiveError::new("choose archive name", destination, &planned, error))?;
    relocate(destination, &archive_path)?;

    info!(
        target: targets::ARCHIVE,
        destination = %destination.display(),
        archive = %archive_path.display(),
        "archived existing file"
    );
    Ok(ArchiveOutcome::Archived { archive_path })
}

fn free_archive_path(planned: PathBuf) -> Result<PathBuf, (PathBuf, io::Error)> {
    if !is_occupied(&planned) {
        return Ok(planned);
    }
    for counter in 1..=MAX_ARCHIVE_SUFFIX {
        let mut name = OsString::from(planned.as_os_str());
        name.push(format!(".{counter}"));
        let candidate = PathBuf::from(name);
        if !is_occupied(&candidate) {
            return Ok(candidate);
        }
    }
    Err((
        planned,
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{MAX_ARCHIVE_SUFFIX} archive entries already exist for this name"),
        ),
    ))
}

fn is_occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

fn relocate(destination: &Path, archive_path: &Path) -> Result<(), ArchiveError> {
    match fs::rename(destination, archive_path) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == io::ErrorKind::CrossesDevices => {
            debug!(target: targets::ARCHIVE, destination = %destination.display(), "rename crosses filesystems; copying");
            fs::copy(destination, archive_path)
                .map_err(|error| ArchiveError::new("copy", destination, archive_path, error))?;
            fs::remove_file(destination)
                .map_err(|error| ArchiveError::new("remove original", destination, archive_path, error))
        }
        Err(error) => Err(ArchiveError::new("move", destination, archive_path, error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use time::macros::datetime;

    fn stamp() -> RunTimestamp {
        RunTimestamp::from_datetime(datetime!(2019-01-11 06:30:00 UTC)).expect("format")
    }

    #[test]
    fn archive_path_prefixes_timestamp() {
        let path = archive_path_for(Path::new("/share/Archive"), &stamp(), "report.csv");
        assert_eq!(path, PathBuf::from("/share/Archive/20190111-063000_report.csv"));
    }

    #[test]
    fn long_names_are_cut_to_fit_one_component() {
        let name = format!("{}.csv", "é".repeat(130));
        let path = archive_path_for(Path::new("/share/Archive"), &stamp(), &name);
        let entry = path.file_name().and_then(|n| n.to_str()).expect("utf-8 entry");
        assert!(entry.len() + SUFFIX_RESERVE <= NAME_MAX, "{} bytes", entry.len());
        assert!(entry.starts_with("20190111-063000_éé"));
    }

    #[test]
    fn overlong_destination_is_still_archived() {
        let dir = tempdir().expect("tempdir");
        let name = "r".repeat(250);
        let destination = dir.path().join(&name);
        fs::write(&destination, b"OLD").expect("seed");
        let archive_dir = dir.path().join("Archive");

        let outcome = archive_if_present(&destination, &archive_dir, &stamp(), &name).expect("archive");

        let archived = outcome.archive_path().expect("archived");
        assert_eq!(fs::read(archived).unwrap(), b"OLD");
        assert!(!destination.exists());
    }

    #[test]
    fn missing_destination_is_not_an_error() {
        let dir = tempdir().expect("tempdir");
        let archive_dir = dir.path().join("Archive");

        let outcome = archive_if_present(&dir.path().join("report.csv"), &archive_dir, &stamp(), "report.csv")
            .expect("absent destination succeeds");

        assert_eq!(outcome, ArchiveOutcome::NothingToArchive);
        assert!(!archive_dir.exists(), "archive dir is only created when needed");
    }

    #[test]
    fn existing_destination_moves_into_archive() {
        let dir = tempdir().expect("tempdir");
        let destination = dir.path().join("report.csv");
        fs::write(&destination, b"OLD").expect("seed");
        let archive_dir = dir.path().join("Archive");

        let outcome = archive_if_present(&destination, &archive_dir, &stamp(), "report.csv").expect("archive");

        let expected = archive_dir.join("20190111-063000_report.csv");
        assert_eq!(outcome.archive_path(), Some(expected.as_path()));
        assert!(!destination.exists());
        assert_eq!(fs::read(expected).expect("read archive"), b"OLD");
    }

    #[test]
    fn taken_archive_name_gets_numeric_suffix() {
        let dir = tempdir().expect("tempdir");
        let archive_dir = dir.path().join("Archive");
        fs::create_dir(&archive_dir).expect("archive dir");
        fs::write(archive_dir.join("20190111-063000_report.csv"), b"FIRST").expect("seed archive");
        let destination = dir.path().join("report.csv");
        fs::write(&destination, b"SECOND").expect("seed");

        let outcome = archive_if_present(&destination, &archive_dir, &stamp(), "report.csv").expect("archive");

        let expected = archive_dir.join("20190111-063000_report.csv.1");
        assert_eq!(outcome.archive_path(), Some(expected.as_path()));
        assert_eq!(fs::read(archive_dir.join("20190111-063000_report.csv")).unwrap(), b"FIRST");
        assert_eq!(fs::read(expected).unwrap(), b"SECOND");
    }

    #[test]
    fn blocked_archive_directory_is_reported_and_destination_kept() {
        let dir = tempdir().expect("tempdir");
        let destination = dir.path().join("report.csv");
        fs::write(&destination, b"OLD").expect("seed");
        let archive_dir = dir.path().join("Archive");
        fs::write(&archive_dir, b"not a directory").expect("block archive dir");

        let error = archive_if_present(&destination, &archive_dir, &stamp(), "report.csv")
            .expect_err("archive dir is a regular file");

        assert_eq!(error.destination(), destination.as_path());
        assert_eq!(fs::read(&destination).unwrap(), b"OLD");
    }
}
