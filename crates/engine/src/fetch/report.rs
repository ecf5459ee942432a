use std::path::{Path, PathBuf};

use transport::TransferError;

use crate::archive::ArchiveError;

/// One file that was fetched into a destination.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FetchedFile {
    name: String,
    local_path: PathBuf,
    bytes: u64,
    archived_to: Option<PathBuf>,
}

impl FetchedFile {
    pub(crate) const fn new(
        name: String,
        local_path: PathBuf,
        bytes: u64,
        archived_to: Option<PathBuf>,
    ) -> Self {
        Self {
            name,
            local_path,
            bytes,
            archived_to,
        }
    }

    /// Remote entry name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Local path now holding the fetched content.
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Bytes written.
    pub const fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Archive entry holding the previous content, if there was any.
    pub fn archived_to(&self) -> Option<&Path> {
        self.archived_to.as_deref()
    }
}

/// Outcome of running the fetch routine against one destination.
#[derive(Debug, Default)]
pub struct FetchReport {
    base_dir: PathBuf,
    listed: usize,
    files: Vec<FetchedFile>,
    archive_warnings: Vec<ArchiveError>,
    transfer_failures: Vec<TransferError>,
}

impl FetchReport {
    pub(crate) fn new(base_dir: &Path, listed: usize) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            listed,
            ..Self::default()
        }
    }

    pub(crate) fn record_file(&mut self, file: FetchedFile) {
        self.files.push(file);
    }

    pub(crate) fn record_archive_warning(&mut self, warning: ArchiveError) {
        self.archive_warnings.push(warning);
    }

    pub(crate) fn record_transfer_failure(&mut self, failure: TransferError) {
        self.transfer_failures.push(failure);
    }

    /// Destination base directory.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Number of entries the remote listing returned.
    pub const fn listed(&self) -> usize {
        self.listed
    }

    /// Files fetched, in listing order.
    pub fn files(&self) -> &[FetchedFile] {
        &self.files
    }

    /// Number of fetched files whose previous content was archived.
    pub fn archived_count(&self) -> usize {
        self.files.iter().filter(|f| f.archived_to.is_some()).count()
    }

    /// Total bytes written across all fetched files.
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(FetchedFile::bytes).sum()
    }

    /// Archive failures that were tolerated.
    pub fn archive_warnings(&self) -> &[ArchiveError] {
        &self.archive_warnings
    }

    /// Downloads that failed in keep-going mode.
    pub fn transfer_failures(&self) -> &[TransferError] {
        &self.transfer_failures
    }

    /// Reports whether every listed file was fetched.
    pub fn is_complete(&self) -> bool {
        self.transfer_failures.is_empty()
    }
}
