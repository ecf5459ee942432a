use std::path::{Path, PathBuf};

/// A local base directory receiving fetched files, with its archive directory.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Destination {
    base_dir: PathBuf,
    archive_dir: PathBuf,
}

impl Destination {
    /// Creates a destination. A relative `archive_dir` is resolved beneath
    /// `base_dir`; an absolute one is used as-is.
    pub fn new(base_dir: impl Into<PathBuf>, archive_dir: impl AsRef<Path>) -> Self {
        let base_dir = base_dir.into();
        let archive_dir = base_dir.join(archive_dir);
        Self {
            base_dir,
            archive_dir,
        }
    }

    /// Returns the base directory.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Returns the archive directory.
    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }

    /// Returns the local path a remote entry called `name` is written to.
    pub fn local_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }
}
