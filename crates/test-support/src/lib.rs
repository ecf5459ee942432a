//! Shared test utilities for the sftp-pull workspace.
//!
//! [`MemoryRemote`] is an in-memory [`RemoteSession`] with scripted failures,
//! and [`Workspace`] wraps a temporary directory laid out like a destination
//! share.

use std::cell::Cell;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tempfile::TempDir;
use transport::{
    ConnectionError, ListError, RemoteSession, RemoteSource, TransferError, remote_path,
};

/// An in-memory remote directory.
#[derive(Debug)]
pub struct MemoryRemote {
    remote_dir: String,
    files: Vec<(String, Vec<u8>)>,
    list_failure: Option<String>,
    vanished: HashSet<String>,
    broken: HashSet<String>,
    disconnect_failure: Option<String>,
    list_calls: usize,
    downloads: Vec<String>,
    disconnects: Rc<Cell<usize>>,
}

impl MemoryRemote {
    /// Creates an empty remote serving `remote_dir`.
    pub fn new(remote_dir: &str) -> Self {
        Self {
            remote_dir: remote_dir.to_owned(),
            files: Vec::new(),
            list_failure: None,
            vanished: HashSet::new(),
            broken: HashSet::new(),
            disconnect_failure: None,
            list_calls: 0,
            downloads: Vec::new(),
            disconnects: Rc::new(Cell::new(0)),
        }
    }

    /// Adds a file; listing order follows insertion order.
    #[must_use]
    pub fn with_file(mut self, name: &str, contents: &[u8]) -> Self {
        self.put(name, contents);
        self
    }

    /// Makes every listing fail with `detail`.
    #[must_use]
    pub fn failing_listing(mut self, detail: &str) -> Self {
        self.list_failure = Some(detail.to_owned());
        self
    }

    /// Keeps `name` in listings but makes its download report it missing.
    #[must_use]
    pub fn vanishing(mut self, name: &str) -> Self {
        self.vanished.insert(name.to_owned());
        self
    }

    /// Makes the download of `name` fail mid-stream.
    #[must_use]
    pub fn breaking(mut self, name: &str) -> Self {
        self.broken.insert(name.to_owned());
        self
    }

    /// Makes [`RemoteSession::disconnect`] fail with `detail`.
    #[must_use]
    pub fn failing_disconnect(mut self, detail: &str) -> Self {
        self.disconnect_failure = Some(detail.to_owned());
        self
    }

    /// Adds or replaces a file.
    pub fn put(&mut self, name: &str, contents: &[u8]) {
        match self.files.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, data)) => *data = contents.to_vec(),
            None => self.files.push((name.to_owned(), contents.to_vec())),
        }
    }

    /// Number of times the directory was listed.
    pub const fn list_calls(&self) -> usize {
        self.list_calls
    }

    /// Remote paths downloaded so far, in call order.
    pub fn downloads(&self) -> &[String] {
        &self.downloads
    }

    /// Shared counter of disconnects; it outlives the remote itself.
    pub fn disconnects(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.disconnects)
    }
}

impl RemoteSource for MemoryRemote {
    fn list_files(&mut self, remote_dir: &str) -> Result<Vec<String>, ListError> {
        self.list_calls += 1;
        if let Some(detail) = &self.list_failure {
            return Err(ListError::new(remote_dir, detail.clone()));
        }
        if remote_dir.trim_end_matches('/') != self.remote_dir.trim_end_matches('/') {
            return Err(ListError::new(remote_dir, "no such file or directory"));
        }
        Ok(self.files.iter().map(|(name, _)| name.clone()).collect())
    }

    fn download(&mut self, requested: &str, local_path: &Path) -> Result<u64, TransferError> {
        self.downloads.push(requested.to_owned());

        let entry = self
            .files
            .iter()
            .find(|(name, _)| remote_path(&self.remote_dir, name) == requested);
        let Some((name, contents)) = entry else {
            return Err(TransferError::RemoteMissing {
                remote_path: requested.to_owned(),
            });
        };
        if self.vanished.contains(name) {
            return Err(TransferError::RemoteMissing {
                remote_path: requested.to_owned(),
            });
        }
        if self.broken.contains(name) {
            return Err(TransferError::Interrupted {
                remote_path: requested.to_owned(),
                local_path: local_path.to_path_buf(),
                source: io::Error::from(io::ErrorKind::ConnectionReset),
            });
        }

        fs::write(local_path, contents).map_err(|source| TransferError::Local {
            remote_path: requested.to_owned(),
            local_path: local_path.to_path_buf(),
            source,
        })?;
        Ok(contents.len() as u64)
    }
}

impl RemoteSession for MemoryRemote {
    fn disconnect(self) -> Result<(), ConnectionError> {
        self.disconnects.set(self.disconnects.get() + 1);
        match self.disconnect_failure {
            Some(detail) => Err(ConnectionError::Disconnect {
                address: "memory".to_owned(),
                detail,
            }),
            None => Ok(()),
        }
    }
}

/// A temporary destination share.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Creates an empty temporary directory.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    /// Root of the temporary directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Creates (if needed) and returns a subdirectory.
    pub fn subdir(&self, name: &str) -> io::Result<PathBuf> {
        let path = self.dir.path().join(name);
        fs::create_dir_all(&path)?;
        Ok(path)
    }
}

/// Writes `contents` to `path`, creating parent directories.
pub fn write_file(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}

/// Returns the sorted entry names of `dir`, or an empty list if it is missing.
pub fn entry_names(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = match fs::read_dir(dir) {
        Ok(entries) => entries
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<io::Result<Vec<_>>>()?,
        Err(error) if error.kind() == io::ErrorKind::NotFound => Vec::new(),
        Err(error) => return Err(error),
    };
    names.sort();
    Ok(names)
}
