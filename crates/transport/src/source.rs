use std::path::Path;

use crate::error::{ConnectionError, ListError, TransferError};

/// A remote directory that can be enumerated and fetched from.
///
/// Implementations block until each call completes.
pub trait RemoteSource {
    /// Returns the names of the files in `remote_dir`, in server order.
    fn list_files(&mut self, remote_dir: &str) -> Result<Vec<String>, ListError>;

    /// Copies `remote_path` into `local_path`, creating or truncating it.
    ///
    /// Returns the number of bytes written.
    fn download(&mut self, remote_path: &str, local_path: &Path) -> Result<u64, TransferError>;
}

impl<T: RemoteSource + ?Sized> RemoteSource for &mut T {
    fn list_files(&mut self, remote_dir: &str) -> Result<Vec<String>, ListError> {
        (**self).list_files(remote_dir)
    }

    fn download(&mut self, remote_path: &str, local_path: &Path) -> Result<u64, TransferError> {
        (**self).download(remote_path, local_path)
    }
}

/// A connected [`RemoteSource`] that holds a server session open.
pub trait RemoteSession: RemoteSource {
    /// Closes the session. Consuming `self` guarantees a single release.
    fn disconnect(self) -> Result<(), ConnectionError>
    where
        Self: Sized;
}

/// Joins a remote directory and an entry name with a single `/`.
pub fn remote_path(remote_dir: &str, name: &str) -> String {
    let dir = remote_dir.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    format!("{dir}/{name}")
}
