//! Fatal errors raised by the fetch routine.

use thiserror::Error;
use transport::{ListError, TransferError};

/// A failure that stops the fetch routine for a destination.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The remote directory could not be enumerated.
    #[error(transparent)]
    List(#[from] ListError),

    /// A file could not be downloaded and keep-going mode is off.
    #[error(transparent)]
    Transfer(#[from] TransferError),
}
