//! SFTP over SSH via `russh` and `russh-sftp`.

mod handler;
mod session;

pub use session::SftpSession;
