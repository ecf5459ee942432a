//! Blocking SFTP session over an embedded SSH client.

use std::path::Path;
use std::sync::{Arc, Mutex};

use logging::targets;
use russh::{Disconnect, client};
use russh_sftp::client::SftpSession as SftpChannel;
use russh_sftp::client::error::Error as SftpError;
use russh_sftp::protocol::StatusCode;
use tokio::io::AsyncWriteExt;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info, warn};

use super::handler::{HostKeyPolicy, HostKeyRejection};
use crate::error::{ConnectionError, ListError, TransferError};
use crate::options::ConnectOptions;
use crate::source::{RemoteSession, RemoteSource};

type SshHandle = client::Handle<HostKeyPolicy>;

/// An authenticated SFTP session.
///
/// Owns a current-thread runtime that drives the SSH client; every method
/// blocks until the remote operation finishes. The session is released when
/// [`RemoteSession::disconnect`] is called or, failing that, on drop.
pub struct SftpSession {
    runtime: Runtime,
    ssh: Option<SshHandle>,
    sftp: Option<SftpChannel>,
    address: String,
}

impl SftpSession {
    /// Connects, authenticates with the configured password, and starts the
    /// `sftp` subsystem.
    pub fn connect(options: &ConnectOptions) -> Result<Self, ConnectionError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ConnectionError::Runtime)?;
        let address = options.address();

        debug!(target: targets::CONNECT, %address, username = options.username(), "connecting");
        let (ssh, sftp) = runtime.block_on(open(options, &address))?;
        info!(target: targets::CONNECT, %address, "session established");

        Ok(Self {
            runtime,
            ssh: Some(ssh),
            sftp: Some(sftp),
            address,
        })
    }

    fn release(&mut self) -> Result<(), ConnectionError> {
        let sftp = self.sftp.take();
        let ssh = self.ssh.take();
        if sftp.is_none() && ssh.is_none() {
            return Ok(());
        }

        let address = self.address.clone();
        self.runtime.block_on(async move {
            if let Some(sftp) = sftp
                && let Err(error) = sftp.close().await
            {
                debug!(target: targets::CONNECT, %address, %error, "sftp channel close failed");
            }
            if let Some(ssh) = ssh {
                ssh.disconnect(Disconnect::ByApplication, "", "en")
                    .await
                    .map_err(|error| ConnectionError::Disconnect {
                        address: address.clone(),
                        detail: error.to_string(),
                    })?;
            }
            debug!(target: targets::CONNECT, %address, "session closed");
            Ok::<(), ConnectionError>(())
        })
    }
}

impl RemoteSource for SftpSession {
    fn list_files(&mut self, remote_dir: &str) -> Result<Vec<String>, ListError> {
        let sftp = self
            .sftp
            .as_ref()
            .ok_or_else(|| ListError::new(remote_dir, "session already closed"))?;

        let entries = self
            .runtime
            .block_on(sftp.read_dir(remote_dir))
            .map_err(|error| ListError::new(remote_dir, error.to_string()))?;

        Ok(listed_files(
            remote_dir,
            entries
                .into_iter()
                .map(|entry| (entry.file_name(), entry.file_type().is_dir())),
        ))
    }

    fn download(&mut self, remote_path: &str, local_path: &Path) -> Result<u64, TransferError> {
        let sftp = self
            .sftp
            .as_ref()
            .ok_or_else(|| TransferError::SessionClosed {
                remote_path: remote_path.to_owned(),
            })?;

        self.runtime.block_on(async {
            let mut remote = sftp
                .open(remote_path)
                .await
                .map_err(|error| classify_open_error(remote_path, &error))?;
            let mut local = tokio::fs::File::create(local_path)
                .await
                .map_err(|source| TransferError::Local {
                    remote_path: remote_path.to_owned(),
                    local_path: local_path.to_path_buf(),
                    source,
                })?;

            let bytes = tokio::io::copy(&mut remote, &mut local)
                .await
                .map_err(|source| TransferError::Interrupted {
                    remote_path: remote_path.to_owned(),
                    local_path: local_path.to_path_buf(),
                    source,
                })?;
            local
                .flush()
                .await
                .map_err(|source| TransferError::Local {
                    remote_path: remote_path.to_owned(),
                    local_path: local_path.to_path_buf(),
                    source,
                })?;
            if let Err(error) = remote.shutdown().await {
                debug!(target: targets::FETCH, %remote_path, %error, "remote handle close failed");
            }
            Ok::<u64, TransferError>(bytes)
        })
    }
}

impl RemoteSession for SftpSession {
    /// Closes the SFTP channel and the SSH session.
    fn disconnect(mut self) -> Result<(), ConnectionError> {
        self.release()
    }
}

impl Drop for SftpSession {
    fn drop(&mut self) {
        if let Err(error) = self.release() {
            warn!(target: targets::CONNECT, %error, "session release on drop failed");
        }
    }
}

async fn open(
    options: &ConnectOptions,
    address: &str,
) -> Result<(SshHandle, SftpChannel), ConnectionError> {
    let config = Arc::new(client::Config {
        inactivity_timeout: Some(options.timeout()),
        ..client::Config::default()
    });
    let rejection: Arc<Mutex<Option<HostKeyRejection>>> = Arc::new(Mutex::new(None));
    let policy = HostKeyPolicy::new(
        address.to_owned(),
        options.host_key_fingerprint().map(str::to_owned),
        Arc::clone(&rejection),
    );

    let connecting = client::connect(config, (options.host(), options.port()), policy);
    let mut ssh = match tokio::time::timeout(options.timeout(), connecting).await {
        Err(_) => {
            return Err(ConnectionError::Timeout {
                address: address.to_owned(),
                timeout: options.timeout(),
            });
        }
        Ok(Err(error)) => {
            let rejected = rejection.lock().ok().and_then(|mut slot| slot.take());
            return Err(match rejected {
                Some(HostKeyRejection { expected, actual }) => ConnectionError::HostKeyMismatch {
                    address: address.to_owned(),
                    expected,
                    actual,
                },
                None => ConnectionError::Unreachable {
                    address: address.to_owned(),
                    detail: error.to_string(),
                },
            });
        }
        Ok(Ok(ssh)) => ssh,
    };

    let auth = ssh
        .authenticate_password(options.username(), options.password())
        .await
        .map_err(|error| ConnectionError::Unreachable {
            address: address.to_owned(),
            detail: error.to_string(),
        })?;
    if !auth.success() {
        return Err(ConnectionError::AuthenticationRejected {
            address: address.to_owned(),
            username: options.username().to_owned(),
        });
    }

    let subsystem_error = |detail: String| ConnectionError::Subsystem {
        address: address.to_owned(),
        detail,
    };
    let channel = ssh
        .channel_open_session()
        .await
        .map_err(|error| subsystem_error(error.to_string()))?;
    channel
        .request_subsystem(true, "sftp")
        .await
        .map_err(|error| subsystem_error(error.to_string()))?;
    let sftp = SftpChannel::new(channel.into_stream())
        .await
        .map_err(|error| subsystem_error(error.to_string()))?;

    Ok((ssh, sftp))
}

/// Keeps regular entries in server order, dropping `.`, `..` and directories.
fn listed_files(
    remote_dir: &str,
    entries: impl IntoIterator<Item = (String, bool)>,
) -> Vec<String> {
    let mut names = Vec::new();
    for (name, is_dir) in entries {
        if name == "." || name == ".." {
            continue;
        }
        if is_dir {
            debug!(target: targets::LIST, %remote_dir, %name, "skipping directory entry");
            continue;
        }
        names.push(name);
    }
    names
}

fn classify_open_error(remote_path: &str, error: &SftpError) -> TransferError {
    match error {
        SftpError::Status(status) if matches!(status.status_code, StatusCode::NoSuchFile) => {
            TransferError::RemoteMissing {
                remote_path: remote_path.to_owned(),
            }
        }
        other => TransferError::Remote {
            remote_path: remote_path.to_owned(),
            detail: other.to_string(),
        },
    }
}
