use std::fmt;
use std::time::Duration;

use zeroize::Zeroizing;

/// Default SSH port.
pub const DEFAULT_PORT: u16 = 22;

/// Default connect and inactivity timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Parameters for establishing an authenticated SFTP session.
#[derive(Clone)]
pub struct ConnectOptions {
    host: String,
    port: u16,
    username: String,
    password: Zeroizing<String>,
    host_key_fingerprint: Option<String>,
    timeout: Duration,
}

impl ConnectOptions {
    /// Creates options for `username@host` on the default port.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            username: username.into(),
            password: Zeroizing::new(password.into()),
            host_key_fingerprint: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the TCP port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Pins the server key to a fingerprint such as `SHA256:...`.
    #[must_use]
    pub fn with_host_key_fingerprint(mut self, fingerprint: Option<String>) -> Self {
        self.host_key_fingerprint = fingerprint;
        self
    }

    /// Overrides the connect and inactivity timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the remote host name.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the TCP port.
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the login user.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the password.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Returns the pinned host key fingerprint, if any.
    pub fn host_key_fingerprint(&self) -> Option<&str> {
        self.host_key_fingerprint.as_deref()
    }

    /// Returns the connect and inactivity timeout.
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Renders `host:port`, bracketing IPv6 literals.
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("host_key_fingerprint", &self.host_key_fingerprint)
            .field("timeout", &self.timeout)
            .finish()
    }
}
