//! User-visible diagnostic lines.
//!
//! Every line starts with `sftp-pull <severity>: `. Error lines carry the
//! exit code they map to as a trailing `(code N)` suffix, e.g.
//!
//! ```text
//! sftp-pull error: ConnectionError: authentication rejected for user ops at files.example:22 (code 3)
//! ```

use std::fmt;
use std::io::{self, Write};

use crate::exit_code::ExitCode;

/// Severity of a user-visible message.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Severity {
    /// Warning message.
    Warning,
    /// Error message.
    Error,
}

impl Severity {
    /// Returns the lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Returns the prefix rendered at the start of a line.
    ///
    /// ```
    /// use client::message::Severity;
    ///
    /// assert_eq!(Severity::Error.prefix(), "sftp-pull error: ");
    /// ```
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Warning => "sftp-pull warning: ",
            Self::Error => "sftp-pull error: ",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One diagnostic line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Message {
    severity: Severity,
    text: String,
    code: Option<ExitCode>,
}

impl Message {
    /// An error line carrying `code`.
    pub fn error(code: ExitCode, text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
            code: Some(code),
        }
    }

    /// A warning line.
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            text: text.into(),
            code: None,
        }
    }

    /// Returns the severity.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns the message text without prefix or code.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the exit code attached to an error line.
    #[must_use]
    pub const fn code(&self) -> Option<ExitCode> {
        self.code
    }

    /// Writes the rendered message followed by a newline.
    pub fn render_line<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "{self}")
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.severity.prefix())?;
        f.write_str(&self.text)?;
        if let Some(code) = self.code {
            write!(f, " (code {})", code.as_i32())?;
        }
        Ok(())
    }
}
