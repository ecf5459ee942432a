//! crates/logging/src/verbosity.rs
//! Verbosity levels derived from `-q` and repeated `-v` flags.

use tracing::Level;

use crate::targets;

/// How much diagnostic output a run produces.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Warnings plus one line per archived file and per destination.
    #[default]
    Normal,
    /// Per-file debug events.
    Verbose,
    /// Everything, including SSH library debug output.
    Trace,
}

impl Verbosity {
    /// Maps the flag counts. `-q` wins over any number of `-v`.
    pub const fn from_flags(verbose: u8, quiet: bool) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Trace,
        }
    }

    /// Maximum level for the workspace's own targets.
    pub const fn own_level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Maximum level for third-party crates (russh and friends).
    pub const fn library_level(self) -> Level {
        match self {
            Self::Quiet | Self::Normal => Level::ERROR,
            Self::Verbose => Level::WARN,
            Self::Trace => Level::DEBUG,
        }
    }

    /// Renders `EnvFilter` directives for this verbosity.
    pub fn directives(self) -> String {
        format!(
            "{},{}={}",
            directive_level(self.library_level()),
            targets::ROOT,
            directive_level(self.own_level()),
        )
    }

    /// Reports whether routine summaries should be printed.
    pub fn shows_summary(self) -> bool {
        self >= Self::Normal
    }

    /// Reports whether each fetched file should be listed.
    pub fn lists_files(self) -> bool {
        self >= Self::Verbose
    }
}

fn directive_level(level: Level) -> String {
    level.as_str().to_ascii_lowercase()
}
