#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` is the command-line front end of `sftp-pull`. It recognises a
//! handful of switches (`--help`/`-h`, `--version`/`-V`, `--verbose`/`-v`,
//! `--quiet`/`-q` and `--keep-going`), reads the run configuration from
//! `SFTP_PULL_*` environment variables and delegates the work to
//! [`client::run_pull`].
//!
//! # Design
//!
//! [`run`] accepts an iterator of arguments together with handles for
//! standard output and error. [`run_with_env`] additionally takes the
//! environment lookup so tests never touch the process environment. A
//! [`clap`](https://docs.rs/clap/) command definition performs the parse; help
//! output is a static text so its wording stays stable.
//!
//! # Output
//!
//! - stdout: one summary line per destination, suppressed by `--quiet`.
//!   With `--verbose` each fetched file is listed below its destination.
//! - stderr: `tracing` events, one warning line per failed archive move and
//!   per file that failed in keep-going mode, and exactly one
//!   `sftp-pull error: ... (code N)` line per fatal error. Warning and error
//!   lines are printed even with `--quiet`.
//!
//! # Examples
//!
//! ```
//! let mut stdout = Vec::new();
//! let mut stderr = Vec::new();
//! let exit_code = cli::run(["sftp-pull", "--version"], &mut stdout, &mut stderr);
//!
//! assert_eq!(exit_code, 0);
//! assert!(stdout.starts_with(b"sftp-pull "));
//! assert!(stderr.is_empty());
//! ```

use std::env;
use std::ffi::OsString;
use std::io::Write;

use clap::{Arg, ArgAction, Command};
use client::config::vars;
use client::{ClientError, ExitCode, Message, PullConfig, PullSummary, RunOptions, describe_report};
use logging::{LoggingError, Verbosity, targets};
use tracing::debug;

const MAX_EXIT_CODE: i32 = u8::MAX as i32;

const PROGRAM_NAME: &str = "sftp-pull";

const HELP_TEXT: &str = concat!(
    "sftp-pull ",
    env!("CARGO_PKG_VERSION"),
    "\n",
    "Fetch every file of a remote SFTP directory into one or more local\n",
    "directories, archiving each existing local copy before it is replaced.\n",
    "\n",
    "Usage: sftp-pull [-h] [-V] [-v...] [-q] [--keep-going]\n",
    "\n",
    "Options:\n",
    "  -h, --help        Show this help message and exit.\n",
    "  -V, --version     Output version information and exit.\n",
    "  -v, --verbose     Increase diagnostic output (repeat for more).\n",
    "  -q, --quiet       Print errors and warnings only; no summary.\n",
    "      --keep-going  Continue after a failed download and exit with code 23.\n",
    "\n",
    "Environment:\n",
    "  SFTP_PULL_HOST         server host name (required)\n",
    "  SFTP_PULL_PORT         TCP port (default 22)\n",
    "  SFTP_PULL_USERNAME     login user (required)\n",
    "  SFTP_PULL_PASSWORD     login password (required)\n",
    "  SFTP_PULL_LOCAL_DIRS   destination directories, separated like PATH (required)\n",
    "  SFTP_PULL_REMOTE_DIR   remote directory (default /files)\n",
    "  SFTP_PULL_ARCHIVE_DIR  archive directory below each destination (default Archive)\n",
    "  SFTP_PULL_HOST_KEY     pinned host key fingerprint, SHA256:...\n",
    "  SFTP_PULL_TIMEOUT      connect timeout in seconds (default 30)\n",
    "  SFTP_PULL_LOG          tracing filter directives overriding -v/-q\n",
    "\n",
    "Exit codes: 0 ok, 1 usage, 2 configuration, 3 connection, 4 listing,\n",
    "5 transfer, 23 partial transfer.\n",
);

#[derive(Debug, Default, Eq, PartialEq)]
struct ParsedArgs {
    show_help: bool,
    show_version: bool,
    verbose: u8,
    quiet: bool,
    keep_going: bool,
}

/// Builds the `clap` command used for parsing.
fn clap_command() -> Command {
    Command::new(PROGRAM_NAME)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(
            Arg::new("help")
                .long("help")
                .short('h')
                .help("Show this help message and exit.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .short('V')
                .help("Output version information and exit.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Increase diagnostic output.")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .help("Print errors and warnings only.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("keep-going")
                .long("keep-going")
                .help("Continue after a failed download.")
                .action(ArgAction::SetTrue),
        )
}

/// Parses command-line arguments into a [`ParsedArgs`] structure.
fn parse_args<I, S>(arguments: I) -> Result<ParsedArgs, clap::Error>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut args: Vec<OsString> = arguments.into_iter().map(Into::into).collect();

    if args.is_empty() {
        args.push(OsString::from(PROGRAM_NAME));
    }

    let matches = clap_command().try_get_matches_from(args)?;

    Ok(ParsedArgs {
        show_help: matches.get_flag("help"),
        show_version: matches.get_flag("version"),
        verbose: matches.get_count("verbose"),
        quiet: matches.get_flag("quiet"),
        keep_going: matches.get_flag("keep-going"),
    })
}

/// Runs the CLI using the process environment.
///
/// Returns the process exit code; `0` means every destination was served.
pub fn run<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    Out: Write,
    Err: Write,
{
    run_with_env(arguments, stdout, stderr, |name| env::var_os(name))
}

/// Runs the CLI reading `SFTP_PULL_*` variables through `lookup`.
pub fn run_with_env<I, S, Out, Err, F>(
    arguments: I,
    stdout: &mut Out,
    stderr: &mut Err,
    lookup: F,
) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    Out: Write,
    Err: Write,
    F: Fn(&str) -> Option<OsString>,
{
    match parse_args(arguments) {
        Ok(parsed) => execute(&parsed, stdout, stderr, lookup),
        Err(error) => {
            let message = Message::error(ExitCode::Syntax, usage_error_text(&error));
            let _ = message.render_line(stderr);
            ExitCode::Syntax.as_i32()
        }
    }
}

fn execute<Out, Err, F>(parsed: &ParsedArgs, stdout: &mut Out, stderr: &mut Err, lookup: F) -> i32
where
    Out: Write,
    Err: Write,
    F: Fn(&str) -> Option<OsString>,
{
    if parsed.show_help {
        return write_or_fail(stdout, HELP_TEXT);
    }
    if parsed.show_version {
        return write_or_fail(stdout, &version_banner());
    }

    let verbosity = Verbosity::from_flags(parsed.verbose, parsed.quiet);
    let log_override = lookup(vars::LOG).and_then(|value| value.into_string().ok());
    match logging::init_tracing(verbosity, log_override.as_deref()) {
        Ok(()) | Err(LoggingError::AlreadyInitialized) => {}
        Err(error @ LoggingError::InvalidFilter { .. }) => {
            let message = Message::error(ExitCode::Config, format!("ConfigError: {}: {error}", vars::LOG));
            let _ = message.render_line(stderr);
            return ExitCode::Config.as_i32();
        }
    }

    let config = match PullConfig::from_lookup(&lookup) {
        Ok(config) => config,
        Err(error) => return report_failure(&ClientError::from(error), verbosity, stdout, stderr),
    };
    debug!(
        target: targets::RUN,
        destinations = config.destinations().len(),
        remote_dir = config.remote_dir(),
        "configuration loaded"
    );

    let options = RunOptions::new().keep_going(parsed.keep_going);
    let outcome = client::run_pull(&config, &options);
    report_outcome(&outcome, verbosity, stdout, stderr)
}

fn report_outcome<Out, Err>(
    outcome: &Result<PullSummary, ClientError>,
    verbosity: Verbosity,
    stdout: &mut Out,
    stderr: &mut Err,
) -> i32
where
    Out: Write,
    Err: Write,
{
    match outcome {
        Ok(summary) => {
            write_run_output(summary, verbosity, stdout, stderr);
            summary.exit_code().as_i32()
        }
        Err(error) => report_failure(error, verbosity, stdout, stderr),
    }
}

fn report_failure<Out, Err>(
    error: &ClientError,
    verbosity: Verbosity,
    stdout: &mut Out,
    stderr: &mut Err,
) -> i32
where
    Out: Write,
    Err: Write,
{
    if let Some(summary) = error.summary() {
        write_run_output(summary, verbosity, stdout, stderr);
    }
    let _ = error.to_message().render_line(stderr);
    error.exit_code().as_i32()
}

fn write_run_output<Out, Err>(
    summary: &PullSummary,
    verbosity: Verbosity,
    stdout: &mut Out,
    stderr: &mut Err,
) where
    Out: Write,
    Err: Write,
{
    if verbosity.shows_summary() {
        let _ = write_summary(stdout, summary, verbosity.lists_files());
    }
    for report in summary.reports() {
        for warning in report.archive_warnings() {
            let _ = Message::warning(format!("ArchiveMoveFailure: {warning}")).render_line(stderr);
        }
        for failure in report.transfer_failures() {
            let _ = Message::warning(format!("TransferError: {failure}")).render_line(stderr);
        }
    }
}

fn write_summary<W: Write>(
    out: &mut W,
    summary: &PullSummary,
    list_files: bool,
) -> std::io::Result<()> {
    for report in summary.reports() {
        writeln!(out, "{}", describe_report(report))?;
        if !list_files {
            continue;
        }
        for file in report.files() {
            write!(out, "  {} -> {}", file.name(), file.local_path().display())?;
            match file.archived_to() {
                Some(archive) => writeln!(out, " (previous copy in {})", archive.display())?,
                None => writeln!(out)?,
            }
        }
    }
    Ok(())
}

fn write_or_fail<W: Write>(out: &mut W, text: &str) -> i32 {
    if out.write_all(text.as_bytes()).is_err() {
        return ExitCode::FileIo.as_i32();
    }
    ExitCode::Ok.as_i32()
}

fn version_banner() -> String {
    format!("{PROGRAM_NAME} {}\n", env!("CARGO_PKG_VERSION"))
}

/// First line of a clap error, without clap's own `error: ` prefix.
fn usage_error_text(error: &clap::Error) -> String {
    let rendered = error.to_string();
    let first = rendered.lines().next().unwrap_or_default();
    let detail = first.strip_prefix("error: ").unwrap_or(first);
    format!("SyntaxError: {detail}")
}

/// Converts a numeric exit code into an [`std::process::ExitCode`].
///
/// Known codes go through [`ExitCode`]; anything else is clamped to `0..=255`.
#[must_use]
pub fn exit_code_from(status: i32) -> std::process::ExitCode {
    ExitCode::from_i32(status).map_or_else(
        || {
            let clamped = status.clamp(0, MAX_EXIT_CODE);
            std::process::ExitCode::from(u8::try_from(clamped).unwrap_or(u8::MAX))
        },
        std::process::ExitCode::from,
    )
}
