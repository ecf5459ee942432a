//! Aggregated outcome of a run across all destinations.

use std::fmt::Write as _;

use engine::fetch::FetchReport;
use engine::timestamp::RunTimestamp;

use crate::exit_code::ExitCode;

/// Per-destination reports of one run, in configuration order.
#[derive(Debug)]
pub struct PullSummary {
    timestamp: RunTimestamp,
    reports: Vec<FetchReport>,
}

impl PullSummary {
    pub(crate) const fn new(timestamp: RunTimestamp) -> Self {
        Self {
            timestamp,
            reports: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, report: FetchReport) {
        self.reports.push(report);
    }

    /// Timestamp shared by every archive entry of the run.
    pub const fn timestamp(&self) -> &RunTimestamp {
        &self.timestamp
    }

    /// One report per destination served.
    pub fn reports(&self) -> &[FetchReport] {
        &self.reports
    }

    /// Files landed across all destinations.
    pub fn files_fetched(&self) -> usize {
        self.reports.iter().map(|r| r.files().len()).sum()
    }

    /// Names listed across all destinations.
    pub fn files_listed(&self) -> usize {
        self.reports.iter().map(FetchReport::listed).sum()
    }

    /// Previous copies moved into archives.
    pub fn files_archived(&self) -> usize {
        self.reports.iter().map(FetchReport::archived_count).sum()
    }

    /// Archive moves that failed and were reported as warnings.
    pub fn archive_warnings(&self) -> usize {
        self.reports.iter().map(|r| r.archive_warnings().len()).sum()
    }

    /// Transfers recorded as failed in keep-going mode.
    pub fn transfer_failures(&self) -> usize {
        self.reports.iter().map(|r| r.transfer_failures().len()).sum()
    }

    /// Bytes downloaded across all destinations.
    pub fn total_bytes(&self) -> u64 {
        self.reports.iter().map(FetchReport::total_bytes).sum()
    }

    /// `Ok` when every listed file landed, `PartialTransfer` otherwise.
    pub fn exit_code(&self) -> ExitCode {
        if self.reports.iter().all(FetchReport::is_complete) {
            ExitCode::Ok
        } else {
            ExitCode::PartialTransfer
        }
    }
}

/// Renders the one-line stdout summary for a destination.
///
/// ```text
/// /srv/share: fetched 3 of 3 files (41 bytes), archived 2
/// ```
pub fn describe_report(report: &FetchReport) -> String {
    let mut line = format!(
        "{}: fetched {} of {} files ({} bytes), archived {}",
        report.base_dir().display(),
        report.files().len(),
        report.listed(),
        report.total_bytes(),
        report.archived_count(),
    );
    let warnings = report.archive_warnings().len();
    if warnings > 0 {
        let _ = write!(line, ", {warnings} archive warning(s)");
    }
    let failures = report.transfer_failures().len();
    if failures > 0 {
        let _ = write!(line, ", {failures} failed");
    }
    line
}
