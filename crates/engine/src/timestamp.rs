//! Run timestamp shared by every archive entry of one run.

use std::fmt;

use logging::targets;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, error::Format};

/// Second-precision layout used as the archive entry prefix, e.g. `20190111-063000`.
const ARCHIVE_STAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[year][month][day]-[hour][minute][second]");

/// The instant a run started, rendered once for archive entry names.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RunTimestamp {
    rendered: String,
}

impl RunTimestamp {
    /// Captures the current local time, falling back to UTC when the local
    /// offset cannot be determined.
    pub fn now() -> Result<Self, Format> {
        let captured = OffsetDateTime::now_local().unwrap_or_else(|_| {
            tracing::debug!(target: targets::ARCHIVE, "local UTC offset unavailable; using UTC");
            OffsetDateTime::now_utc()
        });
        Self::from_datetime(captured)
    }

    /// Builds a timestamp from a known instant.
    pub fn from_datetime(captured: OffsetDateTime) -> Result<Self, Format> {
        let rendered = captured.format(ARCHIVE_STAMP)?;
        Ok(Self { rendered })
    }

    /// Returns the rendered prefix.
    pub fn as_str(&self) -> &str {
        &self.rendered
    }
}

impl fmt::Display for RunTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}
