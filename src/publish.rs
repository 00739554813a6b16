use std::io;

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::analysis::Analysis;
use crate::base::SnapshotTable;

pub mod report;
pub mod workbook;

pub use report::ReportSink;
pub use workbook::WorkbookSink;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Destination for a finished snapshot. Each publish replaces what the
/// previous one wrote.
pub trait SnapshotSink {
    fn name(&self) -> &'static str;

    fn publish(
        &mut self,
        table: &SnapshotTable,
        analysis: &Analysis<'_>,
        generated_at: DateTime<Local>,
    ) -> Result<(), PublishError>;
}

pub fn format_timestamp(ts: &DateTime<Local>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn timestamp_format() {
        let ts = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(format_timestamp(&ts), "2024-03-09 07:05:01");
    }
}
