use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::analysis::{Analysis, RankedRecord};
use crate::base::{Cell, MarketRecord, SnapshotTable};
use super::{format_timestamp, PublishError, SnapshotSink};

/// Overwrites a markdown report on every publish
pub struct ReportSink {
    path: PathBuf,
}

impl ReportSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        ReportSink { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotSink for ReportSink {
    fn name(&self) -> &'static str {
        "report"
    }

    fn publish(
        &mut self,
        _table: &SnapshotTable,
        analysis: &Analysis<'_>,
        generated_at: DateTime<Local>,
    ) -> Result<(), PublishError> {
        fs::write(&self.path, render_report(analysis, &generated_at))?;
        Ok(())
    }
}

pub fn render_report(analysis: &Analysis<'_>, generated_at: &DateTime<Local>) -> String {
    format!(
        "# Cryptocurrency Market Analysis Report\n\
Generated on: {}\n\
\n\
## Top 5 Cryptocurrencies by Market Cap\n\
{}\n\
## Market Overview\n\
- Average Price: ${:.2}\n\
- Highest 24h Change: {}\n\
- Lowest 24h Change: {}\n",
        format_timestamp(generated_at),
        markdown_table(analysis.top_5_by_market_cap),
        analysis.average_price,
        change_line(analysis.highest_24h_change),
        change_line(analysis.lowest_24h_change),
    )
}

fn change_line(ranked: Option<RankedRecord<'_>>) -> String {
    match ranked {
        Some(RankedRecord { record, .. }) => format!("{} ({:.2}%)", record.name, record.change_24h_pct),
        None => "n/a".to_owned(),
    }
}

/// Pipe table with a leading index column; numbers are right aligned.
fn markdown_table(rows: &[MarketRecord]) -> String {
    let mut table = String::from("|    |");
    for label in MarketRecord::COLUMNS.iter() {
        let _ = write!(table, " {} |", label);
    }
    table.push_str("\n|---:|");
    if let Some(first) = rows.first() {
        for cell in first.cells().iter() {
            table.push_str(match cell {
                Cell::Text(_) => ":---|",
                Cell::Number(_) => "---:|",
            });
        }
    } else {
        table.push_str(&":---|".repeat(MarketRecord::COLUMNS.len()));
    }
    table.push('\n');

    for (index, record) in rows.iter().enumerate() {
        let _ = write!(table, "| {:>2} |", index);
        for cell in record.cells().iter() {
            match cell {
                Cell::Text(text) => { let _ = write!(table, " {} |", text); },
                Cell::Number(value) => { let _ = write!(table, " {} |", value); },
            }
        }
        table.push('\n');
    }
    table
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::base::tests::record;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 9, 0, 5).unwrap()
    }

    #[test]
    fn renders_summary_lines() {
        let table = SnapshotTable::new(vec![
            record("Alpha", 1.0, -5.0),
            record("Beta", 2.0, 0.0),
            record("Gamma", 3.0, 10.0),
        ]);
        let report = render_report(&Analysis::new(&table), &now());

        assert!(report.starts_with("# Cryptocurrency Market Analysis Report\nGenerated on: 2024-05-01 09:00:05\n"));
        assert!(report.contains("## Top 5 Cryptocurrencies by Market Cap\n|    | Name | Symbol | Price (USD) |"));
        assert!(report.contains("|  2 | Gamma | gamma | 3 | 3000 | 30 | 10 |\n"));
        assert!(report.contains("- Average Price: $2.00\n"));
        assert!(report.contains("- Highest 24h Change: Gamma (10.00%)\n"));
        assert!(report.contains("- Lowest 24h Change: Alpha (-5.00%)\n"));
    }

    #[test]
    fn table_lists_at_most_five_rows() {
        let table = SnapshotTable::new((0..7).map(|i| record(&format!("Coin{}", i), 1.0, 0.0)).collect());
        let rendered = markdown_table(Analysis::new(&table).top_5_by_market_cap);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[1], "|---:|:---|:---|---:|---:|---:|---:|");
        assert!(lines[6].starts_with("|  4 | Coin4 |"));
    }

    #[test]
    fn empty_snapshot_report() {
        let table = SnapshotTable::default();
        let report = render_report(&Analysis::new(&table), &now());
        assert!(report.contains("- Average Price: $NaN\n"));
        assert!(report.contains("- Highest 24h Change: n/a\n"));
        assert!(report.contains("- Lowest 24h Change: n/a\n"));
    }

    #[test]
    fn publish_overwrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = ReportSink::new(dir.path().join("report.md"));

        let first = SnapshotTable::new(vec![record("Alpha", 1.0, 1.0), record("Beta", 2.0, 2.0)]);
        sink.publish(&first, &Analysis::new(&first), now()).unwrap();
        let second = SnapshotTable::new(vec![record("Gamma", 4.0, 3.0)]);
        sink.publish(&second, &Analysis::new(&second), now()).unwrap();

        let contents = fs::read_to_string(sink.path()).unwrap();
        assert!(contents.contains("Gamma"));
        assert!(!contents.contains("Alpha"));
        assert_eq!(contents.matches("# Cryptocurrency Market Analysis Report").count(), 1);
    }
}
