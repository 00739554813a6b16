use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use rust_xlsxwriter::{ColNum, RowNum, Workbook, Worksheet, XlsxError};
use tracing::info;

use crate::analysis::{Analysis, RankedRecord};
use crate::base::{Cell, MarketRecord, SnapshotTable};
use super::{format_timestamp, PublishError, SnapshotSink};

pub const DATA_SHEET: &str = "CryptoData";
pub const ANALYSIS_SHEET: &str = "Analysis";

// Cell anchors, zero based (row, col)
const TABLE_ANCHOR: (RowNum, ColNum) = (0, 0); // A1
const TIMESTAMP_ANCHOR: (RowNum, ColNum) = (0, 8); // I1
const TOP_5_LABEL: (RowNum, ColNum) = (0, 0); // A1
const TOP_5_ANCHOR: (RowNum, ColNum) = (1, 0); // A2
const AVERAGE_LABEL: (RowNum, ColNum) = (7, 0); // A8
const AVERAGE_VALUE: (RowNum, ColNum) = (7, 1); // B8
const HIGHEST_LABEL: (RowNum, ColNum) = (9, 0); // A10
const HIGHEST_ANCHOR: (RowNum, ColNum) = (10, 0); // A11
const LOWEST_LABEL: (RowNum, ColNum) = (12, 0); // A13
const LOWEST_ANCHOR: (RowNum, ColNum) = (13, 0); // A14

/// Writes the snapshot into the `CryptoData` and `Analysis` sheets of an xlsx file.
///
/// The workbook is rebuilt in memory and saved whole on every publish, so
/// cells from an earlier snapshot never survive into the next one.
pub struct WorkbookSink {
    path: PathBuf,
}

impl WorkbookSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        WorkbookSink { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the workbook with its two empty sheets when the file is missing
    pub fn ensure_exists(&self) -> Result<bool, PublishError> {
        if self.path.exists() {
            return Ok(false);
        }
        let mut workbook = Workbook::new();
        workbook.add_worksheet().set_name(DATA_SHEET)?;
        workbook.add_worksheet().set_name(ANALYSIS_SHEET)?;
        workbook.save(&self.path)?;
        info!(path = %self.path.display(), "created workbook");
        Ok(true)
    }
}

impl SnapshotSink for WorkbookSink {
    fn name(&self) -> &'static str {
        "workbook"
    }

    fn publish(
        &mut self,
        table: &SnapshotTable,
        analysis: &Analysis<'_>,
        generated_at: DateTime<Local>,
    ) -> Result<(), PublishError> {
        let mut workbook = Workbook::new();

        let data_sheet = workbook.add_worksheet().set_name(DATA_SHEET)?;
        write_data_sheet(data_sheet, table, &generated_at)?;

        let analysis_sheet = workbook.add_worksheet().set_name(ANALYSIS_SHEET)?;
        write_analysis_sheet(analysis_sheet, analysis)?;

        workbook.save(&self.path)?;
        Ok(())
    }
}

fn write_data_sheet(
    sheet: &mut Worksheet,
    table: &SnapshotTable,
    generated_at: &DateTime<Local>,
) -> Result<(), XlsxError> {
    write_frame(sheet, TABLE_ANCHOR, table.iter().enumerate())?;
    sheet.autofit();

    let (row, col) = TIMESTAMP_ANCHOR;
    sheet.write_string(row, col, format!("Last Updated: {}", format_timestamp(generated_at)))?;
    Ok(())
}

fn write_analysis_sheet(sheet: &mut Worksheet, analysis: &Analysis<'_>) -> Result<(), XlsxError> {
    write_label(sheet, TOP_5_LABEL, "Top 5 by Market Cap")?;
    write_frame(sheet, TOP_5_ANCHOR, analysis.top_5_by_market_cap.iter().enumerate())?;

    write_label(sheet, AVERAGE_LABEL, "Average Price (USD)")?;
    write_number(sheet, AVERAGE_VALUE, analysis.average_price)?;

    write_label(sheet, HIGHEST_LABEL, "Highest 24h Change")?;
    write_frame(sheet, HIGHEST_ANCHOR, ranked_rows(analysis.highest_24h_change))?;

    write_label(sheet, LOWEST_LABEL, "Lowest 24h Change")?;
    write_frame(sheet, LOWEST_ANCHOR, ranked_rows(analysis.lowest_24h_change))?;
    Ok(())
}

fn ranked_rows<'a>(ranked: Option<RankedRecord<'a>>) -> impl Iterator<Item = (usize, &'a MarketRecord)> {
    ranked.into_iter().map(|r| (r.index, r.record))
}

fn write_label(sheet: &mut Worksheet, (row, col): (RowNum, ColNum), label: &str) -> Result<(), XlsxError> {
    sheet.write_string(row, col, label)?;
    Ok(())
}

/// Non-finite values have no xlsx representation; the cell stays blank
fn write_number(sheet: &mut Worksheet, (row, col): (RowNum, ColNum), value: f64) -> Result<(), XlsxError> {
    if value.is_finite() {
        sheet.write_number(row, col, value)?;
    }
    Ok(())
}

/// Header row (blank index cell, then the column labels) followed by one
/// line per record, each led by its table index.
fn write_frame<'a, I>(sheet: &mut Worksheet, (row, col): (RowNum, ColNum), rows: I) -> Result<(), XlsxError>
where
    I: Iterator<Item = (usize, &'a MarketRecord)>,
{
    for (offset, label) in MarketRecord::COLUMNS.iter().enumerate() {
        sheet.write_string(row, col + 1 + offset as ColNum, *label)?;
    }

    for (line, (index, record)) in rows.enumerate() {
        let cell_row = row + 1 + line as RowNum;
        sheet.write_number(cell_row, col, index as f64)?;
        for (offset, cell) in record.cells().iter().enumerate() {
            let cell_col = col + 1 + offset as ColNum;
            match *cell {
                Cell::Text(text) => {
                    sheet.write_string(cell_row, cell_col, text)?;
                },
                Cell::Number(value) => write_number(sheet, (cell_row, cell_col), value)?,
            }
        }
    }
    Ok(())
}
