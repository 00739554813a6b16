use crate::base::{MarketRecord, SnapshotTable};

pub const TOP_N: usize = 5;

/// A row of the snapshot together with its position in the table
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RankedRecord<'a> {
    pub index: usize,
    pub record: &'a MarketRecord,
}

/// Summary views over one snapshot table
#[derive(Clone, Debug, PartialEq)]
pub struct Analysis<'a> {
    pub top_5_by_market_cap: &'a [MarketRecord],
    pub average_price: f64,
    pub highest_24h_change: Option<RankedRecord<'a>>,
    pub lowest_24h_change: Option<RankedRecord<'a>>,
}

impl<'a> Analysis<'a> {
    pub fn new(table: &'a SnapshotTable) -> Self {
        Analysis {
            top_5_by_market_cap: top_5_by_market_cap(table),
            average_price: average_price(table),
            highest_24h_change: highest_24h_change(table),
            lowest_24h_change: lowest_24h_change(table),
        }
    }
}

/// The table is already in market cap order, so this is its head.
pub fn top_5_by_market_cap(table: &SnapshotTable) -> &[MarketRecord] {
    let rows = table.rows();
    &rows[..rows.len().min(TOP_N)]
}

/// Mean price over rows with a price; NaN if there are none.
pub fn average_price(table: &SnapshotTable) -> f64 {
    let (sum, count) = table.iter()
        .map(|record| record.price)
        .filter(|price| !price.is_nan())
        .fold((0.0, 0usize), |(sum, count), price| (sum + price, count + 1));

    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

pub fn highest_24h_change(table: &SnapshotTable) -> Option<RankedRecord<'_>> {
    extreme_by_change(table, |candidate, best| candidate > best)
}

pub fn lowest_24h_change(table: &SnapshotTable) -> Option<RankedRecord<'_>> {
    extreme_by_change(table, |candidate, best| candidate < best)
}

/// First row whose change beats every other under `better`; NaN rows never win.
fn extreme_by_change<F>(table: &SnapshotTable, better: F) -> Option<RankedRecord<'_>>
where
    F: Fn(f64, f64) -> bool,
{
    let mut best: Option<RankedRecord<'_>> = None;
    for (index, record) in table.iter().enumerate() {
        if record.change_24h_pct.is_nan() {
            continue;
        }
        match best {
            Some(current) if !better(record.change_24h_pct, current.record.change_24h_pct) => {}
            _ => best = Some(RankedRecord { index, record }),
        }
    }
    best
}
