use std::ops::Index;
use std::slice::Iter;

/// One asset in a snapshot, already projected from the provider's record
#[derive(Clone, Debug, PartialEq)]
pub struct MarketRecord {
    pub name: String,
    pub symbol: String,
    pub price: f64,
    pub market_cap: f64,
    pub volume_24h: f64,
    pub change_24h_pct: f64,
}

impl MarketRecord {
    pub const NAME: &'static str = "Name";
    pub const SYMBOL: &'static str = "Symbol";
    pub const PRICE: &'static str = "Price (USD)";
    pub const MARKET_CAP: &'static str = "Market Cap";
    pub const VOLUME_24H: &'static str = "24h Volume";
    pub const CHANGE_24H_PCT: &'static str = "24h Change %";

    /// Display labels, in column order
    pub const COLUMNS: [&'static str; 6] = [
        Self::NAME,
        Self::SYMBOL,
        Self::PRICE,
        Self::MARKET_CAP,
        Self::VOLUME_24H,
        Self::CHANGE_24H_PCT,
    ];

    pub fn cells(&self) -> [Cell<'_>; 6] {
        [
            Cell::Text(&self.name),
            Cell::Text(&self.symbol),
            Cell::Number(self.price),
            Cell::Number(self.market_cap),
            Cell::Number(self.volume_24h),
            Cell::Number(self.change_24h_pct),
        ]
    }
}

/// A single table cell, borrowed from a record
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Cell<'a> {
    Text(&'a str),
    Number(f64),
}

/// The records returned by one fetch, in provider order (market cap descending)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SnapshotTable {
    rows: Vec<MarketRecord>,
}

impl SnapshotTable {
    pub fn new(rows: Vec<MarketRecord>) -> Self {
        SnapshotTable { rows }
    }

    pub fn rows(&self) -> &[MarketRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, MarketRecord> {
        self.rows.iter()
    }
}

impl Index<usize> for SnapshotTable {
    type Output = MarketRecord;

    fn index(&self, idx: usize) -> &MarketRecord {
        &self.rows[idx]
    }
}

impl<'a> IntoIterator for &'a SnapshotTable {
    type Item = &'a MarketRecord;
    type IntoIter = Iter<'a, MarketRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
