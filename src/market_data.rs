use serde_json::Value;

pub mod api_parser;
pub mod reader;

pub use api_parser::{MarketDataError, MarketDataErrorKind, MarketDataResult};
pub use reader::{MarketDataLive, MarketDataSimJson};

/// Raw provider record, keyed as in the source JSON
pub type RawRecord = serde_json::map::Map<String, Value>;

/// Source of raw market snapshots.
///
/// `Ok(None)` means the provider has nothing more to give; a live provider
/// never returns it.
pub trait MarketDataProvider {
    fn fetch_market_data(&mut self) -> MarketDataResult;
}

impl<P: MarketDataProvider + ?Sized> MarketDataProvider for Box<P> {
    fn fetch_market_data(&mut self) -> MarketDataResult {
        (**self).fetch_market_data()
    }
}
