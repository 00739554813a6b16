use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::base::{MarketRecord, SnapshotTable};
use crate::config::MarketQuery;
use crate::market_data::RawRecord;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct MarketDataError(pub MarketDataErrorKind);

impl MarketDataError {
    pub fn new_field_format_error(field: &str) -> Self {
        MarketDataError(MarketDataErrorKind::FieldFormatError(field.to_owned()))
    }

    pub fn kind(&self) -> &MarketDataErrorKind {
        &self.0
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MarketDataErrorKind {
    #[error("field `{0}` unavailable")]
    FieldUnavailable(String),
    #[error("field `{0}` has an unexpected format")]
    FieldFormatError(String),
    #[error("response is not a JSON array of objects")]
    JsonParseError,
    #[error("response contained no markets")]
    EmptyResponse,
    #[error("market data API returned status {0}")]
    APIUnavailable(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("replay source error: {0}")]
    Replay(String),
}

impl From<ureq::Error> for MarketDataError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, _resp) => MarketDataError(MarketDataErrorKind::APIUnavailable(code)),
            ureq::Error::Transport(transport) => {
                MarketDataError(MarketDataErrorKind::Transport(transport.to_string()))
            }
        }
    }
}

pub type MarketDataResult = Result<Option<Vec<RawRecord>>, MarketDataError>;

const NAME: &str = "name";
const SYMBOL: &str = "symbol";
const CURRENT_PRICE: &str = "current_price";
const MARKET_CAP: &str = "market_cap";
const TOTAL_VOLUME: &str = "total_volume";
const PRICE_CHANGE_PCT_24H: &str = "price_change_percentage_24h";

fn get_field<'a>(map: &'a RawRecord, field: &str) -> Result<&'a Value, MarketDataError> {
    map.get(field).ok_or_else(|| MarketDataError(MarketDataErrorKind::FieldUnavailable(field.to_owned())))
}

fn get_f64(map: &RawRecord, field: &str) -> Result<f64, MarketDataError> {
    get_field(map, field)?.as_f64()
        .ok_or_else(|| MarketDataError::new_field_format_error(field))
}

fn get_f64_or_null_val(map: &RawRecord, field: &str, val: f64) -> Result<f64, MarketDataError> {
    get_f64(map, field)
        .or_else(|_err| {
            get_field(map, field)?.as_null().ok_or_else(|| MarketDataError::new_field_format_error(field))
                .map(|_null_val| val)
        })
}

fn get_str<'a>(map: &'a RawRecord, field: &str) -> Result<&'a str, MarketDataError> {
    get_field(map, field)?.as_str()
        .ok_or_else(|| MarketDataError::new_field_format_error(field))
}

fn get_string(map: &RawRecord, field: &str) -> Result<String, MarketDataError> {
    Ok(get_str(map, field)?.to_owned())
}

/// Null numbers come through as NaN, like an empty cell
fn get_record(record: &RawRecord) -> Result<MarketRecord, MarketDataError> {
    Ok(MarketRecord {
        name: get_string(record, NAME)?,
        symbol: get_string(record, SYMBOL)?,
        price: get_f64_or_null_val(record, CURRENT_PRICE, f64::NAN)?,
        market_cap: get_f64_or_null_val(record, MARKET_CAP, f64::NAN)?,
        volume_24h: get_f64_or_null_val(record, TOTAL_VOLUME, f64::NAN)?,
        change_24h_pct: get_f64_or_null_val(record, PRICE_CHANGE_PCT_24H, f64::NAN)?,
    })
}

impl SnapshotTable {
    /// Projects raw provider records onto the six display columns, keeping row order.
    pub fn from_raw(records: &[RawRecord]) -> Result<SnapshotTable, MarketDataError> {
        let rows = records.iter()
            .map(get_record)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SnapshotTable::new(rows))
    }
}

/// Splits a markets response into per-asset records
pub fn parse_records(response: Value) -> Result<Vec<RawRecord>, MarketDataError> {
    let items = match response {
        Value::Array(items) => items,
        _ => return Err(MarketDataError(MarketDataErrorKind::JsonParseError)),
    };

    items.into_iter()
        .map(|item| match item {
            Value::Object(map) => Ok(map),
            _ => Err(MarketDataError(MarketDataErrorKind::JsonParseError)),
        })
        .collect()
}

pub fn fetch_api_market_data(
    agent: &ureq::Agent,
    api_address: &str,
    query: &MarketQuery,
) -> Result<Vec<RawRecord>, MarketDataError> {
    let mut request = agent.get(api_address);
    for (key, value) in query.pairs() {
        request = request.query(key, &value);
    }
    debug!(url = %request.url(), "requesting market data");

    let resp = request.call()?;
    let response: Value = resp.into_json()
        .map_err(|_err| MarketDataError(MarketDataErrorKind::JsonParseError))?;
    parse_records(response)
}
