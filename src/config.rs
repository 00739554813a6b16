use std::path::PathBuf;
use std::time::Duration;

pub const API_ADDRESS: &str = "https://api.coingecko.com/api/v3/coins/markets";
pub const WORKBOOK_PATH: &str = "crypto_analysis.xlsx";
pub const REPORT_PATH: &str = "crypto_analysis_report.md";
pub const UPDATE_INTERVAL_SECS: u64 = 300;

/// Fixed query sent to the markets endpoint
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarketQuery {
    pub vs_currency: String,
    pub order: String,
    pub per_page: u32,
    pub page: u32,
    pub sparkline: bool,
}

impl Default for MarketQuery {
    fn default() -> Self {
        MarketQuery {
            vs_currency: "usd".to_owned(),
            order: "market_cap_desc".to_owned(),
            per_page: 50,
            page: 1,
            sparkline: false,
        }
    }
}

impl MarketQuery {
    pub fn pairs(&self) -> [(&'static str, String); 5] {
        [
            ("vs_currency", self.vs_currency.clone()),
            ("order", self.order.clone()),
            ("per_page", self.per_page.to_string()),
            ("page", self.page.to_string()),
            ("sparkline", self.sparkline.to_string()),
        ]
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub api_address: String,
    pub query: MarketQuery,
    pub workbook_path: PathBuf,
    pub report_path: PathBuf,
    pub update_interval: Duration,
    /// Attempts per cycle; 1 leaves retrying to the next cycle
    pub retry_limit: u64,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// Stop after this many cycles; run forever when unset
    pub max_cycles: Option<u64>,
    /// Replay provider responses from a JSON-lines file instead of the network
    pub replay_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_address: API_ADDRESS.to_owned(),
            query: MarketQuery::default(),
            workbook_path: PathBuf::from(WORKBOOK_PATH),
            report_path: PathBuf::from(REPORT_PATH),
            update_interval: Duration::from_secs(UPDATE_INTERVAL_SECS),
            retry_limit: 1,
            connect_timeout: Duration::from_secs(15), // fairly generous connect and read timeouts
            read_timeout: Duration::from_secs(15),
            max_cycles: None,
            replay_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_query_pairs() {
        let pairs = MarketQuery::default().pairs();
        assert_eq!(pairs[0], ("vs_currency", "usd".to_owned()));
        assert_eq!(pairs[1], ("order", "market_cap_desc".to_owned()));
        assert_eq!(pairs[2], ("per_page", "50".to_owned()));
        assert_eq!(pairs[3], ("page", "1".to_owned()));
        assert_eq!(pairs[4], ("sparkline", "false".to_owned()));
    }

    #[test]
    fn defaults_match_single_retry_five_minute_loop() {
        let config = Config::default();
        assert_eq!(config.update_interval, Duration::from_secs(300));
        assert_eq!(config.retry_limit, 1);
        assert_eq!(config.workbook_path, PathBuf::from("crypto_analysis.xlsx"));
        assert_eq!(config.report_path, PathBuf::from("crypto_analysis_report.md"));
        assert!(config.max_cycles.is_none());
    }
}
