use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::{thread, time};

use serde_json::Value;
use tracing::warn;

use crate::config::{Config, MarketQuery};
use super::api_parser::{self, MarketDataError, MarketDataErrorKind};
use super::{MarketDataProvider, MarketDataResult};

const RETRY_PAUSE_MILLIS: u64 = 1000;

/// Pulls the markets endpoint over HTTP
pub struct MarketDataLive {
    agent: ureq::Agent,
    api_address: String,
    query: MarketQuery,
    retry_limit: u64,
}

impl MarketDataLive {
    pub fn new(config: &Config) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(config.connect_timeout)
            .timeout_read(config.read_timeout)
            .build();
        MarketDataLive {
            agent,
            api_address: config.api_address.clone(),
            query: config.query.clone(),
            retry_limit: config.retry_limit.max(1),
        }
    }
}

impl MarketDataProvider for MarketDataLive {
    fn fetch_market_data(&mut self) -> MarketDataResult {
        let mut attempts = 0;
        loop {
            match api_parser::fetch_api_market_data(&self.agent, &self.api_address, &self.query) {
                Ok(records) => {
                    break Ok(Some(records));
                },
                Err(err) => {
                    attempts += 1;
                    if attempts >= self.retry_limit {
                        break Err(err);
                    }
                    warn!(%err, attempts, "market data fetch failed, retrying in 1 second");
                    thread::sleep(time::Duration::from_millis(RETRY_PAUSE_MILLIS));
                }
            }
        }
    }
}

/// Replays recorded markets responses, one JSON array per line
pub struct MarketDataSimJson {
    data_reader: BufReader<File>,
    line_buffer: String,
}

impl MarketDataSimJson {
    pub fn new<P: AsRef<Path>>(filename: P) -> Result<Self, MarketDataError> {
        let data_file = File::open(filename.as_ref()).map_err(replay_error)?;
        Ok(MarketDataSimJson {
            data_reader: BufReader::new(data_file),
            line_buffer: String::new(),
        })
    }
}

fn replay_error(err: std::io::Error) -> MarketDataError {
    MarketDataError(MarketDataErrorKind::Replay(err.to_string()))
}

impl MarketDataProvider for MarketDataSimJson {
    fn fetch_market_data(&mut self) -> MarketDataResult {
        loop {
            self.line_buffer.clear();
            let bytes_read = self.data_reader.read_line(&mut self.line_buffer).map_err(replay_error)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            if self.line_buffer.trim().is_empty() {
                continue;
            }
            let response = serde_json::from_str::<Value>(&self.line_buffer)
                .map_err(|_err| MarketDataError(MarketDataErrorKind::JsonParseError))?;
            return api_parser::parse_records(response).map(Some);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;

    use super::*;

    const BODY: &str = r#"[{"name":"Bitcoin","symbol":"btc","current_price":67000.0,"market_cap":1.3e12,"total_volume":2.5e10,"price_change_percentage_24h":1.5}]"#;

    /// Answers one request per entry in `responses`, sending back each request line
    fn serve(responses: Vec<(&'static str, &'static str)>) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = format!("http://{}/api/v3/coins/markets", listener.local_addr().unwrap());
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();
                let mut header = String::new();
                while reader.read_line(&mut header).unwrap() > 0 && header != "\r\n" {
                    header.clear();
                }
                let _ = tx.send(request_line);
                write!(
                    stream,
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                ).unwrap();
                stream.flush().unwrap();
            }
        });
        (address, rx)
    }

    fn live(address: String, retry_limit: u64) -> MarketDataLive {
        let config = Config {
            api_address: address,
            retry_limit,
            connect_timeout: time::Duration::from_secs(2),
            read_timeout: time::Duration::from_secs(2),
            ..Config::default()
        };
        MarketDataLive::new(&config)
    }

    #[test]
    fn live_fetch_sends_fixed_query() {
        let (address, requests) = serve(vec![("200 OK", BODY)]);
        let records = live(address, 1).fetch_market_data().unwrap().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["name"], "Bitcoin");

        let request_line = requests.recv().unwrap();
        assert!(request_line.starts_with("GET /api/v3/coins/markets?"));
        for param in ["vs_currency=usd", "order=market_cap_desc", "per_page=50", "page=1", "sparkline=false"] {
            assert!(request_line.contains(param), "missing {} in {}", param, request_line);
        }
    }

    #[test]
    fn live_fetch_reports_error_status() {
        let (address, _requests) = serve(vec![("500 Internal Server Error", "{}")]);
        let err = live(address, 1).fetch_market_data().unwrap_err();
        assert_eq!(err.kind(), &MarketDataErrorKind::APIUnavailable(500));
    }

    #[test]
    fn live_fetch_rejects_non_array_body() {
        let (address, _requests) = serve(vec![("200 OK", r#"{"status":{"error_code":429}}"#)]);
        let err = live(address, 1).fetch_market_data().unwrap_err();
        assert_eq!(err.kind(), &MarketDataErrorKind::JsonParseError);
    }

    #[test]
    fn live_fetch_retries_up_to_limit() {
        let (address, requests) = serve(vec![("503 Service Unavailable", "{}"), ("200 OK", BODY)]);
        let records = live(address, 2).fetch_market_data().unwrap().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(requests.iter().take(2).count(), 2);
    }

    #[test]
    fn live_fetch_transport_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);
        let err = live(address, 1).fetch_market_data().unwrap_err();
        assert!(matches!(err.kind(), MarketDataErrorKind::Transport(_)));
    }

    #[test]
    fn replay_reads_lines_until_exhausted() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", BODY).unwrap();
        writeln!(file).unwrap();
        writeln!(file, "[]").unwrap();
        file.flush().unwrap();

        let mut sim = MarketDataSimJson::new(file.path()).unwrap();
        assert_eq!(sim.fetch_market_data().unwrap().unwrap().len(), 1);
        assert!(sim.fetch_market_data().unwrap().unwrap().is_empty());
        assert!(sim.fetch_market_data().unwrap().is_none());
    }

    #[test]
    fn replay_missing_file() {
        let err = MarketDataSimJson::new("/nonexistent/replay.jsonl").err().unwrap();
        assert!(matches!(err.kind(), MarketDataErrorKind::Replay(_)));
    }
}
