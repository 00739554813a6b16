use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing::info;

use crypto_snapshot::config::{self, Config};
use crypto_snapshot::cycle::{self, Scheduler};
use crypto_snapshot::market_data::{MarketDataLive, MarketDataProvider, MarketDataSimJson};
use crypto_snapshot::publish::{ReportSink, SnapshotSink, WorkbookSink};

/// Snapshots the top 50 cryptocurrencies into a workbook and a markdown report
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[arg(long, default_value = config::WORKBOOK_PATH)]
    workbook: PathBuf,

    #[arg(long, default_value = config::REPORT_PATH)]
    report: PathBuf,

    #[arg(long, default_value_t = config::UPDATE_INTERVAL_SECS)]
    interval_secs: u64,

    /// Stop after this many cycles
    #[arg(long)]
    cycles: Option<u64>,

    /// Read provider responses from a JSON-lines file instead of the API
    #[arg(long)]
    replay: Option<PathBuf>,

    #[arg(long, default_value = config::API_ADDRESS)]
    api_url: String,

    #[arg(long, default_value_t = 1)]
    retry_limit: u64,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Config {
            api_address: args.api_url,
            workbook_path: args.workbook,
            report_path: args.report,
            update_interval: Duration::from_secs(args.interval_secs),
            retry_limit: args.retry_limit,
            max_cycles: args.cycles,
            replay_path: args.replay,
            ..Config::default()
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from(Args::parse());

    let workbook = WorkbookSink::new(&config.workbook_path);
    workbook.ensure_exists()
        .with_context(|| format!("creating workbook {}", config.workbook_path.display()))?;

    let mut provider: Box<dyn MarketDataProvider> = match &config.replay_path {
        Some(path) => Box::new(
            MarketDataSimJson::new(path).with_context(|| format!("opening replay file {}", path.display()))?,
        ),
        None => Box::new(MarketDataLive::new(&config)),
    };
    let mut sinks: Vec<Box<dyn SnapshotSink>> = vec![
        Box::new(workbook),
        Box::new(ReportSink::new(&config.report_path)),
    ];

    info!(
        workbook = %config.workbook_path.display(),
        report = %config.report_path.display(),
        interval_secs = config.update_interval.as_secs(),
        "starting crypto market snapshots"
    );
    let scheduler = Scheduler::new(config.update_interval, config.max_cycles);
    let cycles = scheduler.run(|| cycle::run_cycle(&mut provider, &mut sinks, Local::now));

    info!(cycles, "finished");
    Ok(())
}
