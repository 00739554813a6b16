use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tracing::{error, info, warn};

use crate::analysis::Analysis;
use crate::base::SnapshotTable;
use crate::market_data::{MarketDataError, MarketDataErrorKind, MarketDataProvider};
use crate::publish::{format_timestamp, SnapshotSink};

#[derive(Debug)]
pub enum CycleOutcome {
    /// Snapshot built and handed to every sink; `failed_sinks` names the ones that errored
    Published { rows: usize, failed_sinks: Vec<&'static str> },
    /// Fetch or table build failed; no sink was touched
    Skipped(MarketDataError),
    /// The provider has no more data
    Exhausted,
}

/// One fetch, build, summarize, publish pass. Never panics on bad data and
/// never lets one sink's failure stop another. `clock` is read once the
/// snapshot is built, so output stamps reflect write time.
pub fn run_cycle<P, C>(provider: &mut P, sinks: &mut [Box<dyn SnapshotSink>], clock: C) -> CycleOutcome
where
    P: MarketDataProvider + ?Sized,
    C: FnOnce() -> DateTime<Local>,
{
    let records = match provider.fetch_market_data() {
        Ok(Some(records)) if records.is_empty() => {
            let err = MarketDataError(MarketDataErrorKind::EmptyResponse);
            warn!(%err, "keeping previous outputs");
            return CycleOutcome::Skipped(err);
        }
        Ok(Some(records)) => records,
        Ok(None) => return CycleOutcome::Exhausted,
        Err(err) => {
            error!(%err, "error fetching data");
            return CycleOutcome::Skipped(err);
        }
    };

    let table = match SnapshotTable::from_raw(&records) {
        Ok(table) => table,
        Err(err) => {
            error!(%err, "malformed market data");
            return CycleOutcome::Skipped(err);
        }
    };
    let analysis = Analysis::new(&table);
    let now = clock();

    let mut failed_sinks = Vec::new();
    for sink in sinks.iter_mut() {
        if let Err(err) = sink.publish(&table, &analysis, now) {
            error!(sink = sink.name(), %err, "error updating sink");
            failed_sinks.push(sink.name());
        }
    }

    if failed_sinks.is_empty() {
        info!(rows = table.len(), "data updated successfully");
    }
    CycleOutcome::Published { rows: table.len(), failed_sinks }
}

/// Drives cycles at a fixed period measured from each cycle's start
pub struct Scheduler {
    interval: Duration,
    max_cycles: Option<u64>,
}

impl Scheduler {
    pub fn new(interval: Duration, max_cycles: Option<u64>) -> Self {
        Scheduler { interval, max_cycles }
    }

    /// Runs until the cycle limit is hit or a cycle reports the provider
    /// exhausted. Returns the number of cycles run.
    pub fn run<F>(&self, mut cycle: F) -> u64
    where
        F: FnMut() -> CycleOutcome,
    {
        let mut loop_counter = 0;
        loop {
            if self.max_cycles.is_some_and(|max| loop_counter >= max) {
                info!(cycles = loop_counter, "cycle limit reached");
                break loop_counter;
            }

            let loop_start = Instant::now();
            info!(at = %format_timestamp(&Local::now()), "fetching data");
            let outcome = cycle();
            loop_counter += 1;

            if let CycleOutcome::Exhausted = outcome {
                info!(cycles = loop_counter, "market data exhausted");
                break loop_counter;
            }
            if self.max_cycles.is_some_and(|max| loop_counter >= max) {
                continue;
            }

            match self.interval.checked_sub(loop_start.elapsed()) {
                Some(sleep_time) => thread::sleep(sleep_time),
                None => warn!("falling behind the update interval"),
            }
        }
    }
}
