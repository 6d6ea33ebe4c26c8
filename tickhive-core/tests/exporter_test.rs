//! Exporter state-machine tests: fetch/pace counts, no-data handling,
//! dedup across overlapping windows, bounded 429 retries.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use tickhive_core::data::{
    CandleResponse, DataError, MarketDataProvider, Quote, TimestampUnit,
};
use tickhive_core::domain::Frequency;
use tickhive_core::export::window::DAY_STRIDE_SECS;
use tickhive_core::export::{Exporter, MemorySinkFactory, Pacer};

/// Pacer that counts calls instead of sleeping.
#[derive(Default)]
struct RecordingPacer {
    calls: Rc<Cell<usize>>,
}

impl Pacer for RecordingPacer {
    fn pace(&self) {
        self.calls.set(self.calls.get() + 1);
    }
}

type WindowResult = Result<Option<CandleResponse>, DataError>;

/// Provider serving a scripted result per fetched window.
struct ScriptedProvider {
    script: RefCell<Vec<WindowResult>>,
    fetched_windows: RefCell<Vec<(i64, i64)>>,
}

impl ScriptedProvider {
    fn new(script: Vec<WindowResult>) -> Self {
        Self {
            script: RefCell::new(script),
            fetched_windows: RefCell::new(Vec::new()),
        }
    }

    fn fetch_count(&self) -> usize {
        self.fetched_windows.borrow().len()
    }
}

impl MarketDataProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn pace_interval(&self) -> Duration {
        Duration::ZERO
    }

    fn latest_price(&self, _symbol: &str) -> Result<f64, DataError> {
        Err(DataError::Unsupported {
            vendor: "scripted",
            operation: "latest_price",
        })
    }

    fn quote(&self, _symbol: &str) -> Result<Quote, DataError> {
        Err(DataError::Unsupported {
            vendor: "scripted",
            operation: "quote",
        })
    }

    fn change_pct_prev_day(&self, _symbol: &str) -> Result<f64, DataError> {
        Err(DataError::Unsupported {
            vendor: "scripted",
            operation: "change_pct_prev_day",
        })
    }

    fn stock_candles(
        &self,
        _symbol: &str,
        from: i64,
        to: i64,
        _frequency: Frequency,
    ) -> Result<Option<CandleResponse>, DataError> {
        self.fetched_windows.borrow_mut().push((from, to));
        let mut script = self.script.borrow_mut();
        if script.is_empty() {
            Ok(None)
        } else {
            script.remove(0)
        }
    }
}

fn columns(ts: &[i64]) -> CandleResponse {
    CandleResponse::Columns {
        unit: TimestampUnit::Seconds,
        t: ts.to_vec(),
        o: vec![10.0; ts.len()],
        h: vec![12.0; ts.len()],
        l: None,
        c: vec![11.0; ts.len()],
        v: vec![100; ts.len()],
    }
}

fn run_export(
    provider: &ScriptedProvider,
    now: i64,
) -> (tickhive_core::export::ExportSummary, usize, MemorySinkFactory) {
    let calls = Rc::new(Cell::new(0));
    let pacer = RecordingPacer {
        calls: Rc::clone(&calls),
    };
    let sinks = MemorySinkFactory::new();
    let exporter = Exporter::with_pacer(provider, Box::new(pacer));
    let summary = exporter
        .export_at(
            &sinks,
            &["SPY".to_string()],
            &[Frequency::Daily],
            0,
            DAY_STRIDE_SECS,
            now,
        )
        .unwrap();
    (summary, calls.get(), sinks)
}

#[test]
fn three_advances_mean_three_fetches_each_paced() {
    let provider = ScriptedProvider::new(vec![]);
    // window end starts at one day; three advances reach 4 days
    let (summary, paces, _) = run_export(&provider, 4 * DAY_STRIDE_SECS);

    assert_eq!(provider.fetch_count(), 3);
    assert_eq!(summary.windows_fetched, 3);
    assert_eq!(paces, 3);
    assert_eq!(
        *provider.fetched_windows.borrow(),
        vec![
            (0, DAY_STRIDE_SECS),
            (DAY_STRIDE_SECS, 2 * DAY_STRIDE_SECS),
            (2 * DAY_STRIDE_SECS, 3 * DAY_STRIDE_SECS),
        ]
    );
}

#[test]
fn no_data_window_advances_without_error() {
    let provider = ScriptedProvider::new(vec![Ok(None), Ok(Some(columns(&[100_000])))]);
    let (summary, _, sinks) = run_export(&provider, 3 * DAY_STRIDE_SECS);

    assert!(summary.clean());
    assert_eq!(summary.no_data_windows, 1);
    assert_eq!(summary.candles_written, 1);
    let store = sinks.store();
    let store = store.lock().unwrap();
    assert_eq!(store[&("SPY".to_string(), Frequency::Daily)].len(), 1);
}

#[test]
fn transport_error_is_absorbed_and_the_window_still_advances() {
    let provider = ScriptedProvider::new(vec![
        Ok(Some(columns(&[1_000]))),
        Err(DataError::Transport("connection reset".into())),
        Ok(Some(columns(&[200_000]))),
    ]);
    let (summary, _, sinks) = run_export(&provider, 4 * DAY_STRIDE_SECS);

    assert_eq!(provider.fetch_count(), 3);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.candles_written, 2);
    let store = sinks.store();
    let store = store.lock().unwrap();
    let candles = &store[&("SPY".to_string(), Frequency::Daily)];
    assert_eq!(candles[0].ts, 1_000);
    assert_eq!(candles[1].ts, 200_000);
}

#[test]
fn overlapping_windows_never_write_duplicate_timestamps() {
    // second window repeats the first window's last candle
    let provider = ScriptedProvider::new(vec![
        Ok(Some(columns(&[1_000, 2_000]))),
        Ok(Some(columns(&[2_000, 90_000]))),
    ]);
    let (summary, _, sinks) = run_export(&provider, 3 * DAY_STRIDE_SECS);

    assert_eq!(summary.candles_written, 3);
    let store = sinks.store();
    let store = store.lock().unwrap();
    let ts: Vec<i64> = store[&("SPY".to_string(), Frequency::Daily)]
        .iter()
        .map(|c| c.ts)
        .collect();
    assert_eq!(ts, vec![1_000, 2_000, 90_000]);
    assert!(ts.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn rate_limit_retries_are_bounded_and_paced() {
    let rate_limited = || {
        Err(DataError::RateLimited {
            retry_after_secs: 1,
        })
    };
    let provider = ScriptedProvider::new(vec![rate_limited(), rate_limited(), rate_limited()]);
    // single window
    let (summary, paces, _) = run_export(&provider, DAY_STRIDE_SECS);

    // one attempt plus two bounded retries, each going through the pacer
    assert_eq!(provider.fetch_count(), 3);
    assert_eq!(paces, 3);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.candles_written, 0);
}

#[test]
fn unsupported_interval_skips_the_pair_after_one_fetch() {
    let provider = ScriptedProvider::new(vec![Err(DataError::UnsupportedInterval {
        vendor: "scripted",
        frequency: Frequency::Min60,
    })]);
    let (summary, _, _) = run_export(&provider, 10 * DAY_STRIDE_SECS);

    assert_eq!(provider.fetch_count(), 1);
    assert_eq!(summary.errors.len(), 1);
}
