//! Historical exporter — drives windowed candle pulls into record sinks.
//!
//! Per (symbol, frequency) pair: Init → Fetch → Normalize+Emit → Advance,
//! repeating until the window end catches up with the wall clock. A no-data
//! window and a transport error both log and advance — the window never
//! stalls and a failed fetch never aborts the whole export. Pairs are
//! processed to completion one after another; staying under vendor rate
//! limits needs no scheduler that way.

use tracing::{info, warn};

use super::pacer::{FixedDelayPacer, Pacer};
use super::sink::{ExportError, SinkFactory};
use super::window::ExportWindow;
use crate::data::{normalize, DataError, MarketDataProvider};
use crate::domain::Frequency;

/// Attempts per window on HTTP 429, on top of the preventive pacing. Kept
/// small so retries can never starve the pause-based limiting.
const MAX_RATE_LIMIT_RETRIES: u32 = 2;

/// Outcome counters for one export run.
#[derive(Debug, Default)]
pub struct ExportSummary {
    pub windows_fetched: usize,
    pub candles_written: usize,
    pub no_data_windows: usize,
    /// (symbol, frequency, error) for windows that failed and were skipped.
    pub errors: Vec<(String, Frequency, String)>,
}

impl ExportSummary {
    pub fn clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Windowed candle exporter over one vendor.
pub struct Exporter<'a> {
    provider: &'a dyn MarketDataProvider,
    pacer: Box<dyn Pacer + 'a>,
}

impl<'a> Exporter<'a> {
    /// Exporter paced by the vendor's own published interval.
    pub fn new(provider: &'a dyn MarketDataProvider) -> Self {
        Self {
            provider,
            pacer: Box::new(FixedDelayPacer::new(provider.pace_interval())),
        }
    }

    /// Exporter with an injected pacer (tests, shared per-vendor limiter).
    pub fn with_pacer(provider: &'a dyn MarketDataProvider, pacer: Box<dyn Pacer + 'a>) -> Self {
        Self { provider, pacer }
    }

    /// Export every (symbol, frequency) pair from `start` until the window
    /// reaches the current wall clock.
    pub fn export(
        &self,
        sinks: &dyn SinkFactory,
        symbols: &[String],
        frequencies: &[Frequency],
        start: i64,
        end: i64,
    ) -> Result<ExportSummary, ExportError> {
        self.export_at(sinks, symbols, frequencies, start, end, chrono::Utc::now().timestamp())
    }

    /// Same as [`export`](Self::export) with an explicit "now", which is
    /// captured once so a long run terminates on the clock it started with.
    pub fn export_at(
        &self,
        sinks: &dyn SinkFactory,
        symbols: &[String],
        frequencies: &[Frequency],
        start: i64,
        end: i64,
        now: i64,
    ) -> Result<ExportSummary, ExportError> {
        let mut summary = ExportSummary::default();
        for symbol in symbols {
            for &frequency in frequencies {
                self.export_pair(sinks, symbol, frequency, start, end, now, &mut summary)?;
            }
        }
        info!(
            windows = summary.windows_fetched,
            candles = summary.candles_written,
            errors = summary.errors.len(),
            "export finished"
        );
        Ok(summary)
    }

    fn export_pair(
        &self,
        sinks: &dyn SinkFactory,
        symbol: &str,
        frequency: Frequency,
        start: i64,
        end: i64,
        now: i64,
        summary: &mut ExportSummary,
    ) -> Result<(), ExportError> {
        let mut sink = sinks.open(symbol, frequency)?;
        let mut window = ExportWindow::new(start, end);
        // strictly-increasing guard: drops duplicates from overlapping windows
        let mut last_ts: Option<i64> = None;

        loop {
            self.pacer.pace();
            summary.windows_fetched += 1;

            match self.fetch_window(symbol, frequency, &window) {
                Ok(Some(response)) => match normalize(response, symbol, frequency) {
                    Ok(candles) => {
                        for candle in candles {
                            if last_ts.is_some_and(|last| candle.ts <= last) {
                                continue;
                            }
                            last_ts = Some(candle.ts);
                            sink.append(&candle)?;
                            summary.candles_written += 1;
                        }
                    }
                    Err(e) => {
                        warn!(symbol, %frequency, error = %e, "rejected vendor response");
                        summary
                            .errors
                            .push((symbol.to_string(), frequency, e.to_string()));
                    }
                },
                Ok(None) => {
                    info!(symbol, %frequency, from = window.from, "no data for window");
                    summary.no_data_windows += 1;
                }
                Err(
                    e @ (DataError::UnsupportedInterval { .. } | DataError::Unsupported { .. }),
                ) => {
                    // every further window would fail identically
                    warn!(symbol, %frequency, error = %e, "skipping pair");
                    summary
                        .errors
                        .push((symbol.to_string(), frequency, e.to_string()));
                    break;
                }
                Err(e) => {
                    warn!(symbol, %frequency, from = window.from, error = %e, "fetch failed, advancing");
                    summary
                        .errors
                        .push((symbol.to_string(), frequency, e.to_string()));
                }
            }

            window.advance();
            if window.is_done(now) {
                break;
            }
        }

        sink.flush()
    }

    /// One window fetch with a bounded retry on 429. Every retry goes back
    /// through the pacer, so the minimum inter-request interval holds even
    /// while retrying.
    fn fetch_window(
        &self,
        symbol: &str,
        frequency: Frequency,
        window: &ExportWindow,
    ) -> Result<Option<crate::data::CandleResponse>, DataError> {
        let mut attempt = 0;
        loop {
            match self
                .provider
                .stock_candles(symbol, window.from, window.to, frequency)
            {
                Err(DataError::RateLimited { retry_after_secs })
                    if attempt < MAX_RATE_LIMIT_RETRIES =>
                {
                    attempt += 1;
                    warn!(
                        symbol,
                        attempt, retry_after_secs, "rate limited, retrying after pace"
                    );
                    self.pacer.pace();
                }
                other => return other,
            }
        }
    }
}
