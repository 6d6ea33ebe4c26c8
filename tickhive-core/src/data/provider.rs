//! Market data provider trait and structured error types.
//!
//! The MarketDataProvider trait abstracts over quote/candle vendors
//! (Finnhub, TDAmeritrade, Polygon, IEXCloud) so the strategy and exporter
//! can swap vendors and tests can mock them.

use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;

use crate::domain::Frequency;

/// Structured error types for vendor data operations.
#[derive(Debug, Error)]
pub enum DataError {
    /// HTTP failure, connect/timeout, or a non-success status with no more
    /// specific meaning. The exporter absorbs these per window; the strategy
    /// treats them as fatal for the run.
    #[error("vendor transport error: {0}")]
    Transport(String),

    #[error("rate limited by vendor (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    /// Parallel-array response with unequal column lengths. Fatal for the
    /// whole response: nothing partially emits.
    #[error("response shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A required field is absent. For row-style responses this is raised
    /// per record and the surrounding records still emit.
    #[error("missing field '{field}' in vendor response")]
    MissingField { field: &'static str },

    #[error("{vendor} does not support {frequency} candles")]
    UnsupportedInterval {
        vendor: &'static str,
        frequency: Frequency,
    },

    #[error("{vendor} does not provide {operation}")]
    Unsupported {
        vendor: &'static str,
        operation: &'static str,
    },

    #[error("failed to parse vendor response: {0}")]
    Parse(String),
}

/// Delayed quote for one symbol: the day's open plus the latest price and
/// previous close, as served by the vendor's quote endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub symbol: String,
    pub open: f64,
    pub high: f64,
    pub low: Option<f64>,
    pub latest_price: f64,
    pub prev_close: f64,
    /// Quote time, canonical epoch seconds.
    pub ts: i64,
}

/// Unit of the timestamps in a vendor candle response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampUnit {
    Seconds,
    Milliseconds,
}

impl TimestampUnit {
    /// Convert a vendor timestamp in this unit to canonical seconds.
    pub fn to_seconds(self, ts: i64) -> i64 {
        match self {
            TimestampUnit::Seconds => ts,
            TimestampUnit::Milliseconds => ts / 1000,
        }
    }
}

/// One element of a row-style (list of objects) candle response.
///
/// Every field is optional at this layer: the normalizer decides which
/// absences drop the row (warn) and which are tolerated (`low`).
#[derive(Debug, Clone, PartialEq)]
pub struct CandleRow {
    pub ts: Option<i64>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<u64>,
}

/// Vendor-shaped candle payload, before normalization.
///
/// Two shapes exist in the wild: parallel column arrays (Finnhub) and a
/// list of candle objects (TDAmeritrade, Polygon). Each response carries
/// the vendor's timestamp unit so the normalizer can store canonical
/// seconds without per-vendor knowledge.
#[derive(Debug, Clone, PartialEq)]
pub enum CandleResponse {
    Columns {
        unit: TimestampUnit,
        t: Vec<i64>,
        o: Vec<f64>,
        h: Vec<f64>,
        l: Option<Vec<f64>>,
        c: Vec<f64>,
        v: Vec<u64>,
    },
    Rows {
        unit: TimestampUnit,
        rows: Vec<CandleRow>,
    },
}

impl CandleResponse {
    /// Number of raw elements before normalization.
    pub fn len(&self) -> usize {
        match self {
            CandleResponse::Columns { t, .. } => t.len(),
            CandleResponse::Rows { rows, .. } => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Trait for market data vendors.
///
/// `stock_candles` returns `Ok(None)` for a clean no-data window (market
/// holiday, weekend); errors are reserved for transport and shape problems.
pub trait MarketDataProvider {
    /// Vendor name for logs and error messages.
    fn name(&self) -> &'static str;

    /// Minimum pause between consecutive requests to this vendor, derived
    /// from its published rate limit.
    fn pace_interval(&self) -> Duration;

    /// Latest relevant price for one symbol.
    fn latest_price(&self, symbol: &str) -> Result<f64, DataError>;

    /// Latest prices for a basket, keyed by symbol.
    fn latest_prices(&self, symbols: &[String]) -> Result<HashMap<String, f64>, DataError> {
        let mut prices = HashMap::with_capacity(symbols.len());
        for symbol in symbols {
            prices.insert(symbol.clone(), self.latest_price(symbol)?);
        }
        Ok(prices)
    }

    /// Delayed quote: open, latest price, previous close.
    fn quote(&self, symbol: &str) -> Result<Quote, DataError>;

    /// Percent change of the latest price against the previous close,
    /// e.g. 5.0 for a 5% move.
    fn change_pct_prev_day(&self, symbol: &str) -> Result<f64, DataError>;

    /// Candles for `[from, to]` (epoch seconds) at `frequency`.
    fn stock_candles(
        &self,
        symbol: &str,
        from: i64,
        to: i64,
        frequency: Frequency,
    ) -> Result<Option<CandleResponse>, DataError>;
}
