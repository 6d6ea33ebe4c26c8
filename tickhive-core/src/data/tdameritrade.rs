//! TDAmeritrade data adapter.
//!
//! Wraps the `pricehistory` endpoint. Responses are row-style (a list of
//! candle objects) with millisecond timestamps, and an `empty` flag marks a
//! clean no-data window. Published limit is 120 calls/minute.
//!
//! Quotes and latest prices come from other vendors; this adapter only
//! serves historical candles.

use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use super::provider::{
    CandleResponse, CandleRow, DataError, MarketDataProvider, Quote, TimestampUnit,
};
use crate::domain::Frequency;

const DEFAULT_BASE_URL: &str = "https://api.tdameritrade.com/v1";
const PACE_INTERVAL: Duration = Duration::from_millis(600);

#[derive(Debug, Deserialize)]
struct PriceHistoryResponse {
    #[serde(default)]
    candles: Vec<RawCandle>,
    empty: bool,
}

/// One candle object. Fields stay optional so a drifted response degrades
/// to per-row drops in the normalizer instead of a deserialization abort.
#[derive(Debug, Deserialize)]
struct RawCandle {
    datetime: Option<i64>,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    volume: Option<u64>,
}

/// Blocking TDAmeritrade client.
pub struct TdaClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl TdaClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

impl MarketDataProvider for TdaClient {
    fn name(&self) -> &'static str {
        "tdameritrade"
    }

    fn pace_interval(&self) -> Duration {
        PACE_INTERVAL
    }

    fn latest_price(&self, _symbol: &str) -> Result<f64, DataError> {
        Err(DataError::Unsupported {
            vendor: "tdameritrade",
            operation: "latest_price",
        })
    }

    fn quote(&self, _symbol: &str) -> Result<Quote, DataError> {
        Err(DataError::Unsupported {
            vendor: "tdameritrade",
            operation: "quote",
        })
    }

    fn change_pct_prev_day(&self, _symbol: &str) -> Result<f64, DataError> {
        Err(DataError::Unsupported {
            vendor: "tdameritrade",
            operation: "change_pct_prev_day",
        })
    }

    fn stock_candles(
        &self,
        symbol: &str,
        from: i64,
        to: i64,
        frequency: Frequency,
    ) -> Result<Option<CandleResponse>, DataError> {
        let tda = frequency.to_tda().ok_or(DataError::UnsupportedInterval {
            vendor: "tdameritrade",
            frequency,
        })?;

        let url = format!("{}/marketdata/{symbol}/pricehistory", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("frequencyType", tda.frequency_type),
            ])
            .query(&[("frequency", tda.frequency)])
            .query(&[
                // pricehistory takes milliseconds since epoch
                ("startDate", from * 1000),
                ("endDate", to * 1000),
            ])
            .query(&[("needExtendedHoursData", false)])
            .send()
            .map_err(|e| DataError::Transport(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DataError::RateLimited {
                retry_after_secs: 60,
            });
        }
        if status == reqwest::StatusCode::BAD_REQUEST {
            // the endpoint rejects some (frequencyType, frequency) pairs
            warn!(symbol, %frequency, "pricehistory rejected frequency combination");
            return Err(DataError::UnsupportedInterval {
                vendor: "tdameritrade",
                frequency,
            });
        }
        if !status.is_success() {
            return Err(DataError::Transport(format!(
                "HTTP {status} for pricehistory {symbol}"
            )));
        }

        let history: PriceHistoryResponse =
            response.json().map_err(|e| DataError::Parse(e.to_string()))?;

        if history.empty {
            return Ok(None);
        }

        let rows = history
            .candles
            .into_iter()
            .map(|c| CandleRow {
                ts: c.datetime,
                open: c.open,
                high: c.high,
                low: c.low,
                close: c.close,
                volume: c.volume,
            })
            .collect();

        Ok(Some(CandleResponse::Rows {
            unit: TimestampUnit::Milliseconds,
            rows,
        }))
    }
}
