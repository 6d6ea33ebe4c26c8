//! Polygon data adapter.
//!
//! The free tier serves daily data only: market status, upcoming holidays,
//! and the grouped-daily aggregate for all US stocks. Candles are answered
//! from the grouped endpoint, one date per call, which fits the exporter's
//! one-day windows. Published limit is 1 call/second.

use std::time::Duration;

use chrono::DateTime;
use serde::Deserialize;

use super::provider::{
    CandleResponse, CandleRow, DataError, MarketDataProvider, Quote, TimestampUnit,
};
use crate::domain::Frequency;

const DEFAULT_BASE_URL: &str = "https://api.polygon.io";
const PACE_INTERVAL: Duration = Duration::from_millis(1_100);

/// Current status of an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketStatus {
    Open,
    ExtendedHours,
    Closed,
}

#[derive(Debug, Deserialize)]
struct MarketStatusResponse {
    exchanges: ExchangeStatuses,
}

#[derive(Debug, Deserialize)]
struct ExchangeStatuses {
    nasdaq: String,
    nyse: String,
}

#[derive(Debug, Deserialize)]
struct UpcomingHoliday {
    exchange: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroupedDailyResponse {
    #[serde(default)]
    results: Vec<GroupedAggregate>,
    #[serde(rename = "resultsCount", default)]
    results_count: usize,
}

/// One aggregate from the grouped-daily endpoint. `t` is milliseconds.
#[derive(Debug, Deserialize)]
struct GroupedAggregate {
    #[serde(rename = "T")]
    ticker: String,
    t: Option<i64>,
    o: Option<f64>,
    h: Option<f64>,
    l: Option<f64>,
    c: Option<f64>,
    v: Option<f64>,
}

/// Blocking Polygon client.
pub struct PolygonClient {
    client: reqwest::blocking::Client,
    base_url: String,
    token: String,
}

impl PolygonClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, DataError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(&[("apiKey", self.token.as_str())])
            .send()
            .map_err(|e| DataError::Transport(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DataError::RateLimited {
                retry_after_secs: 60,
            });
        }
        if !status.is_success() {
            return Err(DataError::Transport(format!("HTTP {status} for {path}")));
        }

        response.json().map_err(|e| DataError::Parse(e.to_string()))
    }

    /// Current status of NASDAQ or NYSE.
    pub fn market_status(&self, exchange: &str) -> Result<MarketStatus, DataError> {
        let response: MarketStatusResponse = self.get_json("/v1/marketstatus/now")?;
        exchange_status(&response, exchange)
    }

    /// Whether `date` (YYYY-MM-DD) is a holiday on the given exchange.
    pub fn is_market_holiday(&self, exchange: &str, date: &str) -> Result<bool, DataError> {
        let holidays: Vec<UpcomingHoliday> = self.get_json("/v1/marketstatus/upcoming")?;
        Ok(holiday_on(&holidays, exchange, date))
    }
}

fn exchange_status(
    response: &MarketStatusResponse,
    exchange: &str,
) -> Result<MarketStatus, DataError> {
    let raw = match exchange {
        "NASDAQ" => &response.exchanges.nasdaq,
        "NYSE" => &response.exchanges.nyse,
        other => {
            return Err(DataError::Parse(format!("unknown exchange '{other}'")));
        }
    };
    match raw.as_str() {
        "open" => Ok(MarketStatus::Open),
        "extended-hours" => Ok(MarketStatus::ExtendedHours),
        "closed" => Ok(MarketStatus::Closed),
        other => Err(DataError::Parse(format!("unknown market status '{other}'"))),
    }
}

fn holiday_on(holidays: &[UpcomingHoliday], exchange: &str, date: &str) -> bool {
    holidays
        .iter()
        .any(|h| h.exchange.as_deref() == Some(exchange) && h.date.as_deref() == Some(date))
}

impl MarketDataProvider for PolygonClient {
    fn name(&self) -> &'static str {
        "polygon"
    }

    fn pace_interval(&self) -> Duration {
        PACE_INTERVAL
    }

    fn latest_price(&self, _symbol: &str) -> Result<f64, DataError> {
        Err(DataError::Unsupported {
            vendor: "polygon",
            operation: "latest_price",
        })
    }

    fn quote(&self, _symbol: &str) -> Result<Quote, DataError> {
        Err(DataError::Unsupported {
            vendor: "polygon",
            operation: "quote",
        })
    }

    fn change_pct_prev_day(&self, _symbol: &str) -> Result<f64, DataError> {
        Err(DataError::Unsupported {
            vendor: "polygon",
            operation: "change_pct_prev_day",
        })
    }

    fn stock_candles(
        &self,
        symbol: &str,
        from: i64,
        _to: i64,
        frequency: Frequency,
    ) -> Result<Option<CandleResponse>, DataError> {
        frequency
            .to_polygon()
            .ok_or(DataError::UnsupportedInterval {
                vendor: "polygon",
                frequency,
            })?;

        let date = DateTime::from_timestamp(from, 0)
            .map(|dt| dt.date_naive().format("%Y-%m-%d").to_string())
            .ok_or_else(|| DataError::Parse(format!("invalid window start {from}")))?;

        let response: GroupedDailyResponse =
            self.get_json(&format!("/v2/aggs/grouped/locale/US/market/STOCKS/{date}"))?;

        if response.results_count == 0 {
            return Ok(None);
        }

        let row = response
            .results
            .into_iter()
            .find(|agg| agg.ticker == symbol)
            .map(|agg| CandleRow {
                ts: agg.t,
                open: agg.o,
                high: agg.h,
                low: agg.l,
                close: agg.c,
                volume: agg.v.map(|v| v as u64),
            });

        match row {
            Some(row) => Ok(Some(CandleResponse::Rows {
                unit: TimestampUnit::Milliseconds,
                rows: vec![row],
            })),
            None => Ok(None),
        }
    }
}
