//! IEXCloud data adapter.
//!
//! Serves latest prices (single and batch) and delayed quotes. IEX derives
//! `latestPrice` from multiple sources and falls back through delayed and
//! previous-close prices, which makes it the preferred vendor for sizing.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use super::provider::{CandleResponse, DataError, MarketDataProvider, Quote};
use crate::domain::Frequency;

const DEFAULT_BASE_URL: &str = "https://cloud.iexapis.com/stable";
const PACE_INTERVAL: Duration = Duration::from_millis(500);

/// IEX `/stock/{symbol}/quote` response (displayPercent=true, so
/// `changePercent` is already in percent).
#[derive(Debug, Deserialize)]
struct IexQuote {
    #[serde(rename = "latestPrice")]
    latest_price: f64,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    #[serde(rename = "previousClose")]
    previous_close: f64,
    #[serde(rename = "changePercent")]
    change_percent: f64,
    #[serde(rename = "latestUpdate")]
    latest_update_ms: i64,
}

#[derive(Debug, Deserialize)]
struct BatchEntry {
    quote: IexQuote,
}

/// Blocking IEXCloud client.
pub struct IexCloudClient {
    client: reqwest::blocking::Client,
    base_url: String,
    token: String,
}

impl IexCloudClient {
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

    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, DataError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("token", self.token.as_str())])
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

    fn fetch_quote(&self, symbol: &str) -> Result<IexQuote, DataError> {
        self.get_json(
            &format!("/stock/{symbol}/quote"),
            &[("displayPercent", "true".to_string())],
        )
    }
}

impl MarketDataProvider for IexCloudClient {
    fn name(&self) -> &'static str {
        "iexcloud"
    }

    fn pace_interval(&self) -> Duration {
        PACE_INTERVAL
    }

    fn latest_price(&self, symbol: &str) -> Result<f64, DataError> {
        Ok(self.fetch_quote(symbol)?.latest_price)
    }

    fn latest_prices(&self, symbols: &[String]) -> Result<HashMap<String, f64>, DataError> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }
        let batch: HashMap<String, BatchEntry> = self.get_json(
            "/stock/market/batch",
            &[
                ("symbols", symbols.join(",")),
                ("types", "quote".to_string()),
                ("displayPercent", "true".to_string()),
            ],
        )?;
        let mut prices = HashMap::with_capacity(symbols.len());
        for symbol in symbols {
            let entry = batch
                .get(symbol)
                .ok_or(DataError::MissingField { field: "quote" })?;
            prices.insert(symbol.clone(), entry.quote.latest_price);
        }
        Ok(prices)
    }

    fn quote(&self, symbol: &str) -> Result<Quote, DataError> {
        let q = self.fetch_quote(symbol)?;
        Ok(Quote {
            symbol: symbol.to_string(),
            open: q.open.ok_or(DataError::MissingField { field: "open" })?,
            high: q.high.unwrap_or(q.latest_price),
            low: q.low,
            latest_price: q.latest_price,
            prev_close: q.previous_close,
            ts: q.latest_update_ms / 1000,
        })
    }

    fn change_pct_prev_day(&self, symbol: &str) -> Result<f64, DataError> {
        Ok(self.fetch_quote(symbol)?.change_percent)
    }

    fn stock_candles(
        &self,
        _symbol: &str,
        _from: i64,
        _to: i64,
        _frequency: Frequency,
    ) -> Result<Option<CandleResponse>, DataError> {
        Err(DataError::Unsupported {
            vendor: "iexcloud",
            operation: "stock_candles",
        })
    }
}
