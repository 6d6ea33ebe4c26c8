//! Finnhub data adapter.
//!
//! https://finnhub.io/docs/api — quote and stock-candle endpoints. The free
//! tier allows 60 calls/minute; exceeding it returns HTTP 429, so the pace
//! interval is 1.1 s, the one-per-second budget plus a 10% margin.

use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use super::provider::{CandleResponse, DataError, MarketDataProvider, Quote, TimestampUnit};
use crate::domain::Frequency;

const DEFAULT_BASE_URL: &str = "https://finnhub.io/api/v1";
const PACE_INTERVAL: Duration = Duration::from_millis(1_100);

/// Finnhub `/quote` response.
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    pc: f64,
    t: i64,
}

/// Finnhub `/stock/candle` response: parallel column arrays plus a status.
#[derive(Debug, Deserialize)]
struct CandlesResponse {
    s: String,
    #[serde(default)]
    t: Vec<i64>,
    #[serde(default)]
    o: Vec<f64>,
    #[serde(default)]
    h: Vec<f64>,
    #[serde(default)]
    l: Vec<f64>,
    #[serde(default)]
    c: Vec<f64>,
    #[serde(default)]
    v: Vec<u64>,
}

/// Blocking Finnhub client.
pub struct FinnhubClient {
    client: reqwest::blocking::Client,
    base_url: String,
    token: String,
}

impl FinnhubClient {
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
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(DataError::RateLimited {
                retry_after_secs: retry_after,
            });
        }
        if !status.is_success() {
            return Err(DataError::Transport(format!("HTTP {status} for {path}")));
        }

        response.json().map_err(|e| DataError::Parse(e.to_string()))
    }

    fn fetch_quote(&self, symbol: &str) -> Result<QuoteResponse, DataError> {
        self.get_json("/quote", &[("symbol", symbol.to_string())])
    }
}

impl MarketDataProvider for FinnhubClient {
    fn name(&self) -> &'static str {
        "finnhub"
    }

    fn pace_interval(&self) -> Duration {
        PACE_INTERVAL
    }

    fn latest_price(&self, symbol: &str) -> Result<f64, DataError> {
        Ok(self.fetch_quote(symbol)?.c)
    }

    fn quote(&self, symbol: &str) -> Result<Quote, DataError> {
        let q = self.fetch_quote(symbol)?;
        Ok(Quote {
            symbol: symbol.to_string(),
            open: q.o,
            high: q.h,
            low: Some(q.l),
            latest_price: q.c,
            prev_close: q.pc,
            ts: q.t,
        })
    }

    fn change_pct_prev_day(&self, symbol: &str) -> Result<f64, DataError> {
        let q = self.fetch_quote(symbol)?;
        if q.pc <= 0.0 {
            return Err(DataError::Parse(format!(
                "non-positive previous close {} for {symbol}",
                q.pc
            )));
        }
        Ok((q.c / q.pc - 1.0) * 100.0)
    }

    fn stock_candles(
        &self,
        symbol: &str,
        from: i64,
        to: i64,
        frequency: Frequency,
    ) -> Result<Option<CandleResponse>, DataError> {
        let resolution = frequency
            .to_finnhub()
            .ok_or(DataError::UnsupportedInterval {
                vendor: "finnhub",
                frequency,
            })?;

        let response: CandlesResponse = self.get_json(
            "/stock/candle",
            &[
                ("symbol", symbol.to_string()),
                ("resolution", resolution.to_string()),
                ("from", from.to_string()),
                ("to", to.to_string()),
                ("adjusted", "true".to_string()),
            ],
        )?;

        match response.s.as_str() {
            "ok" => Ok(Some(CandleResponse::Columns {
                unit: TimestampUnit::Seconds,
                t: response.t,
                o: response.o,
                h: response.h,
                l: Some(response.l),
                c: response.c,
                v: response.v,
            })),
            "no_data" => Ok(None),
            other => {
                warn!(symbol, status = other, "unexpected finnhub candle status");
                Err(DataError::Parse(format!(
                    "unexpected candle status '{other}' for {symbol}"
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quote_payload() {
        let q: QuoteResponse = serde_json::from_str(
            r#"{"o":261.07,"h":263.31,"l":260.68,"c":261.74,"pc":259.45,"t":1582641000,"d":2.29,"dp":0.88}"#,
        )
        .unwrap();
        assert_eq!(q.c, 261.74);
        assert_eq!(q.pc, 259.45);
        assert_eq!(q.t, 1_582_641_000);
    }

    #[test]
    fn parses_candle_payload_columns() {
        let c: CandlesResponse = serde_json::from_str(
            r#"{"s":"ok","t":[1582641000,1582727400],"o":[261.07,260.0],"h":[263.31,262.0],"l":[260.68,259.0],"c":[261.74,261.0],"v":[100,200]}"#,
        )
        .unwrap();
        assert_eq!(c.s, "ok");
        assert_eq!(c.t.len(), 2);
        assert_eq!(c.v, vec![100, 200]);
    }

    #[test]
    fn no_data_payload_has_empty_columns() {
        let c: CandlesResponse = serde_json::from_str(r#"{"s":"no_data"}"#).unwrap();
        assert_eq!(c.s, "no_data");
        assert!(c.t.is_empty());
    }
}
