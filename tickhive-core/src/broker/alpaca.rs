//! Alpaca brokerage adapter (v2 REST API).
//!
//! Account status, asset tradability, and plain market-order submission.
//! Bracket orders and stop-loss handling are deliberately out of scope.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{Broker, BrokerError, OrderResult, OrderSide};

const PAPER_BASE_URL: &str = "https://paper-api.alpaca.markets";

/// Connection settings for the Alpaca adapter.
#[derive(Debug, Clone, Deserialize)]
pub struct AlpacaConfig {
    pub api_key_id: String,
    pub api_secret_key: String,
    /// Trading API base; defaults to the paper endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    PAPER_BASE_URL.to_string()
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    status: String,
    account_blocked: bool,
    trading_blocked: bool,
    cash: String,
}

#[derive(Debug, Deserialize)]
struct AssetResponse {
    tradable: bool,
}

#[derive(Debug, Serialize)]
struct OrderRequest<'a> {
    symbol: &'a str,
    qty: String,
    side: &'a str,
    #[serde(rename = "type")]
    order_type: &'a str,
    time_in_force: &'a str,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
    status: String,
}

/// Blocking Alpaca v2 REST client.
#[derive(Debug)]
pub struct AlpacaBroker {
    client: reqwest::blocking::Client,
    config: AlpacaConfig,
}

impl AlpacaBroker {
    pub fn new(config: AlpacaConfig) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");
        Self { client, config }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::blocking::RequestBuilder {
        let url = format!("{}{}", self.config.base_url, path);
        self.client
            .request(method, url)
            .header("APCA-API-KEY-ID", &self.config.api_key_id)
            .header("APCA-API-SECRET-KEY", &self.config.api_secret_key)
    }

    fn account(&self) -> Result<AccountResponse, BrokerError> {
        let response = self
            .request(reqwest::Method::GET, "/v2/account")
            .send()
            .map_err(|e| BrokerError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(BrokerError::Transport(format!(
                "HTTP {} for /v2/account",
                response.status()
            )));
        }
        response.json().map_err(|e| BrokerError::Parse(e.to_string()))
    }

    fn asset_tradable(&self, symbol: &str) -> Result<bool, BrokerError> {
        let response = self
            .request(reqwest::Method::GET, &format!("/v2/assets/{symbol}"))
            .send()
            .map_err(|e| BrokerError::Transport(e.to_string()))?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !status.is_success() {
            return Err(BrokerError::Transport(format!(
                "HTTP {status} for /v2/assets/{symbol}"
            )));
        }
        let asset: AssetResponse =
            response.json().map_err(|e| BrokerError::Parse(e.to_string()))?;
        Ok(asset.tradable)
    }
}

impl Broker for AlpacaBroker {
    fn check_account_tradeable(&self) -> Result<bool, BrokerError> {
        let account = self.account()?;
        Ok(account.status == "ACTIVE" && !account.account_blocked && !account.trading_blocked)
    }

    fn get_account_cash(&self) -> Result<f64, BrokerError> {
        let account = self.account()?;
        account
            .cash
            .parse::<f64>()
            .map_err(|e| BrokerError::Parse(format!("cash '{}': {e}", account.cash)))
    }

    fn check_symbols(&self, symbols: &[String]) -> Result<Vec<String>, BrokerError> {
        let mut tradeable = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            match self.asset_tradable(symbol) {
                Ok(true) => tradeable.push(symbol.clone()),
                Ok(false) => warn!(symbol = symbol.as_str(), "symbol not tradeable, dropping"),
                Err(e) => {
                    warn!(symbol = symbol.as_str(), error = %e, "asset lookup failed, dropping");
                }
            }
        }
        Ok(tradeable)
    }

    fn order_asset(
        &self,
        symbol: &str,
        qty: u64,
        side: OrderSide,
    ) -> Result<Option<OrderResult>, BrokerError> {
        if qty == 0 {
            warn!(symbol, "zero-quantity order skipped");
            return Ok(None);
        }
        if !self.asset_tradable(symbol)? {
            return Err(BrokerError::NotTradeable {
                symbol: symbol.to_string(),
            });
        }

        let request = OrderRequest {
            symbol,
            qty: qty.to_string(),
            side: side.as_str(),
            order_type: "market",
            time_in_force: "day",
        };
        let response = self
            .request(reqwest::Method::POST, "/v2/orders")
            .json(&request)
            .send()
            .map_err(|e| BrokerError::Transport(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNPROCESSABLE_ENTITY
            || status == reqwest::StatusCode::FORBIDDEN
        {
            let body = response.text().unwrap_or_default();
            return Err(BrokerError::Rejected(body));
        }
        if !status.is_success() {
            return Err(BrokerError::Transport(format!(
                "HTTP {status} for /v2/orders"
            )));
        }

        let order: OrderResponse =
            response.json().map_err(|e| BrokerError::Parse(e.to_string()))?;
        Ok(Some(OrderResult {
            order_id: order.id,
            symbol: symbol.to_string(),
            qty,
            side,
            status: order.status,
        }))
    }
}
