//! Brokerage execution: the Broker trait and the Alpaca adapter.

pub mod alpaca;

pub use alpaca::{AlpacaBroker, AlpacaConfig};

use thiserror::Error;

/// Direction of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        }
    }
}

/// Acknowledgement for a submitted order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderResult {
    pub order_id: String,
    pub symbol: String,
    pub qty: u64,
    pub side: OrderSide,
    pub status: String,
}

/// Structured error types for broker operations. All of them are fatal for
/// the current trading run; there is no retry at this layer.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("broker transport error: {0}")]
    Transport(String),

    #[error("account is blocked or not active")]
    AccountBlocked,

    #[error("asset '{symbol}' is not tradeable")]
    NotTradeable { symbol: String },

    #[error("order rejected: {0}")]
    Rejected(String),

    #[error("failed to parse broker response: {0}")]
    Parse(String),
}

/// Trait for brokerage backends.
pub trait Broker {
    /// True if the account is active and neither the account nor trading is
    /// blocked.
    fn check_account_tradeable(&self) -> Result<bool, BrokerError>;

    /// Cash balance available for allocation.
    fn get_account_cash(&self) -> Result<f64, BrokerError>;

    /// Filter `symbols` down to the ones the broker can trade.
    fn check_symbols(&self, symbols: &[String]) -> Result<Vec<String>, BrokerError>;

    /// Submit a market order. Returns `None` when the order was skipped
    /// (zero quantity); `Err` when the broker rejected or transport failed.
    fn order_asset(
        &self,
        symbol: &str,
        qty: u64,
        side: OrderSide,
    ) -> Result<Option<OrderResult>, BrokerError>;
}
