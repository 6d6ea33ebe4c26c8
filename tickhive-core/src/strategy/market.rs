//! Market strategy — buy the index basket when the market is positive,
//! sell when it is negative.
//!
//! One run per trading day: check the account, size the basket from fresh
//! prices, evaluate the daily signal, submit one market order per symbol.
//! Collaborators are injected; this type never constructs a live client.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{info, warn};

use super::allocator::{allocate, AllocationError};
use super::signal::{is_positive, SignalError};
use crate::broker::{Broker, BrokerError, OrderResult, OrderSide};
use crate::data::{DataError, MarketDataProvider};
use crate::domain::AssetAllocation;

/// Default basket: SPX → SPY, DJIA → DIA, NASDAQ → QQQ, equal thirds.
fn default_basket() -> BTreeMap<String, f64> {
    [("SPY", 0.333), ("DIA", 0.333), ("QQQ", 0.333)]
        .into_iter()
        .map(|(s, w)| (s.to_string(), w))
        .collect()
}

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("account is not able to trade")]
    AccountNotTradeable,

    #[error("no tradeable symbols left in the basket")]
    EmptyBasket,

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error(transparent)]
    Data(#[from] DataError),
}

/// The decision a run would execute: sized basket plus direction.
#[derive(Debug, Clone)]
pub struct TradePlan {
    pub cash: f64,
    pub side: OrderSide,
    pub allocations: BTreeMap<String, AssetAllocation>,
}

/// Outcome of a completed run.
#[derive(Debug)]
pub struct RunReport {
    pub plan: TradePlan,
    /// One entry per submitted order; zero-quantity symbols are skipped.
    pub orders: Vec<OrderResult>,
}

pub struct MarketStrategy<'a> {
    broker: &'a dyn Broker,
    data: &'a dyn MarketDataProvider,
    basket: BTreeMap<String, f64>,
    signal_symbol: String,
    risk_fraction: f64,
    threshold_pct: f64,
}

impl<'a> MarketStrategy<'a> {
    pub fn new(broker: &'a dyn Broker, data: &'a dyn MarketDataProvider) -> Self {
        Self {
            broker,
            data,
            basket: default_basket(),
            signal_symbol: "SPY".to_string(),
            risk_fraction: 1.0,
            threshold_pct: 0.0,
        }
    }

    pub fn with_basket(mut self, basket: BTreeMap<String, f64>) -> Self {
        self.basket = basket;
        self
    }

    pub fn with_signal_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.signal_symbol = symbol.into();
        self
    }

    pub fn with_risk_fraction(mut self, risk_fraction: f64) -> Self {
        self.risk_fraction = risk_fraction;
        self
    }

    pub fn with_threshold_pct(mut self, threshold_pct: f64) -> Self {
        self.threshold_pct = threshold_pct;
        self
    }

    /// Size the basket and evaluate the signal without submitting anything.
    ///
    /// Fails closed: any missing price or unavailable signal aborts the run
    /// instead of guessing a direction or trading a partial basket.
    pub fn plan(&self) -> Result<TradePlan, StrategyError> {
        if !self.broker.check_account_tradeable()? {
            return Err(StrategyError::AccountNotTradeable);
        }

        let cash = self.broker.get_account_cash()?;
        info!(cash, "account cash fetched");

        let requested: Vec<String> = self.basket.keys().cloned().collect();
        let tradeable = self.broker.check_symbols(&requested)?;
        let basket: BTreeMap<String, f64> = self
            .basket
            .iter()
            .filter(|(symbol, _)| tradeable.contains(symbol))
            .map(|(symbol, &weight)| (symbol.clone(), weight))
            .collect();
        if basket.is_empty() {
            return Err(StrategyError::EmptyBasket);
        }
        if basket.len() < self.basket.len() {
            warn!(
                requested = self.basket.len(),
                tradeable = basket.len(),
                "basket reduced to tradeable symbols"
            );
        }

        let symbols: Vec<String> = basket.keys().cloned().collect();
        let prices = self.data.latest_prices(&symbols)?;
        let allocations = allocate(cash, self.risk_fraction, &basket, &prices)?;

        let positive = is_positive(self.data, &self.signal_symbol, self.threshold_pct)?;
        let side = if positive {
            OrderSide::Buy
        } else {
            OrderSide::Sell
        };
        info!(signal_symbol = self.signal_symbol.as_str(), ?side, "daily signal evaluated");

        Ok(TradePlan {
            cash,
            side,
            allocations,
        })
    }

    /// Plan and submit one market order per basket symbol.
    pub fn run(&self) -> Result<RunReport, StrategyError> {
        let plan = self.plan()?;
        let mut orders = Vec::with_capacity(plan.allocations.len());
        for allocation in plan.allocations.values() {
            match self
                .broker
                .order_asset(&allocation.symbol, allocation.shares_to_order, plan.side)?
            {
                Some(order) => {
                    info!(
                        symbol = order.symbol.as_str(),
                        qty = order.qty,
                        status = order.status.as_str(),
                        "order submitted"
                    );
                    orders.push(order);
                }
                None => {
                    info!(symbol = allocation.symbol.as_str(), "order skipped");
                }
            }
        }
        Ok(RunReport { plan, orders })
    }
}
