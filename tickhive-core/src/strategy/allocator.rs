//! Allocator — divides available cash across a weighted symbol basket.
//!
//! Pure arithmetic, no I/O: callers fetch fresh prices first. Allocations
//! for different symbols never interact; the sum of `cash_to_allocate`
//! across symbols is informational and is not capped at `total_cash`, so
//! weights summing above 1 over-allocate. That matches the additive-factor
//! design this replaces; it is logged, not normalized (see DESIGN.md).

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;
use tracing::warn;

use crate::domain::AssetAllocation;

#[derive(Debug, Error, PartialEq)]
pub enum AllocationError {
    /// A basket symbol has no price. The whole call fails: a silently
    /// partial basket changes the risk profile unpredictably.
    #[error("no price available for '{symbol}'")]
    MissingPrice { symbol: String },

    #[error("invalid price {price} for '{symbol}'")]
    InvalidPrice { symbol: String, price: f64 },
}

/// Compute whole-share order quantities for every symbol in `assets`.
///
/// Per symbol: `cash = total_cash × risk_fraction × weight`, then
/// `shares = floor(cash / price)` — always rounding toward zero shares,
/// never over the symbol's cash slice.
pub fn allocate(
    total_cash: f64,
    risk_fraction: f64,
    assets: &BTreeMap<String, f64>,
    prices: &HashMap<String, f64>,
) -> Result<BTreeMap<String, AssetAllocation>, AllocationError> {
    let weight_sum: f64 = assets.values().sum();
    if risk_fraction * weight_sum > 1.0 + f64::EPSILON {
        warn!(
            weight_sum,
            risk_fraction, "basket weights exceed available cash; over-allocating by design"
        );
    }

    let mut allocations = BTreeMap::new();
    for (symbol, &weight) in assets {
        let price = *prices
            .get(symbol)
            .ok_or_else(|| AllocationError::MissingPrice {
                symbol: symbol.clone(),
            })?;
        if price <= 0.0 {
            return Err(AllocationError::InvalidPrice {
                symbol: symbol.clone(),
                price,
            });
        }

        let cash_to_allocate = total_cash * risk_fraction * weight;
        let shares_to_order = (cash_to_allocate / price).floor().max(0.0) as u64;
        allocations.insert(
            symbol.clone(),
            AssetAllocation {
                symbol: symbol.clone(),
                weight,
                latest_price: price,
                cash_to_allocate,
                shares_to_order,
            },
        );
    }
    Ok(allocations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basket(weights: &[(&str, f64)]) -> BTreeMap<String, f64> {
        weights
            .iter()
            .map(|(s, w)| (s.to_string(), *w))
            .collect()
    }

    fn prices(entries: &[(&str, f64)]) -> HashMap<String, f64> {
        entries
            .iter()
            .map(|(s, p)| (s.to_string(), *p))
            .collect()
    }

    #[test]
    fn divides_cash_by_weight_and_floors() {
        let allocations = allocate(
            10_000.0,
            1.0,
            &basket(&[("SPY", 0.333), ("DIA", 0.333), ("QQQ", 0.333)]),
            &prices(&[("SPY", 300.0), ("DIA", 250.0), ("QQQ", 200.0)]),
        )
        .unwrap();

        // 10000 * 0.333 = 3330 per symbol
        assert_eq!(allocations["SPY"].shares_to_order, 11);
        assert_eq!(allocations["DIA"].shares_to_order, 13);
        assert_eq!(allocations["QQQ"].shares_to_order, 16);
    }

    #[test]
    fn never_spends_over_the_symbol_slice() {
        let allocations = allocate(
            1_000.0,
            0.5,
            &basket(&[("SPY", 1.0)]),
            &prices(&[("SPY", 333.0)]),
        )
        .unwrap();
        let a = &allocations["SPY"];
        assert!(a.order_value() <= a.cash_to_allocate);
        assert_eq!(a.shares_to_order, 1);
    }

    #[test]
    fn missing_price_fails_the_whole_call() {
        let err = allocate(
            1_000.0,
            1.0,
            &basket(&[("SPY", 0.5), ("DIA", 0.5)]),
            &prices(&[("SPY", 300.0)]),
        )
        .unwrap_err();
        assert_eq!(
            err,
            AllocationError::MissingPrice {
                symbol: "DIA".into()
            }
        );
    }

    #[test]
    fn non_positive_price_is_rejected_not_divided() {
        let err = allocate(
            1_000.0,
            1.0,
            &basket(&[("SPY", 1.0)]),
            &prices(&[("SPY", 0.0)]),
        )
        .unwrap_err();
        assert!(matches!(err, AllocationError::InvalidPrice { .. }));
    }

    #[test]
    fn zero_cash_orders_zero_shares() {
        let allocations = allocate(
            0.0,
            1.0,
            &basket(&[("SPY", 1.0)]),
            &prices(&[("SPY", 300.0)]),
        )
        .unwrap();
        assert_eq!(allocations["SPY"].shares_to_order, 0);
    }
}
