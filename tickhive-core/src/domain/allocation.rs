//! Working state for one symbol during a position-sizing pass.

use serde::{Deserialize, Serialize};

/// One symbol's slice of the sizing computation.
///
/// `latest_price` is refreshed immediately before use and never cached
/// across runs. `cash_to_allocate` is informational: the allocator never
/// enforces that the sum across symbols stays under total cash (see the
/// over-allocation note in `strategy::allocator`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetAllocation {
    pub symbol: String,
    /// Fraction of the risk budget assigned to this symbol.
    pub weight: f64,
    pub latest_price: f64,
    pub cash_to_allocate: f64,
    pub shares_to_order: u64,
}

impl AssetAllocation {
    /// Notional value of the resulting order.
    pub fn order_value(&self) -> f64 {
        self.shares_to_order as f64 * self.latest_price
    }
}
