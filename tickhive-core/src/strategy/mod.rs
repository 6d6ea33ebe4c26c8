//! Strategy layer: position sizing, the daily market signal, and the
//! index-basket strategy that ties them to the broker.

pub mod allocator;
pub mod market;
pub mod signal;
pub mod watchlist;

pub use allocator::{allocate, AllocationError};
pub use market::{MarketStrategy, RunReport, StrategyError, TradePlan};
pub use signal::{is_positive, SignalError};
pub use watchlist::{TomlWatchlist, TradingFilter, Watchlist, WatchlistEntry, WatchlistError};
