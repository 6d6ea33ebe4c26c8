//! Daily market signal — "is the market positive today?"
//!
//! Positive requires both a percent change above the threshold and a latest
//! price above the day's open: a morning pop that has since faded below the
//! open does not count. A failed fetch never defaults to positive — the
//! error propagates and the trading run fails closed.

use thiserror::Error;

use crate::data::{DataError, MarketDataProvider};

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("market signal unavailable: {0}")]
    Unavailable(#[from] DataError),
}

/// True iff `symbol` changed more than `threshold_pct` against the previous
/// close AND its latest price is above today's open.
pub fn is_positive(
    provider: &dyn MarketDataProvider,
    symbol: &str,
    threshold_pct: f64,
) -> Result<bool, SignalError> {
    let change_pct = provider.change_pct_prev_day(symbol)?;
    let quote = provider.quote(symbol)?;
    Ok(change_pct > threshold_pct && quote.latest_price > quote.open)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CandleResponse, Quote};
    use crate::domain::Frequency;
    use std::time::Duration;

    struct FixedQuotes {
        change_pct: Result<f64, ()>,
        open: f64,
        latest: f64,
    }

    impl MarketDataProvider for FixedQuotes {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn pace_interval(&self) -> Duration {
            Duration::ZERO
        }

        fn latest_price(&self, _symbol: &str) -> Result<f64, DataError> {
            Ok(self.latest)
        }

        fn quote(&self, symbol: &str) -> Result<Quote, DataError> {
            Ok(Quote {
                symbol: symbol.to_string(),
                open: self.open,
                high: self.open.max(self.latest),
                low: None,
                latest_price: self.latest,
                prev_close: self.open,
                ts: 0,
            })
        }

        fn change_pct_prev_day(&self, _symbol: &str) -> Result<f64, DataError> {
            self.change_pct
                .map_err(|()| DataError::Transport("connection reset".into()))
        }

        fn stock_candles(
            &self,
            _symbol: &str,
            _from: i64,
            _to: i64,
            _frequency: Frequency,
        ) -> Result<Option<CandleResponse>, DataError> {
            Ok(None)
        }
    }

    #[test]
    fn positive_change_with_price_above_open_is_positive() {
        let provider = FixedQuotes {
            change_pct: Ok(2.0),
            open: 100.0,
            latest: 101.0,
        };
        assert!(is_positive(&provider, "SPY", 0.0).unwrap());
    }

    #[test]
    fn positive_change_alone_is_insufficient() {
        // up 2% on the day but back below the open
        let provider = FixedQuotes {
            change_pct: Ok(2.0),
            open: 100.0,
            latest: 99.0,
        };
        assert!(!is_positive(&provider, "SPY", 0.0).unwrap());
    }

    #[test]
    fn change_below_threshold_is_negative() {
        let provider = FixedQuotes {
            change_pct: Ok(0.5),
            open: 100.0,
            latest: 101.0,
        };
        assert!(!is_positive(&provider, "SPY", 1.0).unwrap());
    }

    #[test]
    fn fetch_failure_propagates_never_defaults_positive() {
        let provider = FixedQuotes {
            change_pct: Err(()),
            open: 100.0,
            latest: 101.0,
        };
        assert!(is_positive(&provider, "SPY", 0.0).is_err());
    }
}
