//! Data facade — explicit composition of the configured vendor adapters.
//!
//! One named handle per vendor, with a configured primary per method family
//! (quotes, candles, latest prices). This replaces the original design of
//! aggregating vendors through inheritance: dispatch is a table lookup here,
//! not method resolution order.
//!
//! Building the facade validates every frequency mapping table, so a drifted
//! vendor interval set aborts startup.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::provider::{CandleResponse, DataError, MarketDataProvider, Quote};
use crate::domain::frequency::{validate_mappings, FrequencyError};
use crate::domain::Frequency;

/// Identifies one configured vendor adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorId {
    Finnhub,
    Tdameritrade,
    Polygon,
    Iexcloud,
}

impl VendorId {
    pub fn as_str(self) -> &'static str {
        match self {
            VendorId::Finnhub => "finnhub",
            VendorId::Tdameritrade => "tdameritrade",
            VendorId::Polygon => "polygon",
            VendorId::Iexcloud => "iexcloud",
        }
    }
}

/// Errors from facade construction.
#[derive(Debug, Error)]
pub enum FacadeError {
    #[error(transparent)]
    Frequency(#[from] FrequencyError),

    #[error("primary vendor '{vendor}' for {role} is not configured")]
    MissingPrimary {
        vendor: &'static str,
        role: &'static str,
    },

    #[error("no vendor adapters configured")]
    Empty,
}

/// Builder for [`DataFacade`]. Callers register already-constructed vendor
/// handles; nothing here constructs a live client implicitly.
pub struct DataFacadeBuilder {
    handles: Vec<(VendorId, Box<dyn MarketDataProvider>)>,
    quotes: VendorId,
    candles: VendorId,
    prices: VendorId,
}

impl DataFacadeBuilder {
    pub fn vendor(mut self, id: VendorId, handle: Box<dyn MarketDataProvider>) -> Self {
        self.handles.push((id, handle));
        self
    }

    pub fn primary_quotes(mut self, id: VendorId) -> Self {
        self.quotes = id;
        self
    }

    pub fn primary_candles(mut self, id: VendorId) -> Self {
        self.candles = id;
        self
    }

    pub fn primary_prices(mut self, id: VendorId) -> Self {
        self.prices = id;
        self
    }

    pub fn build(self) -> Result<DataFacade, FacadeError> {
        validate_mappings()?;
        if self.handles.is_empty() {
            return Err(FacadeError::Empty);
        }

        let resolve = |id: VendorId, role: &'static str| {
            self.handles
                .iter()
                .position(|(vendor, _)| *vendor == id)
                .ok_or(FacadeError::MissingPrimary {
                    vendor: id.as_str(),
                    role,
                })
        };

        let quotes = resolve(self.quotes, "quotes")?;
        let candles = resolve(self.candles, "candles")?;
        let prices = resolve(self.prices, "prices")?;

        Ok(DataFacade {
            handles: self.handles,
            quotes,
            candles,
            prices,
        })
    }
}

/// Facade over the configured vendors, itself a [`MarketDataProvider`].
///
/// Quote methods go to the quotes primary, candle fetches to the candles
/// primary, latest prices to the prices primary. The pace interval is the
/// candle primary's, since the exporter is the only paced consumer.
pub struct DataFacade {
    handles: Vec<(VendorId, Box<dyn MarketDataProvider>)>,
    quotes: usize,
    candles: usize,
    prices: usize,
}

impl std::fmt::Debug for DataFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataFacade")
            .field(
                "handles",
                &self.handles.iter().map(|(id, _)| id).collect::<Vec<_>>(),
            )
            .field("quotes", &self.quotes)
            .field("candles", &self.candles)
            .field("prices", &self.prices)
            .finish()
    }
}

impl DataFacade {
    pub fn builder() -> DataFacadeBuilder {
        DataFacadeBuilder {
            handles: Vec::new(),
            quotes: VendorId::Finnhub,
            candles: VendorId::Finnhub,
            prices: VendorId::Finnhub,
        }
    }

    fn at(&self, idx: usize) -> &dyn MarketDataProvider {
        &*self.handles[idx].1
    }

    /// Direct access to a configured vendor, for callers that need a
    /// specific one (e.g. exporting from a non-primary vendor).
    pub fn handle(&self, id: VendorId) -> Option<&dyn MarketDataProvider> {
        self.handles
            .iter()
            .find(|(vendor, _)| *vendor == id)
            .map(|(_, handle)| &**handle)
    }
}

impl MarketDataProvider for DataFacade {
    fn name(&self) -> &'static str {
        "facade"
    }

    fn pace_interval(&self) -> Duration {
        self.at(self.candles).pace_interval()
    }

    fn latest_price(&self, symbol: &str) -> Result<f64, DataError> {
        self.at(self.prices).latest_price(symbol)
    }

    fn latest_prices(&self, symbols: &[String]) -> Result<HashMap<String, f64>, DataError> {
        self.at(self.prices).latest_prices(symbols)
    }

    fn quote(&self, symbol: &str) -> Result<Quote, DataError> {
        self.at(self.quotes).quote(symbol)
    }

    fn change_pct_prev_day(&self, symbol: &str) -> Result<f64, DataError> {
        self.at(self.quotes).change_pct_prev_day(symbol)
    }

    fn stock_candles(
        &self,
        symbol: &str,
        from: i64,
        to: i64,
        frequency: Frequency,
    ) -> Result<Option<CandleResponse>, DataError> {
        self.at(self.candles).stock_candles(symbol, from, to, frequency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubVendor {
        price: f64,
    }

    impl MarketDataProvider for StubVendor {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn pace_interval(&self) -> Duration {
            Duration::from_millis(10)
        }

        fn latest_price(&self, _symbol: &str) -> Result<f64, DataError> {
            Ok(self.price)
        }

        fn quote(&self, _symbol: &str) -> Result<Quote, DataError> {
            Err(DataError::Unsupported {
                vendor: "stub",
                operation: "quote",
            })
        }

        fn change_pct_prev_day(&self, _symbol: &str) -> Result<f64, DataError> {
            Err(DataError::Unsupported {
                vendor: "stub",
                operation: "change_pct_prev_day",
            })
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
    fn dispatches_prices_to_configured_primary() {
        let facade = DataFacade::builder()
            .vendor(VendorId::Finnhub, Box::new(StubVendor { price: 1.0 }))
            .vendor(VendorId::Iexcloud, Box::new(StubVendor { price: 2.0 }))
            .primary_prices(VendorId::Iexcloud)
            .primary_quotes(VendorId::Finnhub)
            .primary_candles(VendorId::Finnhub)
            .build()
            .unwrap();
        assert_eq!(facade.latest_price("SPY").unwrap(), 2.0);
    }

    #[test]
    fn unconfigured_primary_fails_at_build() {
        let err = DataFacade::builder()
            .vendor(VendorId::Finnhub, Box::new(StubVendor { price: 1.0 }))
            .primary_candles(VendorId::Tdameritrade)
            .build()
            .unwrap_err();
        assert!(matches!(err, FacadeError::MissingPrimary { .. }));
    }

    #[test]
    fn empty_facade_is_rejected() {
        assert!(matches!(
            DataFacade::builder().build().unwrap_err(),
            FacadeError::Empty
        ));
    }
}
