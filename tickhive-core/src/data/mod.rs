//! Market data: vendor adapters, the provider trait, and candle normalization.

pub mod facade;
pub mod finnhub;
pub mod iexcloud;
pub mod normalize;
pub mod polygon;
pub mod provider;
pub mod tdameritrade;

pub use facade::{DataFacade, VendorId};
pub use finnhub::FinnhubClient;
pub use iexcloud::IexCloudClient;
pub use normalize::normalize;
pub use polygon::PolygonClient;
pub use provider::{
    CandleResponse, CandleRow, DataError, MarketDataProvider, Quote, TimestampUnit,
};
pub use tdameritrade::TdaClient;
