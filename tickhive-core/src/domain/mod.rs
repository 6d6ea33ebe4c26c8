//! Domain types for TickHive

pub mod allocation;
pub mod candle;
pub mod frequency;

pub use allocation::AssetAllocation;
pub use candle::Candle;
pub use frequency::{Frequency, FrequencyError};
