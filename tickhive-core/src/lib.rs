//! TickHive Core — brokerage/market-data adapters and the daily trading core.
//!
//! This crate wraps vendor APIs behind thin blocking adapters and composes
//! them into a small trading core:
//! - Domain types (candles, canonical frequencies, allocations)
//! - Vendor data adapters (Finnhub, TDAmeritrade, Polygon, IEXCloud) behind
//!   one `MarketDataProvider` trait and an explicit facade
//! - Broker adapter (Alpaca v2 REST)
//! - Position-sizing allocator and the daily positive/negative market signal
//! - Historical candle exporter with per-vendor request pacing and CSV sinks

pub mod broker;
pub mod config;
pub mod data;
pub mod domain;
pub mod export;
pub mod strategy;
