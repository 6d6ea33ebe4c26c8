//! Watchlist — externally managed list of tradeable symbols.
//!
//! Consumed by the strategy layer only. The trait mirrors the managed-table
//! store this replaces; the bundled implementation reads a TOML file of
//! entries with a per-symbol trading flag.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchlistError {
    #[error("failed to read watchlist {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse watchlist {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// One watchlist row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub isin: String,
    pub name: String,
    pub symbol: String,
    pub trading: bool,
}

/// Which entries a query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TradingFilter {
    #[default]
    TradingEnabled,
    TradingDisabled,
    All,
}

impl TradingFilter {
    fn matches(self, entry: &WatchlistEntry) -> bool {
        match self {
            TradingFilter::TradingEnabled => entry.trading,
            TradingFilter::TradingDisabled => !entry.trading,
            TradingFilter::All => true,
        }
    }
}

/// Trait for watchlist stores.
pub trait Watchlist {
    fn entries(&self, filter: TradingFilter) -> Result<Vec<WatchlistEntry>, WatchlistError>;

    fn symbols(&self, filter: TradingFilter) -> Result<Vec<String>, WatchlistError> {
        Ok(self
            .entries(filter)?
            .into_iter()
            .map(|e| e.symbol)
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct WatchlistFile {
    #[serde(default)]
    stocks: Vec<WatchlistEntry>,
}

/// TOML-file-backed watchlist.
pub struct TomlWatchlist {
    path: PathBuf,
}

impl TomlWatchlist {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl Watchlist for TomlWatchlist {
    fn entries(&self, filter: TradingFilter) -> Result<Vec<WatchlistEntry>, WatchlistError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|source| WatchlistError::Io {
            path: self.path.clone(),
            source,
        })?;
        let file: WatchlistFile =
            toml::from_str(&raw).map_err(|source| WatchlistError::Parse {
                path: self.path.clone(),
                source,
            })?;
        Ok(file
            .stocks
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect())
    }
}
