//! TOML configuration: vendor credentials, primary-vendor choices, strategy
//! knobs, export destination.
//!
//! Loading is explicit (`Config::load`) and constructing collaborators is a
//! separate step (`build_facade`); declaring a function never instantiates
//! a live network client as a side effect.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::broker::{AlpacaBroker, AlpacaConfig};
use crate::data::facade::FacadeError;
use crate::data::{
    DataFacade, FinnhubClient, IexCloudClient, PolygonClient, TdaClient, VendorId,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error(transparent)]
    Facade(#[from] FacadeError),

    #[error("no [alpaca] section configured")]
    MissingBroker,
}

/// Token plus optional base-URL override, shared by the token-style vendors.
#[derive(Debug, Clone, Deserialize)]
pub struct VendorCredentials {
    pub token: String,
    pub base_url: Option<String>,
}

/// Primary vendor per method family.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub quotes: VendorId,
    pub candles: VendorId,
    pub prices: VendorId,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            quotes: VendorId::Finnhub,
            candles: VendorId::Finnhub,
            prices: VendorId::Finnhub,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub risk_fraction: f64,
    pub threshold_pct: f64,
    pub signal_symbol: String,
    /// Basket weights; empty means the built-in SPY/DIA/QQQ thirds.
    pub basket: BTreeMap<String, f64>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            risk_fraction: 1.0,
            threshold_pct: 0.0,
            signal_symbol: "SPY".to_string(),
            basket: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub out_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("exports"),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub alpaca: Option<AlpacaConfig>,
    pub finnhub: Option<VendorCredentials>,
    pub tdameritrade: Option<VendorCredentials>,
    pub polygon: Option<VendorCredentials>,
    pub iexcloud: Option<VendorCredentials>,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub export: ExportConfig,
    /// Path to the watchlist TOML file, if one is used.
    pub watchlist: Option<PathBuf>,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Construct the data facade from every configured vendor section.
    pub fn build_facade(&self) -> Result<DataFacade, ConfigError> {
        let mut builder = DataFacade::builder()
            .primary_quotes(self.data.quotes)
            .primary_candles(self.data.candles)
            .primary_prices(self.data.prices);

        if let Some(creds) = &self.finnhub {
            let client = match &creds.base_url {
                Some(url) => FinnhubClient::with_base_url(creds.token.clone(), url.clone()),
                None => FinnhubClient::new(creds.token.clone()),
            };
            builder = builder.vendor(VendorId::Finnhub, Box::new(client));
        }
        if let Some(creds) = &self.tdameritrade {
            let client = match &creds.base_url {
                Some(url) => TdaClient::with_base_url(creds.token.clone(), url.clone()),
                None => TdaClient::new(creds.token.clone()),
            };
            builder = builder.vendor(VendorId::Tdameritrade, Box::new(client));
        }
        if let Some(creds) = &self.polygon {
            let client = match &creds.base_url {
                Some(url) => PolygonClient::with_base_url(creds.token.clone(), url.clone()),
                None => PolygonClient::new(creds.token.clone()),
            };
            builder = builder.vendor(VendorId::Polygon, Box::new(client));
        }
        if let Some(creds) = &self.iexcloud {
            let client = match &creds.base_url {
                Some(url) => IexCloudClient::with_base_url(creds.token.clone(), url.clone()),
                None => IexCloudClient::new(creds.token.clone()),
            };
            builder = builder.vendor(VendorId::Iexcloud, Box::new(client));
        }

        Ok(builder.build()?)
    }

    /// Construct the broker from the `[alpaca]` section.
    pub fn build_broker(&self) -> Result<AlpacaBroker, ConfigError> {
        let alpaca = self.alpaca.clone().ok_or(ConfigError::MissingBroker)?;
        Ok(AlpacaBroker::new(alpaca))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[alpaca]
api_key_id = "key"
api_secret_key = "secret"

[finnhub]
token = "fh-token"

[iexcloud]
token = "iex-token"

[data]
prices = "iexcloud"

[strategy]
risk_fraction = 0.5
threshold_pct = 0.25

[strategy.basket]
SPY = 0.5
QQQ = 0.5
"#;

    #[test]
    fn parses_sections_with_defaults() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.data.quotes, VendorId::Finnhub);
        assert_eq!(config.data.prices, VendorId::Iexcloud);
        assert_eq!(config.strategy.risk_fraction, 0.5);
        assert_eq!(config.strategy.basket.len(), 2);
        assert_eq!(config.export.out_dir, PathBuf::from("exports"));
        assert!(config.tdameritrade.is_none());
    }

    #[test]
    fn facade_builds_from_configured_vendors() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        let facade = config.build_facade().unwrap();
        assert!(facade.handle(VendorId::Finnhub).is_some());
        assert!(facade.handle(VendorId::Polygon).is_none());
    }

    #[test]
    fn primary_without_section_fails_to_build() {
        let mut config: Config = toml::from_str(SAMPLE).unwrap();
        config.data.candles = VendorId::Polygon;
        assert!(matches!(
            config.build_facade().unwrap_err(),
            ConfigError::Facade(FacadeError::MissingPrimary { .. })
        ));
    }

    #[test]
    fn missing_broker_section_is_reported() {
        let config: Config = toml::from_str("[finnhub]\ntoken = \"t\"\n").unwrap();
        assert!(matches!(
            config.build_broker().unwrap_err(),
            ConfigError::MissingBroker
        ));
    }
}
