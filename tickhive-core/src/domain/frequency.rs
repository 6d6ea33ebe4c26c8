//! Canonical candle sampling intervals and the per-vendor mapping tables.
//!
//! Every vendor encodes intervals differently (Finnhub uses `"1"`..`"M"`,
//! TDAmeritrade a (frequencyType, frequency) pair, Polygon a timespan word).
//! The rest of the crate only ever speaks [`Frequency`]; adapters translate
//! at the request boundary and back before normalization. The tables are
//! validated exhaustively at startup via [`validate_mappings`] so a vendor
//! adding or removing a supported interval fails fast instead of mid-export.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Canonical candle sampling interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Min1,
    Min5,
    Min15,
    Min30,
    Min60,
    Daily,
    Weekly,
    Monthly,
}

/// Errors from frequency parsing and mapping-table validation.
#[derive(Debug, Error)]
pub enum FrequencyError {
    #[error("unknown frequency '{0}' (expected 1min/5min/15min/30min/60min/daily/weekly/monthly)")]
    Unknown(String),

    #[error("{vendor} mapping table is inconsistent for {frequency}: declared supported but does not round-trip")]
    MappingInconsistent {
        vendor: &'static str,
        frequency: Frequency,
    },

    #[error("{vendor} mapping table is inconsistent for {frequency}: not declared supported but has an encoding")]
    UnexpectedMapping {
        vendor: &'static str,
        frequency: Frequency,
    },
}

impl Frequency {
    pub const ALL: [Frequency; 8] = [
        Frequency::Min1,
        Frequency::Min5,
        Frequency::Min15,
        Frequency::Min30,
        Frequency::Min60,
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Monthly,
    ];

    /// Stable label used in sink rows and file names.
    pub fn label(self) -> &'static str {
        match self {
            Frequency::Min1 => "1min",
            Frequency::Min5 => "5min",
            Frequency::Min15 => "15min",
            Frequency::Min30 => "30min",
            Frequency::Min60 => "60min",
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }

    // ── Finnhub ─────────────────────────────────────────────────────
    // https://finnhub.io/docs/api#stock-candles — resolutions 1,5,15,30,60,D,W,M

    pub fn finnhub_supported() -> &'static [Frequency] {
        &Self::ALL
    }

    pub fn to_finnhub(self) -> Option<&'static str> {
        Some(match self {
            Frequency::Min1 => "1",
            Frequency::Min5 => "5",
            Frequency::Min15 => "15",
            Frequency::Min30 => "30",
            Frequency::Min60 => "60",
            Frequency::Daily => "D",
            Frequency::Weekly => "W",
            Frequency::Monthly => "M",
        })
    }

    pub fn from_finnhub(resolution: &str) -> Option<Frequency> {
        match resolution {
            "1" => Some(Frequency::Min1),
            "5" => Some(Frequency::Min5),
            "15" => Some(Frequency::Min15),
            "30" => Some(Frequency::Min30),
            "60" => Some(Frequency::Min60),
            "D" => Some(Frequency::Daily),
            "W" => Some(Frequency::Weekly),
            "M" => Some(Frequency::Monthly),
            _ => None,
        }
    }

    // ── TDAmeritrade ────────────────────────────────────────────────
    // pricehistory expresses the interval as (frequencyType, frequency);
    // minute candles only come in 1/5/10/15/30, so Min60 has no encoding.

    pub fn tda_supported() -> &'static [Frequency] {
        &[
            Frequency::Min1,
            Frequency::Min5,
            Frequency::Min15,
            Frequency::Min30,
            Frequency::Daily,
            Frequency::Weekly,
            Frequency::Monthly,
        ]
    }

    pub fn to_tda(self) -> Option<TdaFrequency> {
        match self {
            Frequency::Min1 => Some(TdaFrequency::new("minute", 1)),
            Frequency::Min5 => Some(TdaFrequency::new("minute", 5)),
            Frequency::Min15 => Some(TdaFrequency::new("minute", 15)),
            Frequency::Min30 => Some(TdaFrequency::new("minute", 30)),
            Frequency::Min60 => None,
            Frequency::Daily => Some(TdaFrequency::new("daily", 1)),
            Frequency::Weekly => Some(TdaFrequency::new("weekly", 1)),
            Frequency::Monthly => Some(TdaFrequency::new("monthly", 1)),
        }
    }

    pub fn from_tda(frequency_type: &str, frequency: u32) -> Option<Frequency> {
        match (frequency_type, frequency) {
            ("minute", 1) => Some(Frequency::Min1),
            ("minute", 5) => Some(Frequency::Min5),
            ("minute", 15) => Some(Frequency::Min15),
            ("minute", 30) => Some(Frequency::Min30),
            ("daily", 1) => Some(Frequency::Daily),
            ("weekly", 1) => Some(Frequency::Weekly),
            ("monthly", 1) => Some(Frequency::Monthly),
            _ => None,
        }
    }

    // ── Polygon ─────────────────────────────────────────────────────
    // The free grouped-daily endpoint only serves daily aggregates.

    pub fn polygon_supported() -> &'static [Frequency] {
        &[Frequency::Daily]
    }

    pub fn to_polygon(self) -> Option<&'static str> {
        match self {
            Frequency::Daily => Some("day"),
            _ => None,
        }
    }

    pub fn from_polygon(timespan: &str) -> Option<Frequency> {
        match timespan {
            "day" => Some(Frequency::Daily),
            _ => None,
        }
    }
}

/// TDAmeritrade's two-field interval encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TdaFrequency {
    pub frequency_type: &'static str,
    pub frequency: u32,
}

impl TdaFrequency {
    fn new(frequency_type: &'static str, frequency: u32) -> Self {
        Self {
            frequency_type,
            frequency,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Frequency {
    type Err = FrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1min" => Ok(Frequency::Min1),
            "5min" => Ok(Frequency::Min5),
            "15min" => Ok(Frequency::Min15),
            "30min" => Ok(Frequency::Min30),
            "60min" => Ok(Frequency::Min60),
            "daily" | "D" => Ok(Frequency::Daily),
            "weekly" | "W" => Ok(Frequency::Weekly),
            "monthly" | "M" => Ok(Frequency::Monthly),
            other => Err(FrequencyError::Unknown(other.to_string())),
        }
    }
}

/// Validate every vendor mapping table against its declared support set.
///
/// For each vendor: every declared-supported frequency must round-trip
/// through the table unchanged, and every unsupported frequency must have no
/// encoding at all. Called at facade construction so a drifted table aborts
/// startup instead of corrupting an export.
pub fn validate_mappings() -> Result<(), FrequencyError> {
    for &f in &Frequency::ALL {
        check_vendor(
            "finnhub",
            f,
            Frequency::finnhub_supported().contains(&f),
            Frequency::to_finnhub(f)
                .and_then(Frequency::from_finnhub)
                .map(|back| back == f),
        )?;
        check_vendor(
            "tdameritrade",
            f,
            Frequency::tda_supported().contains(&f),
            Frequency::to_tda(f)
                .and_then(|enc| Frequency::from_tda(enc.frequency_type, enc.frequency))
                .map(|back| back == f),
        )?;
        check_vendor(
            "polygon",
            f,
            Frequency::polygon_supported().contains(&f),
            Frequency::to_polygon(f)
                .and_then(Frequency::from_polygon)
                .map(|back| back == f),
        )?;
    }
    Ok(())
}

fn check_vendor(
    vendor: &'static str,
    frequency: Frequency,
    supported: bool,
    round_trip: Option<bool>,
) -> Result<(), FrequencyError> {
    match (supported, round_trip) {
        (true, Some(true)) | (false, None) => Ok(()),
        (true, _) => Err(FrequencyError::MappingInconsistent { vendor, frequency }),
        (false, Some(_)) => Err(FrequencyError::UnexpectedMapping { vendor, frequency }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_tables_are_consistent() {
        validate_mappings().unwrap();
    }

    #[test]
    fn labels_parse_back() {
        for &f in &Frequency::ALL {
            assert_eq!(f.label().parse::<Frequency>().unwrap(), f);
        }
    }

    #[test]
    fn min60_has_no_tda_encoding() {
        assert!(Frequency::Min60.to_tda().is_none());
    }

    #[test]
    fn finnhub_daily_round_trips() {
        assert_eq!(
            Frequency::from_finnhub(Frequency::Daily.to_finnhub().unwrap()),
            Some(Frequency::Daily)
        );
    }

    #[test]
    fn unknown_label_is_rejected() {
        assert!("hourly".parse::<Frequency>().is_err());
    }
}
