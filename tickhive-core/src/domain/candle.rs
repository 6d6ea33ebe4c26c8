//! Candle — the fundamental market data unit.

use chrono::TimeZone;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::Frequency;

/// Timezones rendered into sink rows. Presentation-only: the canonical
/// timestamp stays epoch seconds and all ordering uses it, never these.
pub const RENDERED_ZONES: [Tz; 3] = [
    chrono_tz::UTC,
    chrono_tz::America::New_York,
    chrono_tz::Europe::Zurich,
];

/// One OHLCV observation for a symbol at a point in time.
///
/// `ts` is canonical seconds-since-epoch regardless of the source vendor's
/// own encoding (some send milliseconds). `low` is absent in some feeds and
/// stays absent rather than becoming zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub symbol: String,
    pub frequency: Frequency,
    pub ts: i64,
    pub open: f64,
    pub high: f64,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: u64,
}

impl Candle {
    /// Render the canonical timestamp as a wall-clock string in `tz`.
    pub fn rendered(&self, tz: Tz) -> String {
        match tz.timestamp_opt(self.ts, 0) {
            chrono::LocalResult::Single(dt) | chrono::LocalResult::Ambiguous(dt, _) => {
                dt.format("%Y-%m-%d %H:%M:%S").to_string()
            }
            chrono::LocalResult::None => String::new(),
        }
    }

    /// Basic OHLC sanity check: high bounds open/close, prices positive.
    pub fn is_sane(&self) -> bool {
        let low_ok = match self.low {
            Some(low) => low <= self.high && low <= self.open && low <= self.close && low > 0.0,
            None => true,
        };
        self.high >= self.open && self.high >= self.close && self.open > 0.0 && self.close > 0.0 && low_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_candle() -> Candle {
        Candle {
            symbol: "SPY".into(),
            frequency: Frequency::Daily,
            ts: 1_577_977_200, // 2020-01-02 15:00:00 UTC
            open: 100.0,
            high: 105.0,
            low: Some(98.0),
            close: 103.0,
            volume: 50_000,
        }
    }

    #[test]
    fn candle_is_sane() {
        assert!(sample_candle().is_sane());
    }

    #[test]
    fn candle_without_low_is_sane() {
        let mut candle = sample_candle();
        candle.low = None;
        assert!(candle.is_sane());
    }

    #[test]
    fn candle_detects_insane_high() {
        let mut candle = sample_candle();
        candle.high = 97.0; // below open and close
        assert!(!candle.is_sane());
    }

    #[test]
    fn rendered_utc_matches_epoch() {
        let candle = sample_candle();
        assert_eq!(candle.rendered(chrono_tz::UTC), "2020-01-02 15:00:00");
    }

    #[test]
    fn rendered_eastern_is_five_hours_behind_in_winter() {
        let candle = sample_candle();
        assert_eq!(
            candle.rendered(chrono_tz::America::New_York),
            "2020-01-02 10:00:00"
        );
    }

    #[test]
    fn rendering_never_touches_canonical_ts() {
        let candle = sample_candle();
        let before = candle.ts;
        for tz in RENDERED_ZONES {
            let _ = candle.rendered(tz);
        }
        assert_eq!(candle.ts, before);
    }
}
