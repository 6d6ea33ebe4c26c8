//! Candle normalizer — maps vendor-shaped responses to canonical candles.
//!
//! Used identically whether the data came from a paginated historical pull
//! or a one-shot quote-adjacent fetch. The two vendor shapes get different
//! error policies:
//! - column arrays: unequal lengths reject the whole response (the arrays
//!   are positionally coupled, a partial emit would misalign fields)
//! - row objects: a row missing a required field is dropped with a warning,
//!   surrounding rows still emit

use tracing::warn;

use super::provider::{CandleResponse, CandleRow, DataError};
use crate::domain::{Candle, Frequency};

/// Normalize one vendor response into candles, ascending by timestamp.
pub fn normalize(
    response: CandleResponse,
    symbol: &str,
    frequency: Frequency,
) -> Result<Vec<Candle>, DataError> {
    let mut candles = match response {
        CandleResponse::Columns { unit, t, o, h, l, c, v } => {
            let n = t.len();
            let columns_equal = o.len() == n
                && h.len() == n
                && c.len() == n
                && v.len() == n
                && l.as_ref().map_or(true, |l| l.len() == n);
            if !columns_equal {
                return Err(DataError::ShapeMismatch(format!(
                    "parallel arrays differ in length for {symbol}: t={} o={} h={} c={} v={}",
                    n,
                    o.len(),
                    h.len(),
                    c.len(),
                    v.len(),
                )));
            }

            let mut candles = Vec::with_capacity(n);
            for i in 0..n {
                candles.push(Candle {
                    symbol: symbol.to_string(),
                    frequency,
                    ts: unit.to_seconds(t[i]),
                    open: o[i],
                    high: h[i],
                    low: l.as_ref().map(|l| l[i]),
                    close: c[i],
                    volume: v[i],
                });
            }
            candles
        }
        CandleResponse::Rows { unit, rows } => {
            let mut candles = Vec::with_capacity(rows.len());
            for row in rows {
                match row_to_candle(&row, symbol, frequency) {
                    Ok(mut candle) => {
                        candle.ts = unit.to_seconds(candle.ts);
                        candles.push(candle);
                    }
                    Err(DataError::MissingField { field }) => {
                        warn!(symbol, %frequency, field, "dropping candle row with missing field");
                    }
                    Err(e) => return Err(e),
                }
            }
            candles
        }
    };

    candles.sort_by_key(|c| c.ts);
    Ok(candles)
}

fn row_to_candle(row: &CandleRow, symbol: &str, frequency: Frequency) -> Result<Candle, DataError> {
    Ok(Candle {
        symbol: symbol.to_string(),
        frequency,
        ts: row.ts.ok_or(DataError::MissingField { field: "ts" })?,
        open: row.open.ok_or(DataError::MissingField { field: "open" })?,
        high: row.high.ok_or(DataError::MissingField { field: "high" })?,
        low: row.low,
        close: row.close.ok_or(DataError::MissingField { field: "close" })?,
        volume: row.volume.ok_or(DataError::MissingField { field: "volume" })?,
    })
}
