//! Export window — the (from, to) pair driving one chunk of a historical pull.

/// Seconds in the fixed one-day stride.
pub const DAY_STRIDE_SECS: i64 = 24 * 60 * 60;

/// One chunk's bounds, epoch seconds. Created fresh per (symbol, frequency)
/// pair; never persisted, so a rerun restarts from the configured start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportWindow {
    pub from: i64,
    pub to: i64,
    stride: i64,
}

impl ExportWindow {
    pub fn new(from: i64, to: i64) -> Self {
        Self {
            from,
            to,
            stride: DAY_STRIDE_SECS,
        }
    }

    /// Shift both bounds forward by one stride.
    pub fn advance(&mut self) {
        self.from += self.stride;
        self.to += self.stride;
    }

    /// Terminal once the window end has caught up with the wall clock.
    pub fn is_done(&self, now: i64) -> bool {
        self.to >= now
    }
}
