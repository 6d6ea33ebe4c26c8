//! Request pacing — the fixed minimum inter-request delay per vendor.
//!
//! Prevention, not reaction: the pause keeps us under each vendor's
//! published rate limit instead of reacting to 429s with backoff. The state
//! sits behind a mutex so a concurrent export across (symbol, frequency)
//! pairs shares one limiter per vendor — the limit is per-account, not
//! per-pair.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Trait seam so tests observe pacing without sleeping.
pub trait Pacer {
    /// Block until at least the vendor's minimum interval has passed since
    /// the previous call.
    fn pace(&self);
}

/// Wall-clock pacer with a fixed minimum interval.
#[derive(Debug)]
pub struct FixedDelayPacer {
    interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl FixedDelayPacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_request: Mutex::new(None),
        }
    }
}

impl Pacer for FixedDelayPacer {
    fn pace(&self) {
        let mut last = self.last_request.lock().unwrap();
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.interval {
                std::thread::sleep(self.interval - elapsed);
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_call_does_not_block() {
        let pacer = FixedDelayPacer::new(Duration::from_secs(60));
        let start = Instant::now();
        pacer.pace();
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn second_call_waits_out_the_interval() {
        let pacer = FixedDelayPacer::new(Duration::from_millis(50));
        pacer.pace();
        let start = Instant::now();
        pacer.pace();
        assert!(start.elapsed() >= Duration::from_millis(45));
    }
}
