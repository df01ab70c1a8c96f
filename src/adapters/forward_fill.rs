//! Forward-fill gap filler
//!
//! Resamples a price series onto a regular grid starting at the first
//! sample, carrying the last known price into empty slots.

use chrono::Duration;

use crate::domain::PriceObservation;
use crate::ports::GapFiller;

/// Default grid step in minutes
pub const DEFAULT_STEP_MINUTES: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardFill {
    step: Duration,
}

impl Default for ForwardFill {
    fn default() -> Self {
        Self::new(Duration::minutes(DEFAULT_STEP_MINUTES))
    }
}

impl ForwardFill {
    pub fn new(step: Duration) -> Self {
        Self { step }
    }

    pub fn step(&self) -> Duration {
        self.step
    }
}

impl GapFiller for ForwardFill {
    fn fill_time(&self, series: &[PriceObservation]) -> Vec<PriceObservation> {
        let (Some(first), Some(last)) = (series.first(), series.last()) else {
            return Vec::new();
        };
        if self.step <= Duration::zero() {
            return series.to_vec();
        }

        let mut filled = Vec::new();
        let mut next = 0;
        let mut price = first.price;
        let mut t = first.timestamp;
        while t <= last.timestamp {
            // Latest sample at or before the grid point wins
            while next < series.len() && series[next].timestamp <= t {
                price = series[next].price;
                next += 1;
            }
            filled.push(PriceObservation::new(t, price));
            match t.checked_add_signed(self.step) {
                Some(following) => t = following,
                None => break,
            }
        }
        filled
    }
}
