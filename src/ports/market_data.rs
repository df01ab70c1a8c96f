//! Market data preparation port
//!
//! Raw price observations arrive with gaps; the model expects an evenly
//! spaced series. The filler decides the grid and how gaps are filled.

use crate::domain::PriceObservation;

#[cfg_attr(test, mockall::automock)]
pub trait GapFiller {
    /// Evenly spaced copy of `series` (input sorted by timestamp)
    fn fill_time(&self, series: &[PriceObservation]) -> Vec<PriceObservation>;
}
