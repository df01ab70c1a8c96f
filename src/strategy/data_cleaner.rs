//! Data Cleaner
//!
//! Prepares model data for the return model: fills gaps on a regular grid,
//! then drops price outliers in two z-score passes.
//!
//! z = (price - mean) / population_std
//!
//! The second pass recomputes the statistics on the once-filtered series,
//! so a spike that inflated the first standard deviation is still caught.

use statrs::statistics::Statistics;
use tracing::debug;

use crate::domain::{CleanedObservation, PriceObservation};
use crate::ports::GapFiller;

/// Fill gaps and remove outliers. Returns carry the simple return against
/// the previous row of the once-filtered series.
pub fn clean_for_garch<F>(series: &[PriceObservation], filler: &F, cutoff: f64) -> Vec<CleanedObservation>
where
    F: GapFiller + ?Sized,
{
    let filled = filler.fill_time(series);
    let filled_len = filled.len();

    let first_pass = drop_outliers(filled, cutoff);
    let first_len = first_pass.len();

    let with_returns = attach_returns(&first_pass);
    let cleaned = drop_outliers(with_returns, cutoff);

    debug!(
        raw = series.len(),
        filled = filled_len,
        first_pass_dropped = filled_len - first_len,
        second_pass_dropped = first_len - cleaned.len(),
        "Model data cleaned"
    );

    cleaned
}

/// Absolute population z-score of every price. `None` when the series has
/// no spread, in which case nothing is an outlier.
pub fn z_scores(prices: &[f64]) -> Option<Vec<f64>> {
    if prices.is_empty() {
        return None;
    }
    let mean = prices.iter().mean();
    let std_dev = prices.iter().population_std_dev();
    if !(std_dev > 0.0) || !std_dev.is_finite() {
        return None;
    }
    Some(prices.iter().map(|p| ((p - mean) / std_dev).abs()).collect())
}

trait Priced {
    fn price(&self) -> f64;
}

impl Priced for PriceObservation {
    fn price(&self) -> f64 {
        self.price
    }
}

impl Priced for CleanedObservation {
    fn price(&self) -> f64 {
        self.price
    }
}

fn drop_outliers<T: Priced>(rows: Vec<T>, cutoff: f64) -> Vec<T> {
    let prices: Vec<f64> = rows.iter().map(Priced::price).collect();
    let Some(scores) = z_scores(&prices) else {
        return rows;
    };
    rows.into_iter()
        .zip(scores)
        .filter(|(_, z)| *z <= cutoff)
        .map(|(row, _)| row)
        .collect()
}

fn attach_returns(rows: &[PriceObservation]) -> Vec<CleanedObservation> {
    let mut previous: Option<f64> = None;
    rows.iter()
        .map(|row| {
            let price_return = previous.map(|prev| row.price / prev - 1.0);
            previous = Some(row.price);
            CleanedObservation {
                timestamp: row.timestamp,
                price: row.price,
                price_return,
            }
        })
        .collect()
}
