//! Average True Range as a simple mean of the last `period` true ranges.
//!
//! ```text
//! TR  = max(high - low, |high - prev_close|, |low - prev_close|)
//! ATR = mean(TR over the last period bars)
//! ```

use super::check_lengths;
use crate::error::IndicatorError;

#[inline]
pub fn true_range(high: f64, low: f64, prev_close: f64) -> f64 {
    let hl = high - low;
    let hc = (high - prev_close).abs();
    let lc = (low - prev_close).abs();
    hl.max(hc).max(lc)
}

/// ATR at the last bar. Needs `period + 1` bars since every true range
/// looks at the previous close.
pub fn atr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Result<Option<f64>, IndicatorError> {
    check_lengths(high, low, close)?;
    let n = close.len();
    if period == 0 || n < period + 1 {
        return Ok(None);
    }
    let sum: f64 = (n - period..n)
        .map(|i| true_range(high[i], low[i], close[i - 1]))
        .sum();
    Ok(Some(sum / period as f64))
}
