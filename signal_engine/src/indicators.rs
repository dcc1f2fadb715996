//! Closed-form technical indicators evaluated at the last bar of a series.
//!
//! Every function is pure and recomputes from the full slice it is given.
//! "Not enough history" and "division by a zero range" come back as `None`;
//! only misuse (columns of different lengths) is an error.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod kdj;
pub mod macd;
pub mod rsi;
pub mod stats;

pub use atr::{atr, true_range};
pub use bollinger::{Bands, bollinger};
pub use ema::{ema_last, ema_series};
pub use kdj::{Kdj, KdjSmoothing, kdj};
pub use macd::{Macd, macd};
pub use rsi::rsi;
pub use stats::{percentile, sample_std_dev, sma_last};

use crate::error::IndicatorError;

pub(crate) fn check_lengths(high: &[f64], low: &[f64], close: &[f64]) -> Result<(), IndicatorError> {
    if high.len() == close.len() && low.len() == close.len() {
        Ok(())
    } else {
        Err(IndicatorError::LengthMismatch {
            high: high.len(),
            low: low.len(),
            close: close.len(),
        })
    }
}
