//! KDJ stochastic oscillator.
//!
//! ```text
//! RSV = (close - min(low, n)) / (max(high, n) - min(low, n)) * 100
//! K   = 2/3 * K_prev + 1/3 * RSV        (K_prev seeded at 50)
//! D   = 2/3 * D_prev + 1/3 * K          (D_prev seeded at 50)
//! J   = 3K - 2D
//! ```

use serde::{Deserialize, Serialize};

use super::check_lengths;
use crate::error::IndicatorError;

const SEED: f64 = 50.0;
const WEIGHT: f64 = 1.0 / 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Kdj {
    pub k: f64,
    pub d: f64,
    pub j: f64,
}

/// How K and D are smoothed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KdjSmoothing {
    /// The recursion runs across every bar with a defined RSV. Bars whose
    /// range is zero leave K and D unchanged.
    #[default]
    Recursive,
    /// A single smoothing step from the seed, applied to the last RSV only.
    Seeded,
}

fn step(prev: f64, input: f64) -> f64 {
    (1.0 - WEIGHT) * prev + WEIGHT * input
}

/// RSV for the window ending at index `i` (inclusive).
fn rsv_at(high: &[f64], low: &[f64], close: &[f64], window: usize, i: usize) -> Option<f64> {
    if window == 0 || i + 1 < window {
        return None;
    }
    let start = i + 1 - window;
    let hh = high[start..=i].iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let ll = low[start..=i].iter().copied().fold(f64::INFINITY, f64::min);
    let range = hh - ll;
    if range <= 0.0 || !range.is_finite() {
        return None;
    }
    Some((close[i] - ll) / range * 100.0)
}

/// KDJ at the last bar. `Ok(None)` when history is short or the last
/// window's range is zero.
pub fn kdj(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    window: usize,
    smoothing: KdjSmoothing,
) -> Result<Option<Kdj>, IndicatorError> {
    check_lengths(high, low, close)?;
    let Some(last) = close.len().checked_sub(1) else {
        return Ok(None);
    };
    let Some(last_rsv) = rsv_at(high, low, close, window, last) else {
        return Ok(None);
    };

    let (k, d) = match smoothing {
        KdjSmoothing::Seeded => {
            let k = step(SEED, last_rsv);
            (k, step(SEED, k))
        }
        KdjSmoothing::Recursive => {
            let (mut k, mut d) = (SEED, SEED);
            for i in (window - 1)..close.len() {
                if let Some(rsv) = rsv_at(high, low, close, window, i) {
                    k = step(k, rsv);
                    d = step(d, k);
                }
            }
            (k, d)
        }
    };

    Ok(Some(Kdj { k, d, j: 3.0 * k - 2.0 * d }))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn trending(n: usize, slope: f64) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let close: Vec<f64> = (0..n).map(|i| 100.0 + slope * i as f64).collect();
        let high = close.iter().map(|c| c + 1.0).collect();
        let low = close.iter().map(|c| c - 1.0).collect();
        (high, low, close)
    }

    #[test]
    fn seeded_applies_one_step_from_fifty() {
        let high = vec![10.0; 14];
        let low = vec![0.0; 14];
        let mut close = vec![5.0; 14];
        close[13] = 8.0; // RSV = 80

        let kdj = kdj(&high, &low, &close, 14, KdjSmoothing::Seeded).unwrap().unwrap();
        assert_relative_eq!(kdj.k, 60.0, epsilon = 1e-9);
        assert_relative_eq!(kdj.d, 50.0 + 10.0 / 3.0, epsilon = 1e-9);
        assert_relative_eq!(kdj.j, 3.0 * kdj.k - 2.0 * kdj.d, epsilon = 1e-9);
    }

    #[test]
    fn uptrend_puts_k_above_d() {
        let (h, l, c) = trending(60, 1.0);
        for mode in [KdjSmoothing::Seeded, KdjSmoothing::Recursive] {
            let kdj = kdj(&h, &l, &c, 14, mode).unwrap().unwrap();
            assert!(kdj.k >= kdj.d, "{mode:?}: {kdj:?}");
        }
        let seeded = kdj(&h, &l, &c, 14, KdjSmoothing::Seeded).unwrap().unwrap();
        assert!(seeded.k > seeded.d);
    }

    #[test]
    fn recursive_converges_towards_rsv() {
        // Steady uptrend: RSV is constant at 14/15 * 100.
        let (h, l, c) = trending(200, 1.0);
        let kdj = kdj(&h, &l, &c, 14, KdjSmoothing::Recursive).unwrap().unwrap();
        assert_relative_eq!(kdj.k, 1400.0 / 15.0, epsilon = 1e-6);
        assert_relative_eq!(kdj.d, 1400.0 / 15.0, epsilon = 1e-6);
    }

    #[test]
    fn recursive_default_sees_k_cross_below_d_after_a_pullback() {
        // 240-bar climb, then four closes stepping down by one.
        let close: Vec<f64> = (0..244)
            .map(|i| if i < 240 { 100.0 + i as f64 } else { 339.0 - (i - 239) as f64 })
            .collect();
        let high: Vec<f64> = close.iter().map(|c| c + 1.0).collect();
        let low: Vec<f64> = close.iter().map(|c| c - 1.0).collect();

        let recursive = kdj(&high, &low, &close, 14, KdjSmoothing::default()).unwrap().unwrap();
        assert_relative_eq!(recursive.k, 71.29, epsilon = 0.01);
        assert_relative_eq!(recursive.d, 81.64, epsilon = 0.01);
        assert_relative_eq!(recursive.j, 50.61, epsilon = 0.01);
        assert!(recursive.k < recursive.d);

        // The one-step variant forgets the history and still reads K > D.
        let seeded = kdj(&high, &low, &close, 14, KdjSmoothing::Seeded).unwrap().unwrap();
        assert!(seeded.k > seeded.d);
    }

    #[test]
    fn zero_range_is_undefined() {
        let flat = vec![3.0; 30];
        assert_eq!(kdj(&flat, &flat, &flat, 14, KdjSmoothing::Seeded).unwrap(), None);
        assert_eq!(kdj(&flat, &flat, &flat, 14, KdjSmoothing::Recursive).unwrap(), None);
    }

    #[test]
    fn short_history_is_undefined() {
        let (h, l, c) = trending(13, 1.0);
        assert_eq!(kdj(&h, &l, &c, 14, KdjSmoothing::Seeded).unwrap(), None);
    }

    #[test]
    fn mismatched_columns_are_an_error() {
        let err = kdj(&[1.0; 3], &[1.0; 2], &[1.0; 3], 2, KdjSmoothing::Seeded).unwrap_err();
        assert_eq!(err, IndicatorError::LengthMismatch { high: 3, low: 2, close: 3 });
    }
}
