//! MACD: `EMA(close, fast) - EMA(close, slow)` and its `signal`-span EMA.

use serde::Serialize;

use super::ema::{ema_last, ema_series};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Macd {
    pub line: f64,
    pub signal: f64,
}

impl Macd {
    pub fn histogram(&self) -> f64 {
        self.line - self.signal
    }
}

/// MACD at the last close. `None` until the slow EMA window is filled.
pub fn macd(close: &[f64], fast: usize, slow: usize, signal: usize) -> Option<Macd> {
    if fast == 0 || slow == 0 || signal == 0 || close.len() < fast.max(slow) {
        return None;
    }
    let fast_ema = ema_series(close, fast);
    let slow_ema = ema_series(close, slow);
    let line: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();

    Some(Macd {
        line: *line.last()?,
        signal: ema_last(&line, signal)?,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn flat_prices_give_zero_macd() {
        let m = macd(&[50.0; 60], 12, 26, 9).unwrap();
        assert_abs_diff_eq!(m.line, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(m.signal, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn rising_prices_put_line_above_signal() {
        let close: Vec<f64> = (0..120).map(|i| 10.0 + i as f64 * 0.5).collect();
        let m = macd(&close, 12, 26, 9).unwrap();
        assert!(m.line > 0.0);
        assert!(m.line > m.signal);
        assert!(m.histogram() > 0.0);
    }

    #[test]
    fn falling_prices_put_line_below_signal() {
        let close: Vec<f64> = (0..120).map(|i| 200.0 - i as f64).collect();
        let m = macd(&close, 12, 26, 9).unwrap();
        assert!(m.line < m.signal);
    }

    #[test]
    fn undefined_before_slow_window() {
        assert!(macd(&[1.0; 25], 12, 26, 9).is_none());
        assert!(macd(&[1.0; 26], 12, 26, 9).is_some());
    }
}
