//! Exponential moving average.
//!
//! ```text
//! EMA_0 = x_0
//! EMA_t = α * x_t + (1 - α) * EMA_{t-1}    where α = 2 / (span + 1)
//! ```
//!
//! Seeded with the first value and never bias-adjusted.

fn alpha(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

/// EMA over the whole slice, same length as the input.
///
/// A zero span yields an empty vector.
pub fn ema_series(values: &[f64], span: usize) -> Vec<f64> {
    if span == 0 {
        return Vec::new();
    }
    let a = alpha(span);
    let mut out = Vec::with_capacity(values.len());
    let mut iter = values.iter();
    if let Some(&first) = iter.next() {
        let mut prev = first;
        out.push(prev);
        for &x in iter {
            prev = a.mul_add(x, (1.0 - a) * prev);
            out.push(prev);
        }
    }
    out
}

/// EMA at the last value. `None` with fewer than `span` values.
pub fn ema_last(values: &[f64], span: usize) -> Option<f64> {
    if span == 0 || values.len() < span {
        return None;
    }
    let a = alpha(span);
    values
        .iter()
        .copied()
        .reduce(|prev, x| a.mul_add(x, (1.0 - a) * prev))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn series_and_last_agree() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.7).sin() * 3.0).collect();
        let series = ema_series(&prices, 12);
        assert_eq!(series.len(), prices.len());
        assert_relative_eq!(*series.last().unwrap(), ema_last(&prices, 12).unwrap(), epsilon = 1e-12);
    }

    #[test]
    fn seeded_with_first_value() {
        // α = 0.5 for span 3.
        let series = ema_series(&[10.0, 20.0, 20.0], 3);
        assert_eq!(series, vec![10.0, 15.0, 17.5]);
    }

    #[test]
    fn short_input_is_undefined() {
        assert_eq!(ema_last(&[1.0, 2.0], 3), None);
        assert_eq!(ema_last(&[], 1), None);
        assert!(ema_series(&[1.0], 0).is_empty());
    }

    #[test]
    fn constant_input_is_a_fixed_point() {
        assert_relative_eq!(ema_last(&[42.0; 250], 200).unwrap(), 42.0, epsilon = 1e-9);
    }
}
