//! Relative Strength Index with simple rolling means (not Wilder smoothing).
//!
//! ```text
//! gain = mean(max(Δ, 0)) over the last n deltas
//! loss = mean(max(-Δ, 0)) over the last n deltas
//! RSI  = 100 - 100 / (1 + gain / loss)
//! ```

/// RSI at the last close.
///
/// With `loss == 0` the ratio is infinite and RSI saturates at 100. A window
/// with neither gains nor losses is undefined (`None`), as is a series with
/// fewer than `period + 1` closes.
pub fn rsi(close: &[f64], period: usize) -> Option<f64> {
    if period == 0 || close.len() < period + 1 {
        return None;
    }
    let window = &close[close.len() - period - 1..];
    let (gain_sum, loss_sum) = window.windows(2).fold((0.0, 0.0), |(g, l), pair| {
        let delta = pair[1] - pair[0];
        if delta > 0.0 {
            (g + delta, l)
        } else {
            (g, l - delta)
        }
    });
    let gain = gain_sum / period as f64;
    let loss = loss_sum / period as f64;

    if loss == 0.0 {
        return (gain > 0.0).then_some(100.0);
    }
    Some(100.0 - 100.0 / (1.0 + gain / loss))
}
