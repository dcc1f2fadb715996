//! Bollinger Bands: SMA(window) ± k · sample standard deviation(window).

use serde::Serialize;

use super::stats::{mean, sample_std_dev, tail};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bands {
    pub upper: f64,
    pub mid: f64,
    pub lower: f64,
}

pub fn bollinger(close: &[f64], window: usize, k: f64) -> Option<Bands> {
    let w = tail(close, window)?;
    let mid = mean(w)?;
    let sd = sample_std_dev(w)?;
    Some(Bands {
        upper: mid + k * sd,
        mid,
        lower: mid - k * sd,
    })
}
