//! Reference price zones read by the opportunity filter.

use serde::{Deserialize, Serialize};

use crate::indicators::percentile;

/// Support, mid price and expensive zone for one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLevels {
    pub support: f64,
    pub mid_price: f64,
    pub expensive_zone: f64,
}

/// Percentile model over the trailing closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ZoneModel {
    pub support_pct: f64,
    pub mid_pct: f64,
    pub expensive_pct: f64,
    /// Trailing bars to use; `None` means the whole series.
    pub window: Option<usize>,
}

impl Default for ZoneModel {
    fn default() -> Self {
        Self {
            support_pct: 20.0,
            mid_pct: 50.0,
            expensive_pct: 80.0,
            window: None,
        }
    }
}

impl ZoneModel {
    /// Problems with the configured percentiles, if any.
    pub fn validate(&self) -> Result<(), String> {
        let pcts = [self.support_pct, self.mid_pct, self.expensive_pct];
        if pcts.iter().any(|p| !(0.0..=100.0).contains(p)) {
            return Err(format!("zone percentiles must lie in [0, 100], got {pcts:?}"));
        }
        if !(self.support_pct <= self.mid_pct && self.mid_pct <= self.expensive_pct) {
            return Err(format!(
                "zone percentiles must be ordered support <= mid <= expensive, got {pcts:?}"
            ));
        }
        if self.window == Some(0) {
            return Err("zone window must be positive".to_string());
        }
        Ok(())
    }

    pub fn levels(&self, closes: &[f64]) -> Option<ReferenceLevels> {
        let closes = match self.window {
            Some(w) if w < closes.len() => &closes[closes.len() - w..],
            _ => closes,
        };
        Some(ReferenceLevels {
            support: percentile(closes, self.support_pct)?,
            mid_price: percentile(closes, self.mid_pct)?,
            expensive_zone: percentile(closes, self.expensive_pct)?,
        })
    }
}
