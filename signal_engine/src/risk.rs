//! ATR-based stop and take-profit levels for buy-type verdicts.

use serde::Serialize;

use crate::classify::Verdict;

/// How far below entry the stop sits, in ATR multiples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopProfile {
    /// 2.0 × ATR, used for COMPRA FUERTE.
    Conservative,
    /// 1.5 × ATR, used for POSIBLE COMPRA.
    Aggressive,
}

impl StopProfile {
    pub fn for_verdict(verdict: Verdict) -> Option<Self> {
        match verdict {
            Verdict::StrongBuy => Some(Self::Conservative),
            Verdict::PossibleBuy => Some(Self::Aggressive),
            _ => None,
        }
    }

    pub fn atr_multiple(&self) -> f64 {
        match self {
            Self::Conservative => 2.0,
            Self::Aggressive => 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskPlan {
    pub profile: StopProfile,
    pub entry: f64,
    pub stop: f64,
    pub tp1: f64,
    pub tp2: f64,
    pub risk: f64,
    pub risk_pct: f64,
}

/// Builds the plan for `verdict` at `price`.
///
/// Returns `None` for sell-type and neutral verdicts, and whenever the
/// inputs cannot give stop < price.
pub fn plan(verdict: Verdict, price: f64, atr: f64) -> Option<RiskPlan> {
    let profile = StopProfile::for_verdict(verdict)?;
    if !(price.is_finite() && atr.is_finite() && price > 0.0 && atr > 0.0) {
        return None;
    }
    let stop = price - profile.atr_multiple() * atr;
    let risk = price - stop;
    let tp1 = price + risk;
    let tp2 = price + 2.0 * risk;
    // Catastrophic cancellation on tiny ATRs can collapse the ladder.
    if !(stop < price && price < tp1 && tp1 < tp2) {
        return None;
    }
    Some(RiskPlan {
        profile,
        entry: price,
        stop,
        tp1,
        tp2,
        risk,
        risk_pct: 100.0 * risk / price,
    })
}
