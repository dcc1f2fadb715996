//! The "perfect setup" filter and the report built from it.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    classify::{Verdict, Volatility},
    pipeline::Analysis,
    record::round2,
};

/// Thresholds for predicates 3 and 4.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterCriteria {
    pub min_score: i8,
    pub max_risk_pct: f64,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            min_score: 3,
            max_risk_pct: 5.0,
        }
    }
}

/// First predicate an analysis failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NotABuy,
    UnhealthyVolatility,
    ScoreTooLow,
    RiskTooHigh,
    PriceNotInZone,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotABuy => "verdict is not a buy",
            Self::UnhealthyVolatility => "volatility is not healthy",
            Self::ScoreTooLow => "score below minimum",
            Self::RiskTooHigh => "no risk plan or risk too high",
            Self::PriceNotInZone => "price above mid price or in the expensive zone",
        })
    }
}

impl FilterCriteria {
    /// Checks the predicates in order and reports the first one that fails.
    pub fn evaluate(&self, a: &Analysis) -> Result<(), Rejection> {
        if !a.signal.verdict.is_buy() {
            return Err(Rejection::NotABuy);
        }
        if a.volatility != Volatility::Healthy {
            return Err(Rejection::UnhealthyVolatility);
        }
        if a.signal.score < self.min_score {
            return Err(Rejection::ScoreTooLow);
        }
        if !a.risk.is_some_and(|r| r.risk_pct <= self.max_risk_pct) {
            return Err(Rejection::RiskTooHigh);
        }
        let price = a.snapshot.price;
        match a.levels {
            Some(lv) if price <= lv.mid_price && price < lv.expensive_zone => Ok(()),
            _ => Err(Rejection::PriceNotInZone),
        }
    }

    pub fn accepts(&self, a: &Analysis) -> bool {
        self.evaluate(a).is_ok()
    }

    /// The analyses that pass, in input order.
    pub fn select<'a>(&self, analyses: &'a [Analysis]) -> Vec<&'a Analysis> {
        analyses
            .iter()
            .filter(|a| match self.evaluate(a) {
                Ok(()) => true,
                Err(reason) => {
                    debug!(symbol = a.symbol(), %reason, "not an opportunity");
                    false
                }
            })
            .collect()
    }
}

/// One qualifying setup as it is published.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Opportunity {
    pub ticker: String,
    pub verdict: Verdict,
    pub price: f64,
    pub stop: f64,
    pub tp1: f64,
    pub tp2: f64,
    pub risk_pct: f64,
    pub atr_pct: f64,
    pub score: i8,
    pub support: f64,
    pub mid_price: f64,
    pub expensive_zone: f64,
    pub timestamp: String,
}

impl Opportunity {
    /// `None` unless the analysis carries a plan and levels.
    fn from_analysis(a: &Analysis, timestamp: &str) -> Option<Self> {
        let risk = a.risk?;
        let levels = a.levels?;
        Some(Self {
            ticker: a.symbol().to_string(),
            verdict: a.signal.verdict,
            price: round2(a.snapshot.price),
            stop: round2(risk.stop),
            tp1: round2(risk.tp1),
            tp2: round2(risk.tp2),
            risk_pct: round2(risk.risk_pct),
            atr_pct: round2(a.snapshot.atr_pct),
            score: a.signal.score,
            support: round2(levels.support),
            mid_price: round2(levels.mid_price),
            expensive_zone: round2(levels.expensive_zone),
            timestamp: timestamp.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpportunityReport {
    pub market: String,
    pub qualifying: bool,
    pub count: usize,
    pub items: Vec<Opportunity>,
}

impl OpportunityReport {
    pub fn build(
        market: impl Into<String>,
        criteria: &FilterCriteria,
        analyses: &[Analysis],
        timestamp: &str,
    ) -> Self {
        let items: Vec<Opportunity> = criteria
            .select(analyses)
            .into_iter()
            .filter_map(|a| Opportunity::from_analysis(a, timestamp))
            .collect();
        Self {
            market: market.into(),
            qualifying: !items.is_empty(),
            count: items.len(),
            items,
        }
    }
}
