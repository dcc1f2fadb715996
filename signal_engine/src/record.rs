//! Flat, rounded output record for one analyzed instrument.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::{
    classify::{Direction, PricePosition, Verdict, Volatility, Zone},
    pipeline::Analysis,
};

/// Layout of every timestamp the scanner prints.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Rounds half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

/// `t` rendered in `tz` with [`TIMESTAMP_FORMAT`].
pub fn format_timestamp(t: DateTime<Utc>, tz: Tz) -> String {
    t.with_timezone(&tz).format(TIMESTAMP_FORMAT).to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRecord {
    pub ticker: String,
    pub timestamp: String,
    pub bar_timestamp: DateTime<Utc>,
    pub price: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_state: Direction,
    pub bollinger_upper: f64,
    pub bollinger_lower: f64,
    pub bollinger_state: Zone,
    pub k: Option<f64>,
    pub d: Option<f64>,
    pub j: Option<f64>,
    pub kdj_state: Option<Direction>,
    pub rsi: Option<f64>,
    pub rsi_state: Option<Zone>,
    pub ema20: f64,
    pub ema50: f64,
    pub ema200: f64,
    pub trend: Direction,
    pub price_vs_ema50: PricePosition,
    pub atr: f64,
    pub atr_pct: f64,
    pub volatility: Volatility,
    pub verdict: Verdict,
    pub score: i8,
    pub explanation: String,
    pub stop: Option<f64>,
    pub tp1: Option<f64>,
    pub tp2: Option<f64>,
    pub risk_pct: Option<f64>,
    pub support: Option<f64>,
    pub mid_price: Option<f64>,
    pub expensive_zone: Option<f64>,
}

impl AnalysisRecord {
    /// Flattens `a`; `timestamp` is the already formatted scan time.
    pub fn new(a: &Analysis, timestamp: &str) -> Self {
        let s = &a.snapshot;
        Self {
            ticker: s.symbol.clone(),
            timestamp: timestamp.to_string(),
            bar_timestamp: s.timestamp,
            price: round2(s.price),
            macd: round_to(s.macd.line, 4),
            macd_signal: round_to(s.macd.signal, 4),
            macd_state: s.states.macd,
            bollinger_upper: round2(s.bollinger.upper),
            bollinger_lower: round2(s.bollinger.lower),
            bollinger_state: s.states.bollinger,
            k: s.kdj.map(|v| round2(v.k)),
            d: s.kdj.map(|v| round2(v.d)),
            j: s.kdj.map(|v| round2(v.j)),
            kdj_state: s.states.kdj,
            rsi: s.rsi.map(round2),
            rsi_state: s.states.rsi,
            ema20: round2(s.ema20),
            ema50: round2(s.ema50),
            ema200: round2(s.ema200),
            trend: s.states.trend,
            price_vs_ema50: s.states.price_vs_ema50,
            atr: round2(s.atr),
            atr_pct: round2(s.atr_pct),
            volatility: a.volatility,
            verdict: a.signal.verdict,
            score: a.signal.score,
            explanation: a.signal.explanation.clone(),
            stop: a.risk.map(|r| round2(r.stop)),
            tp1: a.risk.map(|r| round2(r.tp1)),
            tp2: a.risk.map(|r| round2(r.tp2)),
            risk_pct: a.risk.map(|r| round2(r.risk_pct)),
            support: a.levels.map(|l| round2(l.support)),
            mid_price: a.levels.map(|l| round2(l.mid_price)),
            expensive_zone: a.levels.map(|l| round2(l.expensive_zone)),
        }
    }
}
