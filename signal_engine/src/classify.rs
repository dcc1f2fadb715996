//! Turns indicator levels into discrete states, a confluence score, and a
//! verdict.
//!
//! Each indicator gets one state. Six sub-signals then vote:
//!
//! | Sub-signal       | +1                    | -1                     | 0                 |
//! |------------------|-----------------------|------------------------|-------------------|
//! | MACD             | line > signal         | otherwise              |                   |
//! | RSI              | < 30                  | > 70                   | normal, undefined |
//! | Bollinger        | price < lower band    | price > upper band     | inside the bands  |
//! | Trend            | EMA50 > EMA200        | otherwise              |                   |
//! | Price vs EMA50   | above                 | otherwise              |                   |
//! | KDJ              | K > D                 | K < D                  | undefined, K ≈ D  |
//!
//! The score maps to a verdict with fixed thresholds; [`StrongGate`] decides
//! whether a strong verdict additionally needs every sub-signal aligned.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    indicators::{Bands, Kdj, Macd},
    snapshot::IndicatorSnapshot,
};

const RSI_OVERSOLD: f64 = 30.0;
const RSI_OVERBOUGHT: f64 = 70.0;
/// RSI band the conjunctive gate accepts for a strong verdict.
const RSI_MID_BAND: (f64, f64) = (40.0, 60.0);

/// K and D closer than this have no cross to read. A long steady trend
/// drives both lines to the same fixed point, where only rounding noise
/// separates them.
const KDJ_TIE: f64 = 1e-9;

const STRONG_SCORE: i8 = 4;
const POSSIBLE_SCORE: i8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    #[serde(rename = "Alcista")]
    Bullish,
    #[serde(rename = "Bajista")]
    Bearish,
}

impl Direction {
    fn from_gt(a: f64, b: f64) -> Self {
        if a > b { Self::Bullish } else { Self::Bearish }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Bullish => "Alcista",
            Self::Bearish => "Bajista",
        }
    }

    fn points(&self) -> i8 {
        match self {
            Self::Bullish => 1,
            Self::Bearish => -1,
        }
    }
}

/// Where a value sits relative to its extremes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Zone {
    #[serde(rename = "Sobreventa")]
    Oversold,
    #[serde(rename = "Normal")]
    Normal,
    #[serde(rename = "Sobrecompra")]
    Overbought,
}

impl Zone {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Oversold => "Sobreventa",
            Self::Normal => "Normal",
            Self::Overbought => "Sobrecompra",
        }
    }

    fn points(&self) -> i8 {
        match self {
            Self::Oversold => 1,
            Self::Normal => 0,
            Self::Overbought => -1,
        }
    }

    pub fn for_rsi(rsi: f64) -> Self {
        if rsi < RSI_OVERSOLD {
            Self::Oversold
        } else if rsi > RSI_OVERBOUGHT {
            Self::Overbought
        } else {
            Self::Normal
        }
    }

    pub fn for_bands(price: f64, bands: &Bands) -> Self {
        if price < bands.lower {
            Self::Oversold
        } else if price > bands.upper {
            Self::Overbought
        } else {
            Self::Normal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PricePosition {
    #[serde(rename = "Arriba")]
    Above,
    #[serde(rename = "Debajo")]
    Below,
}

impl PricePosition {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Above => "Arriba",
            Self::Below => "Debajo",
        }
    }
}

/// Per-indicator states derived from the snapshot levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndicatorStates {
    pub macd: Direction,
    pub kdj: Option<Direction>,
    pub bollinger: Zone,
    pub rsi: Option<Zone>,
    pub trend: Direction,
    pub price_vs_ema50: PricePosition,
}

impl IndicatorStates {
    pub fn from_levels(
        price: f64,
        macd: &Macd,
        bands: &Bands,
        kdj: Option<&Kdj>,
        rsi: Option<f64>,
        ema50: f64,
        ema200: f64,
    ) -> Self {
        Self {
            macd: Direction::from_gt(macd.line, macd.signal),
            kdj: kdj.and_then(kdj_cross),
            bollinger: Zone::for_bands(price, bands),
            rsi: rsi.map(Zone::for_rsi),
            trend: Direction::from_gt(ema50, ema200),
            price_vs_ema50: if price > ema50 {
                PricePosition::Above
            } else {
                PricePosition::Below
            },
        }
    }
}

fn kdj_cross(kdj: &Kdj) -> Option<Direction> {
    ((kdj.k - kdj.d).abs() > KDJ_TIE).then(|| Direction::from_gt(kdj.k, kdj.d))
}

/// ATR%-based volatility band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Volatility {
    #[serde(rename = "Muy lenta")]
    VerySlow,
    #[serde(rename = "Volatilidad sana")]
    Healthy,
    #[serde(rename = "Volátil")]
    Volatile,
    #[serde(rename = "Muy volátil")]
    VeryVolatile,
}

impl Volatility {
    pub fn from_atr_pct(atr_pct: f64) -> Self {
        if atr_pct < 1.0 {
            Self::VerySlow
        } else if atr_pct <= 3.0 {
            Self::Healthy
        } else if atr_pct <= 4.0 {
            Self::Volatile
        } else {
            Self::VeryVolatile
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::VerySlow => "Muy lenta",
            Self::Healthy => "Volatilidad sana",
            Self::Volatile => "Volátil",
            Self::VeryVolatile => "Muy volátil",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Verdict {
    #[serde(rename = "COMPRA FUERTE")]
    StrongBuy,
    #[serde(rename = "POSIBLE COMPRA")]
    PossibleBuy,
    #[serde(rename = "ESPERAR")]
    Wait,
    #[serde(rename = "POSIBLE VENTA")]
    PossibleSell,
    #[serde(rename = "VENTA FUERTE")]
    StrongSell,
}

impl Verdict {
    pub fn from_score(score: i8) -> Self {
        if score >= STRONG_SCORE {
            Self::StrongBuy
        } else if score >= POSSIBLE_SCORE {
            Self::PossibleBuy
        } else if score <= -STRONG_SCORE {
            Self::StrongSell
        } else if score <= -POSSIBLE_SCORE {
            Self::PossibleSell
        } else {
            Self::Wait
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, Self::StrongBuy | Self::PossibleBuy)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::StrongBuy => "COMPRA FUERTE",
            Self::PossibleBuy => "POSIBLE COMPRA",
            Self::Wait => "ESPERAR",
            Self::PossibleSell => "POSIBLE VENTA",
            Self::StrongSell => "VENTA FUERTE",
        }
    }
}

macro_rules! display_via_label {
    ($($t:ty),*) => {
        $(impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        })*
    };
}

display_via_label!(Direction, Zone, PricePosition, Volatility, Verdict, SubSignal);

/// Rule for awarding COMPRA FUERTE / VENTA FUERTE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrongGate {
    /// The score thresholds alone decide.
    #[default]
    ScoreOnly,
    /// A strong score must also have trend, price-vs-EMA50, MACD and KDJ all
    /// pointing the same way, RSI inside the mid band, and volume above its
    /// average. Otherwise it is downgraded one step.
    Conjunctive,
}

/// The six voting sub-signals, in explanation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SubSignal {
    Macd,
    Rsi,
    Bollinger,
    Trend,
    PriceVsEma50,
    Kdj,
}

impl SubSignal {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Macd => "MACD",
            Self::Rsi => "RSI",
            Self::Bollinger => "Bollinger",
            Self::Trend => "Tendencia (EMA50/EMA200)",
            Self::PriceVsEma50 => "Precio vs EMA50",
            Self::Kdj => "KDJ",
        }
    }
}

/// One non-zero vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Contribution {
    pub signal: SubSignal,
    pub state: &'static str,
    pub points: i8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignalVerdict {
    pub verdict: Verdict,
    pub score: i8,
    pub contributions: Vec<Contribution>,
    pub explanation: String,
}

/// Every vote in explanation order, zeros included.
fn votes(states: &IndicatorStates) -> [(SubSignal, &'static str, i8); 6] {
    let price_points = match states.price_vs_ema50 {
        PricePosition::Above => 1,
        PricePosition::Below => -1,
    };
    [
        (SubSignal::Macd, states.macd.label(), states.macd.points()),
        (
            SubSignal::Rsi,
            states.rsi.map_or("Indefinido", |z| z.label()),
            states.rsi.map_or(0, |z| z.points()),
        ),
        (SubSignal::Bollinger, states.bollinger.label(), states.bollinger.points()),
        (SubSignal::Trend, states.trend.label(), states.trend.points()),
        (SubSignal::PriceVsEma50, states.price_vs_ema50.label(), price_points),
        (
            SubSignal::Kdj,
            states.kdj.map_or("Indefinido", |d| d.label()),
            states.kdj.map_or(0, |d| d.points()),
        ),
    ]
}

fn rsi_in_mid_band(rsi: Option<f64>) -> bool {
    rsi.is_some_and(|r| (RSI_MID_BAND.0..=RSI_MID_BAND.1).contains(&r))
}

fn aligned(snapshot: &IndicatorSnapshot, dir: Direction) -> bool {
    let s = &snapshot.states;
    let position = match dir {
        Direction::Bullish => PricePosition::Above,
        Direction::Bearish => PricePosition::Below,
    };
    s.trend == dir
        && s.price_vs_ema50 == position
        && s.macd == dir
        && s.kdj == Some(dir)
        && rsi_in_mid_band(snapshot.rsi)
        && snapshot.volume_above_average()
}

/// Scores a snapshot and names a verdict.
pub fn classify(snapshot: &IndicatorSnapshot, gate: StrongGate) -> SignalVerdict {
    let contributions: Vec<Contribution> = votes(&snapshot.states)
        .into_iter()
        .filter(|(_, _, points)| *points != 0)
        .map(|(signal, state, points)| Contribution { signal, state, points })
        .collect();
    let score: i8 = contributions.iter().map(|c| c.points).sum();

    let verdict = match (Verdict::from_score(score), gate) {
        (Verdict::StrongBuy, StrongGate::Conjunctive) if !aligned(snapshot, Direction::Bullish) => {
            Verdict::PossibleBuy
        }
        (Verdict::StrongSell, StrongGate::Conjunctive) if !aligned(snapshot, Direction::Bearish) => {
            Verdict::PossibleSell
        }
        (v, _) => v,
    };

    let explanation = if contributions.is_empty() {
        "Sin confluencia".to_string()
    } else {
        contributions
            .iter()
            .map(|c| format!("{}: {} ({:+})", c.signal, c.state, c.points))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    SignalVerdict {
        verdict,
        score,
        contributions,
        explanation,
    }
}
