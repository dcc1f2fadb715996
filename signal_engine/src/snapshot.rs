//! The indicator values of one instrument at its last bar.

use chrono::{DateTime, Utc};
use market_data_ingestor::models::bar::BarSeries;
use serde::{Deserialize, Serialize};

use crate::{
    classify::IndicatorStates,
    error::AnalysisError,
    indicators::{self, Bands, Kdj, KdjSmoothing, Macd},
};

/// Window lengths and constants for the indicator engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndicatorParams {
    pub ema_fast: usize,
    pub ema_mid: usize,
    pub ema_slow: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_window: usize,
    pub bollinger_k: f64,
    pub kdj_window: usize,
    pub kdj_smoothing: KdjSmoothing,
    pub rsi_window: usize,
    pub atr_window: usize,
    pub volume_window: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ema_fast: 20,
            ema_mid: 50,
            ema_slow: 200,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_window: 20,
            bollinger_k: 2.0,
            kdj_window: 14,
            kdj_smoothing: KdjSmoothing::default(),
            rsi_window: 14,
            atr_window: 14,
            volume_window: 20,
        }
    }
}

impl IndicatorParams {
    /// Bars needed before every indicator is defined.
    pub fn min_bars(&self) -> usize {
        [
            self.ema_fast,
            self.ema_mid,
            self.ema_slow,
            self.macd_fast,
            self.macd_slow,
            self.bollinger_window,
            self.kdj_window,
            self.rsi_window + 1,
            self.atr_window + 1,
            self.volume_window,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    /// Names of the windows that are zero, and whether `bollinger_k` is unusable.
    pub fn invalid_fields(&self) -> Vec<&'static str> {
        let windows = [
            ("ema_fast", self.ema_fast),
            ("ema_mid", self.ema_mid),
            ("ema_slow", self.ema_slow),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("kdj_window", self.kdj_window),
            ("rsi_window", self.rsi_window),
            ("atr_window", self.atr_window),
            ("volume_window", self.volume_window),
        ];
        let mut bad: Vec<&'static str> = windows
            .into_iter()
            .filter(|(_, w)| *w == 0)
            .map(|(name, _)| name)
            .collect();
        if self.bollinger_window < 2 {
            bad.push("bollinger_window");
        }
        if !(self.bollinger_k.is_finite() && self.bollinger_k > 0.0) {
            bad.push("bollinger_k");
        }
        bad
    }
}

/// Immutable record of the indicators at the last bar of a series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub macd: Macd,
    pub bollinger: Bands,
    pub kdj: Option<Kdj>,
    pub rsi: Option<f64>,
    pub ema20: f64,
    pub ema50: f64,
    pub ema200: f64,
    pub atr: f64,
    pub atr_pct: f64,
    pub volume: f64,
    pub volume_avg: Option<f64>,
    pub states: IndicatorStates,
}

impl IndicatorSnapshot {
    /// Computes every indicator from `series`.
    ///
    /// Short series are rejected before anything is computed. KDJ and RSI may
    /// come back undefined; an undefined or non-positive ATR rejects the
    /// whole snapshot.
    pub fn compute(series: &BarSeries, params: &IndicatorParams) -> Result<Self, AnalysisError> {
        let required = params.min_bars();
        let Some(last) = series.last().filter(|_| series.len() >= required) else {
            return Err(AnalysisError::InsufficientData {
                required,
                actual: series.len(),
            });
        };
        let short = || AnalysisError::InsufficientData {
            required,
            actual: series.len(),
        };

        let close = series.closes();
        let high = series.highs();
        let low = series.lows();
        let volume = series.volumes();
        let price = last.close;

        let atr = indicators::atr(&high, &low, &close, params.atr_window)?
            .filter(|v| v.is_finite() && *v > 0.0)
            .ok_or_else(|| AnalysisError::Unclassifiable {
                reason: "ATR undefined or zero".to_string(),
            })?;
        if !(price.is_finite() && price > 0.0) {
            return Err(AnalysisError::Unclassifiable {
                reason: format!("non-positive price {price}"),
            });
        }

        let macd = indicators::macd(&close, params.macd_fast, params.macd_slow, params.macd_signal)
            .ok_or_else(short)?;
        let bollinger =
            indicators::bollinger(&close, params.bollinger_window, params.bollinger_k).ok_or_else(short)?;
        let ema20 = indicators::ema_last(&close, params.ema_fast).ok_or_else(short)?;
        let ema50 = indicators::ema_last(&close, params.ema_mid).ok_or_else(short)?;
        let ema200 = indicators::ema_last(&close, params.ema_slow).ok_or_else(short)?;
        let kdj = indicators::kdj(&high, &low, &close, params.kdj_window, params.kdj_smoothing)?;
        let rsi = indicators::rsi(&close, params.rsi_window);

        let states = IndicatorStates::from_levels(price, &macd, &bollinger, kdj.as_ref(), rsi, ema50, ema200);

        Ok(Self {
            symbol: series.symbol.clone(),
            timestamp: last.timestamp,
            price,
            macd,
            bollinger,
            kdj,
            rsi,
            ema20,
            ema50,
            ema200,
            atr,
            atr_pct: 100.0 * atr / price,
            volume: last.volume,
            volume_avg: indicators::sma_last(&volume, params.volume_window),
            states,
        })
    }

    /// True when the last bar traded more than its trailing average.
    pub fn volume_above_average(&self) -> bool {
        self.volume_avg.is_some_and(|avg| self.volume > avg)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use market_data_ingestor::models::{bar::Bar, timeframe::TimeFrame};

    use super::*;
    use crate::classify::Direction;

    fn series(n: usize, close_at: impl Fn(usize) -> f64) -> BarSeries {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bars = (0..n)
            .map(|i| {
                let c = close_at(i);
                Bar::new(t0 + Duration::days(i as i64), c, c + 1.0, c - 1.0, c, 1_000.0 + i as f64)
            })
            .collect();
        BarSeries::new("TEST", TimeFrame::day(), bars)
    }

    #[test]
    fn default_min_bars_is_the_ema200_window() {
        assert_eq!(IndicatorParams::default().min_bars(), 200);
        assert!(IndicatorParams::default().invalid_fields().is_empty());
    }

    #[test]
    fn rejects_short_series() {
        let err = IndicatorSnapshot::compute(&series(199, |_| 10.0), &IndicatorParams::default()).unwrap_err();
        assert_eq!(err, AnalysisError::InsufficientData { required: 200, actual: 199 });
    }

    #[test]
    fn snapshot_reads_the_last_bar() {
        let s = series(220, |i| 50.0 + (i as f64 * 0.3).sin());
        let snap = IndicatorSnapshot::compute(&s, &IndicatorParams::default()).unwrap();
        let last = s.last().unwrap();
        assert_eq!(snap.symbol, "TEST");
        assert_eq!(snap.timestamp, last.timestamp);
        assert_eq!(snap.price, last.close);
        assert_eq!(snap.volume, last.volume);
        assert!(snap.atr > 0.0);
        assert!((snap.atr_pct - 100.0 * snap.atr / snap.price).abs() < 1e-12);
        assert!(snap.volume_above_average());
    }

    #[test]
    fn default_kdj_carries_the_trend_history() {
        // The same series as the kdj module test: a climb, then four lower closes.
        let s = series(244, |i| if i < 240 { 100.0 + i as f64 } else { 339.0 - (i - 239) as f64 });
        let snap = IndicatorSnapshot::compute(&s, &IndicatorParams::default()).unwrap();
        let kdj = snap.kdj.unwrap();
        assert!((kdj.k - 71.29).abs() < 0.01, "{kdj:?}");
        assert!((kdj.d - 81.64).abs() < 0.01, "{kdj:?}");
        assert_eq!(snap.states.kdj, Some(Direction::Bearish));

        let seeded = IndicatorParams {
            kdj_smoothing: KdjSmoothing::Seeded,
            ..IndicatorParams::default()
        };
        let snap = IndicatorSnapshot::compute(&s, &seeded).unwrap();
        assert_eq!(snap.states.kdj, Some(Direction::Bullish));
    }

    #[test]
    fn flat_bars_are_unclassifiable() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bars = (0..210)
            .map(|i| Bar::new(t0 + Duration::days(i), 10.0, 10.0, 10.0, 10.0, 5.0))
            .collect();
        let s = BarSeries::new("FLAT", TimeFrame::day(), bars);
        let err = IndicatorSnapshot::compute(&s, &IndicatorParams::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::Unclassifiable { .. }));
    }
}
