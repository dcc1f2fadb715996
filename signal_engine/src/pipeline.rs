//! Per-instrument analysis and the batch scan over a watch-list.

use chrono::{DateTime, Utc};
use market_data_ingestor::{
    models::{bar::BarSeries, lookback::Lookback, request_params::BarsRequestParams, timeframe::TimeFrame},
    providers::{DataProvider, ProviderError, fetch_batch},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    classify::{SignalVerdict, StrongGate, Volatility, classify},
    error::AnalysisError,
    risk::{RiskPlan, plan},
    snapshot::{IndicatorParams, IndicatorSnapshot},
    zones::{ReferenceLevels, ZoneModel},
};

/// Everything computed for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub snapshot: IndicatorSnapshot,
    pub volatility: Volatility,
    pub signal: SignalVerdict,
    pub risk: Option<RiskPlan>,
    pub levels: Option<ReferenceLevels>,
}

impl Analysis {
    pub fn symbol(&self) -> &str {
        &self.snapshot.symbol
    }
}

/// Knobs shared by every instrument in a scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    pub indicators: IndicatorParams,
    pub gate: StrongGate,
    pub zones: ZoneModel,
}

/// Runs the whole pipeline on one series.
pub fn analyze_series(series: &BarSeries, settings: &AnalysisSettings) -> Result<Analysis, AnalysisError> {
    let snapshot = IndicatorSnapshot::compute(series, &settings.indicators)?;
    let volatility = Volatility::from_atr_pct(snapshot.atr_pct);
    let signal = classify(&snapshot, settings.gate);
    let risk = plan(signal.verdict, snapshot.price, snapshot.atr);
    let levels = settings.zones.levels(&series.closes());

    Ok(Analysis {
        snapshot,
        volatility,
        signal,
        risk,
        levels,
    })
}

/// What to fetch for one scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRequest {
    pub symbols: Vec<String>,
    pub lookback: Lookback,
    pub interval: TimeFrame,
    pub end: DateTime<Utc>,
}

impl ScanRequest {
    pub fn bars_params(&self) -> BarsRequestParams {
        BarsRequestParams::for_lookback(self.symbols.clone(), self.interval, self.lookback, self.end)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The provider returned nothing for the symbol.
    NoData,
    Analysis(AnalysisError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: SkipReason,
}

/// Result of one scan. `analyses` keeps watch-list order.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub analyses: Vec<Analysis>,
    pub skipped: Vec<SkippedSymbol>,
    pub as_of: DateTime<Utc>,
}

/// Fetches the watch-list in one batch and analyzes each instrument.
///
/// Only a provider-level failure is an error. Instruments without data or
/// whose analysis fails are listed in [`ScanReport::skipped`].
pub async fn scan(
    provider: &dyn DataProvider,
    request: &ScanRequest,
    settings: &AnalysisSettings,
) -> Result<ScanReport, ProviderError> {
    let mut batch = fetch_batch(provider, request.bars_params()).await?;

    let mut analyses = Vec::with_capacity(batch.len());
    let mut skipped = Vec::new();
    for symbol in &request.symbols {
        let Some(series) = batch.shift_remove(symbol) else {
            debug!(symbol = %symbol, "no bars; skipping");
            skipped.push(SkippedSymbol {
                symbol: symbol.clone(),
                reason: SkipReason::NoData,
            });
            continue;
        };
        match analyze_series(&series, settings) {
            Ok(analysis) => analyses.push(analysis),
            Err(e) => {
                debug!(symbol = %symbol, error = %e, "analysis skipped");
                skipped.push(SkippedSymbol {
                    symbol: symbol.clone(),
                    reason: SkipReason::Analysis(e),
                });
            }
        }
    }

    info!(
        requested = request.symbols.len(),
        analyzed = analyses.len(),
        skipped = skipped.len(),
        interval = %request.interval,
        "scan complete"
    );

    Ok(ScanReport {
        analyses,
        skipped,
        as_of: Utc::now(),
    })
}
