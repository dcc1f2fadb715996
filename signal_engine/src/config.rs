//! Scanner configuration: parsing, normalization, and loading.
//!
//! A TOML file describes:
//! - The timezone scan timestamps are printed in
//! - Indicator windows, KDJ smoothing, and the strong-verdict gate
//! - Reference-zone percentiles and opportunity-filter thresholds
//! - Named markets, each a watch-list with its lookback and bar interval
//!
//! Normalization lowercases market names, trims and uppercases symbols, and
//! drops duplicate symbols while keeping the first occurrence.
//!
//! Entrypoints:
//! - Parse + normalize from a TOML string: [`ScanConfig::from_toml_str`]
//! - Parse + normalize from a file path: [`ScanConfig::load`]

use std::{collections::HashSet, mem, path::Path};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use indexmap::IndexMap;
use market_data_ingestor::models::{lookback::Lookback, timeframe::TimeFrame};
use serde::{Deserialize, Serialize};
use shared_utils::config::read_config_file;
use thiserror::Error;

use crate::{
    classify::StrongGate,
    filter::FilterCriteria,
    pipeline::{AnalysisSettings, ScanRequest},
    snapshot::IndicatorParams,
    zones::ZoneModel,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Read(#[from] shared_utils::config::ConfigError),

    #[error("failed to parse scanner config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid scanner config: {0}")]
    Invalid(String),

    #[error("unknown market '{name}'; configured: {known}")]
    UnknownMarket { name: String, known: String },
}

/// One watch-list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarketCfg {
    pub symbols: Vec<String>,
    #[serde(default = "default_lookback")]
    pub lookback: Lookback,
    #[serde(default = "TimeFrame::day")]
    pub interval: TimeFrame,
}

fn default_lookback() -> Lookback {
    Lookback::Years(2)
}

fn default_timezone() -> Tz {
    chrono_tz::America::Mazatlan
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanConfig {
    #[serde(default = "default_timezone")]
    pub timezone: Tz,
    #[serde(default)]
    pub indicators: IndicatorParams,
    #[serde(default)]
    pub strong_gate: StrongGate,
    #[serde(default)]
    pub zones: ZoneModel,
    #[serde(default)]
    pub filter: FilterCriteria,
    /// Market name -> watch-list, in file order.
    #[serde(default)]
    pub markets: IndexMap<String, MarketCfg>,
}

/// What normalization changed.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct NormalizationReport {
    pub markets_renamed: usize,
    pub symbols_deduped: usize,
}

impl ScanConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let mut cfg: ScanConfig = toml::from_str(s)?;
        cfg.normalize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = read_config_file(path)?;
        Self::from_toml_str(&raw)
    }

    /// Lowercases market names and cleans every watch-list in place.
    pub fn normalize(&mut self) -> Result<NormalizationReport, ConfigError> {
        let mut report = NormalizationReport::default();
        let mut rebuilt = IndexMap::with_capacity(self.markets.len());

        for (raw_name, mut market) in mem::take(&mut self.markets) {
            let name = raw_name.trim().to_lowercase();
            if name.is_empty() {
                return Err(ConfigError::Invalid("market name cannot be empty".into()));
            }
            if name != raw_name {
                report.markets_renamed += 1;
            }
            if rebuilt.contains_key(&name) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate market after normalization: {name}"
                )));
            }

            let before = market.symbols.len();
            let mut seen = HashSet::new();
            let mut symbols = Vec::with_capacity(before);
            for raw in mem::take(&mut market.symbols) {
                let symbol = raw.trim().to_uppercase();
                if symbol.is_empty() {
                    return Err(ConfigError::Invalid(format!("empty symbol in market {name}")));
                }
                if seen.insert(symbol.clone()) {
                    symbols.push(symbol);
                }
            }
            report.symbols_deduped += before - symbols.len();
            market.symbols = symbols;
            rebuilt.insert(name, market);
        }

        self.markets = rebuilt;
        Ok(report)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let bad = self.indicators.invalid_fields();
        if !bad.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "indicator windows must be positive: {}",
                bad.join(", ")
            )));
        }
        self.zones.validate().map_err(ConfigError::Invalid)?;
        if !(self.filter.max_risk_pct.is_finite() && self.filter.max_risk_pct > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "filter.max_risk_pct must be positive, got {}",
                self.filter.max_risk_pct
            )));
        }
        if let Some((name, _)) = self.markets.iter().find(|(_, m)| m.symbols.is_empty()) {
            return Err(ConfigError::Invalid(format!("market {name} has no symbols")));
        }
        Ok(())
    }

    pub fn market(&self, name: &str) -> Result<&MarketCfg, ConfigError> {
        let key = name.trim().to_lowercase();
        self.markets.get(&key).ok_or_else(|| ConfigError::UnknownMarket {
            name: name.to_string(),
            known: self.markets.keys().cloned().collect::<Vec<_>>().join(", "),
        })
    }

    /// The scan request for `market` ending at `end`.
    pub fn request_for(&self, market: &str, end: DateTime<Utc>) -> Result<ScanRequest, ConfigError> {
        let m = self.market(market)?;
        Ok(ScanRequest {
            symbols: m.symbols.clone(),
            lookback: m.lookback,
            interval: m.interval,
            end,
        })
    }

    pub fn settings(&self) -> AnalysisSettings {
        AnalysisSettings {
            indicators: self.indicators.clone(),
            gate: self.strong_gate,
            zones: self.zones.clone(),
        }
    }
}
