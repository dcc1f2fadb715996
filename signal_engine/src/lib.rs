//! Technical-indicator signal scanner.
//!
//! For each instrument on a watch-list the engine computes MACD, Bollinger
//! Bands, KDJ, RSI, EMA20/50/200 and ATR at the last bar
//! ([`snapshot::IndicatorSnapshot`]), scores their confluence into a verdict
//! ([`classify`]), derives ATR-based stop and take-profit levels for buy
//! verdicts ([`risk`]), and finally keeps only the setups that pass the
//! opportunity filter ([`filter`]).
//!
//! Bars come from any [`market_data_ingestor::providers::DataProvider`];
//! [`pipeline::scan`] runs the whole thing over one batch fetch.

pub mod classify;
pub mod config;
pub mod error;
pub mod filter;
pub mod indicators;
pub mod pipeline;
pub mod record;
pub mod risk;
pub mod snapshot;
pub mod zones;

pub use error::{AnalysisError, IndicatorError};
pub use pipeline::{Analysis, AnalysisSettings, ScanReport, ScanRequest, analyze_series, scan};
