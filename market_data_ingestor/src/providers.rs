//! Provider abstraction for market data sources.
//!
//! This module defines the [`DataProvider`] trait, which serves as a unified interface
//! for fetching time-series bar data from any market data vendor (e.g., Alpaca, Polygon.io).
//!
//! Each concrete provider implementation should implement [`DataProvider`] to handle
//! vendor-specific API logic and validation. The trait is designed for async usage and
//! supports dynamic dispatch (`dyn DataProvider`) for runtime selection of providers.
//!
//! [`fetch_batch`] layers the batch contract callers rely on over any provider:
//! one call for many symbols, a map keyed by symbol in request order, and
//! symbols without data silently left out.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use market_data_ingestor::models::{
//!     bar::BarSeries,
//!     request_params::BarsRequestParams,
//! };
//! use market_data_ingestor::providers::{DataProvider, ProviderError};
//!
//! struct MyProvider;
//!
//! #[async_trait]
//! impl DataProvider for MyProvider {
//!     async fn fetch_bars(
//!         &self,
//!         _params: BarsRequestParams,
//!     ) -> Result<Vec<BarSeries>, ProviderError> {
//!         Ok(vec![])
//!     }
//! }
//! ```

pub mod alpaca_rest;
pub mod file;
pub mod memory;

use std::path::PathBuf;

use async_trait::async_trait;
use indexmap::IndexMap;
use shared_utils::env::MissingEnvVarError;
use snafu::{Backtrace, Snafu};
use tracing::{debug, warn};

use crate::models::{bar::BarSeries, request_params::BarsRequestParams};

/// Trait for fetching time-series bar data from a market data provider.
///
/// Implement this trait for each concrete data vendor (e.g., Alpaca, Polygon).
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Fetches time-series bar data for the given request parameters.
    ///
    /// # Arguments
    ///
    /// * `params` - The parameters specifying symbols, timeframe, and date range.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<BarSeries>)` - One series per symbol that had data. Symbols
    ///   without data may be omitted; that is not an error.
    /// * `Err(ProviderError)` - The request as a whole failed.
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<Vec<BarSeries>, ProviderError>;
}

/// Fetches every requested symbol in one call and keys the result by symbol.
///
/// The map follows the order of `params.symbols`. Series that come back empty,
/// or for symbols nobody asked for, are dropped. Each series is
/// [`cleaned`](BarSeries::cleaned) so consumers can rely on chronological,
/// finite bars.
pub async fn fetch_batch(
    provider: &dyn DataProvider,
    params: BarsRequestParams,
) -> Result<IndexMap<String, BarSeries>, ProviderError> {
    let requested = params.symbols.clone();
    let mut by_symbol: IndexMap<String, BarSeries> = provider
        .fetch_bars(params)
        .await?
        .into_iter()
        .map(|s| (s.symbol.clone(), s))
        .collect();

    let mut out = IndexMap::with_capacity(requested.len());
    for symbol in &requested {
        match by_symbol.shift_remove(symbol) {
            Some(series) => {
                let series = series.cleaned();
                if series.is_empty() {
                    debug!(%symbol, "provider returned no usable bars");
                } else {
                    out.insert(symbol.clone(), series);
                }
            }
            None => debug!(%symbol, "provider returned no series"),
        }
    }
    for extra in by_symbol.keys() {
        warn!(symbol = %extra, "provider returned an unrequested symbol; ignoring");
    }
    Ok(out)
}

/// Errors that can occur during the creation of a provider instance
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// missed environment variable.
    #[snafu(display("Missing environment variable: {source}"))]
    MissingEnvVar {
        source: MissingEnvVarError,
        backtrace: Backtrace,
    },

    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// API key contains invalid characters.
    #[snafu(display("Invalid API key format: {source}"))]
    InvalidApiKey {
        source: reqwest::header::InvalidHeaderValue,
        backtrace: Backtrace,
    },

    /// The directory backing a file provider does not exist.
    #[snafu(display("Bars directory not found: {}", path.display()))]
    MissingDirectory { path: PathBuf, backtrace: Backtrace },
}

/// Errors that can occur within a `DataProvider` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// An error during an API request (e.g., network failure, timeout).
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The provider's API returned a specific error message (e.g., invalid API key).
    #[snafu(display("API error ({status}): {message}"))]
    Api {
        status: u16,
        message: String,
        backtrace: Backtrace,
    },

    /// The request parameters were invalid for this specific provider.
    #[snafu(display("Invalid parameters for provider: {message}"))]
    Validation {
        message: String,
        backtrace: Backtrace,
    },

    /// An internal error occurred while processing data within the provider.
    #[snafu(display("Internal provider error: {message}"))]
    Internal {
        message: String,
        backtrace: Backtrace,
    },

    /// An error during provider configuration or initialization.
    #[snafu(display("Provider initialization error: {source}"))]
    Init {
        #[snafu(backtrace)]
        source: ProviderInitError,
    },
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::models::{
        bar::Bar,
        lookback::Lookback,
        timeframe::TimeFrame,
    };
    use crate::providers::memory::InMemoryProvider;

    struct FailingProvider;

    #[async_trait]
    impl DataProvider for FailingProvider {
        async fn fetch_bars(&self, _params: BarsRequestParams) -> Result<Vec<BarSeries>, ProviderError> {
            InternalSnafu { message: "boom" }.fail()
        }
    }

    fn bars(n: i64) -> Vec<Bar> {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| Bar::new(t0 + Duration::days(i), 10.0, 11.0, 9.0, 10.0, 100.0))
            .collect()
    }

    fn params(symbols: &[&str]) -> BarsRequestParams {
        BarsRequestParams::for_lookback(
            symbols.iter().map(|s| s.to_string()).collect(),
            TimeFrame::day(),
            Lookback::Years(1),
            Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
        )
    }

    // This function decides AT RUNTIME which provider to give back.
    fn get_provider(name: &str) -> Box<dyn DataProvider> {
        if name == "memory" {
            Box::new(
                InMemoryProvider::new()
                    .with_bars("MSFT", bars(3))
                    .with_bars("AAPL", bars(2))
                    .with_bars("EMPTY", vec![]),
            )
        } else {
            Box::new(FailingProvider)
        }
    }

    #[tokio::test]
    async fn test_batch_follows_request_order_and_omits_missing() {
        let provider = get_provider("memory");
        let batch = fetch_batch(provider.as_ref(), params(&["AAPL", "NOPE", "EMPTY", "MSFT"]))
            .await
            .unwrap();

        let keys: Vec<&str> = batch.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["AAPL", "MSFT"]);
        assert_eq!(batch["AAPL"].len(), 2);
        assert_eq!(batch["MSFT"].len(), 3);
    }

    #[tokio::test]
    async fn test_batch_propagates_provider_failure() {
        let provider = get_provider("broken");
        let err = fetch_batch(provider.as_ref(), params(&["AAPL"])).await.unwrap_err();
        assert!(matches!(err, ProviderError::Internal { .. }));
        assert_eq!(err.to_string(), "Internal provider error: boom");
    }
}
