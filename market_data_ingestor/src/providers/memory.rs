//! A provider backed by bars held in memory. Used for fixtures and for feeding
//! already-fetched data back through the same code path as a live vendor.

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::{
    models::{
        bar::{Bar, BarSeries},
        request_params::BarsRequestParams,
    },
    providers::{DataProvider, ProviderError},
};

#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    bars: IndexMap<String, Vec<Bar>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars(mut self, symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        self.insert(symbol, bars);
        self
    }

    pub fn insert(&mut self, symbol: impl Into<String>, bars: Vec<Bar>) {
        self.bars.insert(symbol.into(), bars);
    }
}

#[async_trait]
impl DataProvider for InMemoryProvider {
    /// Returns the stored bars for each requested symbol, unfiltered by date.
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<Vec<BarSeries>, ProviderError> {
        Ok(params
            .symbols
            .iter()
            .filter_map(|symbol| {
                self.bars
                    .get(symbol)
                    .map(|bars| BarSeries::new(symbol.clone(), params.timeframe, bars.clone()))
            })
            .collect())
    }
}
