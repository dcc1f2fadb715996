//! Reads bars from a directory of JSON files, one `<SYMBOL>.json` per symbol,
//! each holding an array of [`Bar`] objects.
//!
//! A missing or unreadable file only drops that symbol; the batch carries on.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use snafu::ensure;
use tracing::{debug, warn};

use crate::{
    models::{
        bar::{Bar, BarSeries},
        request_params::BarsRequestParams,
    },
    providers::{DataProvider, MissingDirectorySnafu, ProviderError, ProviderInitError},
};

#[derive(Debug, Clone)]
pub struct JsonFileProvider {
    dir: PathBuf,
}

impl JsonFileProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ProviderInitError> {
        let dir = dir.into();
        ensure!(dir.is_dir(), MissingDirectorySnafu { path: dir.clone() });
        Ok(Self { dir })
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.json"))
    }

    async fn read_bars(path: &Path) -> Option<Vec<Bar>> {
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no bars file");
                return None;
            }
        };
        match serde_json::from_slice::<Vec<Bar>>(&raw) {
            Ok(bars) => Some(bars),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "malformed bars file; skipping");
                None
            }
        }
    }
}

#[async_trait]
impl DataProvider for JsonFileProvider {
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<Vec<BarSeries>, ProviderError> {
        let mut out = Vec::with_capacity(params.symbols.len());
        for symbol in &params.symbols {
            let Some(bars) = Self::read_bars(&self.path_for(symbol)).await else {
                continue;
            };
            let bars: Vec<Bar> = bars
                .into_iter()
                .filter(|b| params.contains(b.timestamp))
                .collect();
            out.push(BarSeries::new(symbol.clone(), params.timeframe, bars));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::models::{lookback::Lookback, timeframe::TimeFrame};

    #[tokio::test]
    async fn reads_present_files_and_skips_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc::now();
        let bars: Vec<Bar> = (0..5)
            .map(|i| Bar::new(now - Duration::days(5 - i), 1.0, 2.0, 0.5, 1.5, 10.0))
            .collect();
        std::fs::write(dir.path().join("AAPL.json"), serde_json::to_vec(&bars).unwrap()).unwrap();
        std::fs::write(dir.path().join("BAD.json"), b"{not json").unwrap();

        let provider = JsonFileProvider::new(dir.path()).unwrap();
        let params = BarsRequestParams::for_lookback(
            vec!["AAPL".into(), "BAD".into(), "MISSING".into()],
            TimeFrame::day(),
            Lookback::Days(3),
            now,
        );
        let series = provider.fetch_bars(params).await.unwrap();

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].symbol, "AAPL");
        // Only the bars inside the 3-day window survive; the start is inclusive.
        assert_eq!(series[0].len(), 3);
    }

    #[test]
    fn missing_directory_is_an_init_error() {
        let err = JsonFileProvider::new("/no/such/bars/dir").unwrap_err();
        assert!(matches!(err, ProviderInitError::MissingDirectory { .. }));
    }
}
