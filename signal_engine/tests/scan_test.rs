use async_trait::async_trait;
use chrono::{Duration, Utc};
use market_data_ingestor::{
    models::{
        bar::{Bar, BarSeries},
        request_params::BarsRequestParams,
    },
    providers::{
        DataProvider, InternalSnafu, ProviderError, file::JsonFileProvider, memory::InMemoryProvider,
    },
};
use signal_engine::{
    classify::{Direction, PricePosition, Verdict},
    config::ScanConfig,
    filter::OpportunityReport,
    pipeline::{SkipReason, scan},
    record::{AnalysisRecord, format_timestamp},
};

/// `n` daily bars ending yesterday, close = f(i), high/low = close +/- spread.
fn daily_bars(n: usize, spread: f64, f: impl Fn(usize) -> f64) -> Vec<Bar> {
    let start = Utc::now() - Duration::days(n as i64 + 1);
    (0..n)
        .map(|i| {
            let c = f(i);
            Bar::new(start + Duration::days(i as i64), c, c + spread, c - spread, c, 10_000.0)
        })
        .collect()
}

const CONFIG: &str = r#"
timezone = "America/Mazatlan"

[markets.test]
lookback = "2y"
interval = "1D"
symbols = ["TEST", "PULLBACK", "MISSING"]
"#;

#[tokio::test]
async fn linear_uptrend_is_a_bullish_buy() {
    let provider = InMemoryProvider::new().with_bars("TEST", daily_bars(250, 1.0, |i| 100.0 + i as f64));
    let config = ScanConfig::from_toml_str(CONFIG).unwrap();
    let request = config.request_for("test", Utc::now()).unwrap();

    let report = scan(&provider, &request, &config.settings()).await.unwrap();

    assert_eq!(report.analyses.len(), 1);
    let a = &report.analyses[0];
    assert_eq!(a.symbol(), "TEST");
    assert_eq!(a.snapshot.states.trend, Direction::Bullish);
    assert_eq!(a.snapshot.states.macd, Direction::Bullish);
    assert_eq!(a.snapshot.states.price_vs_ema50, PricePosition::Above);
    assert!(matches!(a.signal.verdict, Verdict::PossibleBuy | Verdict::StrongBuy));
    assert!(a.risk.is_some());

    let skipped: Vec<&str> = report.skipped.iter().map(|s| s.symbol.as_str()).collect();
    assert_eq!(skipped, vec!["PULLBACK", "MISSING"]);
    assert!(report.skipped.iter().all(|s| s.reason == SkipReason::NoData));

    let ts = format_timestamp(report.as_of, config.timezone);
    let record = serde_json::to_value(AnalysisRecord::new(a, &ts)).unwrap();
    assert_eq!(record["ticker"], "TEST");
    assert_eq!(record["trend"], "Alcista");
    assert_eq!(record["verdict"], "POSIBLE COMPRA");
    assert_eq!(record["price"], 349.0);
    assert_eq!(record["timestamp"], ts);
}

#[tokio::test]
async fn scan_from_bar_files_and_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let bars_dir = dir.path().join("bars");
    std::fs::create_dir(&bars_dir).unwrap();

    // Steady climb: close ends far above its median, so it can never qualify.
    let climb = daily_bars(260, 1.0, |i| 100.0 + i as f64);
    // Climb to 199.5, slide one point a bar down to 142.5, then bounce three
    // bars. EMA50 stays just above EMA200, MACD and KDJ turn up, RSI is
    // oversold, and the close sits below its median.
    let pullback = daily_bars(260, 2.0, |i| {
        let i = i as f64;
        if i < 200.0 {
            100.0 + i * 0.5
        } else if i < 257.0 {
            398.5 - i
        } else {
            i - 113.5
        }
    });
    std::fs::write(bars_dir.join("TEST.json"), serde_json::to_vec(&climb).unwrap()).unwrap();
    std::fs::write(bars_dir.join("PULLBACK.json"), serde_json::to_vec(&pullback).unwrap()).unwrap();

    let config_path = dir.path().join("scan.toml");
    std::fs::write(&config_path, CONFIG).unwrap();
    let config = ScanConfig::load(&config_path).unwrap();

    let provider = JsonFileProvider::new(&bars_dir).unwrap();
    let request = config.request_for("TEST", Utc::now()).unwrap();
    let report = scan(&provider, &request, &config.settings()).await.unwrap();

    let analyzed: Vec<&str> = report.analyses.iter().map(|a| a.symbol()).collect();
    assert_eq!(analyzed, vec!["TEST", "PULLBACK"]);

    let dip = &report.analyses[1];
    assert_eq!(dip.snapshot.states.trend, Direction::Bullish);
    assert_eq!(dip.snapshot.states.macd, Direction::Bullish);
    assert_eq!(dip.snapshot.states.kdj, Some(Direction::Bullish));
    assert_eq!(dip.snapshot.states.price_vs_ema50, PricePosition::Below);
    assert_eq!(dip.signal.score, 3);

    let opportunities = OpportunityReport::build("TEST", &config.filter, &report.analyses, "ts");
    assert!(opportunities.qualifying);
    assert_eq!(opportunities.count, 1);
    let item = &opportunities.items[0];
    assert_eq!(item.ticker, "PULLBACK");
    assert_eq!(item.verdict, Verdict::PossibleBuy);
    assert_eq!(item.score, 3);
    assert_eq!(item.price, 145.5);
    assert_eq!(item.mid_price, 156.25);
    assert!(item.price < item.expensive_zone);
    assert!((1.0..=3.0).contains(&item.atr_pct));
    assert!(item.risk_pct <= 5.0);
    assert!(item.stop < item.price && item.price < item.tp1 && item.tp1 < item.tp2);
}

#[test]
fn missing_config_file_is_a_read_error() {
    let err = ScanConfig::load("/no/such/scan.toml").unwrap_err();
    assert!(err.to_string().contains("/no/such/scan.toml"));
}

struct DownProvider;

#[async_trait]
impl DataProvider for DownProvider {
    async fn fetch_bars(&self, _params: BarsRequestParams) -> Result<Vec<BarSeries>, ProviderError> {
        InternalSnafu {
            message: "vendor unavailable",
        }
        .fail()
    }
}

#[tokio::test]
async fn provider_failure_aborts_the_scan() {
    let config = ScanConfig::from_toml_str(CONFIG).unwrap();
    let request = config.request_for("test", Utc::now()).unwrap();
    let err = scan(&DownProvider, &request, &config.settings()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Internal { .. }));
}
