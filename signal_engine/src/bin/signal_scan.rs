use std::{io::Write, path::PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use market_data_ingestor::providers::{DataProvider, alpaca_rest::AlpacaProvider, file::JsonFileProvider};
use signal_engine::{
    config::ScanConfig,
    filter::OpportunityReport,
    pipeline::scan,
    record::{AnalysisRecord, format_timestamp},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const CONFIG_ENV: &str = "SIGNAL_SCAN_CONFIG";

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Path to the scanner config (TOML). Falls back to $SIGNAL_SCAN_CONFIG.
    #[arg(short, long)]
    config: Option<String>,

    /// Read bars from <DIR>/<SYMBOL>.json instead of calling Alpaca
    #[arg(long)]
    bars_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print one analysis record per instrument
    Analyze {
        /// Market name as configured (e.g. "mx", "usa")
        #[arg(long, default_value = "mx")]
        market: String,
    },

    /// Print only the setups that pass the opportunity filter
    Opportunities {
        #[arg(long, default_value = "mx")]
        market: String,
    },
}

impl Commands {
    fn market(&self) -> &str {
        match self {
            Commands::Analyze { market } | Commands::Opportunities { market } => market,
        }
    }
}

fn provider(bars_dir: Option<PathBuf>) -> anyhow::Result<Box<dyn DataProvider>> {
    Ok(match bars_dir {
        Some(dir) => Box::new(JsonFileProvider::new(dir)?),
        None => Box::new(AlpacaProvider::new()?),
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_path = shared_utils::config::resolve_config_path(cli.config.as_deref(), CONFIG_ENV)
        .context("no config given; pass --config or set SIGNAL_SCAN_CONFIG")?;
    let config = ScanConfig::load(&config_path)?;
    let market = cli.command.market();
    let request = config.request_for(market, Utc::now())?;
    let provider = provider(cli.bars_dir)?;

    info!(
        market,
        symbols = request.symbols.len(),
        config = %config_path.display(),
        "starting scan"
    );
    let report = scan(provider.as_ref(), &request, &config.settings())
        .await
        .with_context(|| format!("scan of market '{market}' failed"))?;
    let timestamp = format_timestamp(report.as_of, config.timezone);

    match &cli.command {
        Commands::Analyze { .. } => {
            let records: Vec<AnalysisRecord> = report
                .analyses
                .iter()
                .map(|a| AnalysisRecord::new(a, &timestamp))
                .collect();
            print_json(&records)?;
        }
        Commands::Opportunities { .. } => {
            let report = OpportunityReport::build(
                market.to_uppercase(),
                &config.filter,
                &report.analyses,
                &timestamp,
            );
            info!(market, count = report.count, "opportunity filter applied");
            print_json(&report)?;
        }
    }

    Ok(())
}
