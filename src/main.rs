use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use quality_screener::app::{QualityStocksUseCase, TierListing};
use quality_screener::config::Config;
use quality_screener::domain::Tier;
use quality_screener::infra::build_directory;
use quality_screener::pipeline::processing::scoring::ScoringEngine;
use quality_screener::pipeline::LoadOptions;
use quality_screener::repository::InstrumentRepository;
use quality_screener::{logging, server};

#[derive(Parser)]
#[command(name = "quality_screener")]
#[command(about = "Scores broker CSV exports and sorts equities into quality tiers")]
#[command(version)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the exports and serve the HTTP API
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print tier listings
    Tiers {
        #[arg(long, value_enum, default_value_t = TierArg::All)]
        tier: TierArg,
        /// Folder holding the exports, overrides config
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print durability/valuation distribution statistics
    Stats {
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TierArg {
    Great,
    Aggressive,
    Good,
    All,
}

impl TierArg {
    fn tiers(self) -> Vec<Tier> {
        match self {
            TierArg::Great => vec![Tier::Great],
            TierArg::Aggressive => vec![Tier::Aggressive],
            TierArg::Good => vec![Tier::Good],
            TierArg::All => Tier::RANKED.to_vec(),
        }
    }
}

fn build_use_case(config: &Config) -> anyhow::Result<QualityStocksUseCase> {
    let repository = InstrumentRepository::new(LoadOptions::from(&config.data), ScoringEngine::default());
    let directory = build_directory(config.directory.as_ref()).context("building identity directory")?;
    Ok(QualityStocksUseCase::new(Arc::new(repository), directory))
}

fn print_listing(listing: &TierListing) {
    println!("\n{} ({} stocks)", listing.tier, listing.count);
    for (rank, stock) in listing.stocks.iter().enumerate() {
        println!(
            "  {:>3}. {:<40} {:<12} score {:>6.2}",
            rank + 1,
            stock.name,
            stock.identity().nse_code().unwrap_or("-"),
            stock.derived.quality_score
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load_or_default(&cli.config)?;
    logging::init_logging(&config.logging);

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            quality_screener::metrics::init_metrics(&config.metrics);

            let use_case = Arc::new(build_use_case(&config)?);
            // The API still starts on a failed initial load; POST /refresh retries.
            if let Err(e) = use_case.refresh().await {
                error!("Initial load from {} failed: {}", config.data.folder.display(), e);
            }
            info!("Starting server on {}:{}", config.server.host, config.server.port);
            server::start_server(use_case, &config.server.host, config.server.port).await?;
        }
        Commands::Tiers { tier, data_dir, json } => {
            if let Some(dir) = data_dir {
                config.data.folder = dir;
            }
            let use_case = build_use_case(&config)?;
            use_case.refresh().await.context("loading exports")?;

            if json && tier == TierArg::All {
                println!("{}", serde_json::to_string_pretty(&use_case.all_tiers().await)?);
                return Ok(());
            }
            for tier in tier.tiers() {
                let listing = use_case.tier(tier).await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&listing)?);
                } else {
                    print_listing(&listing);
                }
            }
        }
        Commands::Stats { data_dir } => {
            if let Some(dir) = data_dir {
                config.data.folder = dir;
            }
            let use_case = build_use_case(&config)?;
            let summary = use_case.refresh().await.context("loading exports")?;
            println!("{}", serde_json::to_string_pretty(&summary.report)?);
            println!("{}", serde_json::to_string_pretty(&use_case.statistics().await)?);
        }
    }
    Ok(())
}
