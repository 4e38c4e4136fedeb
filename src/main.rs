//! amz-spending - Amazon order-history spending tracker CLI
//!
//! A Rust implementation with TLS fingerprint emulation for reliable scraping.

use amz_spending::commands::SpendingCommand;
use amz_spending::config::Config;
use amz_spending::orders::models::TimeRange;
use amz_spending::orders::storefronts::Storefront;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "amz-spending",
    version,
    about = "Amazon order-history spending tracker",
    long_about = "Estimates Amazon spending over rolling time windows by scraping the order-history pages of a storefront, with per-range caching."
)]
struct Cli {
    /// Amazon storefront to query
    #[arg(short, long, default_value = "us", global = true)]
    storefront: Storefront,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true, env = "AMZ_PROXY")]
    proxy: Option<String>,

    /// Delay between requests in milliseconds
    #[arg(long, default_value = "1000", global = true, env = "AMZ_DELAY")]
    delay: u64,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the spending report for one time range
    #[command(alias = "f")]
    Fetch {
        /// Time range (30 or 3m)
        #[arg(short, long, default_value = "30")]
        range: TimeRange,

        /// Bypass the cache and re-scrape
        #[arg(long)]
        force: bool,

        /// Answer only from the cache, never scrape
        #[arg(long)]
        cache_only: bool,
    },

    /// Show cached totals for one range, grouped by currency
    #[command(alias = "t")]
    Total {
        /// Time range (30 or 3m)
        #[arg(short, long, default_value = "30")]
        range: TimeRange,
    },

    /// List supported storefronts
    Storefronts,

    /// Delete every cached range aggregate
    ClearCache,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    config.storefront = cli.storefront;
    config.delay_ms = cli.delay;

    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }

    match cli.command {
        Commands::Fetch { range, force, cache_only } => {
            let cmd = SpendingCommand::new(config);
            let output = cmd.fetch(range, force, cache_only).await?;
            println!("{}", output);
        }

        Commands::Total { range } => {
            let cmd = SpendingCommand::new(config);
            let output = cmd.total(range)?;
            println!("{}", output);
        }

        Commands::Storefronts => {
            println!("Supported Amazon storefronts:\n");
            println!("{:<6} {:<20} {:<10} {:<8}", "Code", "Domain", "Currency", "Symbol");
            println!("{:-<6} {:-<20} {:-<10} {:-<8}", "", "", "", "");

            for storefront in Storefront::all() {
                println!(
                    "{:<6} {:<20} {:<10} {:<8}",
                    storefront.to_string(),
                    storefront.domain(),
                    storefront.currency(),
                    storefront.symbol()
                );
            }
        }

        Commands::ClearCache => {
            let cmd = SpendingCommand::new(config);
            let output = cmd.clear_cache()?;
            println!("{}", output);
        }
    }

    Ok(())
}
