use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

use price_watcher::config::AppConfig;
use price_watcher::models::{format_price, ProductRecord};
use price_watcher::plugins::notifiers::SlackNotifier;
use price_watcher::plugins::PluginManager;
use price_watcher::utils::logging;
use price_watcher::{
    AppError, CheckOutcome, ChromeRenderer, PriceFetcher, PriceStore, PriceWatcher, ProductManager,
    RenderingFetcher,
};

#[derive(Parser)]
#[command(name = "price-watcher", version, about = "Track competitor prices and get alerted when they change")]
struct Cli {
    /// Configuration file (defaults to config/default and config/local)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the products state file
    #[arg(long, global = true)]
    products_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start tracking a product
    Add {
        name: String,
        #[arg(long)]
        url: String,
        #[arg(long)]
        selector: String,
    },
    /// Stop tracking a product and drop its history
    Remove { name: String },
    /// Show every tracked product
    List,
    /// Show the most recent prices of a product
    History {
        name: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Check every product once
    Check,
    /// Check every product now and then on a fixed interval
    Watch {
        /// Seconds between sweeps
        #[arg(long)]
        interval: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = AppConfig::from_env(cli.config.as_deref())?;
    if let Some(products_file) = cli.products_file {
        config.storage.products_file = products_file;
    }

    let _guard = logging::init(&config.logging)?;

    match run(cli.command, &config).await {
        Err(e) if e.is_warning() => {
            tracing::warn!("{}", e);
            println!("⚠️  {}", e);
            Ok(())
        }
        result => Ok(result?),
    }
}

async fn build_manager(config: &AppConfig) -> price_watcher::Result<ProductManager> {
    let store = PriceStore::load(&config.storage.products_file)?;

    let renderer = ChromeRenderer::detect(&config.scraper).map(|r| Arc::new(r) as Arc<dyn RenderingFetcher>);
    let fetcher = PriceFetcher::new(&config.scraper, renderer)?;
    if !fetcher.has_renderer() {
        tracing::debug!("Static HTML only, no rendering fallback");
    }

    let notifiers = PluginManager::new();
    if let Some(slack) = SlackNotifier::from_config(&config.notifications.slack)? {
        notifiers.register_notifier(Box::new(slack)).await;
    }
    tracing::debug!("{}", describe_notifiers(&notifiers).await);

    Ok(ProductManager::new(
        store,
        Arc::new(fetcher),
        notifiers,
        Duration::from_millis(config.scheduler.inter_request_delay_ms),
    ))
}

async fn run(command: Commands, config: &AppConfig) -> price_watcher::Result<()> {
    let mut manager = build_manager(config).await?;

    match command {
        Commands::Add { name, url, selector } => {
            let record = manager.add_product(&name, &url, &selector).await?;
            match record.current_price {
                Some(price) => println!("✅ Added {} at {}", name, format_price(price)),
                None => println!("✅ Added {} (price not available yet)", name),
            }
        }
        Commands::Remove { name } => {
            manager.remove_product(&name)?;
            println!("🗑️  Removed {}", name);
        }
        Commands::List => {
            if manager.store().is_empty() {
                println!("No products tracked yet");
            }
            for (name, record) in manager.list_products() {
                println!("📦 {}", name);
                println!("   URL: {}", record.url);
                println!("   Selector: {}", record.selector);
                println!("   Current: {}", format_optional_price(record.current_price));
                if record.previous_price.is_some() {
                    println!("   Previous: {}", format_optional_price(record.previous_price));
                }
                println!("   Last recorded: {}", describe_last_entry(record));
                match record.last_checked_at {
                    Some(at) => println!("   Last checked: {}", at.to_rfc3339()),
                    None => println!("   Last checked: never"),
                }
            }
        }
        Commands::History { name, limit } => {
            let history = manager.price_history(&name)?;
            println!("📈 Price history for {}", name);
            if history.is_empty() {
                println!("   No prices recorded yet");
            }
            let skip = history.len().saturating_sub(limit);
            for entry in &history[skip..] {
                println!("   {}  {}", entry.timestamp.format("%Y-%m-%d %H:%M:%S"), format_price(entry.price));
            }
        }
        Commands::Check => {
            let report = manager.check_all().await?;
            for (name, outcome) in &report.outcomes {
                println!("{}", describe_outcome(name, outcome));
            }
            println!(
                "Checked {} products: {} changed, {} failed",
                report.checked, report.changed, report.failed
            );
        }
        Commands::Watch { interval } => {
            let interval = interval.unwrap_or(config.scheduler.default_interval_secs);
            if interval == 0 {
                return Err(AppError::Validation("Interval must be greater than 0".to_string()));
            }

            let manager = Arc::new(Mutex::new(manager));
            let mut watcher = PriceWatcher::new(manager).await?;
            watcher.start(Duration::from_secs(interval)).await?;

            info!("Watching prices every {}s, press Ctrl+C to stop", interval);
            tokio::signal::ctrl_c().await?;
            info!("Shutting down...");

            watcher.shutdown().await?;
            let stats = watcher.stats().await;
            info!(
                "Ran {} sweeps ({} failed, {} skipped)",
                stats.runs, stats.failures, stats.skipped
            );
        }
    }

    Ok(())
}

async fn describe_notifiers(notifiers: &PluginManager) -> String {
    if !notifiers.has_notifier("slack").await {
        return "No Slack webhook configured, alerts disabled".to_string();
    }
    let mut types = notifiers.list_notifier_types().await;
    types.sort();
    format!("Alerts delivered via {}", types.join(", "))
}

fn format_optional_price(price: Option<rust_decimal::Decimal>) -> String {
    match price {
        Some(price) => format_price(price),
        None => "unknown".to_string(),
    }
}

fn describe_last_entry(record: &ProductRecord) -> String {
    match record.last_entry() {
        Some(entry) => format!("{} at {}", format_price(entry.price), entry.timestamp.to_rfc3339()),
        None => "nothing yet".to_string(),
    }
}

fn describe_outcome(name: &str, outcome: &CheckOutcome) -> String {
    match outcome {
        CheckOutcome::FirstObservation { price } => format!("🆕 {}: {}", name, format_price(*price)),
        CheckOutcome::Unchanged { price } => format!("✓ {}: {} (no change)", name, format_price(*price)),
        CheckOutcome::Changed { old, new } => {
            format!("🔔 {}: {} → {}", name, format_price(*old), format_price(*new))
        }
        CheckOutcome::Failed { reason } => format!("❌ {}: {}", name, reason),
    }
}
