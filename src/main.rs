use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use landscout_core::{
    create_listing_table, write_listings_csv, Config, FilterPipeline, Source, Verdict,
};
use landscout_scrapers::{
    ListingViewer, LogViewer, ScanReport, Scanner, Scraper, ScraperFactory, SystemBrowserViewer,
    ThrottlePolicy, WebFetcher,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log parsed fields and every fetched URL (-v, --verbose)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the configured regions for listings that pass every filter
    #[command(about = "Scan the configured regions for listings that pass every filter")]
    #[command(long_about = "Scan every configured region of the selected sources, open each accepted listing in the browser and print a summary. Currently supports AddLand, Rightmove and UK Land and Farms.")]
    Scan(ScanCommand),

    /// Fetch a single listing and show how it was read
    #[command(about = "Fetch a single listing and show how it was read")]
    Inspect(InspectCommand),

    /// Print the default configuration as TOML
    #[command(about = "Print the default configuration as TOML")]
    Config,
}

#[derive(Parser)]
struct ScanCommand {
    /// Configuration file (-c, --config)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Sources to scan (-x, --source). Defaults to every enabled source.
    #[arg(short = 'x', long, value_enum)]
    source: Vec<Source>,

    /// Minimum acreage
    #[arg(long)]
    min_acres: Option<f64>,

    /// Maximum acreage
    #[arg(long)]
    max_acres: Option<f64>,

    /// Maximum price per acre in GBP
    #[arg(long)]
    max_price_per_acre: Option<f64>,

    /// Log accepted listings instead of opening them in the browser
    #[arg(long)]
    no_open: bool,

    /// Do not pause between listing fetches
    #[arg(long)]
    no_throttle: bool,

    /// Show the browser window while rendering
    #[arg(long)]
    headful: bool,

    /// Write accepted listings to a CSV file (-o, --output)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
}

#[derive(Parser)]
struct InspectCommand {
    /// The source the listing belongs to (-x, --source)
    #[arg(short = 'x', long, value_enum)]
    source: Source,

    /// Listing URL
    url: Url,

    /// Configuration file (-c, --config)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Print the normalized listing as JSON
    #[arg(long)]
    json: bool,
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    Config::load(path).with_context(|| match path {
        Some(path) => format!("failed to load configuration from {}", path.display()),
        None => "failed to build default configuration".to_string(),
    })
}

fn print_report(report: &ScanReport) {
    if report.accepted.is_empty() {
        println!("{}", "No listings passed the filters".yellow());
    } else {
        println!("{}", create_listing_table(&report.accepted));
    }

    println!(
        "{} examined, {} accepted, {} rejected, {} failed",
        report.examined,
        report.accepted.len().to_string().green().bold(),
        report.rejected.len(),
        report.failures.len().to_string().red()
    );
    for failure in &report.failures {
        println!("  {} {}", "!".red(), failure);
    }
}

async fn scan(cmd: ScanCommand) -> Result<()> {
    let mut config = load_config(cmd.config.as_deref())?;
    if let Some(min_acres) = cmd.min_acres {
        config.filter.min_acres = min_acres;
    }
    if let Some(max_acres) = cmd.max_acres {
        config.filter.max_acres = max_acres;
    }
    if let Some(max_price_per_acre) = cmd.max_price_per_acre {
        config.filter.max_price_per_acre = max_price_per_acre;
    }
    if cmd.headful {
        config.fetch.headless = false;
    }
    config.validate()?;

    let sources = if cmd.source.is_empty() {
        config.sources.enabled()
    } else {
        cmd.source.clone()
    };
    let viewer: Arc<dyn ListingViewer> = if cmd.no_open {
        Arc::new(LogViewer)
    } else {
        Arc::new(SystemBrowserViewer)
    };
    let throttle = if cmd.no_throttle {
        ThrottlePolicy::disabled()
    } else {
        ThrottlePolicy::new(Duration::from_secs(config.throttle.max_delay_secs))
    };

    let scanner = Scanner::new(&config, &sources, viewer, throttle)?;
    let mut fetcher = WebFetcher::new(&config.fetch)?;
    if scanner.needs_browser() {
        fetcher
            .start_browser(&config.fetch)
            .await
            .context("failed to launch the browser session")?;
    }

    let report = scanner.run(&fetcher).await;
    fetcher.shutdown().await;

    print_report(&report);
    if let Some(path) = &cmd.output {
        write_listings_csv(path, &report.accepted)?;
        info!("Exported {} listings to {}", report.accepted.len(), path.display());
    }
    Ok(())
}

async fn inspect(cmd: InspectCommand) -> Result<()> {
    let config = load_config(cmd.config.as_deref())?;
    let scraper = ScraperFactory::create_scraper(cmd.source, &config);

    let mut fetcher = WebFetcher::new(&config.fetch)?;
    if scraper.needs_browser() {
        fetcher.start_browser(&config.fetch).await?;
    }
    let fetched = scraper.fetch_listing(&fetcher, &cmd.url).await;
    fetcher.shutdown().await;
    let property = fetched?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&property)?);
    } else {
        println!("{}", create_listing_table(std::slice::from_ref(&property)));
        for (key, value) in property.raw_fields() {
            println!("  {}: {}", key.bold(), value);
        }
    }

    let verdict = FilterPipeline::new(config.filter, &config.sources)?.evaluate(&property);
    match verdict {
        Verdict::Accepted => println!("{}", "Accepted".green().bold()),
        Verdict::Rejected(reason) => println!("{} {}", "Rejected:".red().bold(), reason),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Scan(cmd) => scan(cmd).await?,
        Commands::Inspect(cmd) => inspect(cmd).await?,
        Commands::Config => print!("{}", Config::default().to_toml()?),
    }

    Ok(())
}
