//! Blocklist Ingest - blocklist feed loader

use anyhow::{Context, Result};
use blocklist_common::logging::{init_logging, LogConfig, LogLevel};
use blocklist_common::types::FeedId;
use blocklist_ingest::{store, BlocklistConnector, FeedClient, IngestConfig};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "blocklist-ingest")]
#[command(author, version, about = "Load blocklist.de IP feeds into a document store")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Action to perform (defaults to `run`)
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    run: RunArgs,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

impl Cli {
    fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Run(self.run))
    }
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Comma-separated feed identifiers
    #[arg(
        short,
        long,
        env = "BLOCKLIST_FEEDS",
        value_delimiter = ',',
        default_values_t = FeedId::defaults()
    )]
    feeds: Vec<FeedId>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch, transform and store the given feeds, then log statistics
    Run(RunArgs),

    /// Print document counts from the store
    Stats,

    /// Fetch one feed and show a sample of its entries
    ProbeFeed {
        #[arg(short, long, default_value = "ssh")]
        feed: FeedId,
    },

    /// Connect to the store, ping it and list databases
    ProbeStore,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Environment variables take precedence over the flags
    let log_config = log_config(cli.verbose).merge_env()?;
    let _guard = init_logging(&log_config)?;

    if let Err(e) = execute(cli.into_command()).await {
        error!(error = %format!("{:#}", e), "blocklist-ingest failed");
        return Err(e);
    }

    Ok(())
}

fn log_config(verbose: bool) -> LogConfig {
    let log_level = if verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    LogConfig::builder()
        .level(log_level)
        .log_file_prefix("blocklist-ingest")
        .filter_directives("sqlx=warn,mongodb=warn,hyper=info")
        .build()
}

async fn execute(command: Command) -> Result<()> {
    let config = IngestConfig::from_env().context("Failed to load configuration")?;

    match command {
        Command::Run(args) => run(&config, &args.feeds).await,
        Command::Stats => stats(&config).await,
        Command::ProbeFeed { feed } => probe_feed(&config, &feed).await,
        Command::ProbeStore => probe_store(&config).await,
    }
}

async fn run(config: &IngestConfig, feeds: &[FeedId]) -> Result<()> {
    info!(feeds = ?feeds.iter().map(FeedId::as_str).collect::<Vec<_>>(), "Starting ingestion");

    let mut connector = BlocklistConnector::connect(config)
        .await
        .context("Failed to connect to document store")?;

    let report = connector.run(feeds).await;
    info!(report = %serde_json::to_string(&report)?, "Run report");

    let stats = connector.statistics().await;
    connector.close().await?;

    let stats = stats.context("Failed to read store statistics")?;
    info!(statistics = %stats.to_json()?, "Ingestion complete");

    Ok(())
}

async fn stats(config: &IngestConfig) -> Result<()> {
    let mut connector = BlocklistConnector::connect(config).await?;
    let stats = connector.statistics().await;
    connector.close().await?;

    println!("{}", stats?.to_json()?);
    Ok(())
}

async fn probe_feed(config: &IngestConfig, feed: &FeedId) -> Result<()> {
    let client = FeedClient::new(config.feed.clone())?;
    let probe = client
        .probe(feed)
        .await
        .with_context(|| format!("Feed probe failed for {}", client.feed_url(feed)))?;

    println!("{}: {} entries", probe.url, probe.entries);
    for entry in &probe.sample {
        println!("  {}", entry);
    }

    Ok(())
}

async fn probe_store(config: &IngestConfig) -> Result<()> {
    let mut store = store::connect(&config.store)
        .await
        .context("Failed to connect to document store")?;

    let checked = async {
        store.ping().await?;
        store.list_databases().await
    }
    .await;
    store.close().await?;

    let databases = checked.context("Store probe failed")?;
    println!("{}: reachable", store.describe());
    println!("databases: {}", databases.join(", "));

    Ok(())
}
