//! Sitetree main entry point
//!
//! `serve` runs the crawler server; the other subcommands talk to one.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use sitetree::client::{CrawlerClient, DEFAULT_SERVER};
use sitetree::config::{load_config_with_hash, Config};
use sitetree::crawler::{CrawlerRegistry, HttpDiscovery};
use sitetree::{server, tree};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Sitetree: a concurrent site-map builder
///
/// Crawls sites on request and keeps a tree of every URL path found on
/// each one. Start a server with `serve`, then drive it with `start`,
/// `stop` and `list`.
#[derive(Parser, Debug)]
#[command(name = "sitetree")]
#[command(version)]
#[command(about = "A concurrent site-map builder", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the crawler server
    Serve {
        /// Path to TOML configuration file
        #[arg(value_name = "CONFIG")]
        config: PathBuf,
    },

    /// Start crawling a site
    Start {
        site: String,
        #[arg(long, default_value = DEFAULT_SERVER)]
        addr: String,
    },

    /// Stop crawling a site
    Stop {
        site: String,
        #[arg(long, default_value = DEFAULT_SERVER)]
        addr: String,
    },

    /// Print the tree built for a site
    List {
        site: String,
        #[arg(long, default_value = DEFAULT_SERVER)]
        addr: String,
    },

    /// Print every site the server knows
    Sites {
        #[arg(long, default_value = DEFAULT_SERVER)]
        addr: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Serve { config } => {
            tracing::info!("Loading configuration from: {}", config.display());
            let (config, hash) = load_config_with_hash(&config)
                .with_context(|| format!("Failed to load configuration {}", config.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            handle_serve(config).await?;
        }
        Command::Start { site, addr } => {
            let message = CrawlerClient::new(&addr)?.start(&site).await?;
            println!("{}", message);
        }
        Command::Stop { site, addr } => {
            let message = CrawlerClient::new(&addr)?.stop(&site).await?;
            println!("{}", message);
        }
        Command::List { site, addr } => handle_list(&addr, &site).await?,
        Command::Sites { addr } => {
            for site in CrawlerClient::new(&addr)?.sites().await? {
                println!("{}", site);
            }
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitetree=info,warn"),
            1 => EnvFilter::new("sitetree=debug,tower_http=debug,info"),
            2 => EnvFilter::new("sitetree=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Runs the server until Ctrl-C
async fn handle_serve(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Workers per crawl: {}, queue capacity: {}, concurrent requests: {}",
        config.crawler.workers,
        config.crawler.queue_capacity,
        config.crawler.max_concurrent_requests
    );

    let discovery = HttpDiscovery::new(&config)?;
    let registry = Arc::new(CrawlerRegistry::new(
        config.crawler.clone(),
        Arc::new(discovery),
    ));

    let listener = TcpListener::bind(&config.server.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.listen_addr))?;

    server::serve(registry, listener, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
        tracing::info!("Shutdown requested");
    })
    .await?;

    Ok(())
}

async fn handle_list(addr: &str, site: &str) -> anyhow::Result<()> {
    let Some(listing) = CrawlerClient::new(addr)?.list(site).await? else {
        println!("No crawler for {}", site);
        return Ok(());
    };

    println!("Site: {}", listing.site);
    println!("Status: {}", listing.status);
    println!("Started: {}", listing.started_at.to_rfc3339());
    if let Some(finished) = listing.finished_at {
        println!("Finished: {}", finished.to_rfc3339());
    }
    println!("URLs processed: {}", listing.urls_processed);
    println!("Nodes: {}", listing.tree.node_count());
    println!();
    println!("{}", listing.tree.name);
    print!("{}", tree::render(&listing.tree));

    Ok(())
}
