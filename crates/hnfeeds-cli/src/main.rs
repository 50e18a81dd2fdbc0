use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hnfeeds_client::{DefaultFeedService, build_feed_service};
use hnfeeds_core::config::{DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_MAX_WORKERS, ResolverConfig};
use hnfeeds_core::feed::to_xml;
use hnfeeds_core::models::SourceEntry;

#[derive(Parser)]
#[command(name = "hnfeeds", version, about = "Rewrite feeds with full article content")]
struct Cli {
    /// Per-page fetch timeout in seconds
    #[arg(long, global = true, env = "TIMEOUT_SECS", default_value_t = DEFAULT_FETCH_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Entries resolved concurrently
    #[arg(long, global = true, env = "MAX_WORKERS", default_value_t = DEFAULT_MAX_WORKERS)]
    max_workers: usize,

    /// Base URL of a full-text-rss instance
    #[arg(long, global = true, env = "FULLTEXT_RSS_URL")]
    fulltext_url: Option<String>,

    /// JSON file replacing the built-in site rules
    #[arg(long, global = true, env = "HNFEEDS_RULES")]
    rules: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the rewritten Atom feed for a source feed
    Feed {
        /// Source feed URL; `http://` is assumed when no scheme is given
        url: String,

        /// Write the feed to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run a single article through the strategy chain
    Entry {
        /// Article URL
        link: String,

        /// Entry title as the source feed has it
        #[arg(short, long, default_value = "")]
        title: String,

        /// Entry description (HTML) as the source feed has it
        #[arg(short, long, default_value = "")]
        description: String,

        /// Publication date, RFC 3339
        #[arg(short, long)]
        published: Option<DateTime<Utc>>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // Logs go to stderr so stdout stays a clean document.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("hnfeeds=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = resolver_config(&cli)?;
    let service = build_feed_service(&config)
        .await
        .context("Failed to set up feed service")?;

    match cli.command {
        Commands::Feed { url, output } => cmd_feed(&service, &url, output.as_deref()).await?,
        Commands::Entry {
            link,
            title,
            description,
            published,
        } => {
            let mut entry = SourceEntry::new(link, title).with_description(description);
            entry.published_at = published;
            cmd_entry(&service, &entry).await?;
        }
    }

    Ok(())
}

/// Flags first, then the remaining environment variables.
fn resolver_config(cli: &Cli) -> Result<ResolverConfig> {
    if cli.timeout_secs == 0 {
        anyhow::bail!("--timeout-secs must be at least 1");
    }
    if cli.max_workers == 0 {
        anyhow::bail!("--max-workers must be at least 1");
    }

    let env = ResolverConfig::from_env().context("Invalid configuration")?;
    Ok(ResolverConfig {
        fetch_timeout: Duration::from_secs(cli.timeout_secs),
        max_workers: cli.max_workers,
        fulltext_url: cli
            .fulltext_url
            .clone()
            .filter(|url| !url.trim().is_empty()),
        rules_path: cli.rules.clone(),
        ..env
    })
}

fn normalize_feed_url(url: &str) -> String {
    if url.contains("://") {
        url.to_string()
    } else {
        format!("http://{url}")
    }
}

async fn cmd_feed(service: &DefaultFeedService, url: &str, output: Option<&Path>) -> Result<()> {
    let url = normalize_feed_url(url);

    let feed = service
        .create_feed(&url)
        .await
        .with_context(|| format!("No feed for {url}"))?;
    let xml = to_xml(&feed)?;

    match output {
        Some(path) => {
            std::fs::write(path, &xml)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(
                path = %path.display(),
                entries = feed.entries().len(),
                "Feed written"
            );
        }
        None => println!("{xml}"),
    }

    Ok(())
}

async fn cmd_entry(service: &DefaultFeedService, entry: &SourceEntry) -> Result<()> {
    let resolution = service.resolver().resolve(entry).await;
    let strategy = resolution.strategy_name();
    let resolved = resolution
        .into_entry()
        .with_context(|| format!("Could not resolve {}", entry.link))?;

    eprintln!("strategy: {strategy}");
    println!("{}", serde_json::to_string_pretty(&resolved)?);

    Ok(())
}
