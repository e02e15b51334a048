use anyhow::{Context, Result};
use article_feed::config;
use article_feed::{Cursor, FeedService};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(author, version, about = "Print one page of the article feed as JSON")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Id of the last article from the previous page
    #[arg(long, requires = "cursor_created_at")]
    cursor_id: Option<String>,

    /// Creation time (epoch millis) of the last article from the previous page
    #[arg(long, requires = "cursor_id", allow_hyphen_values = true)]
    cursor_created_at: Option<i64>,

    /// Override `feed.page_size` from the config
    #[arg(long)]
    page_size: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    let cursor = match (args.cursor_id, args.cursor_created_at) {
        (Some(id), Some(created_at)) => Some(Cursor::from_parts(id, created_at)?),
        _ => None,
    };
    let page_size = args.page_size.unwrap_or(cfg.feed.page_size);

    let database_url = cfg.database_url();
    info!(database_url = %database_url, page_size, "fetching page");
    let feed = FeedService::open(&database_url, page_size).await?;

    let result = feed.fetch_page_with(cursor.as_ref(), page_size).await;
    feed.close().await;

    let page = match result {
        Ok(page) => page,
        Err(err) => {
            error!(retryable = err.is_retryable(), "{err}");
            return Err(err.into());
        }
    };

    let json = serde_json::to_string_pretty(&page).context("failed to encode page")?;
    println!("{json}");
    Ok(())
}
