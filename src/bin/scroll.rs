use anyhow::Result;
use article_feed::config;
use article_feed::scroll;
use article_feed::FeedService;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Walk the whole feed page by page, following each cursor"
)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Override `feed.page_size` from the config
    #[arg(long)]
    page_size: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    let page_size = args.page_size.unwrap_or(cfg.feed.page_size);
    let feed = FeedService::open(&cfg.database_url(), page_size).await?;
    info!(page_size = feed.page_size(), "walking feed");

    let result = scroll::walk(&feed, |index, page| {
        println!("-- page {} ({} articles)", index + 1, page.list.len());
        for article in &page.list {
            println!(
                "{}  {}  {}",
                article.created_at.format("%Y-%m-%d %H:%M:%S%.3f"),
                article.id,
                article.title
            );
        }
    })
    .await;
    feed.close().await;

    let items = result?;
    println!("All {} articles loaded.", items.len());
    Ok(())
}
