use anyhow::Result;
use article_feed::config;
use article_feed::db;
use article_feed::seed::{self, SeedOptions};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Populate the article table with synthetic articles"
)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Number of articles to create (overrides `seed.count`)
    #[arg(long)]
    count: Option<usize>,

    /// Append to the existing rows instead of clearing them first
    #[arg(long)]
    keep_existing: bool,
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

    let mut opts = SeedOptions::from(&cfg.seed);
    if let Some(count) = args.count {
        opts.count = count;
    }
    if args.keep_existing {
        opts.clear_existing = false;
    }

    let database_url = cfg.database_url();
    let pool = db::init_pool(&database_url).await?;
    db::run_migrations(&pool).await?;

    info!(database_url = %database_url, count = opts.count, "seeding articles");
    let report = seed::run(&pool, &opts, &mut rand::thread_rng()).await?;
    pool.close().await;

    println!(
        "DB Seed: Finished ({}ms), cleared {} and created {} articles",
        report.elapsed.as_millis(),
        report.cleared,
        report.inserted
    );
    Ok(())
}
