//! Synthetic article fixtures for demos and tests.
use crate::config;
use crate::db::{self, Pool};
use crate::model::Article;
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Instant;
use tracing::{info, instrument};

pub const UNSPLASH_IMAGES: [&str; 8] = [
    "https://images.unsplash.com/photo-1518709268805-4e9042af2176?w=800&h=400&fit=crop",
    "https://images.unsplash.com/photo-1551434678-e076c223a692?w=800&h=400&fit=crop",
    "https://images.unsplash.com/photo-1460925895917-afdab827c52f?w=800&h=400&fit=crop",
    "https://images.unsplash.com/photo-1551288049-bebda4e38f71?w=800&h=400&fit=crop",
    "https://images.unsplash.com/photo-1517077304055-6e89abbf09b0?w=800&h=400&fit=crop",
    "https://images.unsplash.com/photo-1498050108023-c5249f4df085?w=800&h=400&fit=crop",
    "https://images.unsplash.com/photo-1461749280684-dccba630e2f6?w=800&h=400&fit=crop",
    "https://images.unsplash.com/photo-1551650975-87deedd944c3?w=800&h=400&fit=crop",
];

const WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua", "enim",
    "ad", "minim", "veniam", "quis", "nostrud", "exercitation", "ullamco", "laboris", "nisi",
    "aliquip", "ex", "ea", "commodo", "consequat", "duis", "aute", "irure", "in", "reprehenderit",
    "voluptate", "velit", "esse", "cillum", "fugiat", "nulla", "pariatur", "excepteur", "sint",
    "occaecat", "cupidatat", "non", "proident", "sunt", "culpa", "qui", "officia", "deserunt",
    "mollit", "anim", "id", "est", "laborum",
];

#[derive(Debug, Clone, PartialEq)]
pub struct SeedOptions {
    pub count: usize,
    /// Width of the past window creation times are drawn from.
    pub years: u32,
    pub clear_existing: bool,
    /// Chance that an article carries an image.
    pub image_probability: f64,
    pub images: Vec<String>,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self::from(&config::Seed::default())
    }
}

impl From<&config::Seed> for SeedOptions {
    fn from(seed: &config::Seed) -> Self {
        Self {
            count: seed.count,
            years: seed.years,
            clear_existing: seed.clear_existing,
            image_probability: seed.image_probability,
            images: seed.images.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub cleared: u64,
    pub inserted: u64,
    pub elapsed: std::time::Duration,
}

/// Generate `opts.count` articles created within `opts.years` before `now`.
pub fn generate<R: Rng>(opts: &SeedOptions, now: DateTime<Utc>, rng: &mut R) -> Vec<Article> {
    let now_ms = now.timestamp_millis();
    let window_ms = Duration::days(365 * i64::from(opts.years.max(1))).num_milliseconds();

    (0..opts.count)
        .map(|_| {
            let offset = rng.gen_range(1..=window_ms);
            let created_at =
                DateTime::from_timestamp_millis(now_ms - offset).unwrap_or(now);
            let image = if rng.gen_bool(opts.image_probability.clamp(0.0, 1.0)) {
                opts.images.choose(rng).cloned()
            } else {
                None
            };
            Article {
                id: uuid::Builder::from_random_bytes(rng.gen()).into_uuid().to_string(),
                title: sentence(rng),
                teaser: paragraph(rng),
                image,
                created_at,
            }
        })
        .collect()
}

/// Populate the store, wiping it first when `opts.clear_existing` is set.
#[instrument(skip_all, fields(count = opts.count))]
pub async fn run<R: Rng>(pool: &Pool, opts: &SeedOptions, rng: &mut R) -> Result<SeedReport> {
    let started = Instant::now();
    let articles = generate(opts, Utc::now(), rng);
    let (cleared, inserted) = db::replace_articles(pool, &articles, opts.clear_existing).await?;
    let elapsed = started.elapsed();
    info!(
        cleared,
        inserted,
        elapsed_ms = elapsed.as_millis() as u64,
        "db seed finished"
    );
    Ok(SeedReport {
        cleared,
        inserted,
        elapsed,
    })
}

fn sentence<R: Rng>(rng: &mut R) -> String {
    let len = rng.gen_range(4..=10);
    let mut out = String::new();
    for i in 0..len {
        let word = WORDS.choose(rng).copied().unwrap_or("lorem");
        if i == 0 {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
        } else {
            out.push(' ');
            out.push_str(word);
        }
    }
    out.push('.');
    out
}

fn paragraph<R: Rng>(rng: &mut R) -> String {
    let len = rng.gen_range(3..=6);
    (0..len).map(|_| sentence(rng)).collect::<Vec<_>>().join(" ")
}
