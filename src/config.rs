//! Configuration loader and validator for the article feed.
use crate::feed::DEFAULT_PAGE_SIZE;
use crate::seed::UNSPLASH_IMAGES;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub app: App,
    #[serde(default)]
    pub feed: Feed,
    #[serde(default)]
    pub seed: Seed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Feed {
    pub page_size: u32,
}

impl Default for Feed {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Fixture generator settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Seed {
    pub count: usize,
    pub years: u32,
    pub clear_existing: bool,
    pub image_probability: f64,
    pub images: Vec<String>,
}

impl Default for Seed {
    fn default() -> Self {
        Self {
            count: 100,
            years: 2,
            clear_existing: true,
            image_probability: 1.0,
            images: UNSPLASH_IMAGES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Config {
    /// Ensure required directories exist (creates `app.data_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.app.data_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.app.data_dir)
    }

    /// `DATABASE_URL` when set, otherwise a SQLite file under `app.data_dir`.
    pub fn database_url(&self) -> String {
        std::env::var("DATABASE_URL").unwrap_or_else(|_| self.default_database_url())
    }

    pub fn default_database_url(&self) -> String {
        format!(
            "sqlite://{}/feed.db",
            self.app.data_dir.trim_end_matches('/')
        )
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty"));
    }
    if cfg.feed.page_size == 0 {
        return Err(ConfigError::Invalid("feed.page_size must be > 0"));
    }

    let seed = &cfg.seed;
    if seed.years == 0 {
        return Err(ConfigError::Invalid("seed.years must be > 0"));
    }
    if !(0.0..=1.0).contains(&seed.image_probability) {
        return Err(ConfigError::Invalid(
            "seed.image_probability must be within [0, 1]",
        ));
    }
    if seed.image_probability > 0.0 && seed.images.is_empty() {
        return Err(ConfigError::Invalid(
            "seed.images must be non-empty when seed.image_probability > 0",
        ));
    }
    if seed.images.iter().any(|url| url.trim().is_empty()) {
        return Err(ConfigError::Invalid("seed.images entries must be non-empty"));
    }

    Ok(())
}

/// Example YAML configuration.
pub fn example() -> &'static str {
    r#"app:
  data_dir: "./data"

feed:
  page_size: 3

seed:
  count: 100
  years: 2
  clear_existing: true
  image_probability: 1.0
  images:
    - "https://images.unsplash.com/photo-1518709268805-4e9042af2176?w=800&h=400&fit=crop"
    - "https://images.unsplash.com/photo-1551434678-e076c223a692?w=800&h=400&fit=crop"
    - "https://images.unsplash.com/photo-1460925895917-afdab827c52f?w=800&h=400&fit=crop"
    - "https://images.unsplash.com/photo-1551288049-bebda4e38f71?w=800&h=400&fit=crop"
    - "https://images.unsplash.com/photo-1517077304055-6e89abbf09b0?w=800&h=400&fit=crop"
    - "https://images.unsplash.com/photo-1498050108023-c5249f4df085?w=800&h=400&fit=crop"
    - "https://images.unsplash.com/photo-1461749280684-dccba630e2f6?w=800&h=400&fit=crop"
    - "https://images.unsplash.com/photo-1551650975-87deedd944c3?w=800&h=400&fit=crop"
"#
}
