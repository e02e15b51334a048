//! Cursor-based pagination over the article feed.
//!
//! Pages are read newest first (`created_at DESC, id DESC`). Each page asks
//! storage for one lookahead row beyond the page size; its presence is what
//! sets `has_next_page`.
use crate::db::{self, Pool};
use crate::model::{Article, ArticlePage, Cursor, MetaData};
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, instrument, warn};

pub const DEFAULT_PAGE_SIZE: u32 = 3;

#[derive(Debug, Error)]
pub enum FeedError {
    /// Storage could not serve the read. Callers may retry.
    #[error("failed to fetch articles, please try again")]
    StorageUnavailable {
        #[source]
        source: sqlx::Error,
    },
    #[error("invalid cursor: {0}")]
    InvalidCursor(&'static str),
    #[error("page size must be > 0 (got {0})")]
    InvalidPageSize(u32),
}

impl FeedError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, FeedError::StorageUnavailable { .. })
    }
}

impl From<sqlx::Error> for FeedError {
    fn from(source: sqlx::Error) -> Self {
        FeedError::StorageUnavailable { source }
    }
}

/// Anything that can hand out feed pages.
#[async_trait]
pub trait ArticleFeed: Send + Sync {
    async fn fetch_page(&self, cursor: Option<&Cursor>) -> Result<ArticlePage, FeedError>;
}

/// Pagination service over an explicitly owned connection pool.
#[derive(Debug, Clone)]
pub struct FeedService {
    pool: Pool,
    page_size: u32,
}

impl FeedService {
    pub fn new(pool: Pool, page_size: u32) -> Result<Self, FeedError> {
        if page_size == 0 {
            return Err(FeedError::InvalidPageSize(page_size));
        }
        Ok(Self { pool, page_size })
    }

    /// Open the database at `database_url`, apply migrations and wrap the pool.
    pub async fn open(database_url: &str, page_size: u32) -> Result<Self> {
        let pool = db::init_pool(database_url).await?;
        db::run_migrations(&pool).await?;
        Ok(Self::new(pool, page_size)?)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Fetch the page after `cursor` (or the first page) using an explicit size.
    #[instrument(skip_all, fields(page_size = page_size, cursor_id = cursor.map(|c| c.id.as_str())))]
    pub async fn fetch_page_with(
        &self,
        cursor: Option<&Cursor>,
        page_size: u32,
    ) -> Result<ArticlePage, FeedError> {
        if page_size == 0 {
            return Err(FeedError::InvalidPageSize(page_size));
        }

        let rows = match db::fetch_articles(&self.pool, cursor, i64::from(page_size) + 1).await {
            Ok(rows) => rows,
            Err(err) => {
                error!(error = %err, "error fetching articles");
                return Err(err.into());
            }
        };

        if rows.is_empty() {
            if let Some(cursor) = cursor {
                self.note_stale_cursor(cursor).await?;
            }
        }

        let page = paginate(rows, page_size as usize);
        debug!(
            items = page.list.len(),
            has_next_page = page.meta_data.has_next_page,
            "fetched page"
        );
        Ok(page)
    }

    /// Warn when an empty page came from a cursor whose row is gone.
    async fn note_stale_cursor(&self, cursor: &Cursor) -> Result<(), FeedError> {
        match db::cursor_exists(&self.pool, cursor).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                warn!(
                    cursor_id = %cursor.id,
                    created_at = cursor.created_at_millis(),
                    "cursor does not match a stored article; ending feed"
                );
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "error checking cursor");
                Err(err.into())
            }
        }
    }

    /// Close the underlying pool. Further fetches fail with `StorageUnavailable`.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ArticleFeed for FeedService {
    async fn fetch_page(&self, cursor: Option<&Cursor>) -> Result<ArticlePage, FeedError> {
        self.fetch_page_with(cursor, self.page_size).await
    }
}

/// Turn up to `page_size + 1` ordered rows into a page. The lookahead row, if
/// present, is dropped and the cursor points at the last kept row.
pub fn paginate(mut rows: Vec<Article>, page_size: usize) -> ArticlePage {
    let has_next_page = rows.len() > page_size;
    rows.truncate(page_size);

    let cursor = if has_next_page {
        rows.last().map(Cursor::from)
    } else {
        None
    };

    ArticlePage {
        list: rows,
        meta_data: MetaData {
            has_next_page,
            cursor,
        },
    }
}
