//! Row shapes returned by repository queries.
//!
//! Timestamps are stored as epoch milliseconds; conversion into domain types
//! happens here so the rest of the crate only sees `chrono` values.

use crate::model::Article;
use chrono::DateTime;

/// Raw `articles` row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArticleRow {
    pub id: String,
    pub title: String,
    pub teaser: String,
    pub image: Option<String>,
    pub created_at: i64,
}

impl TryFrom<ArticleRow> for Article {
    type Error = sqlx::Error;

    fn try_from(row: ArticleRow) -> Result<Self, Self::Error> {
        let created_at = DateTime::from_timestamp_millis(row.created_at).ok_or_else(|| {
            sqlx::Error::Decode(
                format!("article {} has out-of-range created_at {}", row.id, row.created_at).into(),
            )
        })?;
        Ok(Article {
            id: row.id,
            title: row.title,
            teaser: row.teaser,
            image: row.image,
            created_at,
        })
    }
}
