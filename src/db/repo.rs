use super::model::ArticleRow;
use crate::model::{Article, Cursor};
use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

pub type Pool = SqlitePool;

const ARTICLE_COLUMNS: &str = "SELECT id, title, teaser, image, created_at FROM articles";

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    let options = SqliteConnectOptions::from_str(&normalized)
        .with_context(|| format!("invalid database url {}", normalized))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);
    let pool = SqlitePool::connect_with(options)
        .await
        .with_context(|| format!("failed to open database {}", normalized))?;
    Ok(pool)
}

/// Expand a leading `~/` in a file-backed SQLite URL and create its parent
/// directory. In-memory and non-sqlite URLs are returned untouched.
fn prepare_sqlite_url(url: &str) -> String {
    let Some(rest) = url.strip_prefix("sqlite:") else {
        return url.to_string();
    };
    if rest.starts_with(":memory") {
        return url.to_string();
    }

    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let (path, query) = match rest.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (rest, None),
    };
    if path.is_empty() {
        return url.to_string();
    }

    let path = match (path.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(tail), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), tail),
        _ => path.to_string(),
    };

    if let Some(parent) = Path::new(&path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    match query {
        Some(q) => format!("sqlite://{}?{}", path, q),
        None => format!("sqlite://{}", path),
    }
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Fetch up to `limit` articles in feed order (`created_at DESC, id DESC`).
///
/// With a cursor, only rows strictly after the cursor row are returned, and
/// only if the cursor row itself still exists with the same timestamp.
/// Otherwise the result is empty.
#[instrument(skip_all, fields(limit = limit, has_cursor = cursor.is_some()))]
pub async fn fetch_articles(
    pool: &Pool,
    cursor: Option<&Cursor>,
    limit: i64,
) -> Result<Vec<Article>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(ARTICLE_COLUMNS);

    if let Some(cursor) = cursor {
        let millis = cursor.created_at_millis();
        qb.push(" WHERE EXISTS (SELECT 1 FROM articles anchor WHERE anchor.id = ")
            .push_bind(cursor.id.clone())
            .push(" AND anchor.created_at = ")
            .push_bind(millis)
            .push(") AND (created_at < ")
            .push_bind(millis)
            .push(" OR (created_at = ")
            .push_bind(millis)
            .push(" AND id < ")
            .push_bind(cursor.id.clone())
            .push("))");
    }

    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(limit);

    qb.build_query_as::<ArticleRow>()
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(Article::try_from)
        .collect()
}

/// Whether the row a cursor points at is still stored.
#[instrument(skip_all)]
pub async fn cursor_exists(pool: &Pool, cursor: &Cursor) -> Result<bool, sqlx::Error> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM articles WHERE id = ? AND created_at = ?")
            .bind(&cursor.id)
            .bind(cursor.created_at_millis())
            .fetch_optional(pool)
            .await?;
    Ok(found.is_some())
}

#[instrument(skip_all)]
pub async fn get_article(pool: &Pool, id: &str) -> Result<Option<Article>> {
    let row = sqlx::query_as::<_, ArticleRow>(&format!("{} WHERE id = ?", ARTICLE_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(Article::try_from).transpose()?)
}

/// Insert articles in one transaction, optionally wiping the table first.
/// Returns `(deleted, inserted)`.
#[instrument(skip_all, fields(count = articles.len(), clear_existing = clear_existing))]
pub async fn replace_articles(
    pool: &Pool,
    articles: &[Article],
    clear_existing: bool,
) -> Result<(u64, u64)> {
    let mut tx = pool.begin().await?;

    let deleted = if clear_existing {
        sqlx::query("DELETE FROM articles")
            .execute(&mut *tx)
            .await
            .context("failed to clear articles")?
            .rows_affected()
    } else {
        0
    };

    let mut inserted = 0;
    for article in articles {
        inserted += sqlx::query(
            "INSERT INTO articles (id, title, teaser, image, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&article.id)
        .bind(&article.title)
        .bind(&article.teaser)
        .bind(&article.image)
        .bind(article.created_at.timestamp_millis())
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to insert article {}", article.id))?
        .rows_affected();
    }

    tx.commit().await?;
    Ok((deleted, inserted))
}

pub async fn insert_articles(pool: &Pool, articles: &[Article]) -> Result<u64> {
    let (_, inserted) = replace_articles(pool, articles, false).await?;
    Ok(inserted)
}

#[instrument(skip_all)]
pub async fn delete_article(pool: &Pool, id: &str) -> Result<bool> {
    let res = sqlx::query("DELETE FROM articles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected() > 0)
}

#[instrument(skip_all)]
pub async fn count_articles(pool: &Pool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    async fn setup_pool() -> Pool {
        let pool = init_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    fn article(id: &str, millis: i64) -> Article {
        Article {
            id: id.into(),
            title: format!("title {id}"),
            teaser: format!("teaser {id}"),
            image: Some(format!("https://img.example/{id}.jpg")),
            created_at: DateTime::from_timestamp_millis(millis).unwrap(),
        }
    }

    #[test]
    fn prepare_url_passes_memory_and_other_schemes() {
        assert_eq!(prepare_sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(
            prepare_sqlite_url("postgres://localhost/db"),
            "postgres://localhost/db"
        );
    }

    #[test]
    fn prepare_url_creates_parent_dir() {
        let td = tempfile::tempdir().unwrap();
        let db_path = td.path().join("nested").join("feed.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        let out = prepare_sqlite_url(&url);
        assert_eq!(out, url);
        assert!(td.path().join("nested").exists());
    }

    #[tokio::test]
    async fn insert_get_and_delete() {
        let pool = setup_pool().await;
        let a = article("a", 1_000);
        assert_eq!(insert_articles(&pool, &[a.clone()]).await.unwrap(), 1);
        assert_eq!(get_article(&pool, "a").await.unwrap(), Some(a));
        assert!(delete_article(&pool, "a").await.unwrap());
        assert!(!delete_article(&pool, "a").await.unwrap());
        assert_eq!(count_articles(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn image_is_stored_verbatim() {
        let pool = setup_pool().await;
        let mut blank = article("blank", 1);
        blank.image = Some(" ".into());
        let mut none = article("none", 2);
        none.image = None;
        insert_articles(&pool, &[blank.clone(), none.clone()])
            .await
            .unwrap();
        assert_eq!(get_article(&pool, "blank").await.unwrap(), Some(blank));
        assert_eq!(get_article(&pool, "none").await.unwrap(), Some(none));
    }

    #[tokio::test]
    async fn replace_clears_previous_rows() {
        let pool = setup_pool().await;
        insert_articles(&pool, &[article("a", 1), article("b", 2)])
            .await
            .unwrap();
        let (deleted, inserted) = replace_articles(&pool, &[article("c", 3)], true)
            .await
            .unwrap();
        assert_eq!((deleted, inserted), (2, 1));
        assert_eq!(count_articles(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn fetch_orders_by_created_at_then_id() {
        let pool = setup_pool().await;
        insert_articles(
            &pool,
            &[article("a", 10), article("c", 20), article("b", 20), article("d", 5)],
        )
        .await
        .unwrap();

        let ids: Vec<String> = fetch_articles(&pool, None, 10)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["c", "b", "a", "d"]);

        let cursor = Cursor::from_parts("b", 20).unwrap();
        let after: Vec<String> = fetch_articles(&pool, Some(&cursor), 10)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(after, vec!["a", "d"]);
        assert!(cursor_exists(&pool, &cursor).await.unwrap());
    }

    #[tokio::test]
    async fn fetch_with_stale_cursor_is_empty() {
        let pool = setup_pool().await;
        insert_articles(&pool, &[article("a", 10), article("b", 5)])
            .await
            .unwrap();

        let missing = Cursor::from_parts("zzz", 10).unwrap();
        assert!(fetch_articles(&pool, Some(&missing), 10).await.unwrap().is_empty());

        // right id, wrong timestamp
        let skewed = Cursor::from_parts("a", 11).unwrap();
        assert!(!cursor_exists(&pool, &skewed).await.unwrap());
        assert!(fetch_articles(&pool, Some(&skewed), 10).await.unwrap().is_empty());
    }
}
