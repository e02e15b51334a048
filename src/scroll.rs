//! Walks the feed from the newest article to the end by following cursors.
use crate::feed::{ArticleFeed, FeedError};
use crate::model::{Article, ArticlePage, Cursor};
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum ScrollError {
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error("page {0} reported more results but carried no cursor")]
    MissingCursor(usize),
    #[error("page {0} returned the same cursor as the previous page")]
    Stalled(usize),
}

/// Follow the feed from the newest article until `has_next_page` is false.
///
/// `on_page` sees every page as it arrives (zero-based index). Returns all
/// articles in feed order. The first failed fetch ends the walk.
#[instrument(skip_all)]
pub async fn walk<F>(feed: &dyn ArticleFeed, mut on_page: F) -> Result<Vec<Article>, ScrollError>
where
    F: FnMut(usize, &ArticlePage),
{
    let mut items = Vec::new();
    let mut cursor: Option<Cursor> = None;
    let mut index = 0;

    loop {
        let page = feed.fetch_page(cursor.as_ref()).await?;
        on_page(index, &page);

        let next = page.meta_data.cursor;
        let has_next_page = page.meta_data.has_next_page;
        items.extend(page.list);

        if !has_next_page {
            break;
        }
        let next = next.ok_or(ScrollError::MissingCursor(index))?;
        if cursor.as_ref() == Some(&next) {
            return Err(ScrollError::Stalled(index));
        }
        cursor = Some(next);
        index += 1;
    }

    info!(pages = index + 1, items = items.len(), "all articles loaded");
    Ok(items)
}
