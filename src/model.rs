use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::feed::FeedError;

/// A persisted feed entry. `(created_at, id)` is its position in the feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub teaser: String,
    pub image: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// Position of the last article handed out on a page.
///
/// Serialized as `{ "id": "...", "createdAt": <epoch millis> }` when it
/// crosses a process boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", try_from = "WireCursor")]
pub struct Cursor {
    pub id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// Unvalidated cursor as it arrives over the wire.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCursor {
    id: String,
    created_at: i64,
}

impl TryFrom<WireCursor> for Cursor {
    type Error = FeedError;

    fn try_from(wire: WireCursor) -> Result<Self, Self::Error> {
        Cursor::from_parts(wire.id, wire.created_at)
    }
}

impl Cursor {
    /// Build a cursor from its wire parts, rejecting values no article could carry.
    pub fn from_parts(id: impl Into<String>, created_at_millis: i64) -> Result<Self, FeedError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(FeedError::InvalidCursor("cursor id must be non-empty"));
        }
        let created_at = DateTime::from_timestamp_millis(created_at_millis)
            .ok_or(FeedError::InvalidCursor("cursor createdAt is out of range"))?;
        Ok(Self { id, created_at })
    }

    pub fn created_at_millis(&self) -> i64 {
        self.created_at.timestamp_millis()
    }
}

impl From<&Article> for Cursor {
    fn from(article: &Article) -> Self {
        Self {
            id: article.id.clone(),
            created_at: article.created_at,
        }
    }
}

/// One page of the feed, shaped the way callers consume it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ArticlePage {
    pub list: Vec<Article>,
    pub meta_data: MetaData,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MetaData {
    pub has_next_page: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Cursor>,
}

impl ArticlePage {
    pub fn empty() -> Self {
        Self {
            list: Vec::new(),
            meta_data: MetaData {
                has_next_page: false,
                cursor: None,
            },
        }
    }

    pub fn has_next_page(&self) -> bool {
        self.meta_data.has_next_page
    }

    pub fn next_cursor(&self) -> Option<&Cursor> {
        self.meta_data.cursor.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn article(id: &str, millis: i64) -> Article {
        Article {
            id: id.into(),
            title: "Title".into(),
            teaser: "Teaser".into(),
            image: None,
            created_at: DateTime::from_timestamp_millis(millis).unwrap(),
        }
    }

    #[test]
    fn cursor_wire_format_uses_epoch_millis() {
        let cursor = Cursor::from(&article("abc", 1_700_000_000_123));
        let value = serde_json::to_value(&cursor).unwrap();
        assert_eq!(value, json!({ "id": "abc", "createdAt": 1_700_000_000_123_i64 }));

        let back: Cursor = serde_json::from_value(value).unwrap();
        assert_eq!(back, cursor);
    }

    #[test]
    fn from_parts_rejects_malformed_input() {
        assert!(matches!(
            Cursor::from_parts("  ", 0),
            Err(FeedError::InvalidCursor(_))
        ));
        assert!(matches!(
            Cursor::from_parts("abc", i64::MAX),
            Err(FeedError::InvalidCursor(_))
        ));
        let c = Cursor::from_parts("abc", 42).unwrap();
        assert_eq!(c.created_at_millis(), 42);
    }

    #[test]
    fn decoding_validates_cursor() {
        assert!(serde_json::from_str::<Cursor>(r#"{"id":"","createdAt":5}"#).is_err());
        assert!(serde_json::from_str::<Cursor>(r#"{"id":"a","createdAt":9223372036854775807}"#)
            .is_err());
        let c: Cursor = serde_json::from_str(r#"{"id":"a","createdAt":5}"#).unwrap();
        assert_eq!(c, Cursor::from_parts("a", 5).unwrap());
    }

    #[test]
    fn page_omits_absent_cursor() {
        let page = ArticlePage {
            list: vec![article("a", 1)],
            meta_data: MetaData {
                has_next_page: false,
                cursor: None,
            },
        };
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(
            value,
            json!({
                "list": [{
                    "id": "a",
                    "title": "Title",
                    "teaser": "Teaser",
                    "image": null,
                    "createdAt": 1
                }],
                "metaData": { "hasNextPage": false }
            })
        );
    }
}
