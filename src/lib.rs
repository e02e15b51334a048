pub mod config;
pub mod db;
pub mod feed;
pub mod model;
pub mod scroll;
pub mod seed;

pub use feed::{ArticleFeed, FeedError, FeedService};
pub use model::{Article, ArticlePage, Cursor};
