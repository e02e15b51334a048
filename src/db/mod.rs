//! Database module: row models and SQL repositories.
//!
//! - `model`: raw rows and their conversion into domain entities.
//! - `repo`: SQL-only functions over the SQLite pool.
//!
//! Callers import from `article_feed::db`; the repository API is re-exported.

pub mod model;
pub mod repo;

pub use repo::*;

pub use model::ArticleRow;
