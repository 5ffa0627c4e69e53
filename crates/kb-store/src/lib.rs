//! SQLite storage implementation for the knowledge base.
//!
//! Single-file database with an FTS5 index kept in sync by triggers.

mod schema;
mod sqlite;

pub use schema::{LAST_INDEX_EPOCH_KEY, SCHEMA_VERSION};
pub use sqlite::SqliteStore;
