//! Query layer: full-text search and bounded graph traversal.

mod engine;

pub use engine::QueryEngine;
