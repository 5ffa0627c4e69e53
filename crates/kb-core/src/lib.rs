//! kb-core - Core types and traits for the knowledge-base indexer
//!
//! This crate provides the foundational types, traits, and error handling
//! used throughout the kb workspace.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::{KbError, Result};
pub use traits::*;
pub use types::*;
