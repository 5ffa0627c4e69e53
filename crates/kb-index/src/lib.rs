//! Corpus walking, cross-reference extraction, and indexing orchestration.

mod indexer;
mod staleness;
mod walk;
mod xref;

pub use indexer::Indexer;
pub use staleness::is_stale;
pub use walk::{walk_corpus, CorpusFile};
pub use xref::{build_edges, extract_mentions};
