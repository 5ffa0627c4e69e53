//! Staleness detection: decide whether a full pass is needed without
//! reading any file content.

use std::collections::HashSet;

use tracing::debug;

use kb_core::{CorpusConfig, Result, Store};

use crate::walk::walk_corpus;

/// Check whether the index is out of date with respect to the corpus.
///
/// Stale when the store is empty, when any qualifying file was modified
/// after the last indexing pass, or when a qualifying file has no document
/// row. Deleted files do not mark the index stale on their own.
pub async fn is_stale<S: Store + ?Sized>(store: &S, config: &CorpusConfig) -> Result<bool> {
    if store.document_count().await? == 0 {
        debug!("Index stale: no documents");
        return Ok(true);
    }

    let Some(last_epoch) = store.last_index_epoch().await? else {
        debug!("Index stale: no recorded index epoch");
        return Ok(true);
    };

    let tracked: HashSet<String> = store.document_paths().await?.into_iter().collect();

    for file in walk_corpus(config)? {
        if file.mtime_epoch > last_epoch {
            debug!("Index stale: {} modified after last pass", file.rel_path);
            return Ok(true);
        }
        if !tracked.contains(&file.rel_path) {
            debug!("Index stale: {} not tracked", file.rel_path);
            return Ok(true);
        }
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::Indexer;
    use kb_core::KbConfig;
    use kb_store::SqliteStore;
    use std::fs;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_empty_store_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let config = CorpusConfig {
            root: dir.path().to_path_buf(),
            ..Default::default()
        };
        let store = SqliteStore::open_memory().unwrap();
        assert!(is_stale(&store, &config).await.unwrap());
    }

    #[tokio::test]
    async fn test_fresh_after_index_then_stale_on_new_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("README.md"), "# Top\n\n## A\nbody\n").unwrap();

        let mut config = KbConfig::default();
        config.corpus.root = dir.path().to_path_buf();

        let store = Arc::new(SqliteStore::open_memory().unwrap());
        let indexer = Indexer::new(store.clone(), config.clone());
        indexer.index_all().await.unwrap();

        assert!(!is_stale(store.as_ref(), &config.corpus).await.unwrap());

        fs::write(dir.path().join("new.md"), "# New\n").unwrap();
        assert!(is_stale(store.as_ref(), &config.corpus).await.unwrap());
    }
}
