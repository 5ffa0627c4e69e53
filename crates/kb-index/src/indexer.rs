//! Indexing orchestrator: walks the corpus, runs parsers, and applies
//! per-document updates to the store.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use kb_core::{
    Chunk, DocKind, Document, DocumentUpdate, IndexStats, KbConfig, Result, Store, UpdateOutcome,
};
use kb_parse::{
    chunk_document, classify_path, detect_kind, parse_corrections, parse_incidents, parse_rules,
    parse_schema_mismatches, parse_verification_types,
};

use crate::staleness::is_stale;
use crate::walk::{walk_corpus, CorpusFile};
use crate::xref::build_edges;

/// Drives full and conditional indexing passes over the corpus.
pub struct Indexer<S> {
    store: Arc<S>,
    config: KbConfig,
}

impl<S: Store> Indexer<S> {
    pub fn new(store: Arc<S>, config: KbConfig) -> Self {
        Self { store, config }
    }

    /// Index every qualifying file under the corpus root.
    ///
    /// Unchanged files (by content fingerprint) are skipped. A failure on
    /// one file is logged and counted without aborting the pass. The last
    /// index epoch is recorded after the pass completes.
    pub async fn index_all(&self) -> Result<IndexStats> {
        let files = walk_corpus(&self.config.corpus)?;
        info!("Indexing pass over {} files", files.len());

        let mut stats = IndexStats::default();
        for file in &files {
            match self.index_file(file).await {
                Ok(Some(outcome)) => {
                    stats.files_indexed += 1;
                    stats.chunks_created += outcome.chunks_written;
                    stats.edges_created += outcome.edges_created;
                }
                Ok(None) => {
                    debug!("Unchanged, skipping {}", file.rel_path);
                }
                Err(e) => {
                    warn!("Failed to index {}: {}", file.rel_path, e);
                    stats.failures += 1;
                }
            }
        }

        let now = chrono_now_epoch();
        self.store.set_last_index_epoch(now).await?;

        info!(
            "Indexed {} files ({} chunks, {} edges, {} failures)",
            stats.files_indexed, stats.chunks_created, stats.edges_created, stats.failures
        );
        Ok(stats)
    }

    /// Run a full pass only when the index is stale; otherwise return
    /// zeroed stats and leave the store untouched.
    pub async fn index_if_stale(&self) -> Result<IndexStats> {
        if !is_stale(self.store.as_ref(), &self.config.corpus).await? {
            debug!("Index fresh, skipping pass");
            return Ok(IndexStats::default());
        }
        self.index_all().await
    }

    /// Index a single file. Returns `None` when the stored fingerprint
    /// matches and nothing was written.
    async fn index_file(&self, file: &CorpusFile) -> Result<Option<UpdateOutcome>> {
        let content = std::fs::read_to_string(&file.abs_path)?;

        let existing = self.store.get_document_by_path(&file.rel_path).await?;
        if let Some(existing) = &existing {
            if !existing.content_changed(&content) {
                return Ok(None);
            }
        }

        let rel = Path::new(&file.rel_path);
        let category = classify_path(rel, &self.config.corpus);
        let kind = detect_kind(rel, &self.config.corpus);
        let title = extract_title(&content);

        let mut document = Document::new(&file.rel_path, category, title.as_deref(), &content);
        if let Some(existing) = existing {
            // Keep the identity stable across re-indexing.
            document.id = existing.id;
        }

        let chunks: Vec<Chunk> = chunk_document(&content, category, kind, &self.config.corrections)
            .into_iter()
            .map(|data| Chunk::from_data(document.id, data))
            .collect();

        let mut update = DocumentUpdate::new(document);
        match kind {
            DocKind::Rules => {
                update.rules = parse_rules(&content);
                update.verification_types = parse_verification_types(&content);
            }
            DocKind::Incidents => {
                update.incidents = parse_incidents(&content);
            }
            DocKind::Mismatches => {
                update.schema_mismatches = parse_schema_mismatches(&content);
            }
            DocKind::Corrections => {
                update.corrections = parse_corrections(&content, &self.config.corrections);
            }
            DocKind::Plain => {}
        }
        update.edges = build_edges(&chunks);
        update.chunks = chunks;

        debug!(
            "Indexing {} ({}, {:?}): {} chunks, {} edges",
            file.rel_path,
            category,
            kind,
            update.chunks.len(),
            update.edges.len()
        );

        let outcome = self.store.apply_document_update(update).await?;
        Ok(Some(outcome))
    }
}

/// First level-1 heading, if any.
fn extract_title(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        line.strip_prefix("# ")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    })
}

fn chrono_now_epoch() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kb_core::{Category, EntityKind, EntityRef};
    use kb_store::SqliteStore;
    use std::fs;

    const RULES_MD: &str = "\
# Rules

## Core Rules

| Rule | Description | Verification |
|------|-------------|--------------|
| CR-1 | Never claim state without proof | VR-BUILD |
| CR-2 | Keep migrations reversible | VR-TEST |

## Verification Types

| VR Type | Command | Description |
|---------|---------|-------------|
| VR-BUILD | cargo build | Build must succeed |
| VR-TEST | cargo test | Tests must pass |
";

    const CORRECTIONS_MD: &str = "\
# Corrections

## Active Prevention Rules

### 2025-11-02 - Phantom build claim
- **Wrong**: claimed the build passed without running it
- **Correction**: run the verification command first
- **Rule**: always verify before reporting
- **CR**: CR-1

## Archived

### 2025-01-01 - Old entry
- **Wrong**: stale
";

    fn fixture_corpus() -> (tempfile::TempDir, KbConfig) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::create_dir_all(dir.path().join("plans")).unwrap();
        fs::create_dir_all(dir.path().join("memory")).unwrap();

        fs::write(dir.path().join("rules.md"), RULES_MD).unwrap();
        fs::write(dir.path().join("memory/corrections.md"), CORRECTIONS_MD).unwrap();
        fs::write(
            dir.path().join("docs/guide.md"),
            "# Guide\n\n## Usage\nRun kb index to build the knowledge base.\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("plans/roadmap.md"),
            "# Roadmap\n\n## Items\n- [ ] P1: ship the indexer\n- [x] design the schema\n",
        )
        .unwrap();

        let mut config = KbConfig::default();
        config.corpus.root = dir.path().to_path_buf();
        (dir, config)
    }

    #[tokio::test]
    async fn test_index_all_extracts_entities() {
        let (_dir, config) = fixture_corpus();
        let store = Arc::new(SqliteStore::open_memory().unwrap());
        let indexer = Indexer::new(store.clone(), config);

        let stats = indexer.index_all().await.unwrap();
        assert_eq!(stats.files_indexed, 4);
        assert_eq!(stats.failures, 0);
        assert!(stats.chunks_created > 0);
        assert!(stats.edges_created > 0);

        let rules = store.list_rules().await.unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].rule_id, "CR-1");
        assert_eq!(rules[0].vr_type.as_deref(), Some("VR-BUILD"));

        let vrs = store.list_verification_types().await.unwrap();
        assert_eq!(vrs.len(), 2);

        // Only the active correction entry is stored.
        assert!(store
            .get_correction("2025-11-02-phantom-build-claim")
            .await
            .unwrap()
            .is_some());
        assert!(store
            .get_correction("2025-01-01-old-entry")
            .await
            .unwrap()
            .is_none());

        // The corrections doc links its entry to CR-1.
        let edges = store
            .edges_for_entity(&EntityRef::new(EntityKind::Cr, "CR-1"))
            .await
            .unwrap();
        assert!(edges.iter().any(|e| {
            e.source.kind == EntityKind::Correction || e.target.kind == EntityKind::Correction
        }));

        let doc = store
            .get_document_by_path("memory/corrections.md")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.category, Category::Memory);
        assert_eq!(doc.title.as_deref(), Some("Corrections"));
    }

    #[tokio::test]
    async fn test_double_index_is_idempotent() {
        let (_dir, config) = fixture_corpus();
        let store = Arc::new(SqliteStore::open_memory().unwrap());
        let indexer = Indexer::new(store.clone(), config);

        let first = indexer.index_all().await.unwrap();
        let before = store.get_stats().await.unwrap();

        let second = indexer.index_all().await.unwrap();
        assert_eq!(second.files_indexed, 0);
        assert_eq!(second.chunks_created, 0);

        let after = store.get_stats().await.unwrap();
        assert_eq!(before.documents, after.documents);
        assert_eq!(before.chunks, after.chunks);
        assert_eq!(before.rules, after.rules);
        assert_eq!(before.edges, after.edges);
        assert!(first.files_indexed > 0);
    }

    #[tokio::test]
    async fn test_changed_file_reindexed_with_stable_id() {
        let (dir, config) = fixture_corpus();
        let store = Arc::new(SqliteStore::open_memory().unwrap());
        let indexer = Indexer::new(store.clone(), config);

        indexer.index_all().await.unwrap();
        let doc_before = store
            .get_document_by_path("docs/guide.md")
            .await
            .unwrap()
            .unwrap();

        fs::write(
            dir.path().join("docs/guide.md"),
            "# Guide\n\n## Usage\nUpdated usage text.\n\n## Extra\nMore.\n",
        )
        .unwrap();

        let stats = indexer.index_all().await.unwrap();
        assert_eq!(stats.files_indexed, 1);

        let doc_after = store
            .get_document_by_path("docs/guide.md")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc_before.id, doc_after.id);
        let chunks = store.get_chunks_for_document(doc_after.id).await.unwrap();
        assert!(chunks.iter().any(|c| c.heading == "Extra"));
    }

    #[tokio::test]
    async fn test_index_if_stale_skips_when_fresh() {
        let (_dir, config) = fixture_corpus();
        let store = Arc::new(SqliteStore::open_memory().unwrap());
        let indexer = Indexer::new(store.clone(), config);

        let first = indexer.index_if_stale().await.unwrap();
        assert!(first.files_indexed > 0);

        let second = indexer.index_if_stale().await.unwrap();
        assert_eq!(second, IndexStats::default());
    }

    #[test]
    fn test_extract_title() {
        assert_eq!(extract_title("# Hello\nbody"), Some("Hello".to_string()));
        assert_eq!(extract_title("no heading"), None);
        assert_eq!(extract_title("## Sub only"), None);
    }
}
