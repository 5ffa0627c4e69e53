//! Core traits defining the interfaces between components.

use async_trait::async_trait;
use ulid::Ulid;

use crate::error::Result;
use crate::types::{
    Category, Chunk, Correction, Document, Edge, EntityRef, Incident, Rule, SchemaMismatch,
    StoreStats, VerificationType,
};

/// Everything the orchestrator writes for one document, applied as a single
/// atomic unit. Previously stored chunks, derived rows, and edges for the
/// document are replaced wholesale.
#[derive(Debug, Clone)]
pub struct DocumentUpdate {
    pub document: Document,
    pub chunks: Vec<Chunk>,
    pub rules: Vec<Rule>,
    pub verification_types: Vec<VerificationType>,
    pub incidents: Vec<Incident>,
    pub schema_mismatches: Vec<SchemaMismatch>,
    pub corrections: Vec<Correction>,
    pub edges: Vec<Edge>,
}

impl DocumentUpdate {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            chunks: Vec::new(),
            rules: Vec::new(),
            verification_types: Vec::new(),
            incidents: Vec::new(),
            schema_mismatches: Vec::new(),
            corrections: Vec::new(),
            edges: Vec::new(),
        }
    }
}

/// Row counts actually written by [`Store::apply_document_update`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub chunks_written: u64,

    /// Edges newly created (insert-or-ignore; duplicates do not count).
    pub edges_created: u64,
}

/// Storage layer trait.
#[async_trait]
pub trait Store: Send + Sync {
    // Document operations
    async fn get_document(&self, id: Ulid) -> Result<Option<Document>>;
    async fn get_document_by_path(&self, path: &str) -> Result<Option<Document>>;
    async fn list_documents(&self, category: Option<Category>) -> Result<Vec<Document>>;
    async fn document_count(&self) -> Result<u64>;
    async fn document_paths(&self) -> Result<Vec<String>>;

    /// Replace one document and all of its derived rows in one transaction.
    async fn apply_document_update(&self, update: DocumentUpdate) -> Result<UpdateOutcome>;

    // Chunk operations
    async fn get_chunk(&self, id: Ulid) -> Result<Option<Chunk>>;
    async fn get_chunks_for_document(&self, doc_id: Ulid) -> Result<Vec<Chunk>>;

    // Entity lookups
    async fn get_rule(&self, rule_id: &str) -> Result<Option<Rule>>;
    async fn list_rules(&self) -> Result<Vec<Rule>>;
    async fn get_verification_type(&self, vr_type: &str) -> Result<Option<VerificationType>>;
    async fn list_verification_types(&self) -> Result<Vec<VerificationType>>;
    async fn get_correction(&self, id: &str) -> Result<Option<Correction>>;
    async fn entity_exists(&self, entity: &EntityRef) -> Result<bool>;

    // Graph operations
    async fn edges_for_entity(&self, entity: &EntityRef) -> Result<Vec<Edge>>;

    // Search operations
    async fn search_chunks(&self, query: &str, k: u32) -> Result<Vec<(Ulid, f32)>>;

    // Index metadata
    async fn last_index_epoch(&self) -> Result<Option<i64>>;
    async fn set_last_index_epoch(&self, epoch: i64) -> Result<()>;

    // Stats
    async fn get_stats(&self) -> Result<StoreStats>;
}
