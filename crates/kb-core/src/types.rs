//! Core domain types for the knowledge base.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ulid::Ulid;

/// Category a document falls into, derived from its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Root,
    Docs,
    Plan,
    Memory,
    Patterns,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Docs => "docs",
            Self::Plan => "plan",
            Self::Memory => "memory",
            Self::Patterns => "patterns",
            Self::Other => "other",
        }
    }

    /// Parse a stored category token; unknown tokens map to `Other`.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "root" => Self::Root,
            "docs" => Self::Docs,
            "plan" => Self::Plan,
            "memory" => Self::Memory,
            "patterns" => Self::Patterns,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured shape of a document, detected from configured file-name
/// markers. Determines which parser set runs alongside the section splitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocKind {
    /// Rule table and/or verification-type table source.
    Rules,
    /// Corrections log with active/archived sections.
    Corrections,
    /// Incident log.
    Incidents,
    /// Schema-mismatch notes.
    Mismatches,
    /// No specialized parser; generic splitting only.
    Plain,
}

/// A document in the knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier (ULID).
    pub id: Ulid,

    /// Corpus-relative file path (unique).
    pub file_path: String,

    /// Path-derived category.
    pub category: Category,

    /// Title, usually the first level-1 heading.
    pub title: Option<String>,

    /// Blake3 hash of raw content for change detection.
    #[serde(with = "serde_bytes_opt")]
    pub content_hash: Option<[u8; 32]>,

    /// When this document was last indexed (RFC 3339).
    pub indexed_at: String,

    /// Same instant as Unix seconds, for staleness comparison.
    pub indexed_at_epoch: i64,
}

impl Document {
    /// Create a new document record for the given content.
    pub fn new(file_path: &str, category: Category, title: Option<&str>, content: &str) -> Self {
        let now = chrono::Utc::now();
        let content_hash = blake3::hash(content.as_bytes());

        Self {
            id: Ulid::new(),
            file_path: file_path.to_string(),
            category,
            title: title.map(String::from),
            content_hash: Some(*content_hash.as_bytes()),
            indexed_at: now.to_rfc3339(),
            indexed_at_epoch: now.timestamp(),
        }
    }

    /// Check if content has changed by comparing hashes.
    pub fn content_changed(&self, new_content: &str) -> bool {
        let new_hash = blake3::hash(new_content.as_bytes());
        self.content_hash
            .map(|h| h != *new_hash.as_bytes())
            .unwrap_or(true)
    }
}

/// Kind of a chunk, recorded so consumers can filter without re-parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    Section,
    PlanItem,
    Correction,
}

impl ChunkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Section => "section",
            Self::PlanItem => "plan_item",
            Self::Correction => "correction",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "plan_item" => Self::PlanItem,
            "correction" => Self::Correction,
            _ => Self::Section,
        }
    }
}

/// A heading-delimited or logically-delimited slice of a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique identifier (ULID).
    pub id: Ulid,

    /// Parent document ID.
    pub doc_id: Ulid,

    /// What kind of slice this is.
    pub chunk_type: ChunkType,

    /// Heading text; empty for pre-heading preamble.
    pub heading: String,

    /// Body content.
    pub content: String,

    /// Start line in source (1-based).
    pub line_start: u32,

    /// End line in source (1-based, inclusive).
    pub line_end: u32,

    /// Opaque annotations (e.g. plan_item_id, correction_id).
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Chunk {
    /// Assign an identity to parser output for the given document.
    pub fn from_data(doc_id: Ulid, data: ChunkData) -> Self {
        Self {
            id: Ulid::new(),
            doc_id,
            chunk_type: data.chunk_type,
            heading: data.heading,
            content: data.content,
            line_start: data.line_start,
            line_end: data.line_end,
            metadata: data.metadata,
        }
    }
}

/// Raw chunk data before ID assignment, produced by the chunker.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkData {
    pub chunk_type: ChunkType,
    pub heading: String,
    pub content: String,
    pub line_start: u32,
    pub line_end: u32,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ChunkData {
    pub fn section(heading: &str, content: &str, line_start: u32, line_end: u32) -> Self {
        Self {
            chunk_type: ChunkType::Section,
            heading: heading.to_string(),
            content: content.to_string(),
            line_start,
            line_end,
            metadata: HashMap::new(),
        }
    }
}

/// A numbered policy statement extracted from a rule table (CR).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique identifier, e.g. "CR-7".
    pub rule_id: String,

    /// The rule statement.
    pub rule_text: String,

    /// Optional link to a verification type, e.g. "VR-BUILD".
    pub vr_type: Option<String>,

    /// Optional reference path for where the rule applies.
    pub reference_path: Option<String>,
}

/// A named check/command extracted from a verification table (VR).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationType {
    /// Unique identifier, e.g. "VR-BUILD".
    pub vr_type: String,

    /// Command that performs the verification.
    pub command: String,

    /// Optional description.
    pub description: Option<String>,
}

/// An incident extracted from an incident log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Incident number (natural identity).
    pub incident_num: u32,

    pub date: Option<String>,
    pub incident_type: Option<String>,
    pub description: Option<String>,
}

/// A free-text schema-mismatch note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaMismatch {
    pub note: String,
}

/// A dated "lesson learned" entry extracted from a corrections log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    /// Stable entity identifier: `<date>-<title-slug>`.
    pub id: String,

    pub date: String,
    pub title: String,
    pub wrong: Option<String>,
    pub correction: Option<String>,
    pub rule: Option<String>,

    /// Optional link to a Rule, e.g. "CR-3".
    pub cr_rule: Option<String>,
}

/// Enumerated entity kinds participating in the cross-reference graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Rule, identified by "CR-<n>".
    Cr,
    /// Verification type, identified by "VR-<NAME>".
    Vr,
    /// Incident, identified by its number.
    Incident,
    /// Correction entry.
    Correction,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [Self::Cr, Self::Vr, Self::Incident, Self::Correction];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cr => "cr",
            Self::Vr => "vr",
            Self::Incident => "incident",
            Self::Correction => "correction",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cr" => Some(Self::Cr),
            "vr" => Some(Self::Vr),
            "incident" => Some(Self::Incident),
            "correction" => Some(Self::Correction),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A typed reference to a graph entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// A directed link between two entities derived from textual co-occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: EntityRef,
    pub target: EntityRef,
}

impl Edge {
    pub fn new(source: EntityRef, target: EntityRef) -> Self {
        Self { source, target }
    }
}

/// Aggregate result of an indexing pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub files_indexed: u64,
    pub chunks_created: u64,
    pub edges_created: u64,
    pub failures: u64,
}

/// A full-text search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Result rank (1-indexed).
    pub rank: u32,

    /// Relevance score (higher is better).
    pub score: f32,

    /// The matched chunk.
    pub chunk: Chunk,

    /// Path of the source document.
    pub file_path: String,

    /// Category of the source document.
    pub category: Category,
}

/// Search results container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    /// The original query.
    pub query: String,

    /// Total results returned.
    pub total_results: usize,

    /// Search latency in milliseconds.
    pub latency_ms: u64,

    /// Individual results.
    pub results: Vec<SearchHit>,
}

/// One entity reached during graph traversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraversalNode {
    pub entity: EntityRef,

    /// Hops from the starting entity.
    pub distance: u32,
}

/// Result of a bounded-depth traversal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Traversal {
    pub start: EntityRef,
    pub max_depth: u32,
    pub nodes: Vec<TraversalNode>,
}

/// Statistics about the knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub documents: u64,
    pub chunks: u64,
    pub rules: u64,
    pub verification_types: u64,
    pub incidents: u64,
    pub corrections: u64,
    pub edges: u64,
    pub storage_bytes: u64,
}

/// Helper module for optional byte array serialization.
mod serde_bytes_opt {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &Option<[u8; 32]>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(bytes) => {
                let hex = hex::encode(bytes);
                hex.serialize(serializer)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<[u8; 32]>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt: Option<String> = Option::deserialize(deserializer)?;
        match opt {
            Some(hex) => {
                let bytes = hex::decode(&hex).map_err(serde::de::Error::custom)?;
                let arr: [u8; 32] = bytes
                    .try_into()
                    .map_err(|_| serde::de::Error::custom("invalid hash length"))?;
                Ok(Some(arr))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_roundtrip() {
        assert_eq!(Category::from_str_lossy("plan"), Category::Plan);
        assert_eq!(Category::from_str_lossy("memory"), Category::Memory);
        assert_eq!(Category::from_str_lossy("bogus"), Category::Other);
        assert_eq!(Category::Plan.as_str(), "plan");
    }

    #[test]
    fn test_document_content_changed() {
        let doc = Document::new("docs/a.md", Category::Docs, Some("A"), "# A\n\nbody");
        assert!(!doc.content_changed("# A\n\nbody"));
        assert!(doc.content_changed("# A\n\nbody changed"));
    }

    #[test]
    fn test_entity_ref_display() {
        let e = EntityRef::new(EntityKind::Cr, "CR-1");
        assert_eq!(e.to_string(), "cr/CR-1");
        assert_eq!(EntityKind::parse("vr"), Some(EntityKind::Vr));
        assert_eq!(EntityKind::parse("nope"), None);
    }

    #[test]
    fn test_chunk_from_data() {
        let doc_id = Ulid::new();
        let chunk = Chunk::from_data(doc_id, ChunkData::section("Heading", "body", 2, 4));
        assert_eq!(chunk.doc_id, doc_id);
        assert_eq!(chunk.heading, "Heading");
        assert_eq!(chunk.chunk_type, ChunkType::Section);
    }
}
