//! kb-parse - Classifier and structured-format parsers
//!
//! This crate turns raw document text into typed records. Each structured
//! source is modeled as an independent parser sharing a tolerant markdown
//! table scan primitive; all parsers return an empty list for absent or
//! malformed input rather than erroring.
//!
//! # Parsers
//!
//! - [`parse_rules`] / [`parse_verification_types`]: pipe-table extraction.
//! - [`parse_incidents`] / [`parse_schema_mismatches`]: log/list extraction.
//! - [`parse_corrections`]: dated entries under the active heading only.
//! - [`parse_sections`]: generic heading-delimited splitting.
//! - [`chunk_document`]: wraps the splitter and adds plan-item and
//!   correction chunk variants with metadata annotations.

mod chunker;
mod classify;
mod corrections;
mod fields;
mod logs;
mod rules;
mod sections;
mod table;

pub use chunker::chunk_document;
pub use classify::{classify_path, detect_kind};
pub use corrections::{parse_correction_entries, parse_corrections, CorrectionEntry};
pub use logs::{parse_incidents, parse_schema_mismatches};
pub use rules::{parse_rules, parse_verification_types};
pub use sections::{parse_sections, Section};
pub use table::scan_table;

// Re-export types for convenience
pub use kb_core::{Category, ChunkData, Correction, DocKind, Incident, Rule, VerificationType};
