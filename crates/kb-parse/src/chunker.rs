//! Chunk production: generic sections plus plan-item and correction
//! variants with metadata annotations.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::json;

use kb_core::{Category, ChunkData, ChunkType, CorrectionsConfig, DocKind};

use crate::corrections::parse_correction_entries;
use crate::sections::parse_sections;

/// `- [ ]` / `- [x]` checkbox list item, with an optional explicit id
/// prefix like `P3:` or `KB-12.`.
fn plan_item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*[-*]\s*\[( |x|X)\]\s*(?:([A-Z]*\d+|[A-Z]+-\d+)[.:)]\s*)?(.+)$")
            .expect("valid regex")
    })
}

/// Split a document into chunks for storage.
///
/// Every document gets heading-delimited section chunks. Plan documents
/// additionally emit one `plan_item` chunk per checkbox item, annotated
/// with `plan_item_id` and `done`. Correction logs emit one `correction`
/// chunk per active entry, annotated with `is_correction` and
/// `correction_id`, so downstream consumers can filter without re-parsing.
pub fn chunk_document(
    text: &str,
    category: Category,
    kind: DocKind,
    corrections: &CorrectionsConfig,
) -> Vec<ChunkData> {
    let mut chunks: Vec<ChunkData> = parse_sections(text)
        .into_iter()
        .map(|s| ChunkData::section(&s.heading, &s.content, s.line_start, s.line_end))
        .collect();

    if category == Category::Plan {
        chunks.extend(plan_item_chunks(text));
    }

    if kind == DocKind::Corrections {
        for entry in parse_correction_entries(text, corrections) {
            let mut chunk = ChunkData {
                chunk_type: ChunkType::Correction,
                heading: format!("{} - {}", entry.correction.date, entry.correction.title),
                content: entry.body,
                line_start: entry.line_start,
                line_end: entry.line_end,
                metadata: Default::default(),
            };
            chunk
                .metadata
                .insert("is_correction".to_string(), json!(true));
            chunk
                .metadata
                .insert("correction_id".to_string(), json!(entry.correction.id));
            chunks.push(chunk);
        }
    }

    chunks
}

fn plan_item_chunks(text: &str) -> Vec<ChunkData> {
    let mut items = Vec::new();
    let mut seq = 0u32;

    for (i, line) in text.lines().enumerate() {
        let Some(caps) = plan_item_re().captures(line) else {
            continue;
        };
        seq += 1;

        let done = !caps[1].trim().is_empty();
        let item_id = caps
            .get(2)
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| format!("item-{}", seq));
        let body = caps[3].trim();

        let line_no = i as u32 + 1;
        let mut chunk = ChunkData {
            chunk_type: ChunkType::PlanItem,
            heading: String::new(),
            content: body.to_string(),
            line_start: line_no,
            line_end: line_no,
            metadata: Default::default(),
        };
        chunk
            .metadata
            .insert("plan_item_id".to_string(), json!(item_id));
        chunk.metadata.insert("done".to_string(), json!(done));
        items.push(chunk);
    }

    items
}
