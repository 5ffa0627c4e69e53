//! Cross-reference extraction: derive graph edges from chunk text.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use kb_core::{Chunk, Edge, EntityKind, EntityRef};

fn cr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bCR-\d+\b").expect("valid regex"))
}

fn vr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bVR-[A-Z][A-Z0-9_-]*\b").expect("valid regex"))
}

fn incident_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bincident\s+#?(\d+)\b").expect("valid regex"))
}

/// Scan text for entity identifiers. First occurrence order, deduplicated.
pub fn extract_mentions(text: &str) -> Vec<EntityRef> {
    let mut seen = HashSet::new();
    let mut mentions = Vec::new();

    let mut push = |entity: EntityRef| {
        if seen.insert(entity.clone()) {
            mentions.push(entity);
        }
    };

    for m in cr_re().find_iter(text) {
        push(EntityRef::new(EntityKind::Cr, m.as_str()));
    }
    for m in vr_re().find_iter(text) {
        push(EntityRef::new(EntityKind::Vr, m.as_str()));
    }
    for caps in incident_re().captures_iter(text) {
        push(EntityRef::new(EntityKind::Incident, &caps[1]));
    }

    mentions
}

/// Build the cross-reference edges for one document's chunks.
///
/// A chunk bound to an owning entity (a correction chunk carrying
/// `correction_id` metadata) links the owner to every identifier mentioned
/// in its body. Identifiers co-occurring in the same chunk are linked
/// pairwise in both orderings. Self-loops are dropped and the result is
/// deduplicated; the store's uniqueness constraint dedups across repeats.
pub fn build_edges(chunks: &[Chunk]) -> Vec<Edge> {
    let mut seen = HashSet::new();
    let mut edges = Vec::new();

    let mut push = |source: &EntityRef, target: &EntityRef| {
        if source == target {
            return;
        }
        let edge = Edge::new(source.clone(), target.clone());
        if seen.insert(edge.clone()) {
            edges.push(edge);
        }
    };

    for chunk in chunks {
        let mentions = extract_mentions(&chunk.content);
        if mentions.is_empty() {
            continue;
        }

        let owner = chunk
            .metadata
            .get("correction_id")
            .and_then(|v| v.as_str())
            .map(|id| EntityRef::new(EntityKind::Correction, id));

        if let Some(owner) = &owner {
            for mention in &mentions {
                push(owner, mention);
            }
        }

        for a in &mentions {
            for b in &mentions {
                push(a, b);
            }
        }
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use ulid::Ulid;

    fn chunk(content: &str) -> Chunk {
        Chunk {
            id: Ulid::new(),
            doc_id: Ulid::nil(),
            chunk_type: kb_core::ChunkType::Section,
            heading: String::new(),
            content: content.to_string(),
            line_start: 1,
            line_end: 1,
            metadata: Default::default(),
        }
    }

    #[test]
    fn test_extract_mentions() {
        let mentions =
            extract_mentions("CR-1 requires VR-BUILD; see Incident 3 and incident #3 again, CR-1");
        assert_eq!(
            mentions,
            vec![
                EntityRef::new(EntityKind::Cr, "CR-1"),
                EntityRef::new(EntityKind::Vr, "VR-BUILD"),
                EntityRef::new(EntityKind::Incident, "3"),
            ]
        );
    }

    #[test]
    fn test_cooccurrence_both_orderings_no_self_loops() {
        let edges = build_edges(&[chunk("CR-1 is verified by VR-BUILD")]);
        assert_eq!(edges.len(), 2);
        assert!(edges.contains(&Edge::new(
            EntityRef::new(EntityKind::Cr, "CR-1"),
            EntityRef::new(EntityKind::Vr, "VR-BUILD"),
        )));
        assert!(edges.contains(&Edge::new(
            EntityRef::new(EntityKind::Vr, "VR-BUILD"),
            EntityRef::new(EntityKind::Cr, "CR-1"),
        )));
    }

    #[test]
    fn test_correction_owner_edges() {
        let mut c = chunk("- **Wrong**: claimed build passed\n- **CR**: CR-1\n");
        c.chunk_type = kb_core::ChunkType::Correction;
        c.metadata
            .insert("correction_id".to_string(), json!("2025-11-02-phantom"));
        c.metadata.insert("is_correction".to_string(), json!(true));

        let edges = build_edges(&[c]);
        assert!(edges.contains(&Edge::new(
            EntityRef::new(EntityKind::Correction, "2025-11-02-phantom"),
            EntityRef::new(EntityKind::Cr, "CR-1"),
        )));
    }

    #[test]
    fn test_no_mentions_no_edges() {
        assert!(build_edges(&[chunk("plain prose without identifiers")]).is_empty());
    }

    #[test]
    fn test_dedup_across_chunks() {
        let edges = build_edges(&[chunk("CR-2 VR-TEST"), chunk("CR-2 then VR-TEST again")]);
        assert_eq!(edges.len(), 2);
    }
}
