//! Query engine over a [`Store`].

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use kb_core::{
    EntityKind, EntityRef, KbConfig, Result, Rule, SearchHit, SearchResults, Store, Traversal,
    TraversalNode, VerificationType,
};

/// High-level query interface: full-text search, entity lookup, and
/// bounded-depth traversal of the cross-reference graph.
pub struct QueryEngine<S> {
    store: Arc<S>,
    config: KbConfig,
}

impl<S: Store> QueryEngine<S> {
    pub fn new(store: Arc<S>, config: KbConfig) -> Self {
        Self { store, config }
    }

    /// Full-text search over chunks, ranked by bm25.
    pub async fn search(&self, query: &str, top_k: Option<u32>) -> Result<SearchResults> {
        let start = Instant::now();
        let k = top_k
            .unwrap_or(self.config.search.default_top_k)
            .min(self.config.search.max_top_k);

        let matches = self.store.search_chunks(query, k).await?;

        let mut results = Vec::with_capacity(matches.len());
        for (rank, (chunk_id, score)) in matches.into_iter().enumerate() {
            let Some(chunk) = self.store.get_chunk(chunk_id).await? else {
                continue;
            };
            let Some(doc) = self.store.get_document(chunk.doc_id).await? else {
                continue;
            };

            results.push(SearchHit {
                rank: rank as u32 + 1,
                score,
                chunk,
                file_path: doc.file_path,
                category: doc.category,
            });
        }

        let latency_ms = start.elapsed().as_millis() as u64;
        debug!(
            "Search '{}' returned {} results in {}ms",
            query,
            results.len(),
            latency_ms
        );

        Ok(SearchResults {
            query: query.to_string(),
            total_results: results.len(),
            latency_ms,
            results,
        })
    }

    /// Look up a rule by identifier, e.g. "CR-1".
    pub async fn rule(&self, rule_id: &str) -> Result<Option<Rule>> {
        self.store.get_rule(rule_id).await
    }

    /// Look up a verification type by identifier, e.g. "VR-BUILD".
    pub async fn verification_type(&self, vr_type: &str) -> Result<Option<VerificationType>> {
        self.store.get_verification_type(vr_type).await
    }

    /// Breadth-first traversal of the cross-reference graph from the given
    /// entity, following edges in both directions.
    ///
    /// The start entity is always included at distance 0. Neighbors whose
    /// entity rows no longer exist are filtered out, so stale edges left by
    /// deleted entities never surface. Cycle-safe via a visited set.
    pub async fn traverse(
        &self,
        kind: EntityKind,
        id: &str,
        max_depth: Option<u32>,
    ) -> Result<Traversal> {
        let max_depth = max_depth.unwrap_or(self.config.graph.default_max_depth);
        let start = EntityRef::new(kind, id);

        let mut visited: HashSet<EntityRef> = HashSet::new();
        let mut nodes = Vec::new();
        let mut queue: VecDeque<(EntityRef, u32)> = VecDeque::new();

        visited.insert(start.clone());
        nodes.push(TraversalNode {
            entity: start.clone(),
            distance: 0,
        });
        queue.push_back((start.clone(), 0));

        while let Some((entity, distance)) = queue.pop_front() {
            if distance >= max_depth {
                continue;
            }

            for edge in self.store.edges_for_entity(&entity).await? {
                let neighbor = if edge.source == entity {
                    edge.target
                } else {
                    edge.source
                };

                if visited.contains(&neighbor) {
                    continue;
                }
                if !self.store.entity_exists(&neighbor).await? {
                    continue;
                }

                visited.insert(neighbor.clone());
                nodes.push(TraversalNode {
                    entity: neighbor.clone(),
                    distance: distance + 1,
                });
                queue.push_back((neighbor, distance + 1));
            }
        }

        debug!("Traversal from {} reached {} entities", start, nodes.len());

        Ok(Traversal {
            start,
            max_depth,
            nodes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kb_core::{
        Category, Chunk, ChunkData, Correction, Document, DocumentUpdate, Edge,
    };
    use kb_store::SqliteStore;

    async fn seeded_engine() -> QueryEngine<SqliteStore> {
        let store = Arc::new(SqliteStore::open_memory().unwrap());

        // A rules document with CR-1 linked to VR-BUILD.
        let doc = Document::new("rules.md", Category::Root, Some("Rules"), "rules v1");
        let doc_id = doc.id;
        let mut update = DocumentUpdate::new(doc);
        update.chunks.push(Chunk::from_data(
            doc_id,
            ChunkData::section(
                "Core Rules",
                "CR-1 Never claim state without proof, verified by VR-BUILD",
                1,
                3,
            ),
        ));
        update.rules.push(Rule {
            rule_id: "CR-1".to_string(),
            rule_text: "Never claim state without proof".to_string(),
            vr_type: Some("VR-BUILD".to_string()),
            reference_path: None,
        });
        update.rules.push(Rule {
            rule_id: "CR-9".to_string(),
            rule_text: "An isolated rule".to_string(),
            vr_type: None,
            reference_path: None,
        });
        update.verification_types.push(VerificationType {
            vr_type: "VR-BUILD".to_string(),
            command: "cargo build".to_string(),
            description: None,
        });
        update.edges.push(Edge::new(
            EntityRef::new(EntityKind::Cr, "CR-1"),
            EntityRef::new(EntityKind::Vr, "VR-BUILD"),
        ));
        store.apply_document_update(update).await.unwrap();

        // A correction referencing CR-1, plus a dangling edge to a rule
        // that was never stored.
        let doc = Document::new(
            "memory/corrections.md",
            Category::Memory,
            Some("Corrections"),
            "corrections v1",
        );
        let doc_id = doc.id;
        let mut update = DocumentUpdate::new(doc);
        update.chunks.push(Chunk::from_data(
            doc_id,
            ChunkData::section("Active", "Claimed a build passed without proof; see CR-1", 1, 4),
        ));
        update.corrections.push(Correction {
            id: "2025-11-02-phantom-build-claim".to_string(),
            date: "2025-11-02".to_string(),
            title: "Phantom build claim".to_string(),
            wrong: Some("claimed without proof".to_string()),
            correction: Some("verify first".to_string()),
            rule: None,
            cr_rule: Some("CR-1".to_string()),
        });
        update.edges.push(Edge::new(
            EntityRef::new(EntityKind::Correction, "2025-11-02-phantom-build-claim"),
            EntityRef::new(EntityKind::Cr, "CR-1"),
        ));
        update.edges.push(Edge::new(
            EntityRef::new(EntityKind::Cr, "CR-1"),
            EntityRef::new(EntityKind::Cr, "CR-404"),
        ));
        store.apply_document_update(update).await.unwrap();

        QueryEngine::new(store, KbConfig::default())
    }

    #[tokio::test]
    async fn test_search_ranks_and_annotates() {
        let engine = seeded_engine().await;

        let results = engine.search("without proof", None).await.unwrap();
        assert!(results.total_results >= 1);
        assert_eq!(results.results[0].rank, 1);
        assert!(!results.results[0].file_path.is_empty());

        let results = engine.search("without proof", Some(1)).await.unwrap();
        assert_eq!(results.total_results, 1);
    }

    #[tokio::test]
    async fn test_search_special_syntax_degrades() {
        let engine = seeded_engine().await;
        let results = engine.search("\"unbalanced AND (", None).await.unwrap();
        assert_eq!(results.total_results, 0);
    }

    #[tokio::test]
    async fn test_lookup() {
        let engine = seeded_engine().await;
        let rule = engine.rule("CR-1").await.unwrap().unwrap();
        assert_eq!(rule.vr_type.as_deref(), Some("VR-BUILD"));
        assert!(engine.rule("CR-404").await.unwrap().is_none());

        let vr = engine.verification_type("VR-BUILD").await.unwrap().unwrap();
        assert_eq!(vr.command, "cargo build");
    }

    #[tokio::test]
    async fn test_traverse_reaches_linked_entities() {
        let engine = seeded_engine().await;

        let t = engine.traverse(EntityKind::Cr, "CR-1", Some(2)).await.unwrap();
        assert_eq!(t.nodes[0].entity, EntityRef::new(EntityKind::Cr, "CR-1"));
        assert_eq!(t.nodes[0].distance, 0);

        let reached: Vec<&EntityRef> = t.nodes.iter().map(|n| &n.entity).collect();
        assert!(reached.contains(&&EntityRef::new(EntityKind::Vr, "VR-BUILD")));
        assert!(reached.contains(&&EntityRef::new(
            EntityKind::Correction,
            "2025-11-02-phantom-build-claim"
        )));
        // The dangling CR-404 edge is filtered out.
        assert!(!reached.contains(&&EntityRef::new(EntityKind::Cr, "CR-404")));
    }

    #[tokio::test]
    async fn test_traverse_isolated_entity() {
        let engine = seeded_engine().await;
        let t = engine.traverse(EntityKind::Cr, "CR-9", None).await.unwrap();
        assert_eq!(t.nodes.len(), 1);
        assert_eq!(t.nodes[0].distance, 0);
    }

    #[tokio::test]
    async fn test_traverse_depth_bound() {
        let engine = seeded_engine().await;

        // Correction -> CR-1 at depth 1; VR-BUILD sits at depth 2.
        let t = engine
            .traverse(EntityKind::Correction, "2025-11-02-phantom-build-claim", Some(1))
            .await
            .unwrap();
        let reached: Vec<&EntityRef> = t.nodes.iter().map(|n| &n.entity).collect();
        assert!(reached.contains(&&EntityRef::new(EntityKind::Cr, "CR-1")));
        assert!(!reached.contains(&&EntityRef::new(EntityKind::Vr, "VR-BUILD")));
    }
}
