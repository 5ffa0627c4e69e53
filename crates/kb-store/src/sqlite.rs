//! SQLite-based storage implementation.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, info};
use ulid::Ulid;

use kb_core::{
    Category, Chunk, ChunkType, Correction, Document, DocumentUpdate, Edge, EntityKind, EntityRef,
    KbError, Result, Rule, Store, StoreStats, UpdateOutcome, VerificationType,
};

use crate::schema::{LAST_INDEX_EPOCH_KEY, SCHEMA};

/// SQLite-based store implementation.
///
/// Uses a blocking Mutex for thread-safe access; the knowledge base is
/// single-process single-writer, so indexing holds the connection for the
/// duration of each per-file transaction.
pub struct SqliteStore {
    /// Connection wrapped in blocking Mutex.
    conn: Arc<Mutex<Connection>>,
}

// Manually implement Send + Sync since Connection is protected by Mutex
unsafe impl Send for SqliteStore {}
unsafe impl Sync for SqliteStore {}

impl SqliteStore {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| KbError::database(format!("Failed to open database: {}", e)))?;

        Self::init(conn, path)
    }

    /// Open an in-memory database (for testing).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| KbError::database(format!("Failed to open in-memory database: {}", e)))?;

        Self::init(conn, Path::new(":memory:"))
    }

    /// Initialize the store with a connection.
    fn init(conn: Connection, path: &Path) -> Result<Self> {
        Self::configure_connection(&conn)?;

        conn.execute_batch(SCHEMA)
            .map_err(|e| KbError::database(format!("Failed to initialize schema: {}", e)))?;

        info!("Database opened at {:?}", path);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Configure SQLite connection for optimal performance.
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = -64000;
            PRAGMA busy_timeout = 30000;
            PRAGMA temp_store = MEMORY;
            PRAGMA foreign_keys = ON;
            "#,
        )
        .map_err(|e| KbError::database(format!("Failed to configure connection: {}", e)))?;

        Ok(())
    }

    /// Execute a blocking operation on the connection.
    fn with_conn<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> Result<R>,
    {
        let conn = self.conn.lock().map_err(|e| KbError::database(e.to_string()))?;
        f(&conn)
    }
}

#[async_trait]
impl Store for SqliteStore {
    // Document operations

    async fn get_document(&self, id: Ulid) -> Result<Option<Document>> {
        self.with_conn(|conn| {
            let mut stmt = sql_prepare(
                conn,
                r#"
                SELECT id, file_path, category, title, content_hash, indexed_at, indexed_at_epoch
                FROM documents WHERE id = ?1
                "#,
            )?;

            let result = stmt
                .query_row(params![id.to_string()], |row| Self::row_to_document(row))
                .optional()
                .map_err(|e| KbError::database(e.to_string()))?;

            Ok(result)
        })
    }

    async fn get_document_by_path(&self, path: &str) -> Result<Option<Document>> {
        let path = path.to_string();
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    r#"
                    SELECT id, file_path, category, title, content_hash, indexed_at, indexed_at_epoch
                    FROM documents WHERE file_path = ?1
                    "#,
                )
                .map_err(|e| KbError::database(e.to_string()))?;

            let result = stmt
                .query_row(params![path], |row| Self::row_to_document(row))
                .optional()
                .map_err(|e| KbError::database(e.to_string()))?;

            Ok(result)
        })
    }

    async fn list_documents(&self, category: Option<Category>) -> Result<Vec<Document>> {
        let category = category.map(|c| c.as_str().to_string());
        self.with_conn(move |conn| {
            let (sql, filter) = match &category {
                Some(cat) => (
                    r#"
                    SELECT id, file_path, category, title, content_hash, indexed_at, indexed_at_epoch
                    FROM documents WHERE category = ?1 ORDER BY file_path
                    "#,
                    Some(cat.clone()),
                ),
                None => (
                    r#"
                    SELECT id, file_path, category, title, content_hash, indexed_at, indexed_at_epoch
                    FROM documents ORDER BY file_path
                    "#,
                    None,
                ),
            };

            let mut stmt = sql_prepare(conn, sql)?;
            let rows = match filter {
                Some(cat) => stmt
                    .query_map(params![cat], |row| Self::row_to_document(row))
                    .map_err(|e| KbError::database(e.to_string()))?
                    .collect::<std::result::Result<Vec<_>, _>>(),
                None => stmt
                    .query_map([], |row| Self::row_to_document(row))
                    .map_err(|e| KbError::database(e.to_string()))?
                    .collect::<std::result::Result<Vec<_>, _>>(),
            }
            .map_err(|e| KbError::database(e.to_string()))?;

            Ok(rows)
        })
    }

    async fn document_count(&self) -> Result<u64> {
        self.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
                .map_err(|e| KbError::database(e.to_string()))
        })
    }

    async fn document_paths(&self) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = sql_prepare(conn, "SELECT file_path FROM documents")?;
            let paths = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(|e| KbError::database(e.to_string()))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| KbError::database(e.to_string()))?;
            Ok(paths)
        })
    }

    async fn apply_document_update(&self, update: DocumentUpdate) -> Result<UpdateOutcome> {
        self.with_conn(move |conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| KbError::database(e.to_string()))?;

            let doc = &update.document;
            let doc_id = doc.id.to_string();

            // Replace-in-place: clear this document's chunks (FTS delete
            // triggers fire here) and per-document derived rows.
            tx.execute("DELETE FROM chunks WHERE doc_id = ?1", params![doc_id])
                .map_err(|e| KbError::database(e.to_string()))?;
            tx.execute("DELETE FROM edges WHERE doc_id = ?1", params![doc_id])
                .map_err(|e| KbError::database(e.to_string()))?;
            tx.execute(
                "DELETE FROM schema_mismatches WHERE doc_id = ?1",
                params![doc_id],
            )
            .map_err(|e| KbError::database(e.to_string()))?;
            tx.execute("DELETE FROM corrections WHERE doc_id = ?1", params![doc_id])
                .map_err(|e| KbError::database(e.to_string()))?;

            let content_hash = doc.content_hash.map(|h| h.to_vec());
            tx.execute(
                r#"
                INSERT OR REPLACE INTO documents
                    (id, file_path, category, title, content_hash, indexed_at, indexed_at_epoch)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    doc_id,
                    doc.file_path,
                    doc.category.as_str(),
                    doc.title,
                    content_hash,
                    doc.indexed_at,
                    doc.indexed_at_epoch,
                ],
            )
            .map_err(|e| KbError::database(format!("Failed to upsert document: {}", e)))?;

            {
                let mut stmt = tx
                    .prepare(
                        r#"
                        INSERT INTO chunks
                            (id, doc_id, chunk_type, heading, content, line_start, line_end, metadata)
                        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                        "#,
                    )
                    .map_err(|e| KbError::database(e.to_string()))?;

                for chunk in &update.chunks {
                    let metadata = serde_json::to_string(&chunk.metadata)?;
                    stmt.execute(params![
                        chunk.id.to_string(),
                        chunk.doc_id.to_string(),
                        chunk.chunk_type.as_str(),
                        chunk.heading,
                        chunk.content,
                        chunk.line_start,
                        chunk.line_end,
                        metadata,
                    ])
                    .map_err(|e| KbError::database(format!("Failed to insert chunk: {}", e)))?;
                }
            }

            for rule in &update.rules {
                tx.execute(
                    r#"
                    INSERT INTO rules (rule_id, rule_text, vr_type, reference_path)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(rule_id) DO UPDATE SET
                        rule_text = excluded.rule_text,
                        vr_type = excluded.vr_type,
                        reference_path = excluded.reference_path
                    "#,
                    params![rule.rule_id, rule.rule_text, rule.vr_type, rule.reference_path],
                )
                .map_err(|e| KbError::database(format!("Failed to upsert rule: {}", e)))?;
            }

            for vr in &update.verification_types {
                tx.execute(
                    r#"
                    INSERT INTO verification_types (vr_type, command, description)
                    VALUES (?1, ?2, ?3)
                    ON CONFLICT(vr_type) DO UPDATE SET
                        command = excluded.command,
                        description = excluded.description
                    "#,
                    params![vr.vr_type, vr.command, vr.description],
                )
                .map_err(|e| {
                    KbError::database(format!("Failed to upsert verification type: {}", e))
                })?;
            }

            for incident in &update.incidents {
                tx.execute(
                    r#"
                    INSERT OR REPLACE INTO incidents (incident_num, date, incident_type, description)
                    VALUES (?1, ?2, ?3, ?4)
                    "#,
                    params![
                        incident.incident_num,
                        incident.date,
                        incident.incident_type,
                        incident.description,
                    ],
                )
                .map_err(|e| KbError::database(format!("Failed to upsert incident: {}", e)))?;
            }

            for mismatch in &update.schema_mismatches {
                tx.execute(
                    "INSERT INTO schema_mismatches (doc_id, note) VALUES (?1, ?2)",
                    params![doc_id, mismatch.note],
                )
                .map_err(|e| KbError::database(e.to_string()))?;
            }

            for correction in &update.corrections {
                tx.execute(
                    r#"
                    INSERT OR REPLACE INTO corrections
                        (id, doc_id, date, title, wrong, correction, rule, cr_rule)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    "#,
                    params![
                        correction.id,
                        doc_id,
                        correction.date,
                        correction.title,
                        correction.wrong,
                        correction.correction,
                        correction.rule,
                        correction.cr_rule,
                    ],
                )
                .map_err(|e| KbError::database(format!("Failed to upsert correction: {}", e)))?;
            }

            let mut edges_created = 0u64;
            {
                let mut stmt = tx
                    .prepare(
                        r#"
                        INSERT OR IGNORE INTO edges
                            (doc_id, source_type, source_id, target_type, target_id)
                        VALUES (?1, ?2, ?3, ?4, ?5)
                        "#,
                    )
                    .map_err(|e| KbError::database(e.to_string()))?;

                for edge in &update.edges {
                    let inserted = stmt
                        .execute(params![
                            doc_id,
                            edge.source.kind.as_str(),
                            edge.source.id,
                            edge.target.kind.as_str(),
                            edge.target.id,
                        ])
                        .map_err(|e| KbError::database(format!("Failed to insert edge: {}", e)))?;
                    edges_created += inserted as u64;
                }
            }

            tx.commit().map_err(|e| KbError::database(e.to_string()))?;

            debug!(
                "Applied update for {}: {} chunks, {} edges",
                doc.file_path,
                update.chunks.len(),
                edges_created
            );

            Ok(UpdateOutcome {
                chunks_written: update.chunks.len() as u64,
                edges_created,
            })
        })
    }

    // Chunk operations

    async fn get_chunk(&self, id: Ulid) -> Result<Option<Chunk>> {
        self.with_conn(|conn| {
            let mut stmt = sql_prepare(
                conn,
                r#"
                SELECT id, doc_id, chunk_type, heading, content, line_start, line_end, metadata
                FROM chunks WHERE id = ?1
                "#,
            )?;

            let result = stmt
                .query_row(params![id.to_string()], |row| Self::row_to_chunk(row))
                .optional()
                .map_err(|e| KbError::database(e.to_string()))?;

            Ok(result)
        })
    }

    async fn get_chunks_for_document(&self, doc_id: Ulid) -> Result<Vec<Chunk>> {
        self.with_conn(|conn| {
            let mut stmt = sql_prepare(
                conn,
                r#"
                SELECT id, doc_id, chunk_type, heading, content, line_start, line_end, metadata
                FROM chunks
                WHERE doc_id = ?1
                ORDER BY line_start, id
                "#,
            )?;

            let chunks = stmt
                .query_map(params![doc_id.to_string()], |row| Self::row_to_chunk(row))
                .map_err(|e| KbError::database(e.to_string()))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| KbError::database(e.to_string()))?;

            Ok(chunks)
        })
    }

    // Entity lookups

    async fn get_rule(&self, rule_id: &str) -> Result<Option<Rule>> {
        let rule_id = rule_id.to_string();
        self.with_conn(|conn| {
            let mut stmt = sql_prepare(
                conn,
                "SELECT rule_id, rule_text, vr_type, reference_path FROM rules WHERE rule_id = ?1",
            )?;

            let result = stmt
                .query_row(params![rule_id], |row| Self::row_to_rule(row))
                .optional()
                .map_err(|e| KbError::database(e.to_string()))?;

            Ok(result)
        })
    }

    async fn list_rules(&self) -> Result<Vec<Rule>> {
        self.with_conn(|conn| {
            let mut stmt = sql_prepare(
                conn,
                "SELECT rule_id, rule_text, vr_type, reference_path FROM rules ORDER BY rule_id",
            )?;

            let rules = stmt
                .query_map([], |row| Self::row_to_rule(row))
                .map_err(|e| KbError::database(e.to_string()))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| KbError::database(e.to_string()))?;

            Ok(rules)
        })
    }

    async fn get_verification_type(&self, vr_type: &str) -> Result<Option<VerificationType>> {
        let vr_type = vr_type.to_string();
        self.with_conn(|conn| {
            let mut stmt = sql_prepare(
                conn,
                "SELECT vr_type, command, description FROM verification_types WHERE vr_type = ?1",
            )?;

            let result = stmt
                .query_row(params![vr_type], |row| {
                    Ok(VerificationType {
                        vr_type: row.get(0)?,
                        command: row.get(1)?,
                        description: row.get(2)?,
                    })
                })
                .optional()
                .map_err(|e| KbError::database(e.to_string()))?;

            Ok(result)
        })
    }

    async fn list_verification_types(&self) -> Result<Vec<VerificationType>> {
        self.with_conn(|conn| {
            let mut stmt = sql_prepare(
                conn,
                "SELECT vr_type, command, description FROM verification_types ORDER BY vr_type",
            )?;

            let types = stmt
                .query_map([], |row| {
                    Ok(VerificationType {
                        vr_type: row.get(0)?,
                        command: row.get(1)?,
                        description: row.get(2)?,
                    })
                })
                .map_err(|e| KbError::database(e.to_string()))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| KbError::database(e.to_string()))?;

            Ok(types)
        })
    }

    async fn get_correction(&self, id: &str) -> Result<Option<Correction>> {
        let id = id.to_string();
        self.with_conn(|conn| {
            let mut stmt = sql_prepare(
                conn,
                r#"
                SELECT id, date, title, wrong, correction, rule, cr_rule
                FROM corrections WHERE id = ?1
                "#,
            )?;

            let result = stmt
                .query_row(params![id], |row| {
                    Ok(Correction {
                        id: row.get(0)?,
                        date: row.get(1)?,
                        title: row.get(2)?,
                        wrong: row.get(3)?,
                        correction: row.get(4)?,
                        rule: row.get(5)?,
                        cr_rule: row.get(6)?,
                    })
                })
                .optional()
                .map_err(|e| KbError::database(e.to_string()))?;

            Ok(result)
        })
    }

    async fn entity_exists(&self, entity: &EntityRef) -> Result<bool> {
        let id = entity.id.clone();
        let kind = entity.kind;
        self.with_conn(move |conn| {
            let exists: Option<i64> = match kind {
                EntityKind::Cr => conn
                    .query_row("SELECT 1 FROM rules WHERE rule_id = ?1", params![id], |r| {
                        r.get(0)
                    })
                    .optional()
                    .map_err(|e| KbError::database(e.to_string()))?,
                EntityKind::Vr => conn
                    .query_row(
                        "SELECT 1 FROM verification_types WHERE vr_type = ?1",
                        params![id],
                        |r| r.get(0),
                    )
                    .optional()
                    .map_err(|e| KbError::database(e.to_string()))?,
                EntityKind::Incident => {
                    let Ok(num) = id.parse::<i64>() else {
                        return Ok(false);
                    };
                    conn.query_row(
                        "SELECT 1 FROM incidents WHERE incident_num = ?1",
                        params![num],
                        |r| r.get(0),
                    )
                    .optional()
                    .map_err(|e| KbError::database(e.to_string()))?
                }
                EntityKind::Correction => conn
                    .query_row(
                        "SELECT 1 FROM corrections WHERE id = ?1",
                        params![id],
                        |r| r.get(0),
                    )
                    .optional()
                    .map_err(|e| KbError::database(e.to_string()))?,
            };
            Ok(exists.is_some())
        })
    }

    // Graph operations

    async fn edges_for_entity(&self, entity: &EntityRef) -> Result<Vec<Edge>> {
        let kind = entity.kind.as_str().to_string();
        let id = entity.id.clone();
        self.with_conn(move |conn| {
            let mut stmt = sql_prepare(
                conn,
                r#"
                SELECT DISTINCT source_type, source_id, target_type, target_id
                FROM edges
                WHERE (source_type = ?1 AND source_id = ?2)
                   OR (target_type = ?1 AND target_id = ?2)
                "#,
            )?;

            let rows = stmt
                .query_map(params![kind, id], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                })
                .map_err(|e| KbError::database(e.to_string()))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| KbError::database(e.to_string()))?;

            let edges = rows
                .into_iter()
                .filter_map(|(st, sid, tt, tid)| {
                    let source = EntityKind::parse(&st).map(|k| EntityRef::new(k, sid))?;
                    let target = EntityKind::parse(&tt).map(|k| EntityRef::new(k, tid))?;
                    Some(Edge::new(source, target))
                })
                .collect();

            Ok(edges)
        })
    }

    // Search operations

    async fn search_chunks(&self, query: &str, k: u32) -> Result<Vec<(Ulid, f32)>> {
        // Escape FTS5 special characters so free-form input degrades to
        // literal matching instead of a syntax error.
        let escaped_query = Self::escape_fts_query(query);
        if escaped_query.trim().is_empty() {
            return Ok(Vec::new());
        }

        self.with_conn(move |conn| {
            let mut stmt = sql_prepare(
                conn,
                r#"
                SELECT c.id, bm25(chunks_fts) as score
                FROM chunks_fts f
                JOIN chunks c ON c.rowid = f.rowid
                WHERE chunks_fts MATCH ?1
                ORDER BY score
                LIMIT ?2
                "#,
            )?;

            let rows = stmt
                .query_map(params![escaped_query, k], |row| {
                    let id_str: String = row.get(0)?;
                    let score: f64 = row.get(1)?;
                    // bm25 is lower-is-better; negate so higher is better.
                    let similarity = (-score) as f32;
                    Ok((
                        Ulid::from_string(&id_str).unwrap_or_else(|_| Ulid::nil()),
                        similarity,
                    ))
                })
                .map_err(|e| KbError::database(e.to_string()))?;

            let results: Vec<_> = rows
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| KbError::database(e.to_string()))?;

            Ok(results)
        })
    }

    // Index metadata

    async fn last_index_epoch(&self) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            let value: Option<String> = conn
                .query_row(
                    "SELECT value FROM index_meta WHERE key = ?1",
                    params![LAST_INDEX_EPOCH_KEY],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| KbError::database(e.to_string()))?;

            Ok(value.and_then(|v| v.parse::<i64>().ok()))
        })
    }

    async fn set_last_index_epoch(&self, epoch: i64) -> Result<()> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO index_meta (key, value) VALUES (?1, ?2)",
                params![LAST_INDEX_EPOCH_KEY, epoch.to_string()],
            )
            .map_err(|e| KbError::database(e.to_string()))?;
            Ok(())
        })
    }

    // Stats

    async fn get_stats(&self) -> Result<StoreStats> {
        self.with_conn(|conn| {
            let count = |table: &str| -> Result<u64> {
                conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })
                .map_err(|e| KbError::database(e.to_string()))
            };

            let documents = count("documents")?;
            let chunks = count("chunks")?;
            let rules = count("rules")?;
            let verification_types = count("verification_types")?;
            let incidents = count("incidents")?;
            let corrections = count("corrections")?;
            let edges: u64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM (SELECT DISTINCT source_type, source_id, target_type, target_id FROM edges)",
                    [],
                    |row| row.get(0),
                )
                .map_err(|e| KbError::database(e.to_string()))?;

            // Get page count and page size to estimate storage
            let page_count: u64 = conn
                .query_row("PRAGMA page_count", [], |row| row.get(0))
                .unwrap_or(0);
            let page_size: u64 = conn
                .query_row("PRAGMA page_size", [], |row| row.get(0))
                .unwrap_or(4096);

            Ok(StoreStats {
                documents,
                chunks,
                rules,
                verification_types,
                incidents,
                corrections,
                edges,
                storage_bytes: page_count * page_size,
            })
        })
    }
}

/// Prepare with uniform error mapping.
fn sql_prepare<'a>(conn: &'a Connection, sql: &str) -> Result<rusqlite::Statement<'a>> {
    conn.prepare(sql)
        .map_err(|e| KbError::database(e.to_string()))
}

// Helper methods
impl SqliteStore {
    /// Convert a row to a Document.
    fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<Document> {
        let id_str: String = row.get(0)?;
        let category_str: String = row.get(2)?;
        let content_hash: Option<Vec<u8>> = row.get(4)?;

        Ok(Document {
            id: Ulid::from_string(&id_str).unwrap_or_else(|_| Ulid::nil()),
            file_path: row.get(1)?,
            category: Category::from_str_lossy(&category_str),
            title: row.get(3)?,
            content_hash: content_hash.and_then(|v| v.try_into().ok()),
            indexed_at: row.get(5)?,
            indexed_at_epoch: row.get(6)?,
        })
    }

    /// Convert a row to a Chunk.
    fn row_to_chunk(row: &rusqlite::Row<'_>) -> rusqlite::Result<Chunk> {
        let id_str: String = row.get(0)?;
        let doc_id_str: String = row.get(1)?;
        let chunk_type_str: String = row.get(2)?;
        let metadata_str: String = row.get(7)?;

        Ok(Chunk {
            id: Ulid::from_string(&id_str).unwrap_or_else(|_| Ulid::nil()),
            doc_id: Ulid::from_string(&doc_id_str).unwrap_or_else(|_| Ulid::nil()),
            chunk_type: ChunkType::from_str_lossy(&chunk_type_str),
            heading: row.get(3)?,
            content: row.get(4)?,
            line_start: row.get(5)?,
            line_end: row.get(6)?,
            metadata: serde_json::from_str(&metadata_str).unwrap_or_default(),
        })
    }

    /// Convert a row to a Rule.
    fn row_to_rule(row: &rusqlite::Row<'_>) -> rusqlite::Result<Rule> {
        Ok(Rule {
            rule_id: row.get(0)?,
            rule_text: row.get(1)?,
            vr_type: row.get(2)?,
            reference_path: row.get(3)?,
        })
    }

    /// Escape FTS5 query special characters.
    ///
    /// Terms carrying syntax characters or bare boolean operators are
    /// double-quoted so the query matches literally.
    fn escape_fts_query(query: &str) -> String {
        query
            .split_whitespace()
            .map(|term| {
                let is_operator = matches!(term, "AND" | "OR" | "NOT" | "NEAR");
                let has_special = term
                    .chars()
                    .any(|c| !c.is_alphanumeric() && c != '_');
                if is_operator || has_special {
                    format!("\"{}\"", term.replace('"', "\"\""))
                } else {
                    term.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
