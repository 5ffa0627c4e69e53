//! Database schema definitions.

/// Main schema SQL for initializing the database.
pub const SCHEMA: &str = r#"
-- Documents table
CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    file_path TEXT NOT NULL UNIQUE,
    category TEXT NOT NULL,
    title TEXT,
    content_hash BLOB,
    indexed_at TEXT NOT NULL,
    indexed_at_epoch INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_documents_category ON documents(category);

-- Chunks table
CREATE TABLE IF NOT EXISTS chunks (
    id TEXT PRIMARY KEY,
    doc_id TEXT NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
    chunk_type TEXT NOT NULL,
    heading TEXT NOT NULL DEFAULT '',
    content TEXT NOT NULL,
    line_start INTEGER NOT NULL,
    line_end INTEGER NOT NULL,
    metadata TEXT DEFAULT '{}'
);

CREATE INDEX IF NOT EXISTS idx_chunks_doc_id ON chunks(doc_id);

-- Extracted rules (CR), upserted by identifier
CREATE TABLE IF NOT EXISTS rules (
    rule_id TEXT PRIMARY KEY,
    rule_text TEXT NOT NULL,
    vr_type TEXT,
    reference_path TEXT
);

-- Extracted verification types (VR), upserted by identifier
CREATE TABLE IF NOT EXISTS verification_types (
    vr_type TEXT PRIMARY KEY,
    command TEXT NOT NULL,
    description TEXT
);

-- Incidents, natural identity on incident_num
CREATE TABLE IF NOT EXISTS incidents (
    incident_num INTEGER PRIMARY KEY,
    date TEXT,
    incident_type TEXT,
    description TEXT
);

-- Schema-mismatch notes, replaced per document
CREATE TABLE IF NOT EXISTS schema_mismatches (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    doc_id TEXT NOT NULL,
    note TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_mismatches_doc_id ON schema_mismatches(doc_id);

-- Corrections, replaced per document
CREATE TABLE IF NOT EXISTS corrections (
    id TEXT PRIMARY KEY,
    doc_id TEXT NOT NULL,
    date TEXT NOT NULL,
    title TEXT NOT NULL,
    wrong TEXT,
    correction TEXT,
    rule TEXT,
    cr_rule TEXT
);

CREATE INDEX IF NOT EXISTS idx_corrections_doc_id ON corrections(doc_id);

-- Cross-reference edges, derived from chunk text. Each edge carries the
-- originating document so re-indexing a file clears and rebuilds only its
-- own edges; traversal reads DISTINCT endpoint tuples.
CREATE TABLE IF NOT EXISTS edges (
    doc_id TEXT NOT NULL,
    source_type TEXT NOT NULL,
    source_id TEXT NOT NULL,
    target_type TEXT NOT NULL,
    target_id TEXT NOT NULL,
    UNIQUE(doc_id, source_type, source_id, target_type, target_id)
);

CREATE INDEX IF NOT EXISTS idx_edges_source ON edges(source_type, source_id);
CREATE INDEX IF NOT EXISTS idx_edges_target ON edges(target_type, target_id);

-- Index metadata (last successful index epoch and friends)
CREATE TABLE IF NOT EXISTS index_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- FTS5 virtual table for full-text search over chunks
CREATE VIRTUAL TABLE IF NOT EXISTS chunks_fts USING fts5(
    heading,
    content,
    content=chunks,
    content_rowid=rowid
);

-- Triggers to keep FTS5 in sync with the chunks table
CREATE TRIGGER IF NOT EXISTS chunks_ai AFTER INSERT ON chunks BEGIN
    INSERT INTO chunks_fts(rowid, heading, content) VALUES (NEW.rowid, NEW.heading, NEW.content);
END;

CREATE TRIGGER IF NOT EXISTS chunks_ad AFTER DELETE ON chunks BEGIN
    INSERT INTO chunks_fts(chunks_fts, rowid, heading, content)
    VALUES ('delete', OLD.rowid, OLD.heading, OLD.content);
END;

CREATE TRIGGER IF NOT EXISTS chunks_au AFTER UPDATE ON chunks BEGIN
    INSERT INTO chunks_fts(chunks_fts, rowid, heading, content)
    VALUES ('delete', OLD.rowid, OLD.heading, OLD.content);
    INSERT INTO chunks_fts(rowid, heading, content) VALUES (NEW.rowid, NEW.heading, NEW.content);
END;
"#;

/// Key under which the last successful index epoch is stored.
pub const LAST_INDEX_EPOCH_KEY: &str = "last_index_epoch";

/// Schema version for migrations.
pub const SCHEMA_VERSION: u32 = 1;
