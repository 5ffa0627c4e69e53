//! Configuration types for the knowledge base.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the knowledge base.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KbConfig {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Corpus layout configuration.
    #[serde(default)]
    pub corpus: CorpusConfig,

    /// Corrections-log parsing configuration.
    #[serde(default)]
    pub corrections: CorrectionsConfig,

    /// Search configuration.
    #[serde(default)]
    pub search: SearchConfig,

    /// Graph traversal configuration.
    #[serde(default)]
    pub graph: GraphConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file.
    pub path: PathBuf,

    /// Enable WAL mode (recommended).
    #[serde(default = "default_true")]
    pub wal_mode: bool,

    /// SQLite cache size in KB (negative = KB, positive = pages).
    #[serde(default = "default_cache_size")]
    pub cache_size: i32,

    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            wal_mode: true,
            cache_size: -64000, // 64MB
            busy_timeout_ms: 30000,
        }
    }
}

/// Corpus layout: where documents live and how paths map to categories.
///
/// Directory markers and file-name markers are configuration rather than
/// hardcoded literals so corpora with different naming conventions can be
/// indexed without code changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Corpus root directory.
    pub root: PathBuf,

    /// Directory names that classify a path as `docs`.
    #[serde(default = "default_docs_dirs")]
    pub docs_dirs: Vec<String>,

    /// Directory names that classify a path as `plan`.
    #[serde(default = "default_plan_dirs")]
    pub plan_dirs: Vec<String>,

    /// Directory names that classify a path as `patterns`.
    #[serde(default = "default_pattern_dirs")]
    pub pattern_dirs: Vec<String>,

    /// Markers that classify a path as `memory` wherever they appear in
    /// its segments (supports paths rooted outside the corpus, such as a
    /// home-directory cache).
    #[serde(default = "default_memory_markers")]
    pub memory_markers: Vec<String>,

    /// File extensions to index.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// File-stem markers identifying a corrections log.
    #[serde(default = "default_corrections_files")]
    pub corrections_files: Vec<String>,

    /// File-stem markers identifying a rule/verification source.
    #[serde(default = "default_rules_files")]
    pub rules_files: Vec<String>,

    /// File-stem markers identifying an incident log.
    #[serde(default = "default_incidents_files")]
    pub incidents_files: Vec<String>,

    /// File-stem markers identifying schema-mismatch notes.
    #[serde(default = "default_mismatch_files")]
    pub mismatch_files: Vec<String>,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            docs_dirs: default_docs_dirs(),
            plan_dirs: default_plan_dirs(),
            pattern_dirs: default_pattern_dirs(),
            memory_markers: default_memory_markers(),
            extensions: default_extensions(),
            corrections_files: default_corrections_files(),
            rules_files: default_rules_files(),
            incidents_files: default_incidents_files(),
            mismatch_files: default_mismatch_files(),
        }
    }
}

/// Heading boundaries for the corrections log. The active/archived split
/// depends on exact heading text, so it is configurable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionsConfig {
    /// Top-level heading that opens the active span.
    #[serde(default = "default_active_heading")]
    pub active_heading: String,

    /// Top-level heading that closes it (any same-level heading also
    /// closes the span; this one is just the conventional name).
    #[serde(default = "default_archived_heading")]
    pub archived_heading: String,
}

impl Default for CorrectionsConfig {
    fn default() -> Self {
        Self {
            active_heading: default_active_heading(),
            archived_heading: default_archived_heading(),
        }
    }
}

/// Search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Default number of results.
    #[serde(default = "default_top_k")]
    pub default_top_k: u32,

    /// Maximum number of results.
    #[serde(default = "default_max_top_k")]
    pub max_top_k: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_k: 10,
            max_top_k: 100,
        }
    }
}

/// Graph traversal configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Default maximum traversal depth.
    #[serde(default = "default_max_depth")]
    pub default_max_depth: u32,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            default_max_depth: 3,
        }
    }
}

// Default value functions

fn default_true() -> bool {
    true
}

fn default_cache_size() -> i32 {
    -64000
}

fn default_busy_timeout() -> u32 {
    30000
}

fn default_docs_dirs() -> Vec<String> {
    vec!["docs".to_string()]
}

fn default_plan_dirs() -> Vec<String> {
    vec!["plans".to_string(), "plan".to_string()]
}

fn default_pattern_dirs() -> Vec<String> {
    vec!["patterns".to_string()]
}

fn default_memory_markers() -> Vec<String> {
    vec!["memory".to_string()]
}

fn default_extensions() -> Vec<String> {
    vec!["md".to_string(), "markdown".to_string()]
}

fn default_corrections_files() -> Vec<String> {
    vec!["correction".to_string()]
}

fn default_rules_files() -> Vec<String> {
    vec!["rule".to_string(), "verification".to_string()]
}

fn default_incidents_files() -> Vec<String> {
    vec!["incident".to_string()]
}

fn default_mismatch_files() -> Vec<String> {
    vec!["mismatch".to_string(), "schema".to_string()]
}

fn default_active_heading() -> String {
    "Active Prevention Rules".to_string()
}

fn default_archived_heading() -> String {
    "Archived".to_string()
}

fn default_top_k() -> u32 {
    10
}

fn default_max_top_k() -> u32 {
    100
}

fn default_max_depth() -> u32 {
    3
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kb")
        .join("kb.db")
}

impl KbConfig {
    /// Load configuration from file.
    pub fn load(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| crate::error::KbError::config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load configuration from default paths.
    pub fn load_default() -> crate::error::Result<Self> {
        // Try user config first
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("kb").join("config.toml");
            if user_config.exists() {
                return Self::load(&user_config);
            }
        }

        // Try local config
        let local_config = PathBuf::from("kb.toml");
        if local_config.exists() {
            return Self::load(&local_config);
        }

        // Return defaults
        Ok(Self::default())
    }
}
