//! Corpus directory walking.

use std::path::PathBuf;
use std::time::UNIX_EPOCH;

use tracing::warn;
use walkdir::WalkDir;

use kb_core::{CorpusConfig, Result};

/// A qualifying file found under the corpus root.
#[derive(Debug, Clone)]
pub struct CorpusFile {
    /// Absolute path on disk.
    pub abs_path: PathBuf,

    /// Path relative to the corpus root, forward-slashed. This is the
    /// document identity used by the store.
    pub rel_path: String,

    /// Modification time as Unix seconds.
    pub mtime_epoch: i64,
}

/// Walk the corpus root and collect files with a configured extension.
///
/// Hidden directories (leading dot) are skipped. Unreadable entries are
/// logged and skipped rather than aborting the walk.
pub fn walk_corpus(config: &CorpusConfig) -> Result<Vec<CorpusFile>> {
    let root = &config.root;
    let mut files = Vec::new();

    let walker = WalkDir::new(root).follow_links(false).into_iter();
    for entry in walker.filter_entry(|e| !is_hidden(e)) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let has_ext = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                config
                    .extensions
                    .iter()
                    .any(|want| want.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false);
        if !has_ext {
            continue;
        }

        let rel_path = match entry.path().strip_prefix(root) {
            Ok(rel) => rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
            Err(_) => continue,
        };

        let mtime_epoch = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        files.push(CorpusFile {
            abs_path: entry.path().to_path_buf(),
            rel_path,
            mtime_epoch,
        });
    }

    files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    Ok(files)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_walk_filters_extensions_and_hidden() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join("README.md"), "# Top\n").unwrap();
        fs::write(dir.path().join("docs/guide.md"), "# Guide\n").unwrap();
        fs::write(dir.path().join("docs/notes.txt"), "not markdown").unwrap();
        fs::write(dir.path().join(".git/HEAD.md"), "hidden").unwrap();

        let config = CorpusConfig {
            root: dir.path().to_path_buf(),
            ..Default::default()
        };

        let files = walk_corpus(&config).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(paths, vec!["README.md", "docs/guide.md"]);
        assert!(files.iter().all(|f| f.mtime_epoch > 0));
    }

    #[test]
    fn test_walk_missing_root_yields_empty() {
        let config = CorpusConfig {
            root: PathBuf::from("/nonexistent/kb-corpus"),
            ..Default::default()
        };
        let files = walk_corpus(&config).unwrap();
        assert!(files.is_empty());
    }
}
