//! Path-based document classification.

use std::path::Path;

use kb_core::{Category, CorpusConfig, DocKind};

/// Map a file path to a category.
///
/// Directory markers are matched in a fixed priority order: a memory marker
/// anywhere in the segments wins (so home-directory cache paths classify as
/// memory even outside the corpus), then plan, patterns, and docs
/// directories. A file with no parent directories is `Root`; everything
/// else is `Other`. Pure function, no filesystem access.
pub fn classify_path(path: &Path, config: &CorpusConfig) -> Category {
    let segments: Vec<String> = path
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(s) => Some(s.to_string_lossy().to_lowercase()),
            _ => None,
        })
        .collect();

    if segments.is_empty() {
        return Category::Other;
    }

    // All segments, including the file name, are eligible memory markers.
    if segments
        .iter()
        .any(|s| config.memory_markers.iter().any(|m| s == &m.to_lowercase()))
    {
        return Category::Memory;
    }

    // Only directory segments participate in the remaining matches.
    let dirs = &segments[..segments.len() - 1];
    let matches_any = |names: &[String]| {
        dirs.iter()
            .any(|d| names.iter().any(|n| d == &n.to_lowercase()))
    };

    if matches_any(&config.plan_dirs) {
        return Category::Plan;
    }
    if matches_any(&config.pattern_dirs) {
        return Category::Patterns;
    }
    if matches_any(&config.docs_dirs) {
        return Category::Docs;
    }
    if dirs.is_empty() {
        return Category::Root;
    }

    Category::Other
}

/// Detect the structured shape of a document from configured file-stem
/// markers, in priority order. Unmatched files are `Plain`.
pub fn detect_kind(path: &Path, config: &CorpusConfig) -> DocKind {
    let stem = match path.file_stem() {
        Some(s) => s.to_string_lossy().to_lowercase(),
        None => return DocKind::Plain,
    };

    let has_marker = |markers: &[String]| markers.iter().any(|m| stem.contains(&m.to_lowercase()));

    if has_marker(&config.corrections_files) {
        DocKind::Corrections
    } else if has_marker(&config.rules_files) {
        DocKind::Rules
    } else if has_marker(&config.incidents_files) {
        DocKind::Incidents
    } else if has_marker(&config.mismatch_files) {
        DocKind::Mismatches
    } else {
        DocKind::Plain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config() -> CorpusConfig {
        CorpusConfig::default()
    }

    #[test]
    fn test_root_file() {
        assert_eq!(
            classify_path(&PathBuf::from("CLAUDE.md"), &config()),
            Category::Root
        );
    }

    #[test]
    fn test_docs_and_plan_priority() {
        assert_eq!(
            classify_path(&PathBuf::from("docs/guide.md"), &config()),
            Category::Docs
        );
        // Plans win over docs even when nested under a docs directory.
        assert_eq!(
            classify_path(&PathBuf::from("docs/plans/q3.md"), &config()),
            Category::Plan
        );
    }

    #[test]
    fn test_memory_marker_anywhere() {
        // Memory marker wins regardless of position, including absolute
        // paths rooted outside the corpus.
        assert_eq!(
            classify_path(&PathBuf::from("/home/u/.cache/memory/notes.md"), &config()),
            Category::Memory
        );
        assert_eq!(
            classify_path(&PathBuf::from("docs/memory/corrections.md"), &config()),
            Category::Memory
        );
    }

    #[test]
    fn test_patterns_and_other() {
        assert_eq!(
            classify_path(&PathBuf::from("patterns/retry.md"), &config()),
            Category::Patterns
        );
        assert_eq!(
            classify_path(&PathBuf::from("misc/random.md"), &config()),
            Category::Other
        );
    }

    #[test]
    fn test_detect_kind() {
        let c = config();
        assert_eq!(
            detect_kind(&PathBuf::from("memory/corrections.md"), &c),
            DocKind::Corrections
        );
        assert_eq!(
            detect_kind(&PathBuf::from("docs/critical-rules.md"), &c),
            DocKind::Rules
        );
        assert_eq!(
            detect_kind(&PathBuf::from("incident-log.md"), &c),
            DocKind::Incidents
        );
        assert_eq!(
            detect_kind(&PathBuf::from("schema-notes.md"), &c),
            DocKind::Mismatches
        );
        assert_eq!(detect_kind(&PathBuf::from("README.md"), &c), DocKind::Plain);
    }
}
