//! Tolerant markdown pipe-table scanning.
//!
//! Shared primitive for the rule-table and verification-type parsers.
//! Finds the first table whose header row satisfies a predicate and
//! returns its data rows as trimmed cells. Ragged column counts and
//! missing leading/trailing pipes are tolerated.

/// Split a pipe-table line into trimmed cells.
fn split_row(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|c| c.trim().to_string()).collect()
}

/// A row of only dashes/colons separating header from data.
fn is_separator_row(cells: &[String]) -> bool {
    !cells.is_empty()
        && cells
            .iter()
            .all(|c| !c.is_empty() && c.chars().all(|ch| matches!(ch, '-' | ':')))
}

fn is_table_line(line: &str) -> bool {
    line.trim_start().starts_with('|')
}

/// Scan text for the first pipe table whose header satisfies `header_pred`
/// and return its data rows. Returns an empty vec when no such table
/// exists. Row order is preserved as table order.
pub fn scan_table<F>(text: &str, header_pred: F) -> Vec<Vec<String>>
where
    F: Fn(&[String]) -> bool,
{
    let mut lines = text.lines().peekable();

    while let Some(line) = lines.next() {
        if !is_table_line(line) {
            continue;
        }

        let header = split_row(line);
        if is_separator_row(&header) || !header_pred(&header) {
            continue;
        }

        // Optional separator row after the header.
        if let Some(next) = lines.peek() {
            if is_table_line(next) && is_separator_row(&split_row(next)) {
                lines.next();
            }
        }

        let mut rows = Vec::new();
        for line in lines.by_ref() {
            if !is_table_line(line) {
                break;
            }
            let cells = split_row(line);
            if is_separator_row(&cells) {
                continue;
            }
            rows.push(cells);
        }
        return rows;
    }

    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
Intro text.

| Rule ID | Rule | VR Type |
|---------|------|---------|
| CR-1 | Never claim state without proof | VR-FILE |
| CR-2 | Build before commit | VR-BUILD |

Trailing text.
";

    #[test]
    fn test_scan_finds_table() {
        let rows = scan_table(TABLE, |h| h.iter().any(|c| c.to_lowercase().contains("rule")));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], "CR-1");
        assert_eq!(rows[1][2], "VR-BUILD");
    }

    #[test]
    fn test_predicate_mismatch_is_empty() {
        let rows = scan_table(TABLE, |h| h.iter().any(|c| c.contains("Command")));
        assert!(rows.is_empty());
    }

    #[test]
    fn test_no_table_is_empty() {
        assert!(scan_table("just prose, no pipes", |_| true).is_empty());
        assert!(scan_table("", |_| true).is_empty());
    }

    #[test]
    fn test_missing_outer_pipes_tolerated() {
        let text = "Rule ID | Rule\n--- | ---\nCR-9 | Do the thing\n";
        let rows = scan_table(text, |h| h.iter().any(|c| c.contains("Rule")));
        // Lines without a leading pipe are not treated as table rows.
        assert!(rows.is_empty());

        let piped = "| Rule ID | Rule\n| --- | ---\n| CR-9 | Do the thing\n";
        let rows = scan_table(piped, |h| h.iter().any(|c| c.contains("Rule")));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], "CR-9");
    }

    #[test]
    fn test_ragged_rows_preserved() {
        let text = "| A | B | C |\n| - | - | - |\n| 1 | 2 |\n| 1 | 2 | 3 | 4 |\n";
        let rows = scan_table(text, |_| true);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[1].len(), 4);
    }
}
