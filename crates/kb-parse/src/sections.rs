//! Generic markdown section splitting.

use std::sync::OnceLock;

use regex::Regex;

/// A heading-delimited slice of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// Heading text; empty for the pre-heading preamble.
    pub heading: String,

    /// Body content below the heading.
    pub content: String,

    /// First body line (1-based).
    pub line_start: u32,

    /// Last body line (1-based, inclusive).
    pub line_end: u32,
}

fn section_heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(##|###)\s+(.*)$").expect("valid regex"))
}

/// Split markdown into sections at level-2 and level-3 headings.
///
/// Content preceding the first heading (commonly a level-1 title plus
/// intro) becomes a section with an empty heading. Line ranges are 1-based,
/// strictly increasing, and non-overlapping. Empty input yields no
/// sections.
pub fn parse_sections(text: &str) -> Vec<Section> {
    if text.is_empty() {
        return Vec::new();
    }

    let lines: Vec<&str> = text.lines().collect();
    let headings: Vec<(usize, String)> = lines
        .iter()
        .enumerate()
        .filter_map(|(i, line)| {
            section_heading_re()
                .captures(line)
                .map(|caps| (i, caps[2].trim().to_string()))
        })
        .collect();

    let mut sections = Vec::new();

    // Preamble before the first heading, or the whole document when no
    // headings exist.
    let first_heading = headings.first().map(|(i, _)| *i).unwrap_or(lines.len());
    if first_heading > 0 {
        sections.push(Section {
            heading: String::new(),
            content: lines[..first_heading].join("\n"),
            line_start: 1,
            line_end: first_heading as u32,
        });
    }

    for (h, (line_idx, heading)) in headings.iter().enumerate() {
        let block_end = headings
            .get(h + 1)
            .map(|(next, _)| *next)
            .unwrap_or(lines.len());

        let body_start = line_idx + 1;
        let content = lines[body_start..block_end].join("\n");

        // An empty body collapses to the heading's own line, never a line
        // belonging to the next section.
        let (line_start, line_end) = if block_end > body_start {
            (body_start as u32 + 1, block_end as u32)
        } else {
            (*line_idx as u32 + 1, *line_idx as u32 + 1)
        };

        sections.push(Section {
            heading: heading.clone(),
            content,
            line_start,
            line_end,
        });
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(parse_sections("").is_empty());
    }

    #[test]
    fn test_no_headings_single_section() {
        let sections = parse_sections("just one line\nand another");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].heading, "");
        assert_eq!(sections[0].line_start, 1);
        assert_eq!(sections[0].line_end, 2);
    }

    #[test]
    fn test_two_level_two_headings() {
        let text = "# Title\n\nintro\n\n## First\nbody one\n\n## Second\nbody two\n";
        let sections = parse_sections(text);

        assert!(sections.iter().any(|s| s.heading == "First"));
        assert!(sections.iter().any(|s| s.heading == "Second"));

        // Preamble carries the title and intro with an empty heading.
        assert_eq!(sections[0].heading, "");
        assert!(sections[0].content.contains("# Title"));

        // Strictly increasing, non-overlapping line ranges.
        for pair in sections.windows(2) {
            assert!(pair[0].line_start <= pair[0].line_end);
            assert!(pair[0].line_end < pair[1].line_start);
        }
    }

    #[test]
    fn test_level_three_headings_split() {
        let text = "## Outer\n\n### Inner A\na\n\n### Inner B\nb\n";
        let sections = parse_sections(text);
        let headings: Vec<&str> = sections.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, vec!["Outer", "Inner A", "Inner B"]);
    }

    #[test]
    fn test_empty_body_stays_on_heading_line() {
        let text = "## A\n## B\nbody\n";
        let sections = parse_sections(text);
        assert_eq!(sections.len(), 2);
        // The empty section's range is its own heading line, not a line
        // from the following section.
        assert_eq!(sections[0].line_start, 1);
        assert_eq!(sections[0].line_end, 1);
        assert!(sections[0].line_end < sections[1].line_start);
        assert_eq!(sections[1].content, "body");
        assert_eq!(sections[1].line_start, 3);
        assert_eq!(sections[1].line_end, 3);
    }
}
