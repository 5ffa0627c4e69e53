//! Correction-log parser.
//!
//! A corrections log is organized as a top-level active heading followed by
//! dated third-level subsections, then an archived span. Only entries under
//! the active heading are extracted; the boundary heading text is
//! configuration, not a literal.

use std::sync::OnceLock;

use regex::Regex;

use kb_core::{Correction, CorrectionsConfig};

use crate::fields::{labeled_field, slug};

/// `### YYYY-MM-DD - <title>` subsection heading.
fn dated_heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^###\s+(\d{4}-\d{2}-\d{2})\s*-\s*(.+)$").expect("valid regex")
    })
}

fn span_heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(#{1,2})\s+(.*)$").expect("valid regex"))
}

fn cr_mention_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"CR-\d+").expect("valid regex"))
}

/// A parsed correction plus its location in the source document, so the
/// chunker can emit a correction chunk with real line ranges.
#[derive(Debug, Clone)]
pub struct CorrectionEntry {
    pub correction: Correction,

    /// Line of the dated heading (1-based).
    pub line_start: u32,

    /// Last line of the entry block (1-based, inclusive).
    pub line_end: u32,

    /// Raw block body below the dated heading.
    pub body: String,
}

/// Extract active correction entries with their source locations.
pub fn parse_correction_entries(text: &str, config: &CorrectionsConfig) -> Vec<CorrectionEntry> {
    let lines: Vec<&str> = text.lines().collect();
    let active = config.active_heading.to_lowercase();

    // Locate the active span: from the configured heading to the next
    // heading of the same or higher level (commonly the archived heading).
    let mut span_start = None;
    let mut span_level = 0usize;
    for (i, line) in lines.iter().enumerate() {
        if let Some(caps) = span_heading_re().captures(line) {
            if caps[2].trim().to_lowercase() == active {
                span_start = Some(i + 1);
                span_level = caps[1].len();
                break;
            }
        }
    }
    let Some(start) = span_start else {
        return Vec::new();
    };

    let mut end = lines.len();
    for (i, line) in lines.iter().enumerate().skip(start) {
        if let Some(caps) = span_heading_re().captures(line) {
            if caps[1].len() <= span_level {
                end = i;
                break;
            }
        }
    }

    // Split the span on dated subsection headings.
    let mut markers: Vec<(usize, String, String)> = Vec::new();
    for (i, line) in lines[start..end].iter().enumerate() {
        if let Some(caps) = dated_heading_re().captures(line) {
            markers.push((start + i, caps[1].to_string(), caps[2].trim().to_string()));
        }
    }

    let mut entries = Vec::new();
    for (m, (line_idx, date, title)) in markers.iter().enumerate() {
        let block_end = markers.get(m + 1).map(|(next, _, _)| *next).unwrap_or(end);
        let body = lines[line_idx + 1..block_end].join("\n");

        let cr_rule = labeled_field(&body, "CR").map(|value| {
            cr_mention_re()
                .find(&value)
                .map(|mat| mat.as_str().to_string())
                .unwrap_or(value)
        });

        entries.push(CorrectionEntry {
            correction: Correction {
                id: format!("{}-{}", date, slug(title)),
                date: date.clone(),
                title: title.clone(),
                wrong: labeled_field(&body, "Wrong"),
                correction: labeled_field(&body, "Correction"),
                rule: labeled_field(&body, "Rule"),
                cr_rule,
            },
            line_start: *line_idx as u32 + 1,
            line_end: block_end as u32,
            body,
        });
    }
    entries
}

/// Extract active correction records, in document order.
pub fn parse_corrections(text: &str, config: &CorrectionsConfig) -> Vec<Correction> {
    parse_correction_entries(text, config)
        .into_iter()
        .map(|e| e.correction)
        .collect()
}
