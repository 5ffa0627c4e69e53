//! Incident-log and schema-mismatch parsers.

use std::sync::OnceLock;

use regex::Regex;

use kb_core::{Incident, SchemaMismatch};

use crate::fields::labeled_field;

/// Heading-level or bolded `Incident <n>` marker.
fn incident_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(?:#{1,6}\s+)?\*{0,2}Incident\s+#?(\d+)").expect("valid regex")
    })
}

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#{1,6}\s+(.*)$").expect("valid regex"))
}

/// Split an incident log on `Incident <n>` markers and extract labeled
/// date/type/description fields per block.
///
/// A template log whose markers carry no real number (e.g. "Incident N")
/// yields an empty list.
pub fn parse_incidents(text: &str) -> Vec<Incident> {
    let lines: Vec<&str> = text.lines().collect();

    // Collect (line index, incident number) for each marker.
    let mut markers: Vec<(usize, u32)> = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if let Some(caps) = incident_marker_re().captures(line) {
            if let Ok(num) = caps[1].parse::<u32>() {
                markers.push((i, num));
            }
        }
    }

    let mut incidents = Vec::new();
    for (m, &(start, num)) in markers.iter().enumerate() {
        let end = markers
            .get(m + 1)
            .map(|&(next, _)| next)
            .unwrap_or(lines.len());
        let block = lines[start..end].join("\n");

        incidents.push(Incident {
            incident_num: num,
            date: labeled_field(&block, "Date"),
            incident_type: labeled_field(&block, "Type"),
            description: labeled_field(&block, "Description"),
        });
    }
    incidents
}

/// Extract bullet notes from a schema-mismatch section.
///
/// Returns empty when the section is absent, which is a legitimate state.
pub fn parse_schema_mismatches(text: &str) -> Vec<SchemaMismatch> {
    let lines: Vec<&str> = text.lines().collect();

    let section_start = lines.iter().position(|line| {
        heading_re()
            .captures(line)
            .map(|c| c[1].to_lowercase().contains("mismatch"))
            .unwrap_or(false)
    });
    let Some(start) = section_start else {
        return Vec::new();
    };

    let mut notes = Vec::new();
    for line in &lines[start + 1..] {
        if heading_re().is_match(line) {
            break;
        }
        let trimmed = line.trim();
        if let Some(item) = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
        {
            let note = item.trim();
            if !note.is_empty() {
                notes.push(SchemaMismatch {
                    note: note.to_string(),
                });
            }
        }
    }
    notes
}
