//! Shared helpers for labeled-field and identifier extraction.

use std::sync::OnceLock;

use regex::Regex;

/// `CR-<n>` rule identifier.
pub(crate) fn rule_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^CR-\d+$").expect("valid regex"))
}

/// `VR-<NAME>` verification-type identifier.
pub(crate) fn vr_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^VR-[A-Z0-9_-]+$").expect("valid regex"))
}

/// Extract a labeled field from a block of text.
///
/// Matches bullet or bare lines of the form `- **Label**: value`,
/// `* Label: value`, or `Label: value` (case-insensitive label).
pub(crate) fn labeled_field(text: &str, label: &str) -> Option<String> {
    let pattern = format!(
        r"(?im)^\s*[-*]?\s*\*{{0,2}}{}\*{{0,2}}\s*:\s*(.+)$",
        regex::escape(label)
    );
    // Label comes from a fixed call site, never user input.
    let re = Regex::new(&pattern).ok()?;
    re.captures(text)
        .map(|c| c[1].trim().trim_end_matches("**").trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Lowercase, dash-separated slug for stable entity identifiers.
pub(crate) fn slug(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_dash = true;
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labeled_field_variants() {
        let text = "- **Wrong**: assumed the file existed\n* Correction: check first\nRule: verify before claiming\n";
        assert_eq!(
            labeled_field(text, "Wrong").as_deref(),
            Some("assumed the file existed")
        );
        assert_eq!(labeled_field(text, "Correction").as_deref(), Some("check first"));
        assert_eq!(
            labeled_field(text, "rule").as_deref(),
            Some("verify before claiming")
        );
        assert_eq!(labeled_field(text, "CR"), None);
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Schema Drift in Plans"), "schema-drift-in-plans");
        assert_eq!(slug("  --weird__ title!  "), "weird-title");
        assert_eq!(slug(""), "");
    }

    #[test]
    fn test_id_patterns() {
        assert!(rule_id_re().is_match("CR-12"));
        assert!(!rule_id_re().is_match("CR-"));
        assert!(vr_id_re().is_match("VR-BUILD"));
        assert!(!vr_id_re().is_match("vr-build"));
    }
}
