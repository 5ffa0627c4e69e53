//! Rule-table and verification-type-table parsers.

use kb_core::{Rule, VerificationType};

use crate::fields::{rule_id_re, vr_id_re};
use crate::table::scan_table;

/// Extract rules from a markdown rule table.
///
/// The table is located by a header mentioning a rule column. Mandatory
/// columns are the `CR-<n>` identifier and the rule text; a VR link and a
/// reference path are optional, and tables with extra or missing optional
/// columns still yield the mandatory ones. Rows whose identifier cell does
/// not match the pattern are skipped. Row order follows table order.
pub fn parse_rules(text: &str) -> Vec<Rule> {
    let rows = scan_table(text, |header| {
        header.iter().any(|c| c.to_lowercase().contains("rule"))
    });

    let mut rules = Vec::new();
    for cells in rows {
        let Some(id_idx) = cells.iter().position(|c| rule_id_re().is_match(c)) else {
            continue;
        };
        let Some(rule_text) = cells.get(id_idx + 1).filter(|c| !c.is_empty()) else {
            continue;
        };

        let rest = &cells[(id_idx + 2).min(cells.len())..];
        let vr_type = rest.iter().find(|c| vr_id_re().is_match(c)).cloned();
        let reference_path = rest
            .iter()
            .find(|c| !c.is_empty() && !vr_id_re().is_match(c))
            .cloned();

        rules.push(Rule {
            rule_id: cells[id_idx].clone(),
            rule_text: rule_text.clone(),
            vr_type,
            reference_path,
        });
    }
    rules
}

/// Extract verification types from a markdown table.
///
/// The table is located by a header with both a VR/verification column and
/// a command column, which distinguishes it from rule tables that also
/// carry a VR link column.
pub fn parse_verification_types(text: &str) -> Vec<VerificationType> {
    let rows = scan_table(text, |header| {
        let lower: Vec<String> = header.iter().map(|c| c.to_lowercase()).collect();
        lower
            .iter()
            .any(|c| c.contains("vr") || c.contains("verification"))
            && lower.iter().any(|c| c.contains("command"))
    });

    let mut types = Vec::new();
    for cells in rows {
        let Some(id_idx) = cells.iter().position(|c| vr_id_re().is_match(c)) else {
            continue;
        };
        let Some(command) = cells.get(id_idx + 1).filter(|c| !c.is_empty()) else {
            continue;
        };
        let description = cells
            .get(id_idx + 2)
            .filter(|c| !c.is_empty())
            .cloned();

        types.push(VerificationType {
            vr_type: cells[id_idx].clone(),
            command: command.clone(),
            description,
        });
    }
    types
}
