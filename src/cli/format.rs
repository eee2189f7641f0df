//! Output formatting for CLI display.

use std::collections::BTreeMap;

use quill::model::ActionsBySession;

/// Count of actions per resolved `action_type`, one aligned line each.
pub(super) fn format_label_counts(sessions: &ActionsBySession) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for action in sessions.values().flatten() {
        *counts.entry(action.action_type.as_str()).or_default() += 1;
    }

    let width = counts.keys().map(|l| l.len()).max().unwrap_or(0);
    counts
        .iter()
        .map(|(label, n)| format!("  {label:<width$}  {n}\n"))
        .collect()
}

/// Numbered priority order, highest first.
pub(super) fn format_priority_order(names: &[String]) -> String {
    if names.is_empty() {
        return "No plugins\n".to_string();
    }
    names
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{}. {name}\n", i + 1))
        .collect()
}
