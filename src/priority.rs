//! Priority resolution: one final `action_type` per action.
//!
//! Each action carries up to three labels, one per level. Resolution scans
//! the priority order and keeps the first label the action carries at any
//! level. Actions matching nothing keep their current `action_type`.
//! Run it once, after Level-3.

use std::collections::BTreeSet;

use crate::model::ActionsBySession;

/// Which label of an action to look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    One,
    Two,
    Three,
    /// The resolved `action_type`.
    Final,
}

/// Overwrite every action's `action_type` with its highest-priority label.
pub fn resolve_priority(priority: &[String], sessions: &ActionsBySession) -> ActionsBySession {
    sessions
        .iter()
        .map(|(session, actions)| {
            let resolved = actions
                .iter()
                .map(|action| {
                    let mut action = action.clone();
                    if let Some(label) = priority.iter().find(|label| action.has_label(label)) {
                        action.action_type.clone_from(label);
                    }
                    action
                })
                .collect();
            (session.clone(), resolved)
        })
        .collect()
}

/// Distinct labels present at `level` across all sessions, sorted.
pub fn observed_labels(sessions: &ActionsBySession, level: Level) -> BTreeSet<String> {
    sessions
        .values()
        .flatten()
        .filter_map(|action| match level {
            Level::One => Some(action.level_1_action_type.as_str().to_string()),
            Level::Two => action.level_2_action_type.map(|k| k.as_str().to_string()),
            Level::Three => action.level_3_action_type.map(|k| k.as_str().to_string()),
            Level::Final => Some(action.action_type.clone()),
        })
        .collect()
}
