//! The three annotation passes: raw events to Level-1, Level-2 and
//! Level-3 actions.
//!
//! Each entry point takes an immutable snapshot keyed by session id and
//! returns a new one. Sessions are processed independently and in
//! session-id order.

mod level1;
mod level2;
mod level3;

pub use level1::{MergeAnalyzer, MergeState, OutOfOrder};

use tracing::debug;

use crate::config::{Level2Config, Level3Config, MergeConfig};
use crate::model::{Action, ActionsBySession, SessionLogs};
use crate::similarity::Similarity;

/// Errors that can occur while parsing actions.
///
/// These are data-quality problems in the input. The pipeline reports
/// them instead of repairing the data.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("session {session}: {source}")]
    NonChronological {
        session: String,
        #[source]
        source: OutOfOrder,
    },

    #[error("session {session}: action {index} references no raw events")]
    EmptyAction { session: String, index: usize },

    #[error(
        "session {session}: action {index} starts at event {start}, \
         before the previous action ends at {previous_end}"
    )]
    OverlappingAction {
        session: String,
        index: usize,
        start: usize,
        previous_end: usize,
    },
}

pub type Result<T> = core::result::Result<T, ParseError>;

/// Merge every session's raw events into Level-1 actions.
pub fn parse_level_1(sessions: &SessionLogs, config: &MergeConfig) -> Result<ActionsBySession> {
    let analyzer = MergeAnalyzer::new(config);
    sessions
        .iter()
        .map(|(session, events)| {
            let (actions, _) =
                analyzer
                    .parse(events)
                    .map_err(|source| ParseError::NonChronological {
                        session: session.clone(),
                        source,
                    })?;
            debug!(%session, events = events.len(), actions = actions.len(), "level 1");
            Ok((session.clone(), actions))
        })
        .collect()
}

/// Attach Level-2 scores and labels to every session's actions.
pub fn parse_level_2(
    sessions: &ActionsBySession,
    oracle: &dyn Similarity,
    config: &Level2Config,
) -> Result<ActionsBySession> {
    sessions
        .iter()
        .map(|(session, actions)| {
            check_actions(session, actions)?;
            let upgraded = level2::upgrade_session(actions, oracle, config);
            debug!(%session, actions = upgraded.len(), "level 2");
            Ok((session.clone(), upgraded))
        })
        .collect()
}

/// Attach Level-3 scores and labels to every session's actions.
pub fn parse_level_3(
    sessions: &ActionsBySession,
    oracle: &dyn Similarity,
    config: &Level3Config,
) -> Result<ActionsBySession> {
    sessions
        .iter()
        .map(|(session, actions)| {
            check_actions(session, actions)?;
            let upgraded = level3::upgrade_session(actions, oracle, config);
            debug!(%session, actions = upgraded.len(), "level 3");
            Ok((session.clone(), upgraded))
        })
        .collect()
}

/// Reject actions that reference no raw events, or whose event ranges
/// overlap or run backwards.
fn check_actions(session: &str, actions: &[Action]) -> Result<()> {
    let mut previous_end = 0;
    for (index, action) in actions.iter().enumerate() {
        let range = action.event_range;
        if range.is_empty() {
            return Err(ParseError::EmptyAction {
                session: session.to_string(),
                index,
            });
        }
        if range.start < previous_end {
            return Err(ParseError::OverlappingAction {
                session: session.to_string(),
                index,
                start: range.start,
                previous_end,
            });
        }
        previous_end = range.end;
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;

    use crate::model::{EventRange, Level1Kind};
    use crate::similarity::Jaccard;

    use fixtures::{LogBuilder, action, sequence};

    fn level_2_config() -> Level2Config {
        Level2Config {
            disjoint_below: 0.2,
            near_duplicate_at: 0.9,
        }
    }

    fn level_3_config() -> Level3Config {
        Level3Config {
            window: 5,
            mindless_window: 2,
            topic_shift_below: 0.1,
            echo_above: 0.8,
            mindless_above: 0.9,
        }
    }

    #[test]
    fn empty_input_yields_empty_output_at_every_level() {
        let level_1 = parse_level_1(&BTreeMap::new(), &MergeConfig::default()).unwrap();
        assert!(level_1.is_empty());

        let level_2 = parse_level_2(&level_1, &Jaccard, &level_2_config()).unwrap();
        assert!(level_2.is_empty());

        let level_3 = parse_level_3(&level_2, &Jaccard, &level_3_config()).unwrap();
        assert!(level_3.is_empty());
    }

    #[test]
    fn level_3_keeps_sessions_and_counts() {
        let mut logs = BTreeMap::new();
        logs.insert("a".to_string(), LogBuilder::new().type_text("hi").build());
        logs.insert("b".to_string(), Vec::new());
        let level_1 = parse_level_1(&logs, &MergeConfig::default()).unwrap();
        let level_2 = parse_level_2(&level_1, &Jaccard, &level_2_config()).unwrap();

        let level_3 = parse_level_3(&level_2, &Jaccard, &level_3_config()).unwrap();

        assert_eq!(level_3.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(level_3["a"].len(), 1);
        assert!(level_3["b"].is_empty());
    }

    #[test]
    fn sessions_are_parsed_independently() {
        let mut logs = BTreeMap::new();
        logs.insert("a".to_string(), LogBuilder::new().type_text("hi").build());
        logs.insert("b".to_string(), Vec::new());

        let actions = parse_level_1(&logs, &MergeConfig::default()).unwrap();

        assert_eq!(actions["a"].len(), 1);
        assert_eq!(actions["a"][0].level_1_action_type, Level1Kind::Insertion);
        assert!(actions["b"].is_empty());
    }

    #[test]
    fn out_of_order_session_is_reported_by_id() {
        let mut events = LogBuilder::new().type_text("ab").build();
        events[1].event_timestamp = 0;
        let mut logs = BTreeMap::new();
        logs.insert("broken".to_string(), events);

        let err = parse_level_1(&logs, &MergeConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ParseError::NonChronological { ref session, .. } if session == "broken"
        ));
    }

    #[test]
    fn action_without_events_is_rejected() {
        let mut broken = action(Level1Kind::Insertion, "x", "x");
        broken.event_range = EventRange { start: 3, end: 3 };
        let mut sessions = BTreeMap::new();
        sessions.insert("s".to_string(), vec![broken]);

        let err = parse_level_2(&sessions, &Jaccard, &level_2_config()).unwrap_err();
        assert!(matches!(err, ParseError::EmptyAction { index: 0, .. }));

        let err = parse_level_3(&sessions, &Jaccard, &level_3_config()).unwrap_err();
        assert!(matches!(err, ParseError::EmptyAction { index: 0, .. }));
    }

    #[test]
    fn overlapping_or_backward_ranges_are_rejected() {
        let mut overlapping = sequence(vec![
            action(Level1Kind::Insertion, "a", "a"),
            action(Level1Kind::Insertion, "ab", "b"),
        ]);
        overlapping[1].event_range = EventRange { start: 0, end: 2 };
        let sessions = BTreeMap::from([("s".to_string(), overlapping)]);

        let err = parse_level_2(&sessions, &Jaccard, &level_2_config()).unwrap_err();
        assert!(matches!(
            err,
            ParseError::OverlappingAction { index: 1, start: 0, previous_end: 1, .. }
        ));

        let backward: Vec<Action> = sequence(vec![
            action(Level1Kind::Insertion, "a", "a"),
            action(Level1Kind::Insertion, "ab", "b"),
        ])
        .into_iter()
        .rev()
        .collect();
        let sessions = BTreeMap::from([("s".to_string(), backward)]);

        let err = parse_level_3(&sessions, &Jaccard, &level_3_config()).unwrap_err();
        assert!(matches!(err, ParseError::OverlappingAction { index: 1, .. }));
    }

    #[test]
    fn consecutive_ranges_with_gaps_are_accepted() {
        let mut actions = sequence(vec![
            action(Level1Kind::Insertion, "a", "a"),
            action(Level1Kind::Insertion, "ab", "b"),
        ]);
        actions[1].event_range = EventRange { start: 4, end: 6 };
        let sessions = BTreeMap::from([("s".to_string(), actions)]);

        assert_eq!(parse_level_3(&sessions, &Jaccard, &level_3_config()).unwrap()["s"].len(), 2);
    }
}
