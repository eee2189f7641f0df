//! Level-2 upgrade: how far each action moves from its predecessor.
//!
//! The resulting text of every action is scored against the resulting
//! text of the action before it. The score picks the label:
//! strictly below `disjoint-below` is a disjoint edit, at or above
//! `near-duplicate-at` is a near-duplicate, anything between is a
//! semantic edit. A score sitting on a threshold takes the label with
//! less semantic change.

use crate::config::Level2Config;
use crate::model::{Action, Level2Kind};
use crate::similarity::{self, Similarity};

/// Annotate one session's actions. Count and order are preserved.
pub(super) fn upgrade_session(
    actions: &[Action],
    oracle: &dyn Similarity,
    config: &Level2Config,
) -> Vec<Action> {
    actions
        .iter()
        .enumerate()
        .map(|(i, action)| {
            let mut upgraded = action.clone();

            if let Some(sim) =
                similarity::score(oracle, &action.sentence_before(), &action.sentence_after())
            {
                upgraded.semantic_difference = Some(1.0 - sim);
            }

            let predecessor = i.checked_sub(1).map(|j| &actions[j]);
            if let Some(previous) = predecessor
                && let Some(score) = similarity::score(
                    oracle,
                    &action.resulting_text(),
                    &previous.resulting_text(),
                )
            {
                upgraded.coordination_score = Some(score);
                upgraded.level_2_action_type = Some(classify(score, config));
            }

            upgraded
        })
        .collect()
}

fn classify(score: f64, config: &Level2Config) -> Level2Kind {
    if score < config.disjoint_below {
        Level2Kind::DisjointEdit
    } else if score >= config.near_duplicate_at {
        Level2Kind::NearDuplicate
    } else {
        Level2Kind::SemanticEdit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::Level1Kind;
    use crate::parse::fixtures::{action, sequence};
    use crate::similarity::{Jaccard, SimilarityError};

    fn config() -> Level2Config {
        Level2Config {
            disjoint_below: 0.2,
            near_duplicate_at: 0.9,
        }
    }

    /// Scores every non-empty pair the same.
    fn constant(score: f64) -> impl Fn(&str, &str) -> Result<f64, SimilarityError> {
        move |a: &str, b: &str| {
            if a.trim().is_empty() || b.trim().is_empty() {
                Err(SimilarityError::EmptyText)
            } else {
                Ok(score)
            }
        }
    }

    fn two_actions() -> Vec<Action> {
        sequence(vec![
            action(Level1Kind::Insertion, "The cat sat.", "The cat sat."),
            action(Level1Kind::Insertion, "The cat sat. It purred.", " It purred."),
        ])
    }

    #[test]
    fn first_action_has_no_label() {
        let upgraded = upgrade_session(&two_actions(), &constant(0.5), &config());

        assert_eq!(upgraded[0].level_2_action_type, None);
        assert_eq!(upgraded[0].coordination_score, None);
        assert_eq!(upgraded[1].level_2_action_type, Some(Level2Kind::SemanticEdit));
        assert_eq!(upgraded[1].coordination_score, Some(0.5));
    }

    #[test]
    fn scores_map_to_labels_with_ties_toward_less_change() {
        let cases = [
            (0.1, Level2Kind::DisjointEdit),
            (0.2, Level2Kind::SemanticEdit),
            (0.5, Level2Kind::SemanticEdit),
            (0.9, Level2Kind::NearDuplicate),
            (1.0, Level2Kind::NearDuplicate),
        ];
        for (score, expected) in cases {
            assert_eq!(classify(score, &config()), expected, "score {score}");
        }
    }

    #[test]
    fn compares_resulting_sentences_with_real_oracle() {
        let upgraded = upgrade_session(&two_actions(), &Jaccard, &config());

        // "It purred." vs "The cat sat.": nothing shared.
        assert_eq!(upgraded[1].coordination_score, Some(0.0));
        assert_eq!(upgraded[1].level_2_action_type, Some(Level2Kind::DisjointEdit));
    }

    #[test]
    fn semantic_difference_measures_edited_sentence() {
        let mut actions = two_actions();
        actions[1] = action(Level1Kind::Insertion, "The cat sat down", " down");
        actions[1].start_doc = "The cat sat".into();
        let upgraded = upgrade_session(&actions, &Jaccard, &config());

        // {the, cat, sat} vs {the, cat, sat, down}.
        assert_eq!(upgraded[1].semantic_difference, Some(0.25));
    }

    #[test]
    fn oracle_failure_leaves_label_unset() {
        let mut actions = two_actions();
        actions.push(action(Level1Kind::CursorMove, "", ""));
        actions.push(action(Level1Kind::Insertion, "Fresh start", "Fresh start"));
        let actions = sequence(actions);

        let upgraded = upgrade_session(&actions, &constant(0.95), &config());

        assert_eq!(upgraded[1].level_2_action_type, Some(Level2Kind::NearDuplicate));
        // Empty resulting text cannot be scored, on either side.
        assert_eq!(upgraded[2].level_2_action_type, None);
        assert_eq!(upgraded[3].level_2_action_type, None);
    }

    #[test]
    fn preserves_count_order_and_level_1() {
        let actions = two_actions();
        let upgraded = upgrade_session(&actions, &Jaccard, &config());

        assert_eq!(upgraded.len(), actions.len());
        for (before, after) in actions.iter().zip(&upgraded) {
            assert_eq!(before.event_range, after.event_range);
            assert_eq!(before.level_1_action_type, after.level_1_action_type);
            assert_eq!(before.action_type, after.action_type);
        }
    }

    #[test]
    fn rerunning_is_idempotent() {
        let once = upgrade_session(&two_actions(), &Jaccard, &config());
        let twice = upgrade_session(&once, &Jaccard, &config());

        assert_eq!(once, twice);
    }

    #[test]
    fn existing_label_survives_failed_rescoring() {
        let once = upgrade_session(&two_actions(), &constant(0.5), &config());
        let failing = |_: &str, _: &str| -> Result<f64, SimilarityError> {
            Err(SimilarityError::Model("offline".into()))
        };
        let again = upgrade_session(&once, &failing, &config());

        assert_eq!(again[1].level_2_action_type, Some(Level2Kind::SemanticEdit));
    }
}
