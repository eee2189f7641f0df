//! Level-3 upgrade: interpretive labels over a look-back window.
//!
//! Three checks run against prior actions in the same session:
//!
//! - topic shift: the sentence an action leaves behind has little in
//!   common with the resulting text of the last `window` actions (the
//!   whole sentence is scored, so completing one keeps its earlier words);
//! - echo: new text that closely matches text the other actor introduced
//!   within the last `window` actions, suggestions shown included;
//! - mindless edit: text that closely matches the same actor's own
//!   inserted or deleted text within the last `mindless-window` actions.
//!
//! All scores that can be computed are recorded. At most one label is
//! assigned, checked in that order. A score equal to its threshold does
//! not trigger the label.

use std::collections::BTreeSet;

use crate::config::Level3Config;
use crate::model::{Action, EventSource, Level3Kind};
use crate::similarity::{self, Similarity};

/// Annotate one session's actions. Count and order are preserved.
pub(super) fn upgrade_session(
    actions: &[Action],
    oracle: &dyn Similarity,
    config: &Level3Config,
) -> Vec<Action> {
    actions
        .iter()
        .enumerate()
        .map(|(i, action)| {
            let history = &actions[..i];
            let recent = tail(history, config.window);
            let very_recent = tail(history, config.mindless_window);

            let topic = topic_similarity(action, recent, oracle);
            let echo = echo_similarity(action, recent, oracle);
            let repeat = repeat_similarity(action, very_recent, oracle);

            let label = if topic.is_some_and(|s| s < config.topic_shift_below) {
                Some(Level3Kind::TopicShift)
            } else if echo.is_some_and(|s| s > config.echo_above) {
                Some(Level3Kind::Echo)
            } else if repeat.is_some_and(|s| s > config.mindless_above) {
                Some(Level3Kind::MindlessEdit)
            } else {
                None
            };

            let mut upgraded = action.clone();
            upgraded.topic_similarity = topic.or(upgraded.topic_similarity);
            upgraded.echo_similarity = echo.or(upgraded.echo_similarity);
            upgraded.repeat_similarity = repeat.or(upgraded.repeat_similarity);
            if label.is_some() {
                upgraded.level_3_action_type = label;
            }
            upgraded
        })
        .collect()
}

fn tail(history: &[Action], len: usize) -> &[Action] {
    &history[history.len().saturating_sub(len)..]
}

/// Similarity of the edited sentence to what the recent window was about.
fn topic_similarity(action: &Action, recent: &[Action], oracle: &dyn Similarity) -> Option<f64> {
    if !action.adds_text() {
        return None;
    }

    let mut seen = BTreeSet::new();
    let context: Vec<String> = recent
        .iter()
        .map(Action::resulting_text)
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect();
    if context.is_empty() {
        return None;
    }

    similarity::score(oracle, &action.resulting_text(), &context.join(" "))
}

/// Best match between the new text and text from the other actor.
fn echo_similarity(action: &Action, recent: &[Action], oracle: &dyn Similarity) -> Option<f64> {
    if !action.adds_text() {
        return None;
    }
    let author = action.text_author();

    let foreign = recent.iter().flat_map(|prior| {
        let inserted = (prior.text_author() != author && prior.adds_text())
            .then(|| prior.inserted_text.trim());
        // Suggestions are always model text.
        let shown = prior
            .suggestions
            .iter()
            .filter(move |_| author != EventSource::Api)
            .map(String::as_str);
        inserted.into_iter().chain(shown)
    });

    best(foreign.map(|text| similarity::score(oracle, action.inserted_text.trim(), text)))
}

/// Best match between the action's own text and the actor's recent text.
fn repeat_similarity(
    action: &Action,
    very_recent: &[Action],
    oracle: &dyn Similarity,
) -> Option<f64> {
    let own = action.own_text();
    if own.is_empty() {
        return None;
    }
    let author = action.text_author();

    let candidates = very_recent
        .iter()
        .filter(|prior| prior.text_author() == author)
        .flat_map(|prior| [prior.inserted_text.trim(), prior.deleted_text.trim()])
        .filter(|text| !text.is_empty());

    best(candidates.map(|text| similarity::score(oracle, own, text)))
}

fn best(scores: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    scores.flatten().reduce(f64::max)
}
