//! Action types: classified units of writer behavior.
//!
//! An action is created by the Level-1 merge analyzer and enriched in
//! place by the later stages. Fields only accumulate; the single
//! exception is `action_type`, which priority resolution overwrites.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::text;

use super::EventSource;

/// A classified, possibly multi-event, unit of writer behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// The resolved label. Starts as the Level-1 label.
    pub action_type: String,

    pub level_1_action_type: Level1Kind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_2_action_type: Option<Level2Kind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_3_action_type: Option<Level3Kind>,

    /// Contributing raw events, as indices into the session log.
    pub event_range: EventRange,

    /// Timestamp of the first contributing event.
    pub action_start: i64,

    /// Timestamp of the last contributing event.
    pub action_end: i64,

    pub event_source: EventSource,

    /// Document before the first contributing event.
    pub start_doc: String,

    /// Document after the last contributing event.
    pub end_doc: String,

    pub start_cursor: usize,
    pub end_cursor: usize,

    /// Char offset of the first content edit, or the start cursor
    /// when the action edits nothing.
    pub edit_position: usize,

    /// Sentence the action started in.
    pub sentence_index: usize,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub inserted_text: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub deleted_text: String,

    /// Suggestion texts shown while the action was in progress.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,

    // ── Level 2 ──
    /// Similarity of the resulting text to the predecessor's resulting text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordination_score: Option<f64>,

    /// One minus the similarity of the edited sentence before and after.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_difference: Option<f64>,

    // ── Level 3 ──
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_similarity: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub echo_similarity: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_similarity: Option<f64>,
}

impl Action {
    /// The sentence around the cursor once the action is done.
    pub fn resulting_text(&self) -> String {
        text::sentence_at(&self.end_doc, self.end_cursor)
    }

    /// The edited sentence as it read before the action.
    pub fn sentence_before(&self) -> String {
        text::sentence_at(&self.start_doc, self.edit_position)
    }

    /// The edited sentence as it reads after the action.
    pub fn sentence_after(&self) -> String {
        text::sentence_at(&self.end_doc, self.edit_position)
    }

    /// Whether the action put new text into the document.
    pub fn adds_text(&self) -> bool {
        !self.inserted_text.trim().is_empty()
    }

    /// The text the action touched: inserted text, else deleted text.
    pub fn own_text(&self) -> &str {
        if self.adds_text() {
            self.inserted_text.trim()
        } else {
            self.deleted_text.trim()
        }
    }

    /// Who wrote the text this action inserted.
    ///
    /// Accepted suggestions carry model text even when the writer
    /// started the flow.
    pub fn text_author(&self) -> EventSource {
        if self.level_1_action_type == Level1Kind::SuggestionAccept {
            EventSource::Api
        } else {
            self.event_source
        }
    }

    /// Labels present at each level, in level order.
    pub fn labels(&self) -> impl Iterator<Item = &'static str> {
        [
            Some(self.level_1_action_type.as_str()),
            self.level_2_action_type.map(Level2Kind::as_str),
            self.level_3_action_type.map(Level3Kind::as_str),
        ]
        .into_iter()
        .flatten()
    }

    /// Whether `label` is one of this action's level labels.
    pub fn has_label(&self, label: &str) -> bool {
        self.labels().any(|l| l == label)
    }
}

/// Half-open range of event indices `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRange {
    pub start: usize,
    pub end: usize,
}

impl EventRange {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Coarse label assigned when an action is formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Level1Kind {
    Insertion,
    Deletion,
    Paste,
    SuggestionRequest,
    SuggestionAccept,
    SuggestionDismiss,
    CursorMove,
    Other,
}

impl Level1Kind {
    pub const ALL: [Self; 8] = [
        Self::Insertion,
        Self::Deletion,
        Self::Paste,
        Self::SuggestionRequest,
        Self::SuggestionAccept,
        Self::SuggestionDismiss,
        Self::CursorMove,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Insertion => "insertion",
            Self::Deletion => "deletion",
            Self::Paste => "paste",
            Self::SuggestionRequest => "suggestion-request",
            Self::SuggestionAccept => "suggestion-accept",
            Self::SuggestionDismiss => "suggestion-dismiss",
            Self::CursorMove => "cursor-move",
            Self::Other => "other",
        }
    }

    /// Rank used to pick the label of a mixed merge window.
    pub(crate) fn dominance(self) -> u8 {
        match self {
            Self::SuggestionAccept => 3,
            Self::SuggestionDismiss => 2,
            Self::SuggestionRequest => 1,
            _ => 0,
        }
    }

    /// Suggestion-family kinds can continue an open suggestion flow.
    pub(crate) fn is_suggestion(self) -> bool {
        matches!(
            self,
            Self::SuggestionRequest | Self::SuggestionAccept | Self::SuggestionDismiss
        )
    }
}

impl fmt::Display for Level1Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mid-level label: how much the action moved away from its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level2Kind {
    #[serde(rename = "disjoint edit")]
    DisjointEdit,

    #[serde(rename = "semantic edit")]
    SemanticEdit,

    #[serde(rename = "near-duplicate")]
    NearDuplicate,
}

impl Level2Kind {
    pub const ALL: [Self; 3] = [Self::DisjointEdit, Self::SemanticEdit, Self::NearDuplicate];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DisjointEdit => "disjoint edit",
            Self::SemanticEdit => "semantic edit",
            Self::NearDuplicate => "near-duplicate",
        }
    }
}

impl fmt::Display for Level2Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// High-level interpretive label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Level3Kind {
    /// The action moves away from the subject of the recent window.
    TopicShift,

    /// The action repeats wording introduced by the other actor.
    Echo,

    /// The action undoes or repeats the writer's own very recent content.
    MindlessEdit,
}

impl Level3Kind {
    pub const ALL: [Self; 3] = [Self::TopicShift, Self::Echo, Self::MindlessEdit];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopicShift => "topic-shift",
            Self::Echo => "echo",
            Self::MindlessEdit => "mindless-edit",
        }
    }
}

impl fmt::Display for Level3Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_action() -> Action {
        Action {
            action_type: "insertion".into(),
            level_1_action_type: Level1Kind::Insertion,
            level_2_action_type: None,
            level_3_action_type: None,
            event_range: EventRange { start: 0, end: 2 },
            action_start: 1_000,
            action_end: 1_200,
            event_source: EventSource::User,
            start_doc: "The cat".into(),
            end_doc: "The cat sat".into(),
            start_cursor: 7,
            end_cursor: 11,
            edit_position: 7,
            sentence_index: 0,
            inserted_text: " sat".into(),
            deleted_text: String::new(),
            suggestions: vec![],
            coordination_score: None,
            semantic_difference: None,
            topic_similarity: None,
            echo_similarity: None,
            repeat_similarity: None,
        }
    }

    #[test]
    fn serde_labels_match_as_str() {
        for kind in Level1Kind::ALL {
            assert_eq!(
                serde_json::to_value(kind).unwrap(),
                serde_json::json!(kind.as_str())
            );
        }
        for kind in Level2Kind::ALL {
            assert_eq!(
                serde_json::to_value(kind).unwrap(),
                serde_json::json!(kind.as_str())
            );
        }
        for kind in Level3Kind::ALL {
            assert_eq!(
                serde_json::to_value(kind).unwrap(),
                serde_json::json!(kind.as_str())
            );
        }
    }

    #[test]
    fn absent_levels_are_omitted_from_json() {
        let json = serde_json::to_value(sample_action()).unwrap();
        let obj = json.as_object().unwrap();

        assert!(!obj.contains_key("level_2_action_type"));
        assert!(!obj.contains_key("level_3_action_type"));
        assert!(!obj.contains_key("deleted_text"));
        assert_eq!(obj["level_1_action_type"], "insertion");
    }

    #[test]
    fn labels_lists_present_levels_only() {
        let mut action = sample_action();
        assert_eq!(action.labels().collect::<Vec<_>>(), vec!["insertion"]);

        action.level_3_action_type = Some(Level3Kind::Echo);
        assert_eq!(
            action.labels().collect::<Vec<_>>(),
            vec!["insertion", "echo"]
        );
        assert!(action.has_label("echo"));
        assert!(!action.has_label("topic-shift"));
    }

    #[test]
    fn own_text_falls_back_to_deleted() {
        let mut action = sample_action();
        assert_eq!(action.own_text(), "sat");

        action.inserted_text = String::new();
        action.deleted_text = "cat ".into();
        assert!(!action.adds_text());
        assert_eq!(action.own_text(), "cat");
    }

    #[test]
    fn resulting_text_is_sentence_at_end_cursor() {
        let mut action = sample_action();
        action.end_doc = "First one. The cat sat".into();
        action.end_cursor = 22;
        assert_eq!(action.resulting_text(), "The cat sat");
    }
}
