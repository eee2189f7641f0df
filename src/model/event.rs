//! Raw events: one logged low-level editing operation each.
//!
//! These mirror the keystroke log format and are never created or
//! mutated by the pipeline, only read.

use serde::{Deserialize, Deserializer, Serialize};

/// One atomic logged editing operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    pub event_name: EventName,

    /// Who produced the event.
    #[serde(default)]
    pub event_source: EventSource,

    /// Milliseconds since the epoch.
    pub event_timestamp: i64,

    /// Content change carried by the event, if any.
    /// The log writes `""` for events without a delta.
    #[serde(default, deserialize_with = "lenient_delta")]
    pub text_delta: Option<TextDelta>,

    /// Document text after the event.
    #[serde(default)]
    pub current_doc: String,

    /// Cursor offset (in chars) after the event.
    #[serde(default)]
    pub current_cursor: usize,

    /// Suggestions on screen when the event was logged.
    #[serde(default)]
    pub current_suggestions: Vec<Suggestion>,
}

/// The kind of a logged event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventName {
    SystemInitialize,
    TextInsert,
    TextDelete,
    CursorForward,
    CursorBackward,
    CursorSelect,
    SuggestionGet,
    SuggestionOpen,
    SuggestionReopen,
    SuggestionUp,
    SuggestionDown,
    SuggestionHover,
    SuggestionSelect,
    SuggestionClose,
    #[serde(other)]
    Other,
}

/// The actor behind an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    /// The writer.
    #[default]
    User,

    /// The suggestion model.
    Api,
}

/// A content change expressed as a sequence of retain/insert/delete ops.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextDelta {
    #[serde(default)]
    pub ops: Vec<DeltaOp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeltaOp {
    Retain { retain: usize },
    Insert { insert: String },
    Delete { delete: usize },
}

/// A suggestion shown to the writer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(default)]
    pub original: String,

    #[serde(default)]
    pub trimmed: String,

    #[serde(default)]
    pub probability: Option<f64>,
}

impl Suggestion {
    /// The displayed text: trimmed when available, otherwise the original.
    pub fn text(&self) -> &str {
        if self.trimmed.trim().is_empty() {
            self.original.trim()
        } else {
            self.trimmed.trim()
        }
    }
}

fn lenient_delta<'de, D>(deserializer: D) -> Result<Option<TextDelta>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    })
}
