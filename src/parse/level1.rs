//! Level-1 merge analyzer: raw events into coarse actions.
//!
//! The analyzer folds a session's events through a single carried
//! [`MergeState`]. Each event either continues the action in progress or
//! flushes it and opens a new one:
//!
//! - suggestion events keep merging into an open suggestion flow until
//!   the suggestion box closes;
//! - text edits merge while the kind, the actor and the sentence stay the
//!   same;
//! - a deletion that eats through the text of the previous action and
//!   into older content breaks off;
//! - cursor moves merge with cursor moves, other events with other events;
//! - an optional pause limit splits everything.
//!
//! Whatever is still in progress when the events run out is flushed.

use tracing::trace;

use crate::config::MergeConfig;
use crate::model::{Action, EventName, EventRange, EventSource, Level1Kind, RawEvent};
use crate::text::{self, Edit};

/// An event's timestamp went backwards.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("event {index} at {timestamp} precedes the previous event at {previous}")]
pub struct OutOfOrder {
    pub index: usize,
    pub timestamp: i64,
    pub previous: i64,
}

/// Char range of text in the current document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    fn contains(self, pos: usize) -> bool {
        pos >= self.start && pos < self.end
    }

    /// The span after `len` chars at `pos` were removed from the document.
    fn after_delete(self, pos: usize, len: usize) -> Self {
        let removed_end = pos + len;
        let before = removed_end.min(self.start).saturating_sub(pos);
        let inside = removed_end
            .min(self.end)
            .saturating_sub(pos.max(self.start));
        Self {
            start: self.start - before,
            end: self.end - before - inside,
        }
    }

    /// Grow to cover `len` chars inserted at `pos`.
    fn after_insert(self, pos: usize, len: usize) -> Self {
        if pos < self.start {
            Self {
                start: pos,
                end: self.end + len,
            }
        } else if pos <= self.end {
            Self {
                start: self.start,
                end: self.end + len,
            }
        } else {
            Self {
                start: self.start,
                end: pos + len,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Not a suggestion flow.
    None,
    Open,
    Closed,
}

/// The action currently being merged.
#[derive(Debug, Clone)]
struct Pending {
    kind: Level1Kind,
    flow: Flow,
    range: EventRange,
    action_start: i64,
    action_end: i64,
    source: EventSource,
    start_doc: String,
    end_doc: String,
    start_cursor: usize,
    end_cursor: usize,
    edit_position: Option<usize>,
    last_edit_position: Option<usize>,
    sentence_index: usize,
    inserted: String,
    deleted: String,
    suggestions: Vec<String>,
    /// Text this action inserted, in document coordinates.
    span: Option<Span>,
    /// Deletion that started inside the previous action's text.
    within_last_span: bool,
}

impl Pending {
    fn open(
        index: usize,
        event: &RawEvent,
        kind: Level1Kind,
        sentence_index: usize,
        state: &MergeState,
        edit: &Edit,
    ) -> Self {
        let within_last_span = kind == Level1Kind::Deletion
            && match (state.last_span, edit.position) {
                (Some(span), Some(pos)) => span.contains(pos),
                _ => false,
            };
        Self {
            kind,
            flow: if kind == Level1Kind::SuggestionRequest {
                Flow::Open
            } else {
                Flow::None
            },
            range: EventRange {
                start: index,
                end: index,
            },
            action_start: event.event_timestamp,
            action_end: event.event_timestamp,
            source: event.event_source,
            start_doc: state.doc.clone(),
            end_doc: state.doc.clone(),
            start_cursor: state.cursor,
            end_cursor: state.cursor,
            edit_position: None,
            last_edit_position: None,
            sentence_index,
            inserted: String::new(),
            deleted: String::new(),
            suggestions: Vec::new(),
            span: None,
            within_last_span,
        }
    }

    fn absorb(&mut self, index: usize, event: &RawEvent, kind: Level1Kind, edit: &Edit) {
        self.range.end = index + 1;
        self.action_end = event.event_timestamp;
        self.end_doc.clone_from(&event.current_doc);
        self.end_cursor = event.current_cursor;

        if kind.dominance() > self.kind.dominance() {
            self.kind = kind;
        }
        if self.flow == Flow::Open && event.event_name == EventName::SuggestionClose {
            self.flow = Flow::Closed;
        }

        if let Some(pos) = edit.position {
            self.edit_position.get_or_insert(pos);

            if !edit.inserted.is_empty() {
                self.inserted.push_str(&edit.inserted);
                let len = edit.inserted.chars().count();
                self.span = Some(match self.span {
                    Some(span) => span.after_insert(pos, len),
                    None => Span {
                        start: pos,
                        end: pos + len,
                    },
                });
            }

            if !edit.deleted.is_empty() {
                // Backspacing walks left: earlier text goes in front.
                match self.last_edit_position {
                    Some(last) if pos < last => self.deleted.insert_str(0, &edit.deleted),
                    _ => self.deleted.push_str(&edit.deleted),
                }
            }

            self.last_edit_position = Some(pos);
        }

        for suggestion in &event.current_suggestions {
            let text = suggestion.text();
            if !text.is_empty() && !self.suggestions.iter().any(|s| s == text) {
                self.suggestions.push(text.to_string());
            }
        }
    }

    fn into_action(self) -> Action {
        Action {
            action_type: self.kind.as_str().to_string(),
            level_1_action_type: self.kind,
            level_2_action_type: None,
            level_3_action_type: None,
            event_range: self.range,
            action_start: self.action_start,
            action_end: self.action_end,
            event_source: self.source,
            start_doc: self.start_doc,
            end_doc: self.end_doc,
            start_cursor: self.start_cursor,
            end_cursor: self.end_cursor,
            edit_position: self.edit_position.unwrap_or(self.start_cursor),
            sentence_index: self.sentence_index,
            inserted_text: self.inserted,
            deleted_text: self.deleted,
            suggestions: self.suggestions,
            coordination_score: None,
            semantic_difference: None,
            topic_similarity: None,
            echo_similarity: None,
            repeat_similarity: None,
        }
    }
}

/// State carried from one event to the next within a session.
#[derive(Debug, Clone, Default)]
pub struct MergeState {
    pending: Option<Pending>,
    /// Text inserted by the most recently emitted text-producing action.
    last_span: Option<Span>,
    last_timestamp: Option<i64>,
    /// Document after the last processed event.
    doc: String,
    cursor: usize,
}

impl MergeState {
    /// Whether an action is still being merged.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Document after the last processed event.
    pub fn document(&self) -> &str {
        &self.doc
    }

    fn flush(&mut self, actions: &mut Vec<Action>) {
        if let Some(done) = self.pending.take() {
            if !done.inserted.is_empty() {
                self.last_span = done.span;
            }
            trace!(kind = %done.kind, events = done.range.len(), "flushing action");
            actions.push(done.into_action());
        }
    }
}

/// Collapses one session's raw events into coarse actions.
#[derive(Debug, Clone, Copy)]
pub struct MergeAnalyzer<'a> {
    config: &'a MergeConfig,
}

impl<'a> MergeAnalyzer<'a> {
    pub fn new(config: &'a MergeConfig) -> Self {
        Self { config }
    }

    /// Parse a session's events into actions.
    ///
    /// Returns the actions and the final merge state. The state never
    /// holds a pending action: the last one is flushed.
    pub fn parse(&self, events: &[RawEvent]) -> Result<(Vec<Action>, MergeState), OutOfOrder> {
        let mut actions = Vec::new();
        let mut state = events
            .iter()
            .enumerate()
            .try_fold(MergeState::default(), |state, (index, event)| {
                self.step(state, &mut actions, index, event)
            })?;
        state.flush(&mut actions);
        Ok((actions, state))
    }

    fn step(
        &self,
        mut state: MergeState,
        actions: &mut Vec<Action>,
        index: usize,
        event: &RawEvent,
    ) -> Result<MergeState, OutOfOrder> {
        if let Some(previous) = state.last_timestamp
            && event.event_timestamp < previous
        {
            return Err(OutOfOrder {
                index,
                timestamp: event.event_timestamp,
                previous,
            });
        }

        let edit = event
            .text_delta
            .as_ref()
            .map(|delta| text::apply_delta(&state.doc, delta))
            .unwrap_or_default();
        let kind = classify(event, &edit);
        let sentence = text::sentence_index(
            &event.current_doc,
            edit.position.unwrap_or(event.current_cursor),
        );

        let continues = state
            .pending
            .as_ref()
            .is_some_and(|p| self.continues(p, state.last_span, event, kind, sentence, &edit));
        if !continues {
            state.flush(actions);
            state.pending = Some(Pending::open(index, event, kind, sentence, &state, &edit));
        }
        if let Some(pending) = state.pending.as_mut() {
            pending.absorb(index, event, kind, &edit);
        }

        if let (Some(span), Some(pos)) = (state.last_span, edit.position)
            && !edit.deleted.is_empty()
        {
            state.last_span = Some(span.after_delete(pos, edit.deleted.chars().count()));
        }
        state.doc.clone_from(&event.current_doc);
        state.cursor = event.current_cursor;
        state.last_timestamp = Some(event.event_timestamp);
        Ok(state)
    }

    fn continues(
        &self,
        pending: &Pending,
        last_span: Option<Span>,
        event: &RawEvent,
        kind: Level1Kind,
        sentence: usize,
        edit: &Edit,
    ) -> bool {
        if let Some(max) = self.config.max_pause_ms
            && event.event_timestamp.saturating_sub(pending.action_end) > max
        {
            return false;
        }

        match pending.flow {
            Flow::Open => return kind.is_suggestion(),
            Flow::Closed => return false,
            Flow::None => {}
        }

        if kind != pending.kind || event.event_source != pending.source {
            return false;
        }
        if edit.is_empty() {
            return true;
        }
        if sentence != pending.sentence_index {
            return false;
        }

        let leaves_last_span = pending.within_last_span
            && matches!(
                (last_span, edit.position),
                (Some(span), Some(pos)) if pos < span.start
            );
        !leaves_last_span
    }
}

/// The Level-1 kind of a single event.
fn classify(event: &RawEvent, edit: &Edit) -> Level1Kind {
    match event.event_name {
        EventName::TextInsert => match event.event_source {
            EventSource::Api => Level1Kind::SuggestionAccept,
            EventSource::User if edit.inserted.chars().count() > 1 => Level1Kind::Paste,
            EventSource::User => Level1Kind::Insertion,
        },
        EventName::TextDelete => Level1Kind::Deletion,
        EventName::SuggestionGet
        | EventName::SuggestionOpen
        | EventName::SuggestionReopen
        | EventName::SuggestionUp
        | EventName::SuggestionDown
        | EventName::SuggestionHover => Level1Kind::SuggestionRequest,
        EventName::SuggestionSelect => Level1Kind::SuggestionAccept,
        EventName::SuggestionClose => Level1Kind::SuggestionDismiss,
        EventName::CursorForward | EventName::CursorBackward | EventName::CursorSelect => {
            Level1Kind::CursorMove
        }
        EventName::SystemInitialize | EventName::Other => Level1Kind::Other,
    }
}
