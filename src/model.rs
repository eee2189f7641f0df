//! Core data model for Quill.
//!
//! Raw events come in, actions come out. Everything is keyed by
//! session id; sessions never share state.

mod action;
mod event;

use std::collections::BTreeMap;

pub use action::{Action, EventRange, Level1Kind, Level2Kind, Level3Kind};
pub use event::{DeltaOp, EventName, EventSource, RawEvent, Suggestion, TextDelta};

/// Raw event logs, keyed by session id.
pub type SessionLogs = BTreeMap<String, Vec<RawEvent>>;

/// Ordered actions, keyed by session id.
pub type ActionsBySession = BTreeMap<String, Vec<Action>>;
