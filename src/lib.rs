//! Quill: layered action parsing for human–model co-writing logs.
//!
//! Raw keystroke events are merged into Level-1 actions, annotated with
//! Level-2 and Level-3 labels by a pluggable similarity oracle, and each
//! action finally gets one `action_type` picked by plugin priority.

pub mod config;
pub mod model;
pub mod parse;
pub mod pipeline;
pub mod plugin;
pub mod priority;
pub mod similarity;
pub mod storage;
pub mod text;
