//! Text helpers: sentence segmentation and delta application.
//!
//! All offsets are char offsets, matching the keystroke log.

use crate::model::{DeltaOp, TextDelta};

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '\n')
}

/// Char offsets where each sentence starts. Always begins with 0.
///
/// A run of terminators (`"?!"`, `"..."`) ends a single sentence.
fn sentence_starts(chars: &[char]) -> Vec<usize> {
    let mut starts = vec![0];
    for (i, &c) in chars.iter().enumerate() {
        let run_ends = chars.get(i + 1).is_none_or(|&next| !is_terminator(next));
        if is_terminator(c) && run_ends {
            starts.push(i + 1);
        }
    }
    starts
}

/// Index of the sentence containing char offset `pos`.
///
/// Offsets past the end of the document count as the end.
pub fn sentence_index(doc: &str, pos: usize) -> usize {
    let chars: Vec<char> = doc.chars().collect();
    let pos = pos.min(chars.len());
    sentence_starts(&chars)
        .iter()
        .filter(|&&start| start <= pos)
        .count()
        - 1
}

/// The trimmed sentence containing char offset `pos`.
///
/// When the cursor sits just past a terminator with nothing typed yet,
/// the sentence it closed is returned instead of an empty one.
pub fn sentence_at(doc: &str, pos: usize) -> String {
    let chars: Vec<char> = doc.chars().collect();
    let starts = sentence_starts(&chars);
    let slice = |idx: usize| -> String {
        let start = starts[idx];
        let end = starts.get(idx + 1).copied().unwrap_or(chars.len());
        chars[start..end].iter().collect::<String>().trim().to_string()
    };

    let idx = sentence_index(doc, pos);
    let sentence = slice(idx);
    if sentence.is_empty() && idx > 0 {
        slice(idx - 1)
    } else {
        sentence
    }
}

/// What a delta did to a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Edit {
    /// Char offset of the first insert or delete op.
    pub position: Option<usize>,
    pub inserted: String,
    pub deleted: String,
}

impl Edit {
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.deleted.is_empty()
    }
}

/// Apply `delta` to `before` and report what was inserted and deleted.
///
/// Ops reaching past the end of `before` are clamped.
pub fn apply_delta(before: &str, delta: &TextDelta) -> Edit {
    let chars: Vec<char> = before.chars().collect();
    let mut edit = Edit::default();
    let mut pos: usize = 0;

    for op in &delta.ops {
        match op {
            DeltaOp::Retain { retain } => pos = pos.saturating_add(*retain).min(chars.len()),
            DeltaOp::Insert { insert } => {
                edit.position.get_or_insert(pos);
                edit.inserted.push_str(insert);
            }
            DeltaOp::Delete { delete } => {
                edit.position.get_or_insert(pos);
                let end = pos.saturating_add(*delete).min(chars.len());
                edit.deleted.extend(&chars[pos..end]);
                pos = end;
            }
        }
    }

    edit
}

/// Lowercased alphanumeric tokens.
pub fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}
