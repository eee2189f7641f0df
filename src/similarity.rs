//! Similarity oracle: scores how alike two text snippets are.
//!
//! The pipeline only depends on the [`Similarity`] trait. Any
//! `Fn(&str, &str) -> Result<f64, SimilarityError>` closure is an oracle,
//! so callers can plug in an embedding model without touching the core.
//! [`Jaccard`] is a lexical stand-in used by the CLI.

use std::collections::BTreeSet;

use tracing::debug;

use crate::text;

/// Why a pair of texts could not be scored.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimilarityError {
    #[error("cannot score empty text")]
    EmptyText,

    #[error("similarity score is not finite: {0}")]
    NotFinite(f64),

    #[error("similarity model failed: {0}")]
    Model(String),
}

/// A pure, deterministic text similarity function.
pub trait Similarity {
    fn similarity(&self, a: &str, b: &str) -> Result<f64, SimilarityError>;
}

impl<F> Similarity for F
where
    F: Fn(&str, &str) -> Result<f64, SimilarityError>,
{
    fn similarity(&self, a: &str, b: &str) -> Result<f64, SimilarityError> {
        self(a, b)
    }
}

/// Score a pair, or `None` if the oracle cannot.
///
/// Non-finite scores count as failures. Failures are logged and
/// otherwise ignored: the caller leaves the dependent label unset.
pub(crate) fn score(oracle: &dyn Similarity, a: &str, b: &str) -> Option<f64> {
    let result = oracle.similarity(a, b).and_then(|s| {
        if s.is_finite() {
            Ok(s)
        } else {
            Err(SimilarityError::NotFinite(s))
        }
    });
    match result {
        Ok(s) => Some(s),
        Err(e) => {
            debug!(error = %e, "skipping comparison");
            None
        }
    }
}

/// Jaccard overlap of lowercased word sets, in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Jaccard;

impl Similarity for Jaccard {
    fn similarity(&self, a: &str, b: &str) -> Result<f64, SimilarityError> {
        let a: BTreeSet<String> = text::tokens(a).collect();
        let b: BTreeSet<String> = text::tokens(b).collect();
        if a.is_empty() || b.is_empty() {
            return Err(SimilarityError::EmptyText);
        }
        let shared = a.intersection(&b).count();
        let total = a.union(&b).count();
        Ok(shared as f64 / total as f64)
    }
}
