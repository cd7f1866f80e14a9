//! Cosine similarity between a query profile and every corpus row.

use crate::corpus::ReferenceCorpus;
use crate::vector::{dot, l2_norm, TraitVector};

/// Similarity of `query` to each corpus row, in row order.
///
/// Query and rows are unit length (or exactly zero), so cosine is the dot product. Results are
/// clamped to `[-1, 1]` to absorb rounding; a zero vector on either side scores `0`.
pub fn cosine_scores(query: &TraitVector, corpus: &ReferenceCorpus) -> Vec<f64> {
    assert_eq!(
        query.dim(),
        corpus.dim(),
        "query width does not match corpus width"
    );
    corpus
        .matrix()
        .rows()
        .take(corpus.len())
        .map(|row| query.dot(row).clamp(-1.0, 1.0))
        .collect()
}

/// Cosine similarity for arbitrary vectors. Zero norm on either side gives `0`.
pub fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let na = l2_norm(a);
    let nb = l2_norm(b);
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    (dot(a, b) / (na * nb)).clamp(-1.0, 1.0)
}
