use std::cmp::Ordering;

use ndarray::ArrayView1;

/// Cosine similarity in `[-1, 1]`. Mismatched, empty, or zero-norm vectors
/// score `0.0`.
pub fn cosine_similarity(query: &[f32], candidate: &[f32]) -> f32 {
    if query.is_empty() || query.len() != candidate.len() {
        return 0.0;
    }

    let query = ArrayView1::from(query);
    let candidate = ArrayView1::from(candidate);

    let dot = query.dot(&candidate);
    let denom = l2_norm(&query) * l2_norm(&candidate);
    if denom <= f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

/// Indices of `candidates` ordered by descending similarity to `query`.
/// Equal scores keep their original (ascending index) order.
pub fn rank_descending_by_cosine<'a, I>(query: &[f32], candidates: I) -> Vec<(usize, f32)>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut scores: Vec<(usize, f32)> = candidates
        .into_iter()
        .enumerate()
        .map(|(idx, candidate)| (idx, cosine_similarity(query, candidate)))
        .collect();

    scores.sort_by(|left, right| {
        right
            .1
            .partial_cmp(&left.1)
            .unwrap_or(Ordering::Equal)
            .then(left.0.cmp(&right.0))
    });
    scores
}

fn l2_norm(vector: &ArrayView1<f32>) -> f32 {
    vector.dot(vector).sqrt()
}
