//! Similarity scoring and top-N selection over embeddings.
//!
//! Scores are computed in `f64` regardless of the `f32` storage type.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;

use crate::models::{Embedding, ItemId};

/// A candidate item with its similarity to the query vector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemScore {
    pub item_id: ItemId,
    pub score: f64,
}

/// Cosine similarity of two vectors.
///
/// Returns `0.0` when the lengths differ, either vector is empty, either norm
/// is zero, or the result is not finite. Otherwise the result lies in
/// `[-1.0, 1.0]`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let score = dot / (norm_a.sqrt() * norm_b.sqrt());
    if score.is_finite() {
        score.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Highest-first ordering with ties broken by ascending item ID
fn by_score_desc(a: &ItemScore, b: &ItemScore) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.item_id.cmp(&b.item_id))
}

/// Score every candidate against `query` and keep the best `limit`.
///
/// Candidates whose ID is in `exclude` are never scored. The result is sorted
/// by descending score, ties by ascending item ID.
pub fn rank<'a, I>(query: &[f32], candidates: I, exclude: &HashSet<&str>, limit: usize) -> Vec<ItemScore>
where
    I: IntoIterator<Item = (&'a ItemId, &'a Embedding)>,
{
    if limit == 0 || query.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<ItemScore> = candidates
        .into_iter()
        .filter(|(id, _)| !exclude.contains(id.as_str()))
        .map(|(id, embedding)| ItemScore {
            item_id: id.clone(),
            score: cosine_similarity(query, embedding),
        })
        .collect();

    if scored.len() > limit {
        scored.select_nth_unstable_by(limit - 1, by_score_desc);
        scored.truncate(limit);
    }
    scored.sort_unstable_by(by_score_desc);

    scored
}

/// Element-wise mean of `vectors`.
///
/// The first vector fixes the dimension; later vectors of any other length
/// are ignored. Returns `None` when no vector contributes.
pub fn mean_vector<'a, I>(vectors: I) -> Option<Vec<f32>>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut sum: Vec<f64> = Vec::new();
    let mut count = 0usize;

    for vector in vectors {
        if vector.is_empty() {
            continue;
        }
        if count == 0 {
            sum = vec![0.0; vector.len()];
        } else if vector.len() != sum.len() {
            tracing::debug!(
                expected = sum.len(),
                actual = vector.len(),
                "Ignoring embedding with mismatched dimension"
            );
            continue;
        }

        for (acc, value) in sum.iter_mut().zip(vector) {
            *acc += f64::from(*value);
        }
        count += 1;
    }

    if count == 0 {
        return None;
    }

    let n = count as f64;
    Some(sum.into_iter().map(|v| (v / n) as f32).collect())
}
