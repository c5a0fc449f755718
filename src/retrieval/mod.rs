
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

use crate::index::{Index, IndexEntry};

/// Guards against division by zero for degenerate (all-zero) vectors
const NORM_EPSILON: f32 = 1e-8;

/// An index entry paired with its similarity to the current query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEntry<'a> {
    pub entry: &'a IndexEntry,
    pub score: f32,
}

/// Cosine similarity between two vectors. Extra components of the longer
/// vector are ignored.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt() + NORM_EPSILON)
}

/// Rank every index entry against the query vector and select up to `k`
/// entries, keeping at most one chunk per source document.
///
/// Ranking is a full linear scan; the index is a small prebuilt snapshot, not
/// a live corpus. Ties keep original index order. Without the per-document
/// dedup one long post would fill every context slot with near-duplicate
/// passages.
#[inline]
pub fn pick_top_k<'a>(index: &'a Index, query: &[f32], k: usize) -> Vec<ScoredEntry<'a>> {
    if k == 0 || index.items.is_empty() {
        return Vec::new();
    }

    let mut ranked: Vec<ScoredEntry<'a>> = index
        .items
        .iter()
        .map(|entry| ScoredEntry {
            entry,
            score: cosine_similarity(query, &entry.vector),
        })
        .collect();

    // stable: equal scores keep index order
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let mut seen: HashSet<&str> = HashSet::new();
    let mut selected = Vec::with_capacity(k.min(ranked.len()));

    for scored in ranked {
        if !seen.insert(scored.entry.document_id.as_str()) {
            continue;
        }
        selected.push(scored);
        if selected.len() >= k {
            break;
        }
    }

    debug!(
        "Selected {} of up to {} context chunks from {} candidates",
        selected.len(),
        k,
        index.items.len()
    );

    selected
}
