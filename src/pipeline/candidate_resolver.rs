//! Candidate Resolver
//!
//! Picks the best usable class label from the classifier's ranked output.
//!
//! Two phases over an immutable ranking:
//! 1. Walk the top-k indices (score descending, lower index first on ties)
//!    and return the first whose label is not an artifact class.
//! 2. If all k are artifacts, return the global argmax unfiltered, so an
//!    accepted input always resolves to something.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::cmp::Ordering;

use crate::config::{DEFAULT_EXCLUDED_LABELS, DEFAULT_TOP_K};
use crate::data::ClassIndexMap;

/// Injectable candidate policy: window size and artifact labels
#[derive(Debug, Clone)]
pub struct CandidatePolicy {
    pub top_k: usize,
    pub excluded: FxHashSet<String>,
}

impl CandidatePolicy {
    pub fn new<I, S>(top_k: usize, excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            top_k,
            excluded: excluded.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_excluded(&self, label: &str) -> bool {
        self.excluded.contains(label)
    }
}

impl Default for CandidatePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_K, DEFAULT_EXCLUDED_LABELS)
    }
}

/// The label chosen for a score vector
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCandidate {
    pub index: usize,
    pub label: String,
    /// Raw score, unrounded
    pub confidence: f64,
    /// True when every top-k candidate was an artifact class
    pub fallback: bool,
}

/// Score descending, then index ascending
fn rank_order(scores: &[f64], a: usize, b: usize) -> Ordering {
    scores[b]
        .partial_cmp(&scores[a])
        .unwrap_or(Ordering::Equal)
        .then(a.cmp(&b))
}

/// Indices of the `k` highest scores in rank order
pub fn top_k_indices(scores: &[f64], k: usize) -> SmallVec<[usize; 8]> {
    let mut ranked: Vec<usize> = (0..scores.len()).collect();
    ranked.sort_by(|&a, &b| rank_order(scores, a, b));
    ranked.into_iter().take(k).collect()
}

/// Index of the highest score, lowest index on ties
pub fn argmax(scores: &[f64]) -> Option<usize> {
    (0..scores.len()).min_by(|&a, &b| rank_order(scores, a, b))
}

/// Resolve a score vector to a class label.
///
/// Returns `None` only for an empty score vector.
pub fn resolve(
    scores: &[f64],
    class_map: &ClassIndexMap,
    policy: &CandidatePolicy,
) -> Option<ResolvedCandidate> {
    let candidate = |index: usize, fallback: bool| ResolvedCandidate {
        index,
        label: class_map.label(index).to_string(),
        confidence: scores[index],
        fallback,
    };

    let filtered = top_k_indices(scores, policy.top_k)
        .into_iter()
        .find(|&index| {
            let label = class_map.label(index);
            let skip = policy.is_excluded(label);
            if skip {
                tracing::debug!("Skipping artifact class '{}' at index {}", label, index);
            }
            !skip
        });

    match filtered {
        Some(index) => Some(candidate(index, false)),
        None => argmax(scores).map(|index| {
            tracing::warn!(
                "All top-{} candidates are artifact classes, using argmax index {}",
                policy.top_k, index
            );
            candidate(index, true)
        }),
    }
}
