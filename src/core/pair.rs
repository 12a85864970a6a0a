use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::core::item::Item;

/// Difference score. Lower means more similar.
pub type Score = i64;

/// Stable identity of a pair, assigned once when the pair is generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PairId(Uuid);

impl PairId {
    fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for PairId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single base-candidate comparison with a mutable difference score
///
/// Two pairs are equal when base, candidate and identity all match; the score
/// takes no part in equality. Cloning a pair is an identity-preserving copy,
/// which is how a pipeline forks independent score tracks that can later be
/// merged back by identity.
#[derive(Debug, Clone)]
pub struct Pair {
    base: Arc<Item>,
    candidate: Arc<Item>,
    id: PairId,
    score: Score,
}

impl Pair {
    /// Create a pair with a fresh identity and a score of 0
    pub fn new(base: Arc<Item>, candidate: Arc<Item>) -> Self {
        Self {
            base,
            candidate,
            id: PairId::fresh(),
            score: 0,
        }
    }

    #[must_use]
    pub fn base(&self) -> &Item {
        &self.base
    }

    #[must_use]
    pub fn candidate(&self) -> &Item {
        &self.candidate
    }

    #[must_use]
    pub fn id(&self) -> PairId {
        self.id
    }

    #[must_use]
    pub fn score(&self) -> Score {
        self.score
    }

    pub fn set_score(&mut self, score: Score) -> &mut Self {
        self.score = score;
        self
    }

    /// Identity-preserving copy carrying a new score
    #[must_use]
    pub fn with_score(&self, score: Score) -> Self {
        Self {
            score,
            ..self.clone()
        }
    }
}

impl PartialEq for Pair {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.base == other.base && self.candidate == other.candidate
    }
}

impl Eq for Pair {}

// Hashing only the identity keeps Hash consistent with Eq.
impl Hash for Pair {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Stable sort by ascending score; ties keep their input order
pub fn rank(pairs: &mut [Pair]) {
    pairs.sort_by_key(Pair::score);
}

/// Pairs of `input` that are not in `remove`, compared by identity
///
/// Relative order of `input` is preserved.
#[must_use]
pub fn difference(input: Vec<Pair>, remove: &[Pair]) -> Vec<Pair> {
    if remove.is_empty() {
        return input;
    }

    let removed: HashSet<&Pair> = remove.iter().collect();
    input
        .into_iter()
        .filter(|pair| !removed.contains(pair))
        .collect()
}

/// Independent copy of a collection; every pair keeps its identity
#[must_use]
pub fn copy_all(pairs: &[Pair]) -> Vec<Pair> {
    pairs.to_vec()
}
