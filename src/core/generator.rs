use std::sync::Arc;

use crate::core::item::Item;
use crate::core::pair::Pair;

/// Wrap payloads so they can be shared by every pair they appear in
pub fn items<I, T>(values: I) -> Vec<Arc<Item>>
where
    I: IntoIterator<Item = T>,
    T: Into<Item>,
{
    values.into_iter().map(|v| Arc::new(v.into())).collect()
}

/// Cross product of bases and candidates
///
/// Produces |bases| x |candidates| pairs, base-major, each with a fresh
/// identity and a score of 0. Time and memory are O(n·m), so keep the
/// fan-out moderate.
#[must_use]
pub fn generate(bases: &[Arc<Item>], candidates: &[Arc<Item>]) -> Vec<Pair> {
    let mut pairs = Vec::with_capacity(bases.len() * candidates.len());

    for base in bases {
        for candidate in candidates {
            pairs.push(Pair::new(Arc::clone(base), Arc::clone(candidate)));
        }
    }

    pairs
}

/// One pair per candidate against a single base
#[must_use]
pub fn generate_single(base: &Arc<Item>, candidates: &[Arc<Item>]) -> Vec<Pair> {
    generate(std::slice::from_ref(base), candidates)
}
