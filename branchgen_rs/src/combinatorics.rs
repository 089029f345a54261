use std::ops::RangeInclusive;

use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

/// Whether a selection treats its items as a set or as a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionKind {
    /// Unordered selection (combinations).
    Pick,
    /// Ordered selection (permutations).
    Arrange,
}

impl SelectionKind {
    pub fn is_ordered(self) -> bool {
        matches!(self, SelectionKind::Arrange)
    }
}

/// Compute C(n, k) - the number of k-combinations from n items.
/// Returns 0 for k > n. Returns 1 for k == 0 and k == n.
pub fn combinations(n: usize, k: usize) -> BigUint {
    combinations_of(&BigUint::from(n), k)
}

/// C(n, k) over an arbitrarily large universe.
///
/// Accumulates multiply-then-divide so that after step `i` the accumulator
/// holds exactly C(n, i + 1); no factorial is ever formed.
pub fn combinations_of(n: &BigUint, k: usize) -> BigUint {
    let k_big = BigUint::from(k);
    if k_big > *n {
        return BigUint::zero();
    }
    // Use symmetry: C(n, k) = C(n, n-k) to minimize iterations
    let k = match (n - &k_big).to_usize() {
        Some(rest) if rest < k => rest,
        _ => k,
    };
    let mut acc = BigUint::one();
    for i in 0..k {
        acc *= n - BigUint::from(i);
        acc /= BigUint::from(i + 1);
    }
    acc
}

/// Compute P(n, k) = n * (n-1) * ... * (n-k+1), the number of ordered
/// k-selections from n items. Returns 0 for k > n and 1 for k == 0.
pub fn permutations(n: usize, k: usize) -> BigUint {
    permutations_of(&BigUint::from(n), k)
}

/// P(n, k) over an arbitrarily large universe.
pub fn permutations_of(n: &BigUint, k: usize) -> BigUint {
    if BigUint::from(k) > *n {
        return BigUint::zero();
    }
    (0..k).fold(BigUint::one(), |acc, i| acc * (n - BigUint::from(i)))
}

pub fn factorial(k: usize) -> BigUint {
    permutations(k, k)
}

/// Number of selections of exactly `k` items of the given kind.
pub fn selections(kind: SelectionKind, n: &BigUint, k: usize) -> BigUint {
    match kind {
        SelectionKind::Pick => combinations_of(n, k),
        SelectionKind::Arrange => permutations_of(n, k),
    }
}

/// Total number of selections across every size in `sizes`.
///
/// Sizes beyond the universe contribute nothing, so the walk stops at `n`.
pub fn total_selections(kind: SelectionKind, n: &BigUint, sizes: RangeInclusive<usize>) -> BigUint {
    let (start, end) = sizes.into_inner();
    let end = n.to_usize().map_or(end, |n| n.min(end));
    (start..=end).map(|k| selections(kind, n, k)).sum()
}
