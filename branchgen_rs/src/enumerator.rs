use std::ops::RangeInclusive;

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use tracing::debug;

use crate::combinatorics::{SelectionKind, combinations, permutations, selections};

/// Index-based selection used on the enumeration path. Each entry is an
/// index into the universe the cursor was built over.
pub type IndexSequence = Vec<usize>;

/// Convert a global offset within a stage to (size, local_index_within_size).
///
/// The global index orders selections as:
/// - All selections of the smallest size in `sizes`
/// - All selections of the next size
/// - ...and so on up to the largest size that fits in the universe
///
/// Returns None if the offset exceeds the stage total.
pub fn global_to_size_and_local(
    offset: &BigUint,
    universe: usize,
    kind: SelectionKind,
    sizes: RangeInclusive<usize>,
) -> Option<(usize, BigUint)> {
    let universe_big = BigUint::from(universe);
    let (first, last) = sizes.into_inner();
    let mut remaining = offset.clone();

    for size in first..=last.min(universe) {
        let count_at_size = selections(kind, &universe_big, size);
        if remaining < count_at_size {
            return Some((size, remaining));
        }
        remaining -= count_at_size;
    }

    None
}

// =============================================================================
// Combinations (combinatorial number system)
// =============================================================================

/// Number of r-combinations drawn from `start..n` whose first element is
/// below `c`. Hockey-stick identity over the per-element blocks.
fn combos_before(c: usize, n: usize, start: usize, elements_remaining: usize) -> BigUint {
    combinations(n - start, elements_remaining) - combinations(n - c, elements_remaining)
}

/// Find the element at the next position of a lexicographic combination,
/// given the rank still to be consumed. Binary search over the candidates,
/// since `combos_before` is monotone in `c`.
fn find_lex_element(
    remaining: &BigUint,
    n: usize,
    start: usize,
    elements_remaining: usize,
) -> usize {
    let mut lo = start;
    let mut hi = n - elements_remaining;

    while lo < hi {
        let mid = lo + (hi - lo).div_ceil(2);
        if combos_before(mid, n, start, elements_remaining) <= *remaining {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }

    lo
}

/// Unrank a local index within C(n, k) to the ascending index list at that
/// position in lexicographic order. Returns None when the rank is out of range.
pub fn unrank_combination(rank: &BigUint, n: usize, k: usize) -> Option<IndexSequence> {
    if k > n || *rank >= combinations(n, k) {
        return None;
    }

    let mut result = Vec::with_capacity(k);
    let mut remaining = rank.clone();
    let mut start = 0usize;

    for i in 0..k {
        let elements_remaining = k - i;
        let c = find_lex_element(&remaining, n, start, elements_remaining);
        remaining -= combos_before(c, n, start, elements_remaining);
        result.push(c);
        start = c + 1;
    }

    Some(result)
}

/// Compute the rank of a sorted combination (inverse of unrank).
pub fn rank_combination(combo: &[usize], n: usize) -> BigUint {
    let k = combo.len();
    if k > n {
        return BigUint::zero();
    }

    let mut rank = BigUint::zero();
    let mut start = 0usize;
    for (i, &c) in combo.iter().enumerate() {
        rank += combos_before(c, n, start, k - i);
        start = c + 1;
    }
    rank
}

/// Step an ascending combination to its lexicographic successor of the same
/// size. Returns false once the last combination has been passed.
pub fn advance_combination(indices: &mut [usize], n: usize) -> bool {
    let k = indices.len();

    // Try to increment from rightmost position
    for i in (0..k).rev() {
        let max_val = n - (k - i);
        if indices[i] < max_val {
            indices[i] += 1;
            for j in (i + 1)..k {
                indices[j] = indices[j - 1] + 1;
            }
            return true;
        }
    }

    false
}

// =============================================================================
// Arrangements (falling-factorial number system)
// =============================================================================

/// Unrank a local index within P(n, k) to the index sequence at that
/// position in lexicographic order.
///
/// Position `i` has `n - i` free candidates, each heading a block of
/// P(n-i-1, k-i-1) sequences, so the rank decomposes digit by digit.
///
/// Only the chosen prefix is held, so memory is O(k) however large `n` is.
pub fn unrank_arrangement(rank: &BigUint, n: usize, k: usize) -> Option<IndexSequence> {
    if k > n || *rank >= permutations(n, k) {
        return None;
    }

    let mut taken: Vec<usize> = Vec::with_capacity(k);
    let mut remaining = rank.clone();
    let mut result = Vec::with_capacity(k);

    for i in 0..k {
        let block = permutations(n - i - 1, k - i - 1);
        let digit = (&remaining / &block).to_usize()?;
        remaining %= &block;
        let value = nth_untaken(&taken, digit);
        let slot = taken.partition_point(|&prior| prior < value);
        taken.insert(slot, value);
        result.push(value);
    }

    Some(result)
}

/// The `nth` smallest value not in `taken` (ascending).
fn nth_untaken(taken: &[usize], nth: usize) -> usize {
    let mut value = nth;
    for &prior in taken {
        if prior <= value {
            value += 1;
        } else {
            break;
        }
    }
    value
}

/// Compute the rank of an index sequence of distinct values below `n`.
pub fn rank_arrangement(sequence: &[usize], n: usize) -> BigUint {
    let k = sequence.len();
    if k > n {
        return BigUint::zero();
    }

    let mut rank = BigUint::zero();
    for (i, &value) in sequence.iter().enumerate() {
        let smaller_taken = sequence[..i].iter().filter(|&&prior| prior < value).count();
        rank += permutations(n - i - 1, k - i - 1) * (value - smaller_taken);
    }
    rank
}

/// Step an arrangement to its lexicographic successor of the same length.
///
/// Cost is O(k^2) per step regardless of `n`, which matters when the
/// universe is a large materialized primary stage.
pub fn advance_arrangement(indices: &mut [usize], n: usize) -> bool {
    let k = indices.len();

    for pos in (0..k).rev() {
        let (prefix, rest) = indices.split_at_mut(pos);
        let taken = |value: &usize| prefix.contains(value);
        let Some(next) = (rest[0] + 1..n).find(|value| !taken(value)) else {
            continue;
        };
        rest[0] = next;

        // Refill the tail with the smallest values still free.
        let mut free = (0..n).filter(|value| *value != next && !taken(value));
        for slot in rest[1..].iter_mut() {
            match free.next() {
                Some(value) => *slot = value,
                None => return false,
            }
        }
        return true;
    }

    false
}

// =============================================================================
// Kind dispatch
// =============================================================================

pub fn unrank_selection(
    kind: SelectionKind,
    rank: &BigUint,
    n: usize,
    k: usize,
) -> Option<IndexSequence> {
    match kind {
        SelectionKind::Pick => unrank_combination(rank, n, k),
        SelectionKind::Arrange => unrank_arrangement(rank, n, k),
    }
}

pub fn rank_selection(kind: SelectionKind, sequence: &[usize], n: usize) -> BigUint {
    match kind {
        SelectionKind::Pick => rank_combination(sequence, n),
        SelectionKind::Arrange => rank_arrangement(sequence, n),
    }
}

/// Unrank a global index across all sizes of a stage.
/// Returns None if the index exceeds the stage total.
pub fn unrank_global(
    offset: &BigUint,
    universe: usize,
    kind: SelectionKind,
    sizes: RangeInclusive<usize>,
) -> Option<IndexSequence> {
    let (size, local) = global_to_size_and_local(offset, universe, kind, sizes)?;
    unrank_selection(kind, &local, universe, size)
}

// =============================================================================
// Seekable stage cursor
// =============================================================================

/// Cursor over every selection of one stage: sizes ascending, each size in
/// lexicographic order.
///
/// The cursor can start from any global index by unranking, so resuming or
/// previewing a window never walks the selections before it.
#[derive(Debug, Clone)]
pub struct StageCursor {
    universe: usize,
    kind: SelectionKind,
    first_size: usize,
    last_size: usize,
    current: IndexSequence,
    exhausted: bool,
}

impl StageCursor {
    pub fn new(universe: usize, kind: SelectionKind, sizes: RangeInclusive<usize>) -> Self {
        Self::starting_at(universe, kind, sizes, &BigUint::zero())
    }

    /// Create a cursor positioned at `offset` (0-based). Offsets at or past
    /// the stage total give an exhausted cursor.
    pub fn starting_at(
        universe: usize,
        kind: SelectionKind,
        sizes: RangeInclusive<usize>,
        offset: &BigUint,
    ) -> Self {
        let (first_size, last_size) = sizes.into_inner();
        let last_size = last_size.min(universe);

        let start = if offset.is_zero() {
            // Special case: the first selection of the first size needs no unranking
            (first_size <= last_size).then(|| (0..first_size).collect())
        } else {
            debug!(universe, ?kind, %offset, "seeking stage cursor");
            unrank_global(offset, universe, kind, first_size..=last_size)
        };

        match start {
            Some(current) => Self {
                universe,
                kind,
                first_size,
                last_size,
                current,
                exhausted: false,
            },
            None => Self {
                universe,
                kind,
                first_size,
                last_size,
                current: Vec::new(),
                exhausted: true,
            },
        }
    }

    pub fn universe(&self) -> usize {
        self.universe
    }

    pub fn kind(&self) -> SelectionKind {
        self.kind
    }

    /// Global index of the selection the next call to `next` yields.
    pub fn current_global_index(&self) -> Option<BigUint> {
        if self.exhausted {
            return None;
        }

        let universe = BigUint::from(self.universe);
        let earlier_sizes: BigUint = (self.first_size..self.current.len())
            .map(|size| selections(self.kind, &universe, size))
            .sum();

        Some(earlier_sizes + rank_selection(self.kind, &self.current, self.universe))
    }

    fn advance(&mut self) {
        if self.exhausted {
            return;
        }

        let stepped = match self.kind {
            SelectionKind::Pick => advance_combination(&mut self.current, self.universe),
            SelectionKind::Arrange => advance_arrangement(&mut self.current, self.universe),
        };
        if stepped {
            return;
        }

        // Exhausted current size, move to next
        let next_size = self.current.len() + 1;
        if next_size > self.last_size {
            self.exhausted = true;
            return;
        }

        // First selection of every size is [0, 1, ..., size-1] for both kinds.
        self.current = (0..next_size).collect();
    }
}

impl Iterator for StageCursor {
    type Item = IndexSequence;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        let selection = self.current.clone();
        self.advance();
        Some(selection)
    }
}
