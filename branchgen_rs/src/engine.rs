use std::fmt;

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use tracing::debug;

use crate::combinatorics::total_selections;
use crate::enumerator::{StageCursor, unrank_global};
use crate::selection::{IndexSelection, PrimarySelection, SelectionSpec, Variant};

/// Number of results the primary stage produces for `option_count` options.
pub fn primary_count(option_count: usize, primary: &PrimarySelection) -> BigUint {
    match primary {
        PrimarySelection::Each => BigUint::from(option_count),
        PrimarySelection::Pick(_) | PrimarySelection::Arrange(_) => {
            total_selections(primary.kind(), &BigUint::from(option_count), primary.sizes())
        }
    }
}

/// Variant count before the cap is applied.
pub fn uncapped_count(option_count: usize, spec: &SelectionSpec) -> BigUint {
    let primary = primary_count(option_count, &spec.primary);
    match spec.secondary {
        None => primary,
        Some(secondary) => total_selections(secondary.kind(), &primary, secondary.sizes()),
    }
}

/// Total number of variants `spec` yields over `option_count` options.
///
/// Zero is a valid answer: the requested sizes do not fit the options.
pub fn variant_count(option_count: usize, spec: &SelectionSpec) -> BigUint {
    let count = uncapped_count(option_count, spec);
    match spec.count_cap {
        Some(cap) => count.min(BigUint::from(cap.get())),
        None => count,
    }
}

/// Lazily enumerate every variant of `spec` in canonical order.
pub fn variants(option_count: usize, spec: &SelectionSpec) -> Variants {
    variants_from(option_count, spec, &BigUint::zero())
}

/// Enumerate starting at global position `offset`.
///
/// Yields exactly the suffix of `variants(option_count, spec)` from
/// `offset` on; the cap still bounds absolute positions.
pub fn variants_from(option_count: usize, spec: &SelectionSpec, offset: &BigUint) -> Variants {
    let remaining = spec.count_cap.map(|cap| {
        let cap = BigUint::from(cap.get());
        if *offset >= cap {
            0
        } else {
            (cap - offset).to_u64().unwrap_or_default()
        }
    });

    let primary_kind = spec.primary.kind();
    let source = match spec.secondary {
        None => VariantSource::Flat {
            cursor: StageCursor::starting_at(
                option_count,
                primary_kind,
                spec.primary.sizes(),
                offset,
            ),
        },
        Some(secondary) => {
            // Second-order selection needs random access into the primary results.
            let primary = if remaining == Some(0) {
                Vec::new()
            } else {
                materialize_primary(option_count, &spec.primary)
            };
            let cursor = StageCursor::starting_at(
                primary.len(),
                secondary.kind(),
                secondary.sizes(),
                offset,
            );
            VariantSource::Nested { primary, cursor }
        }
    };

    Variants { source, remaining }
}

/// The variant at global position `rank`, without enumerating the ones before it.
///
/// Second-order specs are resolved by unranking both stages, so the primary
/// stage is never materialized. Returns None past the (capped) count, or
/// when the primary stage is too large to index.
pub fn variant_at(option_count: usize, spec: &SelectionSpec, rank: &BigUint) -> Option<Variant> {
    if *rank >= variant_count(option_count, spec) {
        return None;
    }

    let primary_kind = spec.primary.kind();
    match spec.secondary {
        None => {
            let indices = unrank_global(rank, option_count, primary_kind, spec.primary.sizes())?;
            Some(Variant::Flat(IndexSelection::new(indices, primary_kind)))
        }
        Some(secondary) => {
            let universe = primary_count(option_count, &spec.primary).to_usize()?;
            let outer = unrank_global(rank, universe, secondary.kind(), secondary.sizes())?;
            let members = outer
                .into_iter()
                .map(|position| {
                    unrank_global(
                        &BigUint::from(position),
                        option_count,
                        primary_kind,
                        spec.primary.sizes(),
                    )
                    .map(|indices| IndexSelection::new(indices, primary_kind))
                })
                .collect::<Option<Vec<_>>>()?;
            Some(Variant::Nested {
                members,
                kind: secondary.kind(),
            })
        }
    }
}

fn materialize_primary(option_count: usize, primary: &PrimarySelection) -> Vec<IndexSelection> {
    let kind = primary.kind();
    let results: Vec<IndexSelection> = StageCursor::new(option_count, kind, primary.sizes())
        .map(|indices| IndexSelection::new(indices, kind))
        .collect();
    debug!(
        options = option_count,
        primary_results = results.len(),
        "materialized primary stage for second-order selection"
    );
    results
}

#[derive(Debug, Clone)]
enum VariantSource {
    Flat {
        cursor: StageCursor,
    },
    Nested {
        primary: Vec<IndexSelection>,
        cursor: StageCursor,
    },
}

/// Pull-based variant sequence. Stops after the cap without generating
/// anything past it; clone it to replay from the current position.
#[derive(Debug, Clone)]
pub struct Variants {
    source: VariantSource,
    remaining: Option<u64>,
}

impl Iterator for Variants {
    type Item = Variant;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == Some(0) {
            return None;
        }

        let variant = match &mut self.source {
            VariantSource::Flat { cursor } => {
                let kind = cursor.kind();
                Variant::Flat(IndexSelection::new(cursor.next()?, kind))
            }
            VariantSource::Nested { primary, cursor } => {
                let kind = cursor.kind();
                let positions = cursor.next()?;
                Variant::Nested {
                    members: positions.iter().map(|&i| primary[i].clone()).collect(),
                    kind,
                }
            }
        };

        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= 1;
        }
        Some(variant)
    }
}

// =============================================================================
// VariantBatcher
// =============================================================================

/// Batched pulling for executors that materialize variants in chunks.
pub struct VariantBatcher {
    iter: Variants,
}

impl VariantBatcher {
    pub fn new(option_count: usize, spec: &SelectionSpec, start_offset: &BigUint) -> Self {
        Self {
            iter: variants_from(option_count, spec, start_offset),
        }
    }

    pub fn next_batch(&mut self, batch_size: usize) -> Option<Vec<Variant>> {
        let mut batch = Vec::with_capacity(batch_size);
        while batch.len() < batch_size {
            match self.iter.next() {
                Some(variant) => batch.push(variant),
                None => break,
            }
        }
        if batch.is_empty() { None } else { Some(batch) }
    }
}

// =============================================================================
// Summary
// =============================================================================

/// "N options → M variants" line shown next to a generator step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSummary {
    pub option_count: usize,
    pub variant_count: BigUint,
    pub uncapped_count: BigUint,
}

impl VariantSummary {
    pub fn new(option_count: usize, spec: &SelectionSpec) -> Self {
        Self {
            option_count,
            variant_count: variant_count(option_count, spec),
            uncapped_count: uncapped_count(option_count, spec),
        }
    }

    /// True when the cap removed at least one variant.
    pub fn is_capped(&self) -> bool {
        self.variant_count < self.uncapped_count
    }
}

fn plural(count: &BigUint, noun: &str) -> String {
    if *count == BigUint::from(1u8) {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

impl fmt::Display for VariantSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} → {}",
            plural(&BigUint::from(self.option_count), "option"),
            plural(&self.variant_count, "variant")
        )?;
        if self.is_capped() {
            write!(f, " (capped from {})", self.uncapped_count)?;
        }
        Ok(())
    }
}
