use std::fmt;
use std::num::NonZeroU64;
use std::ops::RangeInclusive;

use itertools::Itertools;
use serde::Serialize;

use crate::combinatorics::SelectionKind;
use crate::error::SpecError;

/// `usize` is at most 64 bits wide, so every value is representable.
pub(crate) fn widen(value: usize) -> i128 {
    i128::try_from(value).unwrap_or(i128::MAX)
}

/// Inclusive span of selection sizes. Always satisfies `1 <= from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SizeRange {
    from: usize,
    to: usize,
}

impl SizeRange {
    pub fn new(from: usize, to: usize) -> Result<Self, SpecError> {
        if from < 1 || from > to {
            return Err(SpecError::InvalidRange {
                from: widen(from),
                to: widen(to),
            });
        }
        Ok(Self { from, to })
    }

    pub fn start(&self) -> usize {
        self.from
    }

    pub fn end(&self) -> usize {
        self.to
    }
}

/// How many items a stage selects: one fixed size or an inclusive span of sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionValue {
    Size(usize),
    Range(SizeRange),
}

impl SelectionValue {
    pub fn size(k: usize) -> Self {
        SelectionValue::Size(k)
    }

    pub fn range(from: usize, to: usize) -> Result<Self, SpecError> {
        SizeRange::new(from, to).map(SelectionValue::Range)
    }

    /// Sizes visited by this value, smallest first.
    pub fn sizes(&self) -> RangeInclusive<usize> {
        match *self {
            SelectionValue::Size(k) => k..=k,
            SelectionValue::Range(range) => range.from..=range.to,
        }
    }
}

/// First stage: which subsets (or sequences) of the base options to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimarySelection {
    /// No explicit size: every option on its own.
    #[default]
    Each,
    Pick(SelectionValue),
    Arrange(SelectionValue),
}

impl PrimarySelection {
    pub fn kind(&self) -> SelectionKind {
        match self {
            PrimarySelection::Each | PrimarySelection::Pick(_) => SelectionKind::Pick,
            PrimarySelection::Arrange(_) => SelectionKind::Arrange,
        }
    }

    pub fn sizes(&self) -> RangeInclusive<usize> {
        match self {
            PrimarySelection::Each => 1..=1,
            PrimarySelection::Pick(value) | PrimarySelection::Arrange(value) => value.sizes(),
        }
    }
}

/// Second stage, selecting over the results of the first stage as opaque items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecondarySelection {
    ThenPick(SelectionValue),
    ThenArrange(SelectionValue),
}

impl SecondarySelection {
    pub fn kind(&self) -> SelectionKind {
        match self {
            SecondarySelection::ThenPick(_) => SelectionKind::Pick,
            SecondarySelection::ThenArrange(_) => SelectionKind::Arrange,
        }
    }

    pub fn value(&self) -> SelectionValue {
        match *self {
            SecondarySelection::ThenPick(value) | SecondarySelection::ThenArrange(value) => value,
        }
    }

    pub fn sizes(&self) -> RangeInclusive<usize> {
        self.value().sizes()
    }
}

/// Complete generator configuration for one pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SelectionSpec {
    pub primary: PrimarySelection,
    pub secondary: Option<SecondarySelection>,
    /// Keep at most this many variants, canonically first.
    pub count_cap: Option<NonZeroU64>,
}

impl SelectionSpec {
    pub fn new(primary: PrimarySelection) -> Self {
        Self {
            primary,
            secondary: None,
            count_cap: None,
        }
    }

    pub fn pick(k: usize) -> Self {
        Self::new(PrimarySelection::Pick(SelectionValue::Size(k)))
    }

    pub fn arrange(k: usize) -> Self {
        Self::new(PrimarySelection::Arrange(SelectionValue::Size(k)))
    }

    pub fn with_secondary(mut self, secondary: SecondarySelection) -> Self {
        self.secondary = Some(secondary);
        self
    }

    pub fn with_count_cap(mut self, cap: NonZeroU64) -> Self {
        self.count_cap = Some(cap);
        self
    }
}

/// One concrete selection of indices into a universe.
///
/// For `Pick` the indices are ascending and stand for the set; for
/// `Arrange` their order is significant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct IndexSelection {
    pub indices: Vec<usize>,
    pub kind: SelectionKind,
}

impl IndexSelection {
    pub fn new(indices: Vec<usize>, kind: SelectionKind) -> Self {
        Self { indices, kind }
    }
}

impl fmt::Display for IndexSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = self.indices.iter().join(", ");
        match self.kind {
            SelectionKind::Pick => write!(f, "{{{body}}}"),
            SelectionKind::Arrange => write!(f, "[{body}]"),
        }
    }
}

/// A concrete outcome of a selection spec.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Primary stage only: indices into the base options.
    Flat(IndexSelection),
    /// Secondary stage applied: a selection of primary results.
    Nested {
        members: Vec<IndexSelection>,
        kind: SelectionKind,
    },
}

impl Variant {
    pub fn is_ordered(&self) -> bool {
        match self {
            Variant::Flat(selection) => selection.kind.is_ordered(),
            Variant::Nested { kind, .. } => kind.is_ordered(),
        }
    }

    /// Number of top-level items (options for flat, primary results for nested).
    pub fn len(&self) -> usize {
        match self {
            Variant::Flat(selection) => selection.indices.len(),
            Variant::Nested { members, .. } => members.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every base-option index referenced, in emission order.
    pub fn option_indices(&self) -> Vec<usize> {
        match self {
            Variant::Flat(selection) => selection.indices.clone(),
            Variant::Nested { members, .. } => members
                .iter()
                .flat_map(|member| member.indices.iter().copied())
                .collect(),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Flat(selection) => fmt::Display::fmt(selection, f),
            Variant::Nested { members, kind } => {
                let body = members.iter().join(", ");
                match kind {
                    SelectionKind::Pick => write!(f, "{{{body}}}"),
                    SelectionKind::Arrange => write!(f, "[{body}]"),
                }
            }
        }
    }
}
