pub mod codec;
pub mod combinatorics;
pub mod engine;
pub mod enumerator;
pub mod error;
pub mod progress;
pub mod selection;

pub use codec::{PersistedSpec, PersistedValue, decode, decode_json, encode, encode_json};
pub use combinatorics::{SelectionKind, combinations, permutations};
pub use engine::{
    VariantBatcher, VariantSummary, Variants, variant_at, variant_count, variants, variants_from,
};
pub use error::SpecError;
pub use num_bigint::BigUint;
pub use selection::{
    IndexSelection, PrimarySelection, SecondarySelection, SelectionSpec, SelectionValue,
    SizeRange, Variant,
};
