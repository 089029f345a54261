use std::num::NonZeroU64;

use branchgen_rs::combinatorics::factorial;
use branchgen_rs::enumerator::{
    rank_arrangement, rank_combination, unrank_arrangement, unrank_combination,
};
use branchgen_rs::{
    BigUint, PersistedSpec, PrimarySelection, SecondarySelection, SelectionSpec, SelectionValue,
    combinations, decode, decode_json, encode, encode_json, permutations, variant_count,
    variants,
};
use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;

const ROUNDTRIP_CASES: u32 = 50;

fn selection_value() -> impl Strategy<Value = SelectionValue> {
    prop_oneof![
        (0usize..64).prop_map(SelectionValue::Size),
        any::<usize>().prop_map(SelectionValue::Size),
        Just(SelectionValue::Size(usize::MAX)),
        (1usize..32, 0usize..32).prop_map(|(from, span)| {
            SelectionValue::range(from, from + span).expect("from >= 1 and to >= from")
        }),
        (1usize..=usize::MAX, 1usize..=usize::MAX).prop_map(|(a, b)| {
            SelectionValue::range(a.min(b), a.max(b)).expect("both bounds >= 1")
        }),
    ]
}

fn count_cap() -> impl Strategy<Value = Option<NonZeroU64>> {
    proptest::option::of(prop_oneof![
        Just(NonZeroU64::MAX),
        (1u64..=u64::MAX).prop_map(|cap| NonZeroU64::new(cap).expect("cap >= 1")),
    ])
}

fn primary_selection() -> impl Strategy<Value = PrimarySelection> {
    prop_oneof![
        Just(PrimarySelection::Each),
        selection_value().prop_map(PrimarySelection::Pick),
        selection_value().prop_map(PrimarySelection::Arrange),
    ]
}

fn secondary_selection() -> impl Strategy<Value = Option<SecondarySelection>> {
    prop_oneof![
        Just(None),
        selection_value().prop_map(|value| Some(SecondarySelection::ThenPick(value))),
        selection_value().prop_map(|value| Some(SecondarySelection::ThenArrange(value))),
    ]
}

fn selection_spec() -> impl Strategy<Value = SelectionSpec> {
    (primary_selection(), secondary_selection(), count_cap()).prop_map(
        |(primary, secondary, count_cap)| SelectionSpec {
            primary,
            secondary,
            count_cap,
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(ROUNDTRIP_CASES))]

    #[test]
    fn decode_inverts_encode(spec in selection_spec()) {
        prop_assert_eq!(decode(&encode(&spec)), Ok(spec));
        let json = encode_json(&spec).expect("serializes");
        prop_assert_eq!(decode_json(&json), Ok(spec));
    }

    #[test]
    fn encode_preserves_persisted_keys(spec in selection_spec()) {
        let persisted = encode(&spec);
        let reencoded = encode(&decode(&persisted).expect("valid persisted form"));
        prop_assert_eq!(reencoded, persisted);
        prop_assert_eq!(
            persisted.pick.is_none() && persisted.arrange.is_none(),
            spec.primary == PrimarySelection::Each
        );
        prop_assert!(persisted.pick.is_none() || persisted.arrange.is_none());
        prop_assert!(persisted.then_pick.is_none() || persisted.then_arrange.is_none());
    }
}

proptest! {
    #[test]
    fn combinations_are_symmetric(n in 0usize..120, k_seed in 0usize..1000) {
        let k = k_seed % (n + 1);
        prop_assert_eq!(combinations(n, k), combinations(n, n - k));
        prop_assert_eq!(combinations(n, 0), BigUint::from(1u8));
        prop_assert_eq!(combinations(n, n), BigUint::from(1u8));
    }

    #[test]
    fn oversized_selections_are_zero(n in 0usize..200, excess in 1usize..50) {
        prop_assert_eq!(combinations(n, n + excess), BigUint::default());
        prop_assert_eq!(permutations(n, n + excess), BigUint::default());
    }

    #[test]
    fn permutations_factor_through_combinations(n in 0usize..80, k_seed in 0usize..1000) {
        let k = k_seed % (n + 1);
        prop_assert_eq!(permutations(n, k), combinations(n, k) * factorial(k));
    }

    #[test]
    fn combination_rank_roundtrip(
        n in 1usize..60,
        k_seed in 0usize..1000,
        rank_seed in any::<u64>(),
    ) {
        let k = k_seed % (n + 1);
        let total = combinations(n, k);
        let rank = BigUint::from(rank_seed) % &total;
        let combo = unrank_combination(&rank, n, k).expect("rank below total");
        prop_assert!(combo.windows(2).all(|pair| pair[0] < pair[1]));
        prop_assert_eq!(rank_combination(&combo, n), rank);
    }

    #[test]
    fn arrangement_rank_roundtrip(
        n in 1usize..40,
        k_seed in 0usize..1000,
        rank_seed in any::<u64>(),
    ) {
        let k = k_seed % (n + 1);
        let total = permutations(n, k);
        let rank = BigUint::from(rank_seed) % &total;
        let sequence = unrank_arrangement(&rank, n, k).expect("rank below total");
        prop_assert_eq!(rank_arrangement(&sequence, n), rank);
    }

    #[test]
    fn small_enumerations_match_count(n in 0usize..6, spec in selection_spec()) {
        // Keep nested universes small enough to materialize.
        let spec = SelectionSpec { count_cap: NonZeroU64::new(500), ..spec };
        let listed = variants(n, &spec).count();
        prop_assert_eq!(BigUint::from(listed), variant_count(n, &spec));
    }
}

#[test]
fn persisted_spec_default_is_empty_object() {
    assert_eq!(
        serde_json::to_string(&PersistedSpec::default()).expect("serializes"),
        "{}"
    );
}
