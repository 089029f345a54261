use std::fmt;
use std::num::NonZeroU64;

use serde::de::{self, IgnoredAny, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::SpecError;
use crate::selection::{PrimarySelection, SecondarySelection, SelectionSpec, SelectionValue, widen};

/// A selection size as stored in step configuration: `3` or `[1, 3]`.
///
/// Stored as `i128` so that every `usize` size round-trips and negative input
/// can still be reported instead of failing to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PersistedValue {
    Size(i128),
    Range([i128; 2]),
}

// Untagged derive buffers input and cannot carry 128-bit integers.
impl<'de> Deserialize<'de> for PersistedValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PersistedValueVisitor;

        impl<'de> Visitor<'de> for PersistedValueVisitor {
            type Value = PersistedValue;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an integer size or a [from, to] integer pair")
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(PersistedValue::Size(i128::from(v)))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(PersistedValue::Size(i128::from(v)))
            }

            fn visit_i128<E>(self, v: i128) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(PersistedValue::Size(v))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let from = seq
                    .next_element::<i128>()?
                    .ok_or_else(|| <A::Error as de::Error>::invalid_length(0, &self))?;
                let to = seq
                    .next_element::<i128>()?
                    .ok_or_else(|| <A::Error as de::Error>::invalid_length(1, &self))?;
                if seq.next_element::<IgnoredAny>()?.is_some() {
                    return Err(<A::Error as de::Error>::invalid_length(3, &self));
                }
                Ok(PersistedValue::Range([from, to]))
            }
        }

        deserializer.deserialize_any(PersistedValueVisitor)
    }
}

/// Flat persisted form of a [`SelectionSpec`].
///
/// Every key is optional and absent keys are omitted when serialized. Unknown
/// keys are ignored, so the record can be read straight out of the enclosing
/// step configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pick: Option<PersistedValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrange: Option<PersistedValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub then_pick: Option<PersistedValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub then_arrange: Option<PersistedValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i128>,
}

fn decode_size(k: i128) -> Result<usize, SpecError> {
    if k < 0 {
        return Err(SpecError::NegativeSize(k));
    }
    usize::try_from(k).map_err(|_| SpecError::SizeTooLarge(k))
}

fn decode_value(value: PersistedValue) -> Result<SelectionValue, SpecError> {
    match value {
        PersistedValue::Size(k) => decode_size(k).map(SelectionValue::Size),
        PersistedValue::Range([from, to]) => {
            let invalid = SpecError::InvalidRange { from, to };
            if from < 1 || from > to {
                return Err(invalid);
            }
            match (usize::try_from(from), usize::try_from(to)) {
                (Ok(from), Ok(to)) => SelectionValue::range(from, to),
                _ => Err(invalid),
            }
        }
    }
}

fn decode_cap(count: i128) -> Result<NonZeroU64, SpecError> {
    u64::try_from(count)
        .ok()
        .and_then(NonZeroU64::new)
        .ok_or(SpecError::InvalidCap(count))
}

fn encode_value(value: SelectionValue) -> PersistedValue {
    match value {
        SelectionValue::Size(k) => PersistedValue::Size(widen(k)),
        // A one-size range stays a range so that decoding restores it exactly.
        SelectionValue::Range(range) => {
            PersistedValue::Range([widen(range.start()), widen(range.end())])
        }
    }
}

/// Build a [`SelectionSpec`] from its persisted form, rejecting ambiguous or
/// out-of-domain input instead of resolving it.
pub fn decode(persisted: &PersistedSpec) -> Result<SelectionSpec, SpecError> {
    let primary = match (persisted.pick, persisted.arrange) {
        (Some(_), Some(_)) => return Err(SpecError::AmbiguousPrimary),
        (Some(value), None) => PrimarySelection::Pick(decode_value(value)?),
        (None, Some(value)) => PrimarySelection::Arrange(decode_value(value)?),
        (None, None) => PrimarySelection::Each,
    };

    let secondary = match (persisted.then_pick, persisted.then_arrange) {
        (Some(_), Some(_)) => return Err(SpecError::AmbiguousSecondary),
        (Some(value), None) => Some(SecondarySelection::ThenPick(decode_value(value)?)),
        (None, Some(value)) => Some(SecondarySelection::ThenArrange(decode_value(value)?)),
        (None, None) => None,
    };

    let count_cap = persisted.count.map(decode_cap).transpose()?;

    Ok(SelectionSpec {
        primary,
        secondary,
        count_cap,
    })
}

/// Flatten a [`SelectionSpec`] into its persisted form.
///
/// `Each` writes no primary key at all; it is not the same as `pick: 0`.
pub fn encode(spec: &SelectionSpec) -> PersistedSpec {
    let mut persisted = PersistedSpec::default();

    match spec.primary {
        PrimarySelection::Each => {}
        PrimarySelection::Pick(value) => persisted.pick = Some(encode_value(value)),
        PrimarySelection::Arrange(value) => persisted.arrange = Some(encode_value(value)),
    }

    match spec.secondary {
        None => {}
        Some(SecondarySelection::ThenPick(value)) => {
            persisted.then_pick = Some(encode_value(value))
        }
        Some(SecondarySelection::ThenArrange(value)) => {
            persisted.then_arrange = Some(encode_value(value))
        }
    }

    persisted.count = spec.count_cap.map(|cap| i128::from(cap.get()));
    persisted
}

pub fn decode_json(json: &str) -> Result<SelectionSpec, SpecError> {
    let persisted: PersistedSpec = serde_json::from_str(json)?;
    decode(&persisted)
}

pub fn encode_json(spec: &SelectionSpec) -> Result<String, SpecError> {
    Ok(serde_json::to_string(&encode(spec))?)
}

impl TryFrom<&PersistedSpec> for SelectionSpec {
    type Error = SpecError;

    fn try_from(persisted: &PersistedSpec) -> Result<Self, Self::Error> {
        decode(persisted)
    }
}

impl From<&SelectionSpec> for PersistedSpec {
    fn from(spec: &SelectionSpec) -> Self {
        encode(spec)
    }
}
