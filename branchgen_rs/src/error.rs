use thiserror::Error;

/// Precondition violations raised while building or decoding a selection spec.
///
/// A selection that is merely too large for the available options is not an
/// error; it counts as zero variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("invalid range [{from}, {to}]: expected 1 <= from <= to")]
    InvalidRange { from: i128, to: i128 },
    #[error("selection size must be non-negative, got {0}")]
    NegativeSize(i128),
    #[error("selection size {0} does not fit in usize")]
    SizeTooLarge(i128),
    #[error("count cap must be an integer in 1..=18446744073709551615, got {0}")]
    InvalidCap(i128),
    #[error("both `pick` and `arrange` are set; a primary selection takes exactly one")]
    AmbiguousPrimary,
    #[error("both `then_pick` and `then_arrange` are set; a secondary selection takes exactly one")]
    AmbiguousSecondary,
    #[error("malformed selection spec: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for SpecError {
    fn from(e: serde_json::Error) -> Self {
        SpecError::Malformed(e.to_string())
    }
}
