use num_bigint::BigUint;
use num_traits::ToPrimitive;

/// Tracks how far a streaming run has advanced through the variant sequence.
#[derive(Debug)]
pub struct ProgressTracker {
    processed: BigUint,
    limit: Option<usize>,
    start_offset: BigUint,
}

impl ProgressTracker {
    /// `limit` bounds how many variants this run emits, independent of any
    /// cap carried by the `SelectionSpec` itself.
    pub fn new(start_offset: BigUint, limit: Option<usize>) -> Self {
        Self {
            processed: start_offset.clone(),
            limit,
            start_offset,
        }
    }

    /// Global position of the next variant to be emitted.
    pub fn processed(&self) -> &BigUint {
        &self.processed
    }

    pub fn start_offset(&self) -> &BigUint {
        &self.start_offset
    }

    pub fn processed_since_start(&self) -> BigUint {
        &self.processed - &self.start_offset
    }

    /// How many of the next `batch_size` variants this run may still emit.
    pub fn allowance(&self, batch_size: usize) -> usize {
        match self.limit {
            None => batch_size,
            Some(limit) => {
                let done = self.processed_since_start();
                let left = BigUint::from(limit).max(done.clone()) - done;
                batch_size.min(left.to_usize().unwrap_or(usize::MAX))
            }
        }
    }

    /// Record an emitted batch; returns false once the run limit is reached.
    pub fn record_batch(&mut self, batch_size: usize) -> bool {
        self.processed += BigUint::from(batch_size);
        self.limit
            .is_none_or(|limit| self.processed_since_start() < BigUint::from(limit))
    }
}
