use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out process-unique, strictly increasing request sequence numbers.
///
/// The counter starts at 0 and is bumped before use, so the first value is 1.
#[derive(Debug, Default)]
pub struct SequenceGenerator {
    last: AtomicU64,
}

impl SequenceGenerator {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    pub fn next(&self) -> u64 {
        self.last.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// Last value handed out, 0 if none yet.
    #[must_use]
    pub fn last(&self) -> u64 {
        self.last.load(Ordering::Relaxed)
    }
}
