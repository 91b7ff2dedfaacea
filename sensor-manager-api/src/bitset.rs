//! Lock-free fixed-capacity free-slot bitmap.
//!
//! Grounded on the atomic-bitmap slab allocator pattern used elsewhere
//! in the systems-Rust corpus: a single word of compare-and-swap bits
//! tracking which slots are claimed, with no locks and no `unsafe` --
//! this bitmap only ever hands out an index, never a pointer into
//! shared memory, so there's no aliasing to reason about. The payload
//! behind each index is a separate, independently-synchronized cell
//! (see `registry`).

use std::sync::atomic::{AtomicU64, Ordering};

/// Tracks up to 64 free/claimed slots with a single `AtomicU64`. A set
/// bit means "claimed". `MAX_REGISTERED_SENSORS`-sized registries fit
/// comfortably in one word for any embedded sensor hub's sensor count.
pub struct AtomicBitset {
    bits: AtomicU64,
    capacity: usize,
}

impl AtomicBitset {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity <= 64, "AtomicBitset supports at most 64 slots");
        AtomicBitset {
            bits: AtomicU64::new(0),
            capacity,
        }
    }

    /// Claims the lowest-indexed free slot, returning its index. Loops
    /// on CAS failure the way the slab allocator it's grounded on
    /// does; never blocks on a lock.
    pub fn claim(&self) -> Option<usize> {
        loop {
            let bits = self.bits.load(Ordering::Acquire);
            let candidate = (!bits).trailing_zeros() as usize;

            if candidate >= self.capacity {
                return None;
            }

            let new_bits = bits | (1u64 << candidate);

            if self
                .bits
                .compare_exchange(bits, new_bits, Ordering::Release, Ordering::Relaxed)
                .is_ok()
            {
                return Some(candidate);
            }
            // Lost the race to another claimant; retry against fresh bits.
        }
    }

    /// Returns a slot to the free pool. Idempotent: releasing an
    /// already-free slot clears a bit that's already clear.
    pub fn release(&self, index: usize) {
        debug_assert!(index < self.capacity);

        self.bits.fetch_and(!(1u64 << index), Ordering::Release);
    }

    pub fn is_claimed(&self, index: usize) -> bool {
        index < self.capacity
            && self.bits.load(Ordering::Acquire) & (1u64 << index) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_lowest_free_index_first() {
        let bs = AtomicBitset::new(4);

        assert_eq!(bs.claim(), Some(0));
        assert_eq!(bs.claim(), Some(1));
        bs.release(0);
        assert_eq!(bs.claim(), Some(0));
    }

    #[test]
    fn reports_full_when_capacity_exhausted() {
        let bs = AtomicBitset::new(2);

        assert_eq!(bs.claim(), Some(0));
        assert_eq!(bs.claim(), Some(1));
        assert_eq!(bs.claim(), None);
    }

    #[test]
    fn release_then_reclaim_roundtrips() {
        let bs = AtomicBitset::new(2);
        let a = bs.claim().unwrap();

        assert!(bs.is_claimed(a));
        bs.release(a);
        assert!(!bs.is_claimed(a));
    }
}
