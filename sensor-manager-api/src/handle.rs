//! Sensor handles.
//!
//! A handle is a non-zero 32-bit identifier minted at `register` time.
//! Using `NonZeroU32` makes "0 means invalid" a property the type
//! system enforces -- a free slot is `Option<Handle> == None`, not a
//! magic zero value living inside a plain `u32`.

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};

pub type Handle = NonZeroU32;

/// Mints handles from a process-wide monotonic counter, skipping zero
/// and wrapping around on overflow. Wrap-around is checked against the
/// registry by the caller (see `Registry::register`), matching the
/// source's "increment, skipping 0 and any value currently in use"
/// rule -- the counter alone can't tell if a value is in use, so
/// `next` may have to be called more than once.
pub struct HandleMint {
    next: AtomicU32,
}

impl HandleMint {
    pub const fn new() -> Self {
        HandleMint {
            next: AtomicU32::new(1),
        }
    }

    /// Returns the next candidate handle, wrapping past zero. Does not
    /// check for collisions with live handles -- that's the registry's
    /// job, since only it knows which handles are live.
    pub fn next(&self) -> Handle {
        loop {
            let prev = self.next.fetch_add(1, Ordering::Relaxed);

            if let Some(h) = NonZeroU32::new(prev) {
                return h;
            }
            // prev == 0: the counter wrapped past u32::MAX back to 0.
            // Loop again; fetch_add already advanced past the bad value.
        }
    }
}

impl Default for HandleMint {
    fn default() -> Self {
        Self::new()
    }
}
