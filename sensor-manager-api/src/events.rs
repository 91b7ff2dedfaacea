//! Completion events signaled back from a driver after an asynchronous
//! operation finishes.
//!
//! The source dispatches these by an `intEvtNum` index into a table of
//! handler function pointers, with nothing stopping an out-of-range
//! index from being signaled. Here a completion is a typed enum, so
//! there is no dispatch table to index out of bounds in the first
//! place -- the match in `Manager::signal_internal_evt` is exhaustive
//! and checked at compile time.

use crate::rate::{ActiveRate, Latency};

/// An asynchronous completion reported by a driver for one of its
/// sensors. Carried alongside the sensor's `Handle` as a field on
/// `ManagerMsg::SignalInternalEvt`, not wrapped in its own type -- the
/// manager is the only consumer and always has both in hand already.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionEvent {
    /// The driver finished a `power()` call; `true` means powered on.
    PowerChanged(bool),
    /// The driver finished `firmware_upload()`; `true` means it
    /// succeeded, and the accompanying rate/latency are what the
    /// sensor should come up running (ignored on failure).
    FirmwareChanged {
        ok: bool,
        rate: ActiveRate,
        latency: Latency,
    },
    /// The driver finished applying a `set_rate()` call.
    RateChanged { rate: ActiveRate, latency: Latency },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_events_are_distinguishable() {
        let a = CompletionEvent::PowerChanged(true);
        let b = CompletionEvent::PowerChanged(false);

        assert_ne!(a, b);
    }
}
