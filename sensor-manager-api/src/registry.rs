//! The sensor registry: slot allocation, handle minting, and driver
//! lookup.
//!
//! A sensor's immutable descriptor and its `CallInfo` live here,
//! published atomically via the slot's `handle` field. The *mutable*
//! runtime state of a sensor -- `currentRate`/`currentLatency` in the
//! source, `SensorState` here -- deliberately does **not** live in
//! this table: that state is touched only from the manager task (see
//! `manager`), while this registry is the concurrent surface reachable
//! from any task, exactly as described for register/unregister. Moving
//! the mutable half out keeps the concurrent surface to what actually
//! needs to be concurrent.

use crate::bitset::AtomicBitset;
use crate::dispatch::CallInfo;
use crate::error::{Error, Result};
use crate::handle::{Handle, HandleMint};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

pub type SensorType = Arc<str>;

/// Immutable descriptor supplied by the driver at registration time.
#[derive(Clone)]
pub struct SensorInfo {
    pub sensor_type: SensorType,
    /// Discrete hardware rates this sensor supports, ascending.
    pub supported_rates: Arc<[u32]>,
}

impl SensorInfo {
    pub fn new(
        sensor_type: impl Into<SensorType>,
        supported_rates: impl Into<Arc<[u32]>>,
    ) -> Result<Self> {
        let supported_rates = supported_rates.into();

        if supported_rates.is_empty() {
            return Err(Error::InvArgument(
                "supported_rates must not be empty".into(),
            ));
        }
        if !supported_rates.windows(2).all(|w| w[0] < w[1]) {
            return Err(Error::InvArgument(
                "supported_rates must be strictly ascending".into(),
            ));
        }

        Ok(SensorInfo {
            sensor_type: sensor_type.into(),
            supported_rates,
        })
    }
}

struct Slot {
    handle: AtomicU32,
    payload: RwLock<Option<(SensorInfo, CallInfo)>>,
}

impl Slot {
    fn empty() -> Self {
        Slot {
            handle: AtomicU32::new(0),
            payload: RwLock::new(None),
        }
    }
}

pub struct Registry {
    slots: Vec<Slot>,
    free: AtomicBitset,
    mint: HandleMint,
}

impl Registry {
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);

        slots.resize_with(capacity, Slot::empty);

        Registry {
            slots,
            free: AtomicBitset::new(capacity),
            mint: HandleMint::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Finds a handle value not currently in use by any live slot.
    fn fresh_handle(&self) -> Handle {
        loop {
            let candidate = self.mint.next();

            if self.find_slot(candidate).is_none() {
                return candidate;
            }
        }
    }

    fn find_slot(&self, handle: Handle) -> Option<usize> {
        let target = handle.get();

        self.slots
            .iter()
            .position(|s| s.handle.load(Ordering::Acquire) == target)
    }

    /// Registers a new sensor, returning its handle, or `None` if the
    /// registry is at capacity.
    ///
    /// Writes the descriptor and `CallInfo` before publishing the
    /// handle: a reader that observes a non-zero handle on a slot is
    /// guaranteed -- by the `Release` store here paired with the
    /// `Acquire` load in `find_by_handle` -- to see the fully
    /// initialized payload, never a partial one.
    pub fn register(
        &self,
        info: SensorInfo,
        call_info: CallInfo,
    ) -> Option<Handle> {
        let idx = self.free.claim()?;
        let handle = self.fresh_handle();

        *self.slots[idx].payload.write().unwrap() = Some((info, call_info));
        self.slots[idx].handle.store(handle.get(), Ordering::Release);

        info!(handle = handle.get(), slot = idx, "sensor registered");
        Some(handle)
    }

    /// Invalidates the handle before releasing the slot, so a
    /// concurrent reader either sees the live record or a fully free
    /// slot, never a handle pointing at a cleared payload.
    pub fn unregister(&self, handle: Handle) -> bool {
        match self.find_slot(handle) {
            Some(idx) => {
                self.slots[idx].handle.store(0, Ordering::Release);
                *self.slots[idx].payload.write().unwrap() = None;
                self.free.release(idx);
                info!(handle = handle.get(), slot = idx, "sensor unregistered");
                true
            }
            None => {
                warn!(handle = handle.get(), "unregister of unknown handle");
                false
            }
        }
    }

    pub fn find_by_handle(&self, handle: Handle) -> Option<SensorInfo> {
        let idx = self.find_slot(handle)?;

        self.slots[idx]
            .payload
            .read()
            .unwrap()
            .as_ref()
            .map(|(info, _)| info.clone())
    }

    pub fn call_info(&self, handle: Handle) -> Option<CallInfo> {
        let idx = self.find_slot(handle)?;

        self.slots[idx]
            .payload
            .read()
            .unwrap()
            .as_ref()
            .map(|(_, call_info)| call_info.clone())
    }

    /// Returns the handle of the `index`-th live sensor of the given
    /// type, in slot order.
    pub fn find_by_type(
        &self,
        sensor_type: &str,
        index: usize,
    ) -> Option<(Handle, SensorInfo)> {
        self.slots
            .iter()
            .filter_map(|slot| {
                let raw = slot.handle.load(Ordering::Acquire);
                let handle = NonZeroU32::new(raw)?;
                let guard = slot.payload.read().unwrap();
                let (info, _) = guard.as_ref()?;

                (*info.sensor_type == *sensor_type)
                    .then(|| (handle, info.clone()))
            })
            .nth(index)
    }

    /// All live handles, in slot order. Used by the manager to drive
    /// the reconcile loop over every registered sensor.
    pub fn live_handles(&self) -> Vec<Handle> {
        self.slots
            .iter()
            .filter_map(|slot| {
                NonZeroU32::new(slot.handle.load(Ordering::Acquire))
            })
            .collect()
    }
}
