//! The bounded table of live `(sensor, client) -> (rate, latency)`
//! requests that the aggregator scans.

use crate::pool::BoundedPool;
use crate::rate::{Latency, RequestedRate};
use crate::Handle;

/// Identifies a subscriber. Plain `u32` wrapped in a newtype so it
/// can't be confused with a sensor `Handle` at a call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub u32);

#[derive(Debug, Clone, Copy)]
struct RequestRecord {
    handle: Handle,
    client: ClientId,
    rate: RequestedRate,
    latency: Latency,
}

pub struct RequestTable {
    pool: BoundedPool<RequestRecord>,
}

impl RequestTable {
    pub fn with_capacity(capacity: usize) -> Self {
        RequestTable {
            pool: BoundedPool::with_capacity(capacity),
        }
    }

    fn find(&self, handle: Handle, client: ClientId) -> Option<usize> {
        self.pool
            .position(|r| r.handle == handle && r.client == client)
    }

    /// Allocates a new record. Returns `false` if the table is full.
    /// Does **not** reject a duplicate `(handle, client)` pair -- a
    /// second `add` for the same pair appends a second, independent
    /// record, which the aggregator will then count twice. This
    /// mirrors the source's behavior exactly (see the design notes'
    /// discussion of stacking vs. rejecting duplicates): a client that
    /// calls `request` twice for the same sensor is stacking two
    /// requests, not amending one, and must call `release` twice (or
    /// call `amend`, which updates in place) to fully retract.
    pub fn add(
        &mut self,
        handle: Handle,
        client: ClientId,
        rate: RequestedRate,
        latency: Latency,
    ) -> bool {
        self.pool
            .insert(RequestRecord {
                handle,
                client,
                rate,
                latency,
            })
            .is_some()
    }

    pub fn get(
        &self,
        handle: Handle,
        client: ClientId,
    ) -> Option<(RequestedRate, Latency)> {
        let idx = self.find(handle, client)?;
        let record = self.pool.get(idx)?;

        Some((record.rate, record.latency))
    }

    pub fn amend(
        &mut self,
        handle: Handle,
        client: ClientId,
        rate: RequestedRate,
        latency: Latency,
    ) -> bool {
        match self.find(handle, client) {
            Some(idx) => {
                if let Some(record) = self.pool.get_mut(idx) {
                    record.rate = rate;
                    record.latency = latency;
                    true
                } else {
                    false
                }
            }
            None => false,
        }
    }

    pub fn delete(&mut self, handle: Handle, client: ClientId) -> bool {
        match self.find(handle, client) {
            Some(idx) => self.pool.remove(idx).is_some(),
            None => false,
        }
    }

    /// Live `(rate, latency)` pairs for a sensor, in pool-index order
    /// (not otherwise meaningful). This is what `Aggregator` scans.
    pub fn requests_for(
        &self,
        handle: Handle,
    ) -> impl Iterator<Item = (RequestedRate, Latency)> + '_ {
        self.pool
            .iter()
            .filter(move |r| r.handle == handle)
            .map(|r| (r.rate, r.latency))
    }

    /// Whether the given client has any live request against the
    /// given sensor. Used by `trigger_ondemand`'s client check.
    pub fn has_request(&self, handle: Handle, client: ClientId) -> bool {
        self.find(handle, client).is_some()
    }

    /// Drops every live request against a sensor. Called when a sensor
    /// is unregistered: its handle can be reused by a future
    /// registration, and a stale request must never attach to the
    /// wrong sensor.
    pub fn clear_sensor(&mut self, handle: Handle) {
        for idx in 0..self.pool.capacity() {
            if self.pool.get(idx).is_some_and(|r| r.handle == handle) {
                self.pool.remove(idx);
            }
        }
    }
}
