//! The manager task: the single serialized execution context that owns
//! the request table and every sensor's runtime state, and the
//! `ManagerHandle` other tasks use to talk to it.
//!
//! Grounded on the core task's `State`/`run` split: one struct holds
//! everything that must only ever be touched by one task at a time,
//! and a cheaply-`Clone`-able handle wraps an `mpsc::Sender` so any
//! number of callers can reach it without sharing a lock.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, info_span, warn};
use tracing_futures::Instrument;

use crate::aggregate::{calc_hw_latency, calc_hw_rate};
use crate::dispatch::CallInfo;
use crate::error::{Error, Result};
use crate::events::CompletionEvent;
use crate::handle::Handle;
use crate::rate::{ActiveRate, HwRate, Latency, RequestedRate};
use crate::registry::{Registry, SensorInfo, SensorType};
use crate::request_table::{ClientId, RequestTable};
use crate::state::{self, Followup, SensorState};

/// Requests the manager task accepts, one variant per public
/// operation. Each carries a `oneshot::Sender` for its reply, except
/// the fire-and-forget completion signal.
enum ManagerMsg {
    Register {
        info: SensorInfo,
        call_info: CallInfo,
        rpy: oneshot::Sender<Option<Handle>>,
    },
    Unregister {
        handle: Handle,
        rpy: oneshot::Sender<bool>,
    },
    Request {
        handle: Handle,
        client: ClientId,
        rate: RequestedRate,
        latency: Latency,
        rpy: oneshot::Sender<Result<()>>,
    },
    Amend {
        handle: Handle,
        client: ClientId,
        rate: RequestedRate,
        latency: Latency,
        rpy: oneshot::Sender<Result<()>>,
    },
    Release {
        handle: Handle,
        client: ClientId,
        rpy: oneshot::Sender<Result<()>>,
    },
    TriggerOndemand {
        handle: Handle,
        client: ClientId,
        rpy: oneshot::Sender<Result<()>>,
    },
    Flush {
        handle: Handle,
        rpy: oneshot::Sender<Result<()>>,
    },
    GetCurRate {
        handle: Handle,
        rpy: oneshot::Sender<Option<ActiveRate>>,
    },
    GetCurLatency {
        handle: Handle,
        rpy: oneshot::Sender<Latency>,
    },
    SignalInternalEvt {
        handle: Handle,
        event: CompletionEvent,
    },
    ListSensors {
        rpy: oneshot::Sender<Vec<(Handle, SensorType)>>,
    },
    SensorTypeOf {
        handle: Handle,
        rpy: oneshot::Sender<Option<SensorType>>,
    },
}

/// A cheaply-cloned handle to the manager task. This is the crate's
/// public surface: every method sends a `ManagerMsg` and awaits its
/// reply over a dedicated oneshot channel.
#[derive(Clone)]
pub struct ManagerHandle {
    tx: mpsc::Sender<ManagerMsg>,
}

impl ManagerHandle {
    pub async fn register(
        &self,
        info: SensorInfo,
        call_info: CallInfo,
    ) -> Result<Handle> {
        let (rpy, rx) = oneshot::channel();

        self.tx
            .send(ManagerMsg::Register { info, call_info, rpy })
            .await?;
        rx.await?.ok_or(Error::CapacityExhausted)
    }

    pub async fn unregister(&self, handle: Handle) -> Result<()> {
        let (rpy, rx) = oneshot::channel();

        self.tx.send(ManagerMsg::Unregister { handle, rpy }).await?;
        if rx.await? {
            Ok(())
        } else {
            Err(Error::UnknownHandle)
        }
    }

    pub async fn request(
        &self,
        handle: Handle,
        client: ClientId,
        rate: RequestedRate,
        latency: Latency,
    ) -> Result<()> {
        let (rpy, rx) = oneshot::channel();

        self.tx
            .send(ManagerMsg::Request { handle, client, rate, latency, rpy })
            .await?;
        rx.await?
    }

    pub async fn amend(
        &self,
        handle: Handle,
        client: ClientId,
        rate: RequestedRate,
        latency: Latency,
    ) -> Result<()> {
        let (rpy, rx) = oneshot::channel();

        self.tx
            .send(ManagerMsg::Amend { handle, client, rate, latency, rpy })
            .await?;
        rx.await?
    }

    pub async fn release(&self, handle: Handle, client: ClientId) -> Result<()> {
        let (rpy, rx) = oneshot::channel();

        self.tx
            .send(ManagerMsg::Release { handle, client, rpy })
            .await?;
        rx.await?
    }

    pub async fn trigger_ondemand(
        &self,
        handle: Handle,
        client: ClientId,
    ) -> Result<()> {
        let (rpy, rx) = oneshot::channel();

        self.tx
            .send(ManagerMsg::TriggerOndemand { handle, client, rpy })
            .await?;
        rx.await?
    }

    pub async fn flush(&self, handle: Handle) -> Result<()> {
        let (rpy, rx) = oneshot::channel();

        self.tx.send(ManagerMsg::Flush { handle, rpy }).await?;
        rx.await?
    }

    pub async fn get_cur_rate(&self, handle: Handle) -> Result<Option<ActiveRate>> {
        let (rpy, rx) = oneshot::channel();

        self.tx.send(ManagerMsg::GetCurRate { handle, rpy }).await?;
        Ok(rx.await?)
    }

    pub async fn get_cur_latency(&self, handle: Handle) -> Result<Latency> {
        let (rpy, rx) = oneshot::channel();

        self.tx.send(ManagerMsg::GetCurLatency { handle, rpy }).await?;
        Ok(rx.await?)
    }

    /// Fire-and-forget: a driver reports that an asynchronous operation
    /// on one of its sensors has completed.
    pub async fn signal_internal_evt(
        &self,
        handle: Handle,
        event: CompletionEvent,
    ) -> Result<()> {
        self.tx
            .send(ManagerMsg::SignalInternalEvt { handle, event })
            .await?;
        Ok(())
    }

    pub async fn list_sensors(&self) -> Result<Vec<(Handle, SensorType)>> {
        let (rpy, rx) = oneshot::channel();

        self.tx.send(ManagerMsg::ListSensors { rpy }).await?;
        Ok(rx.await?)
    }

    pub async fn sensor_type(&self, handle: Handle) -> Result<Option<SensorType>> {
        let (rpy, rx) = oneshot::channel();

        self.tx.send(ManagerMsg::SensorTypeOf { handle, rpy }).await?;
        Ok(rx.await?)
    }
}

/// Owns the request table and the per-sensor state machines. The
/// registry is shared (it's reachable from any task that holds a
/// `ManagerHandle`'s sibling driver registration API), but everything
/// in here is private to this task.
struct Manager {
    registry: Arc<Registry>,
    request_table: RequestTable,
    states: HashMap<Handle, SensorState>,
}

impl Manager {
    fn new(registry: Arc<Registry>, request_capacity: usize) -> Self {
        Manager {
            registry,
            request_table: RequestTable::with_capacity(request_capacity),
            states: HashMap::new(),
        }
    }

    fn register(&mut self, info: SensorInfo, call_info: CallInfo) -> Option<Handle> {
        let handle = self.registry.register(info, call_info)?;

        self.states.insert(handle, SensorState::Off);
        Some(handle)
    }

    fn unregister(&mut self, handle: Handle) -> bool {
        if self.registry.unregister(handle) {
            self.states.remove(&handle);
            self.request_table.clear_sensor(handle);
            true
        } else {
            false
        }
    }

    /// Recomputes the aggregate target for a sensor from its live
    /// request set and reconciles its state machine against it.
    fn reconcile_sensor(&mut self, handle: Handle) {
        let Some(info) = self.registry.find_by_handle(handle) else {
            return;
        };
        let Some(call_info) = self.registry.call_info(handle) else {
            return;
        };
        let Some(state) = self.states.get_mut(&handle) else {
            return;
        };

        let target_rate = match calc_hw_rate(
            &info.supported_rates,
            self.request_table.requests_for(handle).map(|(r, _)| r),
            None,
            None,
        ) {
            Ok(r) => r,
            Err(_) => {
                // Can't happen: request/amend pre-validate this exact
                // aggregation before committing to the table. Fail
                // safe rather than wedge the sensor on a bug.
                warn!(handle = handle.get(), "aggregate rate turned infeasible after commit");
                HwRate::Off
            }
        };
        let target_latency = calc_hw_latency(
            self.request_table.requests_for(handle).map(|(_, l)| l),
        );

        state::reconcile(state, &call_info, target_rate, target_latency);
    }

    fn handle_request(
        &mut self,
        handle: Handle,
        client: ClientId,
        rate: RequestedRate,
        latency: Latency,
    ) -> Result<()> {
        let info = self
            .registry
            .find_by_handle(handle)
            .ok_or(Error::UnknownHandle)?;

        calc_hw_rate(
            &info.supported_rates,
            self.request_table.requests_for(handle).map(|(r, _)| r),
            Some(rate),
            None,
        )
        .map_err(|_| Error::Infeasible)?;

        if !self.request_table.add(handle, client, rate, latency) {
            return Err(Error::CapacityExhausted);
        }

        self.reconcile_sensor(handle);
        Ok(())
    }

    fn handle_amend(
        &mut self,
        handle: Handle,
        client: ClientId,
        rate: RequestedRate,
        latency: Latency,
    ) -> Result<()> {
        let info = self
            .registry
            .find_by_handle(handle)
            .ok_or(Error::UnknownHandle)?;

        let (old_rate, _) = self
            .request_table
            .get(handle, client)
            .ok_or(Error::UnknownClient)?;

        calc_hw_rate(
            &info.supported_rates,
            self.request_table.requests_for(handle).map(|(r, _)| r),
            Some(rate),
            Some(old_rate),
        )
        .map_err(|_| Error::Infeasible)?;

        self.request_table.amend(handle, client, rate, latency);
        self.reconcile_sensor(handle);
        Ok(())
    }

    fn handle_release(&mut self, handle: Handle, client: ClientId) -> Result<()> {
        if !self.request_table.delete(handle, client) {
            return Err(Error::UnknownClient);
        }

        self.reconcile_sensor(handle);
        Ok(())
    }

    fn handle_trigger_ondemand(
        &mut self,
        handle: Handle,
        client: ClientId,
    ) -> Result<()> {
        if !self.request_table.has_request(handle, client) {
            return Err(Error::UnknownClient);
        }

        let call_info = self.registry.call_info(handle).ok_or(Error::UnknownHandle)?;

        if call_info.dispatch(crate::dispatch::DriverEvent::TriggerOndemand) {
            Ok(())
        } else {
            Err(Error::DriverRefused)
        }
    }

    /// Unlike `trigger_ondemand`, no live request is required: `flush`
    /// takes only a handle, per the public API contract.
    fn handle_flush(&mut self, handle: Handle) -> Result<()> {
        let call_info = self.registry.call_info(handle).ok_or(Error::UnknownHandle)?;

        if call_info.dispatch(crate::dispatch::DriverEvent::Flush) {
            Ok(())
        } else {
            Err(Error::DriverRefused)
        }
    }

    /// An unknown handle reports the same neutral disposition as a
    /// known, unpowered sensor (`None`, standing in for the source's
    /// `OFF`) rather than an error -- these are snapshot queries, and
    /// the public API contract defines their unknown-handle behavior as
    /// a value, not a rejection.
    fn handle_get_cur_rate(&self, handle: Handle) -> Option<ActiveRate> {
        match self.states.get(&handle) {
            Some(SensorState::Active { rate, .. }) => Some(*rate),
            _ => None,
        }
    }

    fn handle_get_cur_latency(&self, handle: Handle) -> Latency {
        match self.states.get(&handle) {
            Some(SensorState::Active { latency, .. }) => *latency,
            _ => None,
        }
    }

    fn handle_signal(&mut self, handle: Handle, event: CompletionEvent) {
        let Some(call_info) = self.registry.call_info(handle) else {
            warn!(handle = handle.get(), "completion event for unknown sensor");
            return;
        };
        let Some(state) = self.states.get_mut(&handle) else {
            return;
        };

        let followup = match event {
            CompletionEvent::PowerChanged(on) => {
                state::on_power_changed(state, &call_info, on);
                Followup::None
            }
            CompletionEvent::FirmwareChanged { ok, rate, latency } => {
                state::on_firmware_changed(state, &call_info, ok, rate, latency)
            }
            CompletionEvent::RateChanged { rate, latency } => {
                state::on_rate_changed(state, rate, latency);
                Followup::None
            }
        };

        if followup == Followup::Reconcile {
            self.reconcile_sensor(handle);
        }
    }

    fn handle_list_sensors(&self) -> Vec<(Handle, SensorType)> {
        self.registry
            .live_handles()
            .into_iter()
            .filter_map(|h| {
                self.registry
                    .find_by_handle(h)
                    .map(|info| (h, info.sensor_type))
            })
            .collect()
    }

    async fn dispatch(&mut self, msg: ManagerMsg) {
        match msg {
            ManagerMsg::Register { info, call_info, rpy } => {
                let handle = self.register(info, call_info);

                if rpy.send(handle).is_err() {
                    warn!("caller gone before register() reply could be sent");
                }
            }

            ManagerMsg::Unregister { handle, rpy } => {
                let ok = self.unregister(handle);

                if rpy.send(ok).is_err() {
                    warn!("caller gone before unregister() reply could be sent");
                }
            }

            ManagerMsg::Request { handle, client, rate, latency, rpy } => {
                let result = self.handle_request(handle, client, rate, latency);

                if rpy.send(result).is_err() {
                    warn!("caller gone before request() reply could be sent");
                }
            }

            ManagerMsg::Amend { handle, client, rate, latency, rpy } => {
                let result = self.handle_amend(handle, client, rate, latency);

                if rpy.send(result).is_err() {
                    warn!("caller gone before amend() reply could be sent");
                }
            }

            ManagerMsg::Release { handle, client, rpy } => {
                let result = self.handle_release(handle, client);

                if rpy.send(result).is_err() {
                    warn!("caller gone before release() reply could be sent");
                }
            }

            ManagerMsg::TriggerOndemand { handle, client, rpy } => {
                let result = self.handle_trigger_ondemand(handle, client);

                if rpy.send(result).is_err() {
                    warn!("caller gone before trigger_ondemand() reply could be sent");
                }
            }

            ManagerMsg::Flush { handle, rpy } => {
                let result = self.handle_flush(handle);

                if rpy.send(result).is_err() {
                    warn!("caller gone before flush() reply could be sent");
                }
            }

            ManagerMsg::GetCurRate { handle, rpy } => {
                let result = self.handle_get_cur_rate(handle);

                if rpy.send(result).is_err() {
                    warn!("caller gone before get_cur_rate() reply could be sent");
                }
            }

            ManagerMsg::GetCurLatency { handle, rpy } => {
                let result = self.handle_get_cur_latency(handle);

                if rpy.send(result).is_err() {
                    warn!("caller gone before get_cur_latency() reply could be sent");
                }
            }

            ManagerMsg::SignalInternalEvt { handle, event } => {
                self.handle_signal(handle, event);
            }

            ManagerMsg::ListSensors { rpy } => {
                let result = self.handle_list_sensors();

                if rpy.send(result).is_err() {
                    warn!("caller gone before list_sensors() reply could be sent");
                }
            }

            ManagerMsg::SensorTypeOf { handle, rpy } => {
                let result = self
                    .registry
                    .find_by_handle(handle)
                    .map(|info| info.sensor_type);

                if rpy.send(result).is_err() {
                    warn!("caller gone before sensor_type() reply could be sent");
                }
            }
        }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<ManagerMsg>) -> Result<Infallible> {
        info!("starting");

        while let Some(msg) = rx.recv().await {
            self.dispatch(msg).instrument(info_span!("manager_msg")).await;
        }

        const ERR_MSG: &str = "every manager handle dropped";

        warn!(ERR_MSG);
        Err(Error::MissingPeer(ERR_MSG.to_string()))
    }
}

/// Spawns the manager task over a fresh registry of the given capacity
/// and a request table sized for `request_capacity` live subscriptions.
/// Returns a cloneable handle and the task's `JoinHandle`.
pub fn start(
    registry: Arc<Registry>,
    request_capacity: usize,
    channel_capacity: usize,
) -> (ManagerHandle, JoinHandle<Result<Infallible>>) {
    let (tx, rx) = mpsc::channel(channel_capacity);
    let manager = Manager::new(registry, request_capacity);

    let join = tokio::spawn(manager.run(rx).instrument(info_span!("sensor_manager")));

    (ManagerHandle { tx }, join)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::SensorOps;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Recorder {
        powered: AtomicBool,
    }

    impl SensorOps for Recorder {
        fn power(&self, on: bool) -> bool {
            self.powered.store(on, Ordering::SeqCst);
            true
        }
        fn firmware_upload(&self) -> bool {
            true
        }
        fn set_rate(&self, _rate: ActiveRate, _latency: Latency) -> bool {
            true
        }
        fn flush(&self) -> bool {
            true
        }
        fn trigger_ondemand(&self) -> bool {
            true
        }
    }

    fn make_manager() -> ManagerHandle {
        let registry = Arc::new(Registry::new(8));
        let (handle, _join) = start(registry, 8, 8);
        handle
    }

    async fn register_accel(mgr: &ManagerHandle) -> (Handle, Arc<Recorder>) {
        let rec = Arc::new(Recorder { powered: AtomicBool::new(false) });
        let info = SensorInfo::new("accel", [10, 50, 100]).unwrap();
        let handle = mgr
            .register(info, CallInfo::InProc(rec.clone()))
            .await
            .unwrap();

        (handle, rec)
    }

    #[tokio::test]
    async fn s1_cold_start_requests_power_on() {
        let mgr = make_manager();
        let (handle, rec) = register_accel(&mgr).await;

        mgr.request(handle, ClientId(1), RequestedRate::Hz(10), None)
            .await
            .unwrap();

        assert!(rec.powered.load(Ordering::SeqCst));
        assert_eq!(mgr.get_cur_rate(handle).await.unwrap(), None);

        mgr.signal_internal_evt(handle, CompletionEvent::PowerChanged(true))
            .await
            .unwrap();
        mgr.signal_internal_evt(
            handle,
            CompletionEvent::FirmwareChanged {
                ok: true,
                rate: ActiveRate::Hz(10),
                latency: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(mgr.get_cur_rate(handle).await.unwrap(), Some(ActiveRate::Hz(10)));
    }

    #[tokio::test]
    async fn s2_unsupported_rate_is_rejected_before_mutating_the_table() {
        let mgr = make_manager();
        let (handle, _rec) = register_accel(&mgr).await;

        let err = mgr
            .request(handle, ClientId(1), RequestedRate::Hz(1000), None)
            .await
            .unwrap_err();

        assert_eq!(err, Error::Infeasible);
        assert_eq!(mgr.get_cur_rate(handle).await.unwrap(), None);
    }

    #[tokio::test]
    async fn s3_two_clients_aggregate_to_the_faster_rate() {
        let mgr = make_manager();
        let (handle, _rec) = register_accel(&mgr).await;

        mgr.request(handle, ClientId(1), RequestedRate::Hz(10), None)
            .await
            .unwrap();
        mgr.signal_internal_evt(handle, CompletionEvent::PowerChanged(true))
            .await
            .unwrap();
        mgr.signal_internal_evt(
            handle,
            CompletionEvent::FirmwareChanged { ok: true, rate: ActiveRate::Hz(10), latency: None },
        )
        .await
        .unwrap();

        mgr.request(handle, ClientId(2), RequestedRate::Hz(50), None)
            .await
            .unwrap();
        mgr.signal_internal_evt(
            handle,
            CompletionEvent::RateChanged { rate: ActiveRate::Hz(50), latency: None },
        )
        .await
        .unwrap();

        assert_eq!(mgr.get_cur_rate(handle).await.unwrap(), Some(ActiveRate::Hz(50)));

        mgr.release(handle, ClientId(2)).await.unwrap();
        mgr.signal_internal_evt(
            handle,
            CompletionEvent::RateChanged { rate: ActiveRate::Hz(10), latency: None },
        )
        .await
        .unwrap();

        assert_eq!(mgr.get_cur_rate(handle).await.unwrap(), Some(ActiveRate::Hz(10)));
    }

    #[tokio::test]
    async fn s4_amend_during_power_on_is_deferred_until_firmware_completes() {
        let mgr = make_manager();
        let (handle, _rec) = register_accel(&mgr).await;

        mgr.request(handle, ClientId(1), RequestedRate::Hz(10), None)
            .await
            .unwrap();

        // Power-on is still outstanding; an amend is accepted into the
        // table but can't move the hardware yet.
        mgr.amend(handle, ClientId(1), RequestedRate::Hz(50), None)
            .await
            .unwrap();
        assert_eq!(mgr.get_cur_rate(handle).await.unwrap(), None);

        mgr.signal_internal_evt(handle, CompletionEvent::PowerChanged(true))
            .await
            .unwrap();
        mgr.signal_internal_evt(
            handle,
            CompletionEvent::FirmwareChanged { ok: true, rate: ActiveRate::Hz(50), latency: None },
        )
        .await
        .unwrap();

        assert_eq!(mgr.get_cur_rate(handle).await.unwrap(), Some(ActiveRate::Hz(50)));
    }

    #[tokio::test]
    async fn s5_flip_during_power_off_short_circuits_without_power_call() {
        let mgr = make_manager();
        let (handle, rec) = register_accel(&mgr).await;

        mgr.request(handle, ClientId(1), RequestedRate::Hz(10), None)
            .await
            .unwrap();
        mgr.signal_internal_evt(handle, CompletionEvent::PowerChanged(true))
            .await
            .unwrap();
        mgr.signal_internal_evt(
            handle,
            CompletionEvent::FirmwareChanged { ok: true, rate: ActiveRate::Hz(10), latency: None },
        )
        .await
        .unwrap();
        assert!(rec.powered.load(Ordering::SeqCst));

        // Releasing the only client starts a power-off...
        mgr.release(handle, ClientId(1)).await.unwrap();

        // ...but before its completion arrives, a new client shows up and
        // flips the target back to "on" without a fresh power(true) call.
        mgr.request(handle, ClientId(2), RequestedRate::Hz(10), None)
            .await
            .unwrap();

        // The outstanding power-off completion finally arrives; the
        // manager sees the sensor already wants to come back up and
        // re-issues power(true) itself.
        mgr.signal_internal_evt(handle, CompletionEvent::PowerChanged(false))
            .await
            .unwrap();
        assert!(rec.powered.load(Ordering::SeqCst));

        mgr.signal_internal_evt(handle, CompletionEvent::PowerChanged(true))
            .await
            .unwrap();
        mgr.signal_internal_evt(
            handle,
            CompletionEvent::FirmwareChanged { ok: true, rate: ActiveRate::Hz(10), latency: None },
        )
        .await
        .unwrap();

        assert_eq!(mgr.get_cur_rate(handle).await.unwrap(), Some(ActiveRate::Hz(10)));
    }

    #[tokio::test]
    async fn s6_ondemand_coexists_with_continuous_rate() {
        let mgr = make_manager();
        let (handle, _rec) = register_accel(&mgr).await;

        mgr.request(handle, ClientId(1), RequestedRate::OnDemand, None)
            .await
            .unwrap();
        mgr.request(handle, ClientId(2), RequestedRate::Hz(10), None)
            .await
            .unwrap();

        mgr.signal_internal_evt(handle, CompletionEvent::PowerChanged(true))
            .await
            .unwrap();
        mgr.signal_internal_evt(
            handle,
            CompletionEvent::FirmwareChanged { ok: true, rate: ActiveRate::Hz(10), latency: None },
        )
        .await
        .unwrap();
        assert_eq!(mgr.get_cur_rate(handle).await.unwrap(), Some(ActiveRate::Hz(10)));

        // The continuous client releases; on-demand alone remains, which
        // is still a workload, so the sensor stays powered -- just at the
        // on-demand pseudo-rate instead of being powered off.
        mgr.release(handle, ClientId(2)).await.unwrap();
        mgr.signal_internal_evt(
            handle,
            CompletionEvent::RateChanged { rate: ActiveRate::OnDemand, latency: None },
        )
        .await
        .unwrap();

        assert_eq!(mgr.get_cur_rate(handle).await.unwrap(), Some(ActiveRate::OnDemand));
    }

    #[tokio::test]
    async fn release_unknown_client_is_an_error() {
        let mgr = make_manager();
        let (handle, _rec) = register_accel(&mgr).await;

        let err = mgr.release(handle, ClientId(99)).await.unwrap_err();
        assert_eq!(err, Error::UnknownClient);
    }

    #[tokio::test]
    async fn unregister_clears_outstanding_requests() {
        let mgr = make_manager();
        let (handle, _rec) = register_accel(&mgr).await;

        mgr.request(handle, ClientId(1), RequestedRate::Hz(10), None)
            .await
            .unwrap();
        mgr.unregister(handle).await.unwrap();

        // An unknown handle reports the same neutral "off" disposition
        // as a never-requested sensor, not an error -- see spec §4.6.
        assert_eq!(mgr.get_cur_rate(handle).await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_sensors_reports_registered_types() {
        let mgr = make_manager();
        let (handle, _rec) = register_accel(&mgr).await;

        let sensors = mgr.list_sensors().await.unwrap();

        assert_eq!(sensors.len(), 1);
        assert_eq!(sensors[0].0, handle);
        assert_eq!(&*sensors[0].1, "accel");
        assert_eq!(mgr.sensor_type(handle).await.unwrap().as_deref(), Some("accel"));
    }

    #[tokio::test]
    async fn trigger_ondemand_requires_a_live_request() {
        let mgr = make_manager();
        let (handle, _rec) = register_accel(&mgr).await;

        let err = mgr.trigger_ondemand(handle, ClientId(1)).await.unwrap_err();
        assert_eq!(err, Error::UnknownClient);

        mgr.request(handle, ClientId(1), RequestedRate::OnDemand, None)
            .await
            .unwrap();
        mgr.trigger_ondemand(handle, ClientId(1)).await.unwrap();
    }
}
