//! An in-process demonstration sensor: its `SensorOps` calls run
//! directly on the caller's stack and report completion by calling
//! back into the manager from a spawned task.

use std::sync::OnceLock;
use std::time::Duration;

use sensor_manager_api::dispatch::SensorOps;
use sensor_manager_api::events::CompletionEvent;
use sensor_manager_api::rate::{ActiveRate, Latency};
use sensor_manager_api::{Handle, ManagerHandle};

/// The `handle` field is unknown until after `ManagerHandle::register`
/// returns it, so it's bound in afterward via `bind` -- the same
/// chicken-and-egg problem the out-of-process driver solves with a
/// oneshot, solved here with a `OnceLock` since this type is shared via
/// `Arc` rather than moved into a task.
pub struct VirtualSensor {
    manager: ManagerHandle,
    handle: OnceLock<Handle>,
}

impl VirtualSensor {
    pub fn new(manager: ManagerHandle) -> Self {
        VirtualSensor {
            manager,
            handle: OnceLock::new(),
        }
    }

    pub fn bind(&self, handle: Handle) {
        let _ = self.handle.set(handle);
    }
}

impl SensorOps for VirtualSensor {
    fn power(&self, on: bool) -> bool {
        let Some(&handle) = self.handle.get() else {
            return false;
        };
        let manager = self.manager.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let _ = manager
                .signal_internal_evt(handle, CompletionEvent::PowerChanged(on))
                .await;
        });
        true
    }

    fn firmware_upload(&self) -> bool {
        let Some(&handle) = self.handle.get() else {
            return false;
        };
        let manager = self.manager.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let _ = manager
                .signal_internal_evt(
                    handle,
                    CompletionEvent::FirmwareChanged {
                        ok: true,
                        rate: ActiveRate::OnDemand,
                        latency: None,
                    },
                )
                .await;
        });
        true
    }

    fn set_rate(&self, rate: ActiveRate, latency: Latency) -> bool {
        let Some(&handle) = self.handle.get() else {
            return false;
        };
        let manager = self.manager.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let _ = manager
                .signal_internal_evt(handle, CompletionEvent::RateChanged { rate, latency })
                .await;
        });
        true
    }

    fn flush(&self) -> bool {
        self.handle.get().is_some()
    }

    fn trigger_ondemand(&self) -> bool {
        self.handle.get().is_some()
    }
}
