//! The dual nature of a driver reference, and the uniform call surface
//! over it.
//!
//! The source tags a raw pointer to distinguish an in-process ops
//! table from an out-of-process task id. Here that's an ordinary sum
//! type and dispatch is an exhaustive match -- no bit manipulation
//! leaks into the rest of the crate.

use crate::rate::{ActiveRate, Latency};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Synchronous operations an in-process driver exposes. Each returns
/// whether the operation was *accepted* -- actual completion, for
/// anything that takes real time (power, firmware, rate changes),
/// arrives later as a `CompletionEvent` through
/// `Manager::signal_internal_evt`.
pub trait SensorOps: Send + Sync {
    fn power(&self, on: bool) -> bool;
    fn firmware_upload(&self) -> bool;
    fn set_rate(&self, rate: ActiveRate, latency: Latency) -> bool;
    fn flush(&self) -> bool;
    fn trigger_ondemand(&self) -> bool;
}

/// Message codes sent to an out-of-process driver task, named after
/// the private event codes the source dispatches
/// (`APP_SENSOR_POWER`, `APP_SENSOR_FW_UPLD`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverEvent {
    Power(bool),
    FwUpload,
    SetRate(ActiveRate, Latency),
    Flush,
    TriggerOndemand,
}

impl fmt::Display for DriverEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DriverEvent::Power(on) => write!(f, "power({on})"),
            DriverEvent::FwUpload => write!(f, "firmware-upload"),
            DriverEvent::SetRate(r, l) => write!(f, "set-rate({r}, {l:?})"),
            DriverEvent::Flush => write!(f, "flush"),
            DriverEvent::TriggerOndemand => write!(f, "trigger-on-demand"),
        }
    }
}

/// Identifies a registered driver as either an in-process ops table or
/// an out-of-process task reachable by message.
#[derive(Clone)]
pub enum CallInfo {
    InProc(Arc<dyn SensorOps>),
    OutOfProc(mpsc::Sender<DriverEvent>),
}

impl CallInfo {
    /// Invokes a driver operation uniformly regardless of which kind
    /// of driver reference this is. For an in-process driver the
    /// return value is the driver's own accept/reject disposition. For
    /// an out-of-process driver, success means the event was
    /// successfully enqueued to the task -- not that the driver has
    /// finished the operation.
    pub fn dispatch(&self, op: DriverEvent) -> bool {
        debug!(op = %op, "dispatching sensor operation");

        match self {
            CallInfo::InProc(ops) => match op {
                DriverEvent::Power(on) => ops.power(on),
                DriverEvent::FwUpload => ops.firmware_upload(),
                DriverEvent::SetRate(rate, latency) => {
                    ops.set_rate(rate, latency)
                }
                DriverEvent::Flush => ops.flush(),
                DriverEvent::TriggerOndemand => ops.trigger_ondemand(),
            },

            CallInfo::OutOfProc(tx) => tx.try_send(op).is_ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Recorder {
        powered: AtomicBool,
        refuse: bool,
    }

    impl SensorOps for Recorder {
        fn power(&self, on: bool) -> bool {
            self.powered.store(on, Ordering::SeqCst);
            !self.refuse
        }
        fn firmware_upload(&self) -> bool {
            !self.refuse
        }
        fn set_rate(&self, _rate: ActiveRate, _latency: Latency) -> bool {
            !self.refuse
        }
        fn flush(&self) -> bool {
            !self.refuse
        }
        fn trigger_ondemand(&self) -> bool {
            !self.refuse
        }
    }

    #[test]
    fn in_proc_dispatch_calls_through() {
        let rec = Arc::new(Recorder {
            powered: AtomicBool::new(false),
            refuse: false,
        });
        let call_info = CallInfo::InProc(rec.clone());

        assert!(call_info.dispatch(DriverEvent::Power(true)));
        assert!(rec.powered.load(Ordering::SeqCst));
    }

    #[test]
    fn in_proc_dispatch_reports_refusal() {
        let rec = Arc::new(Recorder {
            powered: AtomicBool::new(false),
            refuse: true,
        });
        let call_info = CallInfo::InProc(rec);

        assert!(!call_info.dispatch(DriverEvent::Flush));
    }

    #[tokio::test]
    async fn out_of_proc_dispatch_enqueues() {
        let (tx, mut rx) = mpsc::channel(1);
        let call_info = CallInfo::OutOfProc(tx);

        assert!(call_info.dispatch(DriverEvent::TriggerOndemand));
        assert_eq!(rx.recv().await, Some(DriverEvent::TriggerOndemand));
    }

    #[tokio::test]
    async fn out_of_proc_dispatch_fails_when_full() {
        let (tx, _rx) = mpsc::channel(1);
        let call_info = CallInfo::OutOfProc(tx.clone());

        assert!(call_info.dispatch(DriverEvent::Flush));
        // Channel has capacity 1 and nothing has drained it yet.
        assert!(!call_info.dispatch(DriverEvent::Flush));
    }
}
