//! The per-sensor power/firmware/rate state machine.
//!
//! `SensorState` replaces the source's overloaded `currentRate`
//! sentinels (`OFF`, `POWERING_ON`, `FW_UPLOADING`, `POWERING_OFF` living
//! in the same integer as real rates) with a sum type, per the design
//! note calling for exactly that. `reconcile` is the single entry point
//! invoked after every client-side change and after every completion
//! event that might have moved the target; it issues at most one
//! driver operation per call.

use crate::dispatch::{CallInfo, DriverEvent};
use crate::rate::{ActiveRate, HwRate, Latency};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorState {
    Off,
    PoweringOn,
    FwUploading,
    PoweringOff,
    Active { rate: ActiveRate, latency: Latency },
}

impl SensorState {
    /// If this state represents a steady-state hardware configuration
    /// (as opposed to one mid-transition), the `(rate, latency)` it
    /// corresponds to. Transitional states never compare equal to a
    /// target, since a target is always one of `HwRate`'s steady
    /// values -- this is exactly what lets reconcile's "already there"
    /// check be a plain equality test.
    fn steady_target(&self) -> Option<(HwRate, Latency)> {
        match self {
            SensorState::Off => Some((HwRate::Off, None)),
            SensorState::Active { rate, latency } => {
                Some(((*rate).into(), *latency))
            }
            SensorState::PoweringOn
            | SensorState::FwUploading
            | SensorState::PoweringOff => None,
        }
    }
}

/// Compares the sensor's current state against the aggregated target
/// and issues at most one driver operation to close the gap.
pub fn reconcile(
    state: &mut SensorState,
    call_info: &CallInfo,
    target_rate: HwRate,
    target_latency: Latency,
) {
    if state.steady_target() == Some((target_rate, target_latency)) {
        return;
    }

    match state {
        SensorState::Off => {
            if call_info.dispatch(DriverEvent::Power(true)) {
                *state = SensorState::PoweringOn;
            }
        }

        // The outstanding power-off completion, when it arrives, finds
        // the sensor already wanting to come back up and re-issues
        // `power(true)` itself -- see `on_power_changed`.
        SensorState::PoweringOff => {
            *state = SensorState::PoweringOn;
        }

        SensorState::PoweringOn | SensorState::FwUploading => {
            // Deferred: will be re-reconciled when the pending
            // completion event arrives.
        }

        SensorState::Active { .. } => {
            if target_rate == HwRate::Off {
                if call_info.dispatch(DriverEvent::Power(false)) {
                    *state = SensorState::PoweringOff;
                }
            } else {
                let active = target_rate
                    .as_active()
                    .expect("non-Off HwRate always has an ActiveRate");

                // Failure is absorbed: the next reconcile (triggered by
                // the next client call or event) will try again.
                call_info.dispatch(DriverEvent::SetRate(active, target_latency));
            }
        }
    }
}

/// Power-state-changed completion (`POWER_STATE_CHG`, value1 = on/off).
pub fn on_power_changed(state: &mut SensorState, call_info: &CallInfo, on: bool) {
    match (*state, on) {
        (SensorState::PoweringOn, true) => {
            call_info.dispatch(DriverEvent::FwUpload);
            *state = SensorState::FwUploading;
        }

        (SensorState::PoweringOff, false) => {
            *state = SensorState::Off;
        }

        // Spurious off while trying to come up: ask again.
        (SensorState::PoweringOn, false) => {
            call_info.dispatch(DriverEvent::Power(true));
        }

        // Spurious on while trying to shut down: ask again.
        (SensorState::PoweringOff, true) => {
            call_info.dispatch(DriverEvent::Power(false));
        }

        _ => {
            // Late or duplicate event for a state we've already moved
            // past; ignored.
        }
    }
}

/// What the caller (the manager task, which owns the request table and
/// the aggregator) must do after a firmware-state-changed completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Followup {
    None,
    /// A rate change may have been requested during the upload; the
    /// caller should recompute the aggregate target and reconcile
    /// against it.
    Reconcile,
}

/// Firmware-state-changed completion (`FW_STATE_CHG`).
pub fn on_firmware_changed(
    state: &mut SensorState,
    call_info: &CallInfo,
    ok: bool,
    rate: ActiveRate,
    latency: Latency,
) -> Followup {
    if !ok {
        warn!("firmware upload failed, powering down");
        call_info.dispatch(DriverEvent::Power(false));
        *state = SensorState::PoweringOff;
        return Followup::None;
    }

    match state {
        SensorState::FwUploading => {
            *state = SensorState::Active { rate, latency };
            Followup::Reconcile
        }

        // The target flipped to "off" while firmware was uploading.
        SensorState::PoweringOff => {
            call_info.dispatch(DriverEvent::Power(false));
            Followup::None
        }

        _ => Followup::None,
    }
}

/// Rate-changed completion (`RATE_CHG`): unconditional.
pub fn on_rate_changed(state: &mut SensorState, rate: ActiveRate, latency: Latency) {
    *state = SensorState::Active { rate, latency };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::SensorOps;
    use std::cell::RefCell;
    use std::sync::Arc;

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<DriverEvent>>,
        refuse_power: bool,
    }

    impl SensorOps for Recorder {
        fn power(&self, on: bool) -> bool {
            self.calls.borrow_mut().push(DriverEvent::Power(on));
            !self.refuse_power
        }
        fn firmware_upload(&self) -> bool {
            self.calls.borrow_mut().push(DriverEvent::FwUpload);
            true
        }
        fn set_rate(&self, rate: ActiveRate, latency: Latency) -> bool {
            self.calls
                .borrow_mut()
                .push(DriverEvent::SetRate(rate, latency));
            true
        }
        fn flush(&self) -> bool {
            true
        }
        fn trigger_ondemand(&self) -> bool {
            true
        }
    }

    fn recorder() -> (Arc<Recorder>, CallInfo) {
        let rec = Arc::new(Recorder::default());
        let ci = CallInfo::InProc(rec.clone());
        (rec, ci)
    }

    #[test]
    fn cold_start_requests_power_on() {
        let (rec, ci) = recorder();
        let mut state = SensorState::Off;

        reconcile(&mut state, &ci, HwRate::Hz(50), None);

        assert_eq!(state, SensorState::PoweringOn);
        assert_eq!(rec.calls.borrow().as_slice(), &[DriverEvent::Power(true)]);
    }

    #[test]
    fn already_at_target_is_a_noop() {
        let (rec, ci) = recorder();
        let mut state = SensorState::Active {
            rate: ActiveRate::Hz(50),
            latency: None,
        };

        reconcile(&mut state, &ci, HwRate::Hz(50), None);

        assert_eq!(
            state,
            SensorState::Active {
                rate: ActiveRate::Hz(50),
                latency: None
            }
        );
        assert!(rec.calls.borrow().is_empty());
    }

    #[test]
    fn powering_on_and_fw_uploading_defer_reconcile() {
        let (rec, ci) = recorder();

        for start in [SensorState::PoweringOn, SensorState::FwUploading] {
            let mut state = start;

            reconcile(&mut state, &ci, HwRate::Hz(50), None);
            assert_eq!(state, start);
        }
        assert!(rec.calls.borrow().is_empty());
    }

    #[test]
    fn active_to_off_powers_down() {
        let (rec, ci) = recorder();
        let mut state = SensorState::Active {
            rate: ActiveRate::Hz(10),
            latency: None,
        };

        reconcile(&mut state, &ci, HwRate::Off, None);

        assert_eq!(state, SensorState::PoweringOff);
        assert_eq!(rec.calls.borrow().as_slice(), &[DriverEvent::Power(false)]);
    }

    #[test]
    fn active_rate_change_dispatches_set_rate_without_changing_state() {
        let (rec, ci) = recorder();
        let mut state = SensorState::Active {
            rate: ActiveRate::Hz(10),
            latency: None,
        };

        reconcile(&mut state, &ci, HwRate::Hz(50), None);

        // State doesn't move until the RATE_CHG completion arrives.
        assert_eq!(
            state,
            SensorState::Active {
                rate: ActiveRate::Hz(10),
                latency: None
            }
        );
        assert_eq!(
            rec.calls.borrow().as_slice(),
            &[DriverEvent::SetRate(ActiveRate::Hz(50), None)]
        );
    }

    #[test]
    fn s5_flip_during_power_off_short_circuits_without_power_call() {
        let (rec, ci) = recorder();
        let mut state = SensorState::PoweringOff;

        reconcile(&mut state, &ci, HwRate::Hz(10), None);

        assert_eq!(state, SensorState::PoweringOn);
        assert!(rec.calls.borrow().is_empty());

        // The outstanding power-off completion arrives afterwards and
        // sees the sensor already wanting to come back up.
        on_power_changed(&mut state, &ci, false);

        assert_eq!(state, SensorState::PoweringOn);
        assert_eq!(rec.calls.borrow().as_slice(), &[DriverEvent::Power(true)]);
    }

    #[test]
    fn power_on_completion_moves_to_fw_uploading_and_dispatches_upload() {
        let (rec, ci) = recorder();
        let mut state = SensorState::PoweringOn;

        on_power_changed(&mut state, &ci, true);

        assert_eq!(state, SensorState::FwUploading);
        assert_eq!(rec.calls.borrow().as_slice(), &[DriverEvent::FwUpload]);
    }

    #[test]
    fn power_off_completion_moves_to_off() {
        let (_rec, ci) = recorder();
        let mut state = SensorState::PoweringOff;

        on_power_changed(&mut state, &ci, false);

        assert_eq!(state, SensorState::Off);
    }

    #[test]
    fn spurious_power_events_are_retried() {
        let (rec, ci) = recorder();

        let mut state = SensorState::PoweringOn;
        on_power_changed(&mut state, &ci, false);
        assert_eq!(state, SensorState::PoweringOn);

        let mut state2 = SensorState::PoweringOff;
        on_power_changed(&mut state2, &ci, true);
        assert_eq!(state2, SensorState::PoweringOff);

        assert_eq!(
            rec.calls.borrow().as_slice(),
            &[DriverEvent::Power(true), DriverEvent::Power(false)]
        );
    }

    #[test]
    fn late_power_event_in_steady_state_is_ignored() {
        let (rec, ci) = recorder();
        let mut state = SensorState::Active {
            rate: ActiveRate::Hz(10),
            latency: None,
        };

        on_power_changed(&mut state, &ci, true);

        assert_eq!(
            state,
            SensorState::Active {
                rate: ActiveRate::Hz(10),
                latency: None
            }
        );
        assert!(rec.calls.borrow().is_empty());
    }

    #[test]
    fn firmware_success_moves_to_active_and_requests_reconcile() {
        let (_rec, ci) = recorder();
        let mut state = SensorState::FwUploading;

        let followup =
            on_firmware_changed(&mut state, &ci, true, ActiveRate::Hz(50), None);

        assert_eq!(
            state,
            SensorState::Active {
                rate: ActiveRate::Hz(50),
                latency: None
            }
        );
        assert_eq!(followup, Followup::Reconcile);
    }

    #[test]
    fn firmware_failure_powers_down_regardless_of_state() {
        let (rec, ci) = recorder();
        let mut state = SensorState::FwUploading;

        let followup =
            on_firmware_changed(&mut state, &ci, false, ActiveRate::Hz(50), None);

        assert_eq!(state, SensorState::PoweringOff);
        assert_eq!(followup, Followup::None);
        assert_eq!(rec.calls.borrow().as_slice(), &[DriverEvent::Power(false)]);
    }

    #[test]
    fn firmware_done_while_target_already_flipped_to_off_powers_down() {
        let (rec, ci) = recorder();
        let mut state = SensorState::PoweringOff;

        let followup =
            on_firmware_changed(&mut state, &ci, true, ActiveRate::Hz(50), None);

        assert_eq!(state, SensorState::PoweringOff);
        assert_eq!(followup, Followup::None);
        assert_eq!(rec.calls.borrow().as_slice(), &[DriverEvent::Power(false)]);
    }

    #[test]
    fn rate_changed_is_unconditional() {
        let mut state = SensorState::Active {
            rate: ActiveRate::Hz(10),
            latency: None,
        };

        on_rate_changed(&mut state, ActiveRate::Hz(50), Some(5));

        assert_eq!(
            state,
            SensorState::Active {
                rate: ActiveRate::Hz(50),
                latency: Some(5)
            }
        );
    }
}
