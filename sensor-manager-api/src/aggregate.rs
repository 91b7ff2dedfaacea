//! Computes the hardware rate/latency that satisfies every outstanding
//! client request against a sensor.

use crate::rate::{tighter_latency, HwRate, Latency, RequestedRate};

/// Returned when no rate in the sensor's `supportedRates` list can
/// satisfy the maximum requested rate. Never stored as sensor state --
/// only ever a transient return value, per the design note that
/// `IMPOSSIBLE` belongs to the aggregator, not the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Infeasible;

/// Computes the aggregate hardware rate for a sensor from its live
/// request set.
///
/// `extra_rate` is a hypothetical additional request -- used by
/// `request` to pre-validate a new subscription before the request
/// table is mutated. `removed_rate`, if given, causes the *first*
/// live request equal to it to be skipped, used by `amend` so a
/// client's old contribution doesn't double-count alongside its new
/// one. Both are `None` for the common case of recomputing from the
/// table as it already stands (e.g. after `release`).
pub fn calc_hw_rate(
    supported_rates: &[u32],
    requests: impl Iterator<Item = RequestedRate>,
    extra_rate: Option<RequestedRate>,
    mut removed_rate: Option<RequestedRate>,
) -> Result<HwRate, Infeasible> {
    let mut saw_any = false;
    let mut saw_ondemand = false;
    let mut saw_onchange = false;
    let mut max_hz: Option<u32> = None;

    for rate in requests.chain(extra_rate) {
        if removed_rate == Some(rate) {
            removed_rate = None;
            continue;
        }

        saw_any = true;
        match rate {
            RequestedRate::OnDemand => saw_ondemand = true,
            RequestedRate::OnChange => saw_onchange = true,
            RequestedRate::Hz(v) => {
                max_hz = Some(max_hz.map_or(v, |m| m.max(v)))
            }
        }
    }

    match max_hz {
        None if !saw_any => Ok(HwRate::Off),
        None if saw_onchange => Ok(HwRate::OnChange),
        None => {
            debug_assert!(saw_ondemand);
            Ok(HwRate::OnDemand)
        }
        Some(target) => supported_rates
            .iter()
            .find(|&&r| r >= target)
            .map(|&r| HwRate::Hz(r))
            .ok_or(Infeasible),
    }
}

/// Minimum latency across all live requests for a sensor -- lower is a
/// stricter constraint, so the smallest wins. `None` (the source's
/// `INVALID`) if there are no requests with a latency constraint.
pub fn calc_hw_latency(requests: impl Iterator<Item = Latency>) -> Latency {
    requests.fold(None, tighter_latency)
}
