//! Typed stand-ins for the reserved pseudo-rates of the source
//! firmware. Rather than overload a single integer with sentinel
//! values (`OFF`, `ONDEMAND`, `ONCHANGE`, `IMPOSSIBLE`, ...), each role
//! a rate can play gets its own sum type, so the compiler rejects
//! passing a powering-state or an `IMPOSSIBLE` marker where a driver
//! expects a real rate.

use std::fmt;

/// A rate a client may ask for: either a concrete sampling rate, in
/// samples per unit time, or one of the two pseudo-rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestedRate {
    Hz(u32),
    OnDemand,
    OnChange,
}

impl fmt::Display for RequestedRate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RequestedRate::Hz(v) => write!(f, "{}Hz", v),
            RequestedRate::OnDemand => write!(f, "on-demand"),
            RequestedRate::OnChange => write!(f, "on-change"),
        }
    }
}

/// The rate a sensor is actually driven at while powered and active.
/// Same shape as `RequestedRate` -- kept as a distinct type because the
/// two serve different roles (one is "what a client asked for", the
/// other is "what hardware is doing right now") and the aggregator
/// computes one from many of the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveRate {
    Hz(u32),
    OnDemand,
    OnChange,
}

impl fmt::Display for ActiveRate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ActiveRate::Hz(v) => write!(f, "{}Hz", v),
            ActiveRate::OnDemand => write!(f, "on-demand"),
            ActiveRate::OnChange => write!(f, "on-change"),
        }
    }
}

/// The aggregated hardware target computed by `calc_hw_rate`: either
/// the sensor should be off, should run at one of the pseudo-rates, or
/// should run at a concrete supported rate. Never `IMPOSSIBLE` -- that
/// case is reported as `Err(Infeasible)` by the aggregator instead of
/// being a value of this type, per the design note that `IMPOSSIBLE` is
/// strictly a return disposition, never a stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwRate {
    Off,
    OnDemand,
    OnChange,
    Hz(u32),
}

impl HwRate {
    pub fn as_active(self) -> Option<ActiveRate> {
        match self {
            HwRate::Off => None,
            HwRate::OnDemand => Some(ActiveRate::OnDemand),
            HwRate::OnChange => Some(ActiveRate::OnChange),
            HwRate::Hz(v) => Some(ActiveRate::Hz(v)),
        }
    }
}

impl From<ActiveRate> for HwRate {
    fn from(r: ActiveRate) -> Self {
        match r {
            ActiveRate::Hz(v) => HwRate::Hz(v),
            ActiveRate::OnDemand => HwRate::OnDemand,
            ActiveRate::OnChange => HwRate::OnChange,
        }
    }
}

impl fmt::Display for HwRate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HwRate::Off => write!(f, "off"),
            HwRate::OnDemand => write!(f, "on-demand"),
            HwRate::OnChange => write!(f, "on-change"),
            HwRate::Hz(v) => write!(f, "{}Hz", v),
        }
    }
}

/// Maximum batching delay, in milliseconds. `None` stands in for the
/// source's `INVALID` -- "unspecified" or "not batching".
pub type Latency = Option<u32>;

/// Combines two latency constraints the way the aggregator does:
/// lower is stricter, so the tighter (smaller) one wins; an absent
/// constraint never tightens the result.
pub fn tighter_latency(a: Latency, b: Latency) -> Latency {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}
