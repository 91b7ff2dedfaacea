//! Error values returned across the public API.
//!
//! Mirrors the taxonomy of capacity exhaustion, unknown handles/clients,
//! infeasible requests, and driver refusals described in the design --
//! see the component design notes for the reasoning behind each variant.

use std::fmt;
use tokio::sync::{mpsc, oneshot};

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Error {
    /// A fixed-capacity pool (slot registry, request table, or the
    /// internal-event pool) had no room for the operation.
    CapacityExhausted,

    /// No registered sensor has the given handle.
    UnknownHandle,

    /// The client has no live request against the given sensor.
    UnknownClient,

    /// Aggregating the request set would require a rate the sensor
    /// can't support.
    Infeasible,

    /// The driver's ops table (or out-of-process recipient) refused or
    /// failed to accept an operation.
    DriverRefused,

    /// A sensor descriptor or request argument was malformed.
    InvArgument(String),

    /// The manager task has exited; its peer (a channel end) is gone.
    MissingPeer(String),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::CapacityExhausted => write!(f, "capacity exhausted"),
            Error::UnknownHandle => write!(f, "unknown sensor handle"),
            Error::UnknownClient => write!(f, "no request for this client"),
            Error::Infeasible => {
                write!(f, "request set cannot be satisfied by this sensor")
            }
            Error::DriverRefused => write!(f, "driver refused operation"),
            Error::InvArgument(v) => write!(f, "invalid argument: {}", &v),
            Error::MissingPeer(detail) => {
                write!(f, "{} is missing peer", detail)
            }
        }
    }
}

impl<T> From<mpsc::error::SendError<T>> for Error {
    fn from(_error: mpsc::error::SendError<T>) -> Self {
        Error::MissingPeer(String::from("manager task"))
    }
}

impl From<oneshot::error::RecvError> for Error {
    fn from(_error: oneshot::error::RecvError) -> Self {
        Error::MissingPeer(String::from("manager task"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
