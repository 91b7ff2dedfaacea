// Copyright (c) 2024-2026, Sensor Hub Contributors
// All rights reserved.
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions are
// met:
//
// 1. Redistributions of source code must retain the above copyright
//    notice, this list of conditions and the following disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright
//    notice, this list of conditions and the following disclaimer in the
//    documentation and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its
//    contributors may be used to endorse or promote products derived
//    from this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS
// "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT
// LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR
// A PARTICULAR PURPOSE ARE DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT
// HOLDER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL,
// SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT
// LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES; LOSS OF USE,
// DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY
// THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT
// (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
// OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

//! Arbitration between client rate/latency subscriptions and a fixed
//! population of sensor drivers on an embedded sensor hub.
//!
//! A driver registers a sensor once at start-up (`ManagerHandle::register`)
//! and gets back a `Handle` its completion events are reported against.
//! Clients then `request`/`amend`/`release` rate and latency
//! subscriptions against that handle; the manager aggregates every
//! client's ask into the single hardware configuration the sensor
//! should run at and drives the sensor's power/firmware/rate state
//! machine to get there.

pub mod aggregate;
pub mod bitset;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod handle;
pub mod manager;
pub mod pool;
pub mod rate;
pub mod registry;
pub mod request_table;
pub mod state;

pub use error::{Error, Result};
pub use handle::Handle;
pub use manager::ManagerHandle;
pub use rate::{ActiveRate, HwRate, Latency, RequestedRate};
pub use registry::{Registry, SensorInfo, SensorType};
pub use request_table::ClientId;
