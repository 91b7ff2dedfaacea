//! An out-of-process demonstration sensor: operations are enqueued to
//! a dedicated task over an `mpsc` channel, as a real driver running
//! in its own task (or talking to a separate process over some
//! transport) would be reached.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use sensor_manager_api::dispatch::DriverEvent;
use sensor_manager_api::events::CompletionEvent;
use sensor_manager_api::{Handle, ManagerHandle};

/// Spawns the driver task and returns the sender half to hand to
/// `Registry::register` as a `CallInfo::OutOfProc`, plus a oneshot to
/// tell the task its own handle once registration assigns one.
pub fn spawn_out_of_process_driver(
    manager: ManagerHandle,
    channel_capacity: usize,
) -> (mpsc::Sender<DriverEvent>, oneshot::Sender<Handle>) {
    let (tx, mut rx) = mpsc::channel(channel_capacity);
    let (handle_tx, handle_rx) = oneshot::channel();

    tokio::spawn(async move {
        let Ok(handle) = handle_rx.await else {
            return;
        };

        while let Some(event) = rx.recv().await {
            match event {
                DriverEvent::Power(on) => {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    let _ = manager
                        .signal_internal_evt(handle, CompletionEvent::PowerChanged(on))
                        .await;
                }

                DriverEvent::FwUpload => {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    let _ = manager
                        .signal_internal_evt(
                            handle,
                            CompletionEvent::FirmwareChanged {
                                ok: true,
                                rate: sensor_manager_api::ActiveRate::OnDemand,
                                latency: None,
                            },
                        )
                        .await;
                }

                DriverEvent::SetRate(rate, latency) => {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    let _ = manager
                        .signal_internal_evt(handle, CompletionEvent::RateChanged { rate, latency })
                        .await;
                }

                DriverEvent::Flush | DriverEvent::TriggerOndemand => {
                    debug!(%event, "out-of-process driver handled immediate op");
                }
            }
        }
    });

    (tx, handle_tx)
}
