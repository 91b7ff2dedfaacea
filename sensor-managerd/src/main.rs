#![deny(unsafe_code)]

use std::convert::Infallible;
use std::sync::Arc;

use sensor_manager_api::dispatch::CallInfo;
use sensor_manager_api::registry::{Registry, SensorInfo};
use sensor_manager_api::{Error, ManagerHandle, Result};
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, warn};
use tracing_futures::Instrument;

mod config;
mod drivers;

use config::{Config, SensorKind, SensorSpec};

async fn init_app() -> Option<Config> {
    if let Some(cfg) = config::get().await {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(cfg.get_log_level())
            .with_target(false)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .expect("unable to set global default subscriber");
        Some(cfg)
    } else {
        None
    }
}

/// Spawns the configured driver for one sensor and registers it,
/// binding the driver's own handle-aware state once the registry
/// assigns one.
async fn spawn_sensor(
    manager: &ManagerHandle,
    spec: &SensorSpec,
) -> Result<()> {
    let info = SensorInfo::new(
        spec.sensor_type.clone(),
        spec.supported_rates.clone(),
    )?;

    match spec.kind {
        SensorKind::InProcess => {
            let sensor = Arc::new(drivers::VirtualSensor::new(manager.clone()));
            let handle = manager.register(info, CallInfo::InProc(sensor.clone())).await?;

            sensor.bind(handle);
            info!(name = %spec.name, handle = handle.get(), "registered in-process sensor");
        }

        SensorKind::OutOfProcess => {
            let (tx, handle_tx) =
                drivers::spawn_out_of_process_driver(manager.clone(), 8);
            let handle = manager.register(info, CallInfo::OutOfProc(tx)).await?;

            let _ = handle_tx.send(handle);
            info!(name = %spec.name, handle = handle.get(), "registered out-of-process sensor");
        }
    }

    Ok(())
}

async fn wrap_task(handle: JoinHandle<Result<Infallible>>) -> Result<Infallible> {
    match handle.await {
        Err(e) if e.is_panic() => {
            error!("manager task panicked");
            Err(Error::MissingPeer(format!("manager task panicked: {e}")))
        }
        Err(e) => {
            error!("manager task was canceled");
            Err(Error::MissingPeer(format!("manager task canceled: {e}")))
        }
        Ok(Ok(_)) => unreachable!(),
        Ok(Err(e)) => {
            error!("manager task exited -- {}", &e);
            Err(e)
        }
    }
}

async fn run() -> Result<()> {
    if let Some(cfg) = init_app().await {
        let registry = Arc::new(Registry::new(cfg.registry_capacity));
        let (manager, manager_task) = sensor_manager_api::manager::start(
            registry,
            cfg.request_capacity,
            cfg.channel_capacity,
        );

        info!("starting sensors");
        for spec in &cfg.sensor {
            spawn_sensor(&manager, spec)
                .instrument(info_span!("sensor", name = %spec.name))
                .await?;
        }

        tokio::select! {
            result = wrap_task(manager_task) => {
                result?;
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("received interrupt, shutting down");
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("ERROR: {e}")
    }
}
