//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use anyhow::Context;
use client_core::{
    geolocation::locate, orchestrator::execute, GeolocationProvider, PredictionService,
};
use crossbeam_channel::{Receiver, Sender};
use tokio::runtime::Runtime;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

/// Remote collaborators the worker calls on behalf of the UI.
#[derive(Clone)]
pub struct BackendServices {
    pub prediction: Arc<dyn PredictionService>,
    pub geolocation: Arc<dyn GeolocationProvider>,
}

fn build_runtime() -> anyhow::Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("fwi-backend")
        .build()
        .context("failed to build backend runtime")
}

pub fn launch(
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    services: BackendServices,
) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match build_runtime() {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: {err:#}"),
                )));
                tracing::error!("backend worker startup failure: {err:#}");
                return;
            }
        };

        runtime.block_on(async move {
            let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

            while let Ok(cmd) = cmd_rx.recv() {
                tracing::debug!(command = cmd.name(), "backend: received command");
                let ui_tx = ui_tx.clone();
                let services = services.clone();
                // Each command runs on its own task so a slow request never blocks a newer one.
                tokio::spawn(async move {
                    let event = match cmd {
                        BackendCommand::Predict(ticket) => UiEvent::PredictionSettled(
                            execute(services.prediction.as_ref(), ticket).await,
                        ),
                        BackendCommand::Locate(ticket) => UiEvent::LocationSettled(
                            locate(services.geolocation.as_ref(), ticket).await,
                        ),
                    };
                    // Completions must reach the UI or the lifecycle would stay in Loading.
                    // A full queue parks the blocking pool, not a runtime worker.
                    match tokio::task::spawn_blocking(move || ui_tx.send(event)).await {
                        Ok(Ok(())) => {}
                        Ok(Err(_)) => {
                            tracing::warn!("backend: ui event queue closed; dropping completion")
                        }
                        Err(err) => tracing::warn!("backend: completion delivery failed: {err}"),
                    }
                });
            }
            tracing::info!("backend: command queue closed; worker exiting");
        });
    });
}
