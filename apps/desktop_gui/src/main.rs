use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use client_core::{
    config::{load_settings_from, normalize_endpoint, DEFAULT_CONFIG_FILE},
    geolocation::provider_from_source,
    HttpPredictionClient,
};
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

mod backend_bridge;
mod controller;
mod ui;

use backend_bridge::{commands::BackendCommand, runtime::BackendServices};
use controller::events::UiEvent;
use ui::{DesktopGuiApp, StartupConfig};

#[derive(Parser, Debug)]
#[command(name = "desktop_gui", about = "Fire Weather Index predictor")]
struct Args {
    /// Config file; defaults to ./fwi_client.toml, then the per-user config dir.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    endpoint: Option<String>,
}

fn resolve_config_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return local;
    }
    dirs::config_dir()
        .map(|dir| dir.join("fwi_client").join(DEFAULT_CONFIG_FILE))
        .filter(|path| path.exists())
        .unwrap_or(local)
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let args = Args::parse();

    let config_path = resolve_config_path(args.config);
    let mut settings = load_settings_from(&config_path);
    if let Some(raw) = args.endpoint.as_deref() {
        match normalize_endpoint(raw) {
            Ok(endpoint) => settings.prediction_endpoint = endpoint,
            Err(err) => tracing::warn!("ignoring --endpoint: {err:#}"),
        }
    }
    tracing::info!(
        config = %config_path.display(),
        endpoint = %settings.prediction_endpoint,
        geolocation = ?settings.geolocation,
        "starting desktop gui"
    );

    let geolocation = provider_from_source(&settings.geolocation);
    let startup = StartupConfig {
        map_settings: settings.map_settings(),
        endpoint: settings.prediction_endpoint.clone(),
        geolocation_supported: geolocation.is_supported(),
    };

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);
    backend_bridge::runtime::launch(
        cmd_rx,
        ui_tx,
        BackendServices {
            prediction: Arc::new(HttpPredictionClient::new(settings.prediction_endpoint)),
            geolocation,
        },
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("FWI Predictor")
            .with_inner_size([1100.0, 720.0])
            .with_min_inner_size([820.0, 560.0]),
        ..Default::default()
    };
    eframe::run_native(
        "FWI Predictor",
        options,
        Box::new(|_cc| Ok(Box::new(DesktopGuiApp::new(cmd_tx, ui_rx, startup)))),
    )
}
