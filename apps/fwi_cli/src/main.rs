use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use client_core::{
    config::{load_settings_from, normalize_endpoint, DEFAULT_CONFIG_FILE},
    geolocation::{locate, provider_from_source},
    orchestrator::execute,
    FireWeatherSession, HttpPredictionClient, SettleOutcome,
};
use shared::domain::FormField;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Predicts the Fire Weather Index for one set of observations.
#[derive(Parser, Debug)]
#[command(name = "fwi-cli")]
struct Args {
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Overrides the configured prediction endpoint.
    #[arg(long)]
    endpoint: Option<String>,
    /// Pre-fills every weather field with representative values.
    #[arg(long)]
    sample: bool,
    /// Fills latitude/longitude from the configured position source.
    #[arg(long)]
    locate: bool,
    /// Prints the request payload instead of sending it.
    #[arg(long)]
    dry_run: bool,

    #[arg(long)]
    day: Option<String>,
    #[arg(long)]
    month: Option<String>,
    #[arg(long)]
    year: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    temperature: Option<String>,
    #[arg(long = "rh")]
    relative_humidity: Option<String>,
    #[arg(long = "ws")]
    wind_speed: Option<String>,
    #[arg(long)]
    rain: Option<String>,
    #[arg(long)]
    ffmc: Option<String>,
    #[arg(long)]
    dmc: Option<String>,
    #[arg(long)]
    dc: Option<String>,
    #[arg(long)]
    isi: Option<String>,
    #[arg(long)]
    bui: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    latitude: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    longitude: Option<String>,
}

impl Args {
    fn field_values(&self) -> [(FormField, Option<&str>); FormField::COUNT] {
        [
            (FormField::Day, self.day.as_deref()),
            (FormField::Month, self.month.as_deref()),
            (FormField::Year, self.year.as_deref()),
            (FormField::Temperature, self.temperature.as_deref()),
            (FormField::RelativeHumidity, self.relative_humidity.as_deref()),
            (FormField::WindSpeed, self.wind_speed.as_deref()),
            (FormField::Rain, self.rain.as_deref()),
            (FormField::Ffmc, self.ffmc.as_deref()),
            (FormField::Dmc, self.dmc.as_deref()),
            (FormField::Dc, self.dc.as_deref()),
            (FormField::Isi, self.isi.as_deref()),
            (FormField::Bui, self.bui.as_deref()),
            (FormField::Latitude, self.latitude.as_deref()),
            (FormField::Longitude, self.longitude.as_deref()),
        ]
    }
}

fn print_notices(session: &mut FireWeatherSession) {
    for notice in session.drain_notices() {
        eprintln!("! {}", notice.message());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings_from(&args.config);
    if let Some(endpoint) = args.endpoint.as_deref() {
        settings.prediction_endpoint = normalize_endpoint(endpoint)?;
    }
    info!(endpoint = %settings.prediction_endpoint, "settings loaded");

    let mut session = FireWeatherSession::new(settings.map_settings());
    if args.sample {
        session.fill_sample_values();
    }
    for (field, value) in args.field_values() {
        if let Some(value) = value {
            session.update_field(field, value);
        }
    }

    if args.locate {
        let provider = provider_from_source(&settings.geolocation);
        if let Some(ticket) = session.begin_locate(provider.is_supported()) {
            session.apply_location(locate(provider.as_ref(), ticket).await);
        }
        print_notices(&mut session);
    }

    let ticket = match session.begin_submit() {
        Ok(ticket) => ticket,
        Err(err) => {
            print_notices(&mut session);
            bail!(err);
        }
    };

    if args.dry_run {
        println!("{}", serde_json::to_string_pretty(&ticket.request)?);
        return Ok(());
    }

    let client = HttpPredictionClient::new(settings.prediction_endpoint.clone());
    let outcome = session.apply_prediction(execute(&client, ticket).await);
    print_notices(&mut session);

    let result = match outcome {
        SettleOutcome::Succeeded(result) => result,
        SettleOutcome::Failed(err) => bail!("{err}"),
        SettleOutcome::Superseded => bail!("prediction was superseded"),
    };

    println!("Predicted FWI: {}", result.display_value());
    println!(
        "Risk Level:    {} ({})",
        result.risk().label(),
        result.risk().color_hex()
    );

    let view = session.map_view();
    println!(
        "Map:           {:.4}, {:.4} @ zoom {}",
        view.center.latitude, view.center.longitude, view.zoom
    );
    for marker in &view.markers {
        println!("Marker:        {}", marker.label.replace('\n', " | "));
    }
    println!("Tile:          {}", view.center_tile_url());

    Ok(())
}
