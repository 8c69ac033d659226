//! Device location: host capabilities and the acquirer that writes results into the form.

use std::{panic::AssertUnwindSafe, sync::Arc};

use async_trait::async_trait;
use futures::FutureExt;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use shared::domain::Coordinate;
use tracing::{debug, info, warn};

use crate::{
    config::GeolocationSource,
    error::GeolocationError,
    form::FormState,
    sequence::{RequestSeq, Sequencer},
};

#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    /// Synchronous capability check; an unsupported host is never queried.
    fn is_supported(&self) -> bool {
        true
    }

    async fn current_position(&self) -> Result<Coordinate, GeolocationError>;
}

pub struct UnsupportedGeolocation;

#[async_trait]
impl GeolocationProvider for UnsupportedGeolocation {
    fn is_supported(&self) -> bool {
        false
    }

    async fn current_position(&self) -> Result<Coordinate, GeolocationError> {
        Err(GeolocationError::Unsupported)
    }
}

/// Reports a configured position, for hosts without a positioning device.
pub struct FixedGeolocation {
    position: Coordinate,
}

impl FixedGeolocation {
    pub fn new(position: Coordinate) -> Self {
        Self { position }
    }
}

#[async_trait]
impl GeolocationProvider for FixedGeolocation {
    async fn current_position(&self) -> Result<Coordinate, GeolocationError> {
        Ok(self.position)
    }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(alias = "lat")]
    latitude: f64,
    #[serde(alias = "lon")]
    longitude: f64,
}

/// IP-based lookup against a JSON endpoint exposing `latitude`/`longitude` (or `lat`/`lon`).
pub struct HttpGeolocation {
    http: Client,
    url: String,
}

impl HttpGeolocation {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl GeolocationProvider for HttpGeolocation {
    async fn current_position(&self) -> Result<Coordinate, GeolocationError> {
        let res = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(map_lookup_error)?;
        match res.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(GeolocationError::PermissionDenied)
            }
            status if !status.is_success() => {
                return Err(GeolocationError::PositionUnavailable(format!(
                    "lookup returned status {status}"
                )))
            }
            _ => {}
        }
        let body: LookupResponse = res.json().await.map_err(map_lookup_error)?;
        if !body.latitude.is_finite() || !body.longitude.is_finite() {
            return Err(GeolocationError::PositionUnavailable(
                "lookup returned a non-finite position".to_string(),
            ));
        }
        Ok(Coordinate::new(body.latitude, body.longitude))
    }
}

fn map_lookup_error(err: reqwest::Error) -> GeolocationError {
    if err.is_timeout() {
        GeolocationError::Timeout
    } else {
        GeolocationError::PositionUnavailable(err.to_string())
    }
}

pub fn provider_from_source(source: &GeolocationSource) -> Arc<dyn GeolocationProvider> {
    match source {
        GeolocationSource::Unavailable => Arc::new(UnsupportedGeolocation),
        GeolocationSource::Fixed(position) => Arc::new(FixedGeolocation::new(*position)),
        GeolocationSource::Http { url } => Arc::new(HttpGeolocation::new(url.clone())),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocateTicket {
    pub seq: RequestSeq,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocateCompletion {
    pub seq: RequestSeq,
    pub outcome: Result<Coordinate, GeolocationError>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocateOutcome {
    Located(Coordinate),
    /// A newer request was issued after this one; its position or failure is dropped.
    Superseded,
    Failed(GeolocationError),
}

#[derive(Debug, Default)]
pub struct GeolocationAcquirer {
    sequencer: Sequencer,
}

impl GeolocationAcquirer {
    pub fn begin(&mut self, supported: bool) -> Result<LocateTicket, GeolocationError> {
        if !supported {
            info!("geolocation requested on a host without a position source");
            return Err(GeolocationError::Unsupported);
        }
        let seq = self.sequencer.issue();
        debug!(%seq, "issued geolocation request");
        Ok(LocateTicket { seq })
    }

    /// Applies a completion. Only the latest request counts; failures never touch the form.
    pub fn settle(&mut self, completion: LocateCompletion, form: &mut FormState) -> LocateOutcome {
        if !self.sequencer.is_latest(completion.seq) {
            debug!(seq = %completion.seq, "dropping superseded geolocation completion");
            return LocateOutcome::Superseded;
        }
        match completion.outcome {
            Err(err) => {
                warn!(seq = %completion.seq, error = %err, "geolocation failed");
                LocateOutcome::Failed(err)
            }
            Ok(position) => {
                form.set_coordinates(position);
                info!(
                    seq = %completion.seq,
                    latitude = position.latitude,
                    longitude = position.longitude,
                    "geolocation resolved"
                );
                LocateOutcome::Located(position)
            }
        }
    }
}

/// Runs one lookup. A panicking provider still yields a completion.
pub async fn locate(provider: &dyn GeolocationProvider, ticket: LocateTicket) -> LocateCompletion {
    let outcome = match AssertUnwindSafe(provider.current_position())
        .catch_unwind()
        .await
    {
        Ok(outcome) => outcome,
        Err(_) => Err(GeolocationError::PositionUnavailable(
            "position source panicked".to_string(),
        )),
    };
    LocateCompletion {
        seq: ticket.seq,
        outcome,
    }
}
