use async_trait::async_trait;
use reqwest::Client;
use shared::{
    error::ServiceErrorBody,
    protocol::{PredictionRequest, PredictionResponse},
};
use tracing::{debug, warn};

pub mod config;
pub mod error;
pub mod form;
pub mod geolocation;
pub mod map_sync;
pub mod orchestrator;
pub mod risk;
pub mod sequence;
pub mod session;

pub use error::{FieldIssue, FieldIssueKind, GeolocationError, PredictionError, SubmitError};
pub use geolocation::{GeolocationProvider, LocateCompletion, LocateOutcome, LocateTicket};
pub use map_sync::{MapDisplay, MapMarker, MapSettings, MapView};
pub use orchestrator::{
    PredictionCompletion, PredictionTicket, RequestLifecycle, SettleOutcome,
};
pub use risk::{classify, PredictionResult, RiskCategory};
pub use session::{FireWeatherSession, Notice};

/// Remote FWI model. One call per submission; no retries.
#[async_trait]
pub trait PredictionService: Send + Sync {
    async fn predict(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionResponse, PredictionError>;
}

pub struct HttpPredictionClient {
    http: Client,
    endpoint: String,
}

impl HttpPredictionClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PredictionService for HttpPredictionClient {
    async fn predict(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionResponse, PredictionError> {
        debug!(endpoint = %self.endpoint, "posting prediction request");
        let res = self.http.post(&self.endpoint).json(request).send().await?;

        let status = res.status();
        if !status.is_success() {
            let detail = res
                .json::<ServiceErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_default();
            warn!(
                endpoint = %self.endpoint,
                status = status.as_u16(),
                detail = %detail,
                "prediction service rejected request"
            );
            return Err(PredictionError::Rejected {
                status: status.as_u16(),
            });
        }

        let body: PredictionResponse = res.json().await?;
        Ok(body)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
