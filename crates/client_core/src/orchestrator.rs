//! Prediction request lifecycle: submit → loading → success/error.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use shared::{
    domain::FormData,
    protocol::{PredictionRequest, PredictionResponse},
};
use tracing::{debug, info, warn};

use crate::{
    error::PredictionError,
    risk::PredictionResult,
    sequence::{RequestSeq, Sequencer},
    PredictionService,
};

pub const PREDICTION_FAILED_MESSAGE: &str = "Prediction failed. Check backend.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestLifecycle {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionTicket {
    pub seq: RequestSeq,
    pub request: PredictionRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionCompletion {
    pub seq: RequestSeq,
    pub outcome: Result<PredictionResponse, PredictionError>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettleOutcome {
    Succeeded(PredictionResult),
    Failed(PredictionError),
    /// A newer submission is outstanding; this completion changed nothing.
    Superseded,
}

#[derive(Debug, Default)]
pub struct PredictionOrchestrator {
    lifecycle: RequestLifecycle,
    result: Option<PredictionResult>,
    error: Option<&'static str>,
    sequencer: Sequencer,
}

impl PredictionOrchestrator {
    pub fn lifecycle(&self) -> RequestLifecycle {
        self.lifecycle
    }

    pub fn is_loading(&self) -> bool {
        self.lifecycle == RequestLifecycle::Loading
    }

    pub fn result(&self) -> Option<&PredictionResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&'static str> {
        self.error
    }

    /// Clears the previous outcome and enters `Loading`. The caller must send the ticket.
    pub fn begin(&mut self, snapshot: FormData) -> PredictionTicket {
        self.result = None;
        self.error = None;
        self.lifecycle = RequestLifecycle::Loading;
        let seq = self.sequencer.issue();
        debug!(%seq, "prediction submitted");
        PredictionTicket {
            seq,
            request: PredictionRequest::new(snapshot),
        }
    }

    /// Stores the outcome of the latest submission and leaves `Loading` in the same step.
    pub fn settle(&mut self, completion: PredictionCompletion) -> SettleOutcome {
        if !self.sequencer.is_latest(completion.seq) {
            debug!(seq = %completion.seq, "dropping superseded prediction completion");
            return SettleOutcome::Superseded;
        }

        match completion.outcome.and_then(interpret_response) {
            Ok(result) => {
                info!(
                    seq = %completion.seq,
                    fwi = result.fwi(),
                    risk = result.risk().label(),
                    "prediction succeeded"
                );
                self.result = Some(result);
                self.error = None;
                self.lifecycle = RequestLifecycle::Success;
                SettleOutcome::Succeeded(result)
            }
            Err(err) => {
                warn!(seq = %completion.seq, error = %err, "prediction failed");
                self.result = None;
                self.error = Some(PREDICTION_FAILED_MESSAGE);
                self.lifecycle = RequestLifecycle::Error;
                SettleOutcome::Failed(err)
            }
        }
    }
}

fn interpret_response(response: PredictionResponse) -> Result<PredictionResult, PredictionError> {
    match (response.fwi, response.error) {
        (Some(reading), _) => reading
            .as_f64()
            .and_then(PredictionResult::from_raw)
            .ok_or_else(|| {
                PredictionError::MalformedResponse(format!("fwi is not a finite number: {reading:?}"))
            }),
        (None, Some(message)) => Err(PredictionError::Service(message)),
        (None, None) => Err(PredictionError::MalformedResponse(
            "response has no fwi field".to_string(),
        )),
    }
}

/// Performs the network call for one ticket. Always yields a completion, even if the
/// service panics, so the lifecycle can leave `Loading`.
pub async fn execute(
    service: &dyn PredictionService,
    ticket: PredictionTicket,
) -> PredictionCompletion {
    let outcome = match AssertUnwindSafe(service.predict(&ticket.request))
        .catch_unwind()
        .await
    {
        Ok(outcome) => outcome,
        Err(_) => Err(PredictionError::Aborted(
            "prediction service panicked".to_string(),
        )),
    };
    PredictionCompletion {
        seq: ticket.seq,
        outcome,
    }
}
