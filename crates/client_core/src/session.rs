//! Single-owner composition of form, prediction, geolocation and map state.
//!
//! Every mutation happens through `&mut FireWeatherSession` on the owning thread.
//! Async work is described by tickets handed to the caller; the resulting completions
//! come back through [`FireWeatherSession::apply_prediction`] and
//! [`FireWeatherSession::apply_location`].

use std::collections::VecDeque;

use shared::{domain::FormField, error::UnknownFieldError};
use tracing::info;

use crate::{
    error::{describe_issues, FieldIssue, GeolocationError, SubmitError},
    form::FormState,
    geolocation::{GeolocationAcquirer, LocateCompletion, LocateOutcome, LocateTicket},
    map_sync::{MapSettings, MapSynchronizer, MapView},
    orchestrator::{
        PredictionCompletion, PredictionOrchestrator, PredictionTicket, RequestLifecycle,
        SettleOutcome, PREDICTION_FAILED_MESSAGE,
    },
    risk::PredictionResult,
};

pub const GEOLOCATION_UNSUPPORTED_MESSAGE: &str = "Geolocation not supported.";
pub const GEOLOCATION_FAILED_MESSAGE: &str = "Location error. Allow permission.";
pub const SUBMIT_LABEL: &str = "Predict FWI";
pub const SUBMIT_LABEL_LOADING: &str = "Predicting...";

/// User-visible, non-fatal message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    GeolocationUnsupported,
    GeolocationFailed(GeolocationError),
    PredictionFailed,
    FormIncomplete(Vec<FieldIssue>),
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::GeolocationUnsupported => GEOLOCATION_UNSUPPORTED_MESSAGE.to_string(),
            Notice::GeolocationFailed(_) => GEOLOCATION_FAILED_MESSAGE.to_string(),
            Notice::PredictionFailed => PREDICTION_FAILED_MESSAGE.to_string(),
            Notice::FormIncomplete(issues) => {
                format!("Please complete the form: {}", describe_issues(issues))
            }
        }
    }
}

pub struct FireWeatherSession {
    form: FormState,
    orchestrator: PredictionOrchestrator,
    geolocation: GeolocationAcquirer,
    map: MapSynchronizer<MapView>,
    notices: VecDeque<Notice>,
}

impl FireWeatherSession {
    pub fn new(map_settings: MapSettings) -> Self {
        let view = MapView::new(&map_settings);
        Self {
            form: FormState::new(),
            orchestrator: PredictionOrchestrator::default(),
            geolocation: GeolocationAcquirer::default(),
            map: MapSynchronizer::new(view, map_settings),
            notices: VecDeque::new(),
        }
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn update_field(&mut self, field: FormField, raw: impl Into<String>) {
        if self.form.update(field, raw) && field.is_coordinate() {
            self.sync_map();
        }
    }

    pub fn update_field_by_name(
        &mut self,
        name: &str,
        raw: impl Into<String>,
    ) -> Result<(), UnknownFieldError> {
        let field = name.parse::<FormField>()?;
        self.update_field(field, raw);
        Ok(())
    }

    pub fn fill_sample_values(&mut self) {
        self.form.fill_sample();
    }

    fn sync_map(&mut self) {
        let (latitude, longitude) = (self.form.latitude(), self.form.longitude());
        self.map.coordinates_changed(latitude, longitude);
    }

    pub fn map_view(&self) -> &MapView {
        self.map.display()
    }

    pub fn lifecycle(&self) -> RequestLifecycle {
        self.orchestrator.lifecycle()
    }

    pub fn prediction(&self) -> Option<&PredictionResult> {
        self.orchestrator.result()
    }

    pub fn prediction_error(&self) -> Option<&'static str> {
        self.orchestrator.error()
    }

    /// The submit control is enabled only outside `Loading`.
    pub fn can_submit(&self) -> bool {
        !self.orchestrator.is_loading()
    }

    pub fn submit_label(&self) -> &'static str {
        if self.orchestrator.is_loading() {
            SUBMIT_LABEL_LOADING
        } else {
            SUBMIT_LABEL
        }
    }

    /// Validates the form and, if complete, starts a submission.
    pub fn begin_submit(&mut self) -> Result<PredictionTicket, SubmitError> {
        let issues = self.form.validate();
        if !issues.is_empty() {
            info!(issues = issues.len(), "submission blocked by form validation");
            self.notices.push_back(Notice::FormIncomplete(issues.clone()));
            return Err(SubmitError::Invalid(issues));
        }
        Ok(self.orchestrator.begin(self.form.snapshot()))
    }

    pub fn apply_prediction(&mut self, completion: PredictionCompletion) -> SettleOutcome {
        let outcome = self.orchestrator.settle(completion);
        if matches!(outcome, SettleOutcome::Failed(_)) {
            self.notices.push_back(Notice::PredictionFailed);
        }
        outcome
    }

    /// Returns a ticket to run against the host position source, or `None` when the
    /// host has none (a notice is queued instead).
    pub fn begin_locate(&mut self, supported: bool) -> Option<LocateTicket> {
        match self.geolocation.begin(supported) {
            Ok(ticket) => Some(ticket),
            Err(_) => {
                self.notices.push_back(Notice::GeolocationUnsupported);
                None
            }
        }
    }

    pub fn apply_location(&mut self, completion: LocateCompletion) -> LocateOutcome {
        let outcome = self.geolocation.settle(completion, &mut self.form);
        match &outcome {
            LocateOutcome::Located(_) => self.sync_map(),
            LocateOutcome::Failed(err) => self
                .notices
                .push_back(Notice::GeolocationFailed(err.clone())),
            LocateOutcome::Superseded => {}
        }
        outcome
    }

    pub fn pending_notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }
}

impl Default for FireWeatherSession {
    fn default() -> Self {
        Self::new(MapSettings::default())
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
