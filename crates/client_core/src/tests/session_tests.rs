use super::*;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use shared::{
    domain::{Coordinate, FormField},
    protocol::{FwiReading, PredictionRequest, PredictionResponse},
};

use crate::{
    error::{FieldIssueKind, PredictionError},
    geolocation::{locate, FixedGeolocation, GeolocationProvider},
    map_sync::{DEFAULT_CENTER, DEFAULT_ZOOM, FOCUS_ZOOM},
    orchestrator::execute,
    risk::RiskCategory,
    PredictionService,
};

struct ScriptedService {
    reply: Result<PredictionResponse, PredictionError>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedService {
    fn fwi(reading: FwiReading) -> Self {
        Self {
            reply: Ok(PredictionResponse {
                fwi: Some(reading),
                error: None,
            }),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn failing(err: PredictionError) -> Self {
        Self {
            reply: Err(err),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl PredictionService for ScriptedService {
    async fn predict(
        &self,
        _request: &PredictionRequest,
    ) -> Result<PredictionResponse, PredictionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

struct PanickingService;

#[async_trait]
impl PredictionService for PanickingService {
    async fn predict(
        &self,
        _request: &PredictionRequest,
    ) -> Result<PredictionResponse, PredictionError> {
        panic!("model crashed mid-request")
    }
}

fn filled_session() -> FireWeatherSession {
    let mut session = FireWeatherSession::default();
    session.fill_sample_values();
    session
}

#[tokio::test]
async fn scenario_a_low_risk_without_coordinates() {
    let service = ScriptedService::fwi(FwiReading::Text("5.50".to_string()));
    let mut session = filled_session();

    let ticket = session.begin_submit().expect("complete form");
    assert_eq!(ticket.request.value(FormField::Latitude), "");
    assert_eq!(ticket.request.value(FormField::Longitude), "");

    session.apply_prediction(execute(&service, ticket).await);

    let result = session.prediction().expect("result");
    assert_eq!(result.display_value(), "5.50");
    assert_eq!(result.risk(), RiskCategory::Low);
    assert_eq!(result.risk().color_hex(), "#2ecc71");
}

#[tokio::test]
async fn scenario_b_high_risk() {
    let service = ScriptedService::fwi(FwiReading::Text("13.2".to_string()));
    let mut session = filled_session();

    let ticket = session.begin_submit().expect("complete form");
    session.apply_prediction(execute(&service, ticket).await);

    let result = session.prediction().expect("result");
    assert_eq!(result.display_value(), "13.20");
    assert_eq!(result.risk(), RiskCategory::High);
}

#[tokio::test]
async fn scenario_c_geolocation_recenters_map() {
    let provider = FixedGeolocation::new(Coordinate::new(28.6139, 77.2090));
    let mut session = filled_session();
    let before = session.form().snapshot();

    let ticket = session
        .begin_locate(provider.is_supported())
        .expect("supported host");
    let outcome = session.apply_location(locate(&provider, ticket).await);

    assert_eq!(
        outcome,
        LocateOutcome::Located(Coordinate::new(28.6139, 77.2090))
    );
    assert_eq!(session.form().get(FormField::Latitude), "28.613900");
    assert_eq!(session.form().get(FormField::Longitude), "77.209000");
    for field in FormField::ALL.into_iter().filter(|field| !field.is_coordinate()) {
        assert_eq!(session.form().get(field), before.get(field));
    }

    let view = session.map_view();
    assert_eq!(view.zoom, FOCUS_ZOOM);
    assert_eq!(view.center, Coordinate::new(28.6139, 77.209));
    assert_eq!(view.markers.len(), 1);
    assert_eq!(view.markers[0].position, Coordinate::new(28.6139, 77.209));
    assert!(view.markers[0].label.contains("28.613900"));
    assert!(view.markers[0].label.contains("77.209000"));
    assert!(session.drain_notices().is_empty());
}

#[test]
fn scenario_d_unsupported_geolocation_keeps_default_map() {
    let mut session = filled_session();
    let before = session.form().snapshot();

    assert!(session.begin_locate(false).is_none());

    assert_eq!(session.drain_notices(), vec![Notice::GeolocationUnsupported]);
    assert_eq!(Notice::GeolocationUnsupported.message(), "Geolocation not supported.");
    assert_eq!(session.form().snapshot(), before);
    let view = session.map_view();
    assert_eq!(view.center, DEFAULT_CENTER);
    assert_eq!(view.center, Coordinate::new(20.5937, 78.9629));
    assert_eq!(view.zoom, DEFAULT_ZOOM);
    assert!(view.markers.is_empty());
}

#[tokio::test]
async fn scenario_e_rejected_request_ends_in_error() {
    let service = ScriptedService::failing(PredictionError::Rejected { status: 502 });
    let mut session = filled_session();

    let ticket = session.begin_submit().expect("complete form");
    assert_eq!(session.submit_label(), "Predicting...");
    session.apply_prediction(execute(&service, ticket).await);

    assert_eq!(session.lifecycle(), RequestLifecycle::Error);
    assert!(session.prediction().is_none());
    assert!(session.can_submit());
    assert_eq!(session.submit_label(), "Predict FWI");
    assert_eq!(
        session.prediction_error(),
        Some("Prediction failed. Check backend.")
    );
}

#[tokio::test]
async fn scenario_f_later_submission_wins_regardless_of_resolution_order() {
    let low = ScriptedService::fwi(FwiReading::Number(2.0));
    let extreme = ScriptedService::fwi(FwiReading::Number(30.0));

    let mut session = filled_session();
    let first = session.begin_submit().expect("first");
    let second = session.begin_submit().expect("second");

    let first_done = execute(&low, first).await;
    let second_done = execute(&extreme, second).await;

    // The later submission resolves first; the earlier one arrives afterwards.
    let settled = session.apply_prediction(second_done);
    assert!(matches!(settled, SettleOutcome::Succeeded(_)));
    assert_eq!(session.lifecycle(), RequestLifecycle::Success);

    let stale = session.apply_prediction(first_done);
    assert_eq!(stale, SettleOutcome::Superseded);

    let result = session.prediction().expect("result");
    assert_eq!(result.risk(), RiskCategory::Extreme);
    assert_eq!(result.display_value(), "30.00");
}

#[tokio::test]
async fn scenario_f_loading_persists_until_latest_settles() {
    let service = ScriptedService::fwi(FwiReading::Number(8.0));
    let mut session = filled_session();
    let first = session.begin_submit().expect("first");
    let second = session.begin_submit().expect("second");

    session.apply_prediction(execute(&service, first).await);
    assert_eq!(session.lifecycle(), RequestLifecycle::Loading);
    assert!(session.prediction().is_none());

    session.apply_prediction(execute(&service, second).await);
    assert_eq!(session.lifecycle(), RequestLifecycle::Success);
    assert_eq!(
        session.prediction().map(|result| result.risk()),
        Some(RiskCategory::Moderate)
    );
    assert_eq!(service.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn incomplete_form_never_reaches_the_service() {
    let mut session = filled_session();
    session.update_field(FormField::Isi, "");

    let err = session.begin_submit().expect_err("blocked");
    let SubmitError::Invalid(issues) = err;
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].field, FormField::Isi);
    assert_eq!(issues[0].kind, FieldIssueKind::Missing);
    assert_eq!(session.lifecycle(), RequestLifecycle::Idle);

    let notices = session.drain_notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].message().contains("ISI is required"));
}

#[tokio::test]
async fn panicking_service_still_leaves_loading() {
    let mut session = filled_session();
    let ticket = session.begin_submit().expect("complete form");

    let completion = execute(&PanickingService, ticket).await;
    assert!(matches!(completion.outcome, Err(PredictionError::Aborted(_))));

    session.apply_prediction(completion);
    assert_eq!(session.lifecycle(), RequestLifecycle::Error);
    assert!(session.can_submit());
}

#[test]
fn geolocation_failure_keeps_coordinates_and_notifies() {
    let mut session = filled_session();
    session.update_field(FormField::Latitude, "-33.8688");
    session.update_field(FormField::Longitude, "151.2093");

    let ticket = session.begin_locate(true).expect("supported");
    session.apply_location(LocateCompletion {
        seq: ticket.seq,
        outcome: Err(GeolocationError::PermissionDenied),
    });

    assert_eq!(session.form().get(FormField::Latitude), "-33.8688");
    assert_eq!(session.form().get(FormField::Longitude), "151.2093");
    let notices = session.drain_notices();
    assert_eq!(
        notices,
        vec![Notice::GeolocationFailed(GeolocationError::PermissionDenied)]
    );
    assert_eq!(notices[0].message(), "Location error. Allow permission.");
}

#[test]
fn stale_geolocation_failure_after_newer_success_is_ignored() {
    let mut session = FireWeatherSession::default();
    let first = session.begin_locate(true).expect("first");
    let second = session.begin_locate(true).expect("second");

    session.apply_location(LocateCompletion {
        seq: second.seq,
        outcome: Ok(Coordinate::new(1.0, 2.0)),
    });
    let stale = session.apply_location(LocateCompletion {
        seq: first.seq,
        outcome: Err(GeolocationError::PermissionDenied),
    });

    assert_eq!(stale, LocateOutcome::Superseded);
    assert_eq!(session.form().latitude(), "1.000000");
    assert_eq!(session.form().longitude(), "2.000000");
    assert!(session.drain_notices().is_empty());
}

#[test]
fn typed_coordinates_drive_the_map_but_other_fields_do_not() {
    let mut session = FireWeatherSession::default();
    session.update_field(FormField::Latitude, "-33.8688");
    assert_eq!(session.map_view().center, DEFAULT_CENTER);

    session.update_field(FormField::Longitude, "151.2093");
    assert_eq!(session.map_view().center, Coordinate::new(-33.8688, 151.2093));
    assert_eq!(session.map_view().zoom, FOCUS_ZOOM);

    let view_before = session.map_view().clone();
    session.update_field(FormField::Rain, "4");
    assert_eq!(session.map_view(), &view_before);

    session.update_field(FormField::Longitude, "");
    assert_eq!(session.map_view().center, DEFAULT_CENTER);
    assert_eq!(session.map_view().zoom, DEFAULT_ZOOM);
    assert!(session.map_view().markers.is_empty());
}

#[test]
fn update_by_unknown_name_is_rejected_without_side_effects() {
    let mut session = filled_session();
    let before = session.form().snapshot();
    assert!(session.update_field_by_name("Humidity", "1").is_err());
    assert_eq!(session.form().snapshot(), before);

    session
        .update_field_by_name("latitude", "10")
        .expect("known field");
    session
        .update_field_by_name("longitude", "20")
        .expect("known field");
    assert_eq!(session.map_view().center, Coordinate::new(10.0, 20.0));
}
