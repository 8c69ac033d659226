use std::{collections::VecDeque, time::Duration};

use client_core::{
    config::DEFAULT_PREDICTION_ENDPOINT, FireWeatherSession, GeolocationError, LocateCompletion,
    LocateOutcome, MapSettings, PredictionCompletion, PredictionError, RequestLifecycle,
    SettleOutcome,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::domain::{FormField, InputKind};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{
    classify_prediction_failure, err_label, UiError, UiErrorContext, UiEvent,
};
use crate::controller::orchestration::dispatch_backend_command;
use crate::ui::map_panel;

const EMPTY_READOUT: &str = "—";
const MAP_HEIGHT: f32 = 320.0;

#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub map_settings: MapSettings,
    pub endpoint: String,
    pub geolocation_supported: bool,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            map_settings: MapSettings::default(),
            endpoint: DEFAULT_PREDICTION_ENDPOINT.to_string(),
            geolocation_supported: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusBannerSeverity {
    Error,
}

#[derive(Debug, Clone)]
struct StatusBanner {
    severity: StatusBannerSeverity,
    message: String,
}

fn readout(value: &str) -> &str {
    if value.trim().is_empty() {
        EMPTY_READOUT
    } else {
        value
    }
}

/// Grid rows in display order; the coordinates close the form.
const FORM_ROWS: [FormField; FormField::COUNT] = FormField::ALL;

/// Result-panel location block; the typed text is shown as entered.
fn selected_location(latitude: &str, longitude: &str) -> String {
    format!("Selected Location\nLat: {latitude}\nLon: {longitude}")
}

fn input_hint(field: FormField) -> String {
    match (field.input_kind(), field.accepted_range()) {
        (_, Some(range)) => format!("{} - {}", range.start(), range.end()),
        (InputKind::Numeric, None) => "number".to_string(),
        (InputKind::Text, None) => String::new(),
    }
}

pub struct DesktopGuiApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    session: FireWeatherSession,
    endpoint: String,
    geolocation_supported: bool,
    status: String,
    status_banner: Option<StatusBanner>,
    alerts: VecDeque<String>,
}

impl DesktopGuiApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        startup: StartupConfig,
    ) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            session: FireWeatherSession::new(startup.map_settings),
            endpoint: startup.endpoint,
            geolocation_supported: startup.geolocation_supported,
            status: "Ready".to_string(),
            status_banner: None,
            alerts: VecDeque::new(),
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::PredictionSettled(completion) => self.settle_prediction(completion),
                UiEvent::LocationSettled(completion) => self.settle_location(completion),
                UiEvent::Error(err) => {
                    self.status = format!("{} error: {}", err_label(err.category()), err.message());
                    if err.context() == UiErrorContext::BackendStartup {
                        self.status_banner = Some(StatusBanner {
                            severity: StatusBannerSeverity::Error,
                            message: err.message().to_string(),
                        });
                    }
                }
            }
        }
        self.collect_notices();
    }

    fn settle_prediction(&mut self, completion: PredictionCompletion) {
        match self.session.apply_prediction(completion) {
            SettleOutcome::Succeeded(result) => {
                self.status = format!(
                    "Predicted FWI {} ({})",
                    result.display_value(),
                    result.risk().label()
                );
            }
            SettleOutcome::Failed(err) => {
                let ui_err = UiError::from_message(UiErrorContext::Prediction, err.to_string());
                tracing::warn!(category = err_label(ui_err.category()), "{}", ui_err.message());
                self.status = classify_prediction_failure(&err, &self.endpoint);
            }
            SettleOutcome::Superseded => {
                tracing::debug!("ignoring completion of a superseded prediction");
            }
        }
    }

    fn settle_location(&mut self, completion: LocateCompletion) {
        match self.session.apply_location(completion) {
            LocateOutcome::Located(_) => {
                self.status = "Location updated".to_string();
            }
            LocateOutcome::Failed(err) => {
                let err = UiError::from_geolocation(&err);
                self.status = format!("{} error: {}", err_label(err.category()), err.message());
            }
            LocateOutcome::Superseded => {}
        }
    }

    fn collect_notices(&mut self) {
        for notice in self.session.drain_notices() {
            self.alerts.push_back(notice.message());
        }
    }

    fn send(&mut self, cmd: BackendCommand) {
        if let Err(cmd) = dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status) {
            let err = UiError::from_message(UiErrorContext::General, self.status.clone());
            tracing::warn!(category = err_label(err.category()), "{}", err.message());
            self.settle_undispatched(cmd);
        }
    }

    /// A ticket that never reached the worker still has to settle.
    fn settle_undispatched(&mut self, cmd: BackendCommand) {
        match cmd {
            BackendCommand::Predict(ticket) => self.settle_prediction(PredictionCompletion {
                seq: ticket.seq,
                outcome: Err(PredictionError::Aborted(self.status.clone())),
            }),
            BackendCommand::Locate(ticket) => self.settle_location(LocateCompletion {
                seq: ticket.seq,
                outcome: Err(GeolocationError::PositionUnavailable(self.status.clone())),
            }),
        }
    }

    fn submit(&mut self) {
        if let Ok(ticket) = self.session.begin_submit() {
            self.status = "Predicting...".to_string();
            self.send(BackendCommand::Predict(ticket));
        }
        self.collect_notices();
    }

    fn request_location(&mut self) {
        if let Some(ticket) = self.session.begin_locate(self.geolocation_supported) {
            self.status = "Locating...".to_string();
            self.send(BackendCommand::Locate(ticket));
        }
        self.collect_notices();
    }

    fn field_input(&mut self, ui: &mut egui::Ui, field: FormField) {
        let mut value = self.session.form().get(field).to_string();
        let response = ui.add(
            egui::TextEdit::singleline(&mut value)
                .hint_text(input_hint(field))
                .desired_width(150.0),
        );
        if response.changed() {
            self.session.update_field(field, value);
        }
    }

    fn show_form(&mut self, ui: &mut egui::Ui) {
        ui.heading("Weather observations");
        ui.add_space(6.0);
        egui::Grid::new("fwi_form_grid")
            .num_columns(2)
            .spacing([12.0, 6.0])
            .striped(true)
            .show(ui, |ui| {
                for field in FORM_ROWS {
                    ui.label(field.label());
                    self.field_input(ui, field);
                    ui.end_row();
                }
            });

        ui.add_space(8.0);
        if ui.button("Fill sample values").clicked() {
            self.session.fill_sample_values();
            self.status = "Sample values filled".to_string();
        }
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            let submit = egui::Button::new(self.session.submit_label())
                .min_size(egui::vec2(140.0, 28.0));
            if ui.add_enabled(self.session.can_submit(), submit).clicked() {
                self.submit();
            }
            if self.session.lifecycle() == RequestLifecycle::Loading {
                ui.spinner();
            }
        });
    }

    fn show_location(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Get My Location").clicked() {
                self.request_location();
            }
            let form = self.session.form();
            ui.label(format!("Lat: {}", readout(form.latitude())));
            ui.label(format!("Lon: {}", readout(form.longitude())));
        });
    }

    fn show_result(&self, ui: &mut egui::Ui) {
        if let Some(result) = self.session.prediction() {
            let [r, g, b] = result.risk().color_rgb();
            egui::Frame::NONE
                .fill(egui::Color32::from_rgb(r, g, b))
                .corner_radius(8.0)
                .inner_margin(egui::Margin::symmetric(14, 10))
                .show(ui, |ui| {
                    ui.label(
                        egui::RichText::new(format!("Predicted FWI: {}", result.display_value()))
                            .heading()
                            .color(egui::Color32::WHITE),
                    );
                    ui.label(
                        egui::RichText::new(format!("Risk Level: {}", result.risk().label()))
                            .strong()
                            .color(egui::Color32::WHITE),
                    );
                    let form = self.session.form();
                    ui.label(
                        egui::RichText::new(selected_location(form.latitude(), form.longitude()))
                            .color(egui::Color32::WHITE),
                    );
                });
        } else if let Some(message) = self.session.prediction_error() {
            ui.colored_label(egui::Color32::from_rgb(231, 76, 60), message);
        }
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        if let Some(banner) = self.status_banner.clone() {
            let (fill, stroke) = match banner.severity {
                StatusBannerSeverity::Error => (
                    egui::Color32::from_rgb(111, 53, 53),
                    egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)),
                ),
            };

            egui::Frame::NONE
                .fill(fill)
                .stroke(stroke)
                .corner_radius(8.0)
                .inner_margin(egui::Margin::symmetric(10, 8))
                .show(ui, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        ui.label(egui::RichText::new(&banner.message).color(egui::Color32::WHITE));
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("Dismiss").clicked() {
                                self.status_banner = None;
                            }
                        });
                    });
                });
        }
    }

    fn show_alert(&mut self, ctx: &egui::Context) {
        let Some(message) = self.alerts.front().cloned() else {
            return;
        };
        let mut dismissed = false;
        egui::Window::new("Notice")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(message);
                ui.add_space(6.0);
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });
        if dismissed {
            self.alerts.pop_front();
        }
    }
}

impl eframe::App for DesktopGuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        egui::TopBottomPanel::top("app_header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Fire Weather Index Predictor");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(egui::RichText::new(&self.endpoint).small().weak());
                });
            });
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.label(&self.status);
        });

        egui::SidePanel::left("form_panel")
            .resizable(false)
            .min_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.show_form(ui));
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_status_banner(ui);
            self.show_location(ui);
            ui.add_space(6.0);
            map_panel::show_map(ui, self.session.map_view(), MAP_HEIGHT);
            ui.add_space(10.0);
            self.show_result(ui);
        });

        self.show_alert(ctx);

        if self.session.lifecycle() == RequestLifecycle::Loading {
            ctx.request_repaint_after(Duration::from_millis(16));
        } else {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

#[cfg(test)]
mod tests {
    use client_core::{orchestrator::PREDICTION_FAILED_MESSAGE, RiskCategory};
    use crossbeam_channel::bounded;
    use shared::protocol::{FwiReading, PredictionResponse};

    use super::*;

    fn app_with_queue(
        capacity: usize,
        geolocation_supported: bool,
    ) -> (DesktopGuiApp, Receiver<BackendCommand>, Sender<UiEvent>) {
        let (cmd_tx, cmd_rx) = bounded(capacity);
        let (ui_tx, ui_rx) = bounded(16);
        let app = DesktopGuiApp::new(
            cmd_tx,
            ui_rx,
            StartupConfig {
                geolocation_supported,
                ..StartupConfig::default()
            },
        );
        (app, cmd_rx, ui_tx)
    }

    #[test]
    fn readout_uses_placeholder_for_empty_values() {
        assert_eq!(readout(""), EMPTY_READOUT);
        assert_eq!(readout("  "), EMPTY_READOUT);
        assert_eq!(readout("28.613900"), "28.613900");
    }

    #[test]
    fn coordinates_are_the_last_form_rows() {
        assert_eq!(FORM_ROWS.len(), 14);
        assert_eq!(FORM_ROWS[0], FormField::Day);
        assert_eq!(FORM_ROWS[11], FormField::Bui);
        assert_eq!(FORM_ROWS[12], FormField::Latitude);
        assert_eq!(FORM_ROWS[13], FormField::Longitude);
    }

    #[test]
    fn selected_location_shows_typed_text_verbatim() {
        assert_eq!(
            selected_location("28.6139", "77.2090"),
            "Selected Location\nLat: 28.6139\nLon: 77.2090"
        );
        assert_eq!(
            selected_location("10", "-5.50000"),
            "Selected Location\nLat: 10\nLon: -5.50000"
        );
    }

    #[test]
    fn hints_show_accepted_ranges() {
        assert_eq!(input_hint(FormField::Day), "1 - 31");
        assert_eq!(input_hint(FormField::Rain), "number");
    }

    #[test]
    fn incomplete_form_raises_alert_without_dispatch() {
        let (mut app, cmd_rx, _ui_tx) = app_with_queue(4, true);
        app.submit();

        assert!(cmd_rx.try_recv().is_err());
        assert_eq!(app.alerts.len(), 1);
        assert!(app.alerts[0].starts_with("Please complete the form"));
        assert!(app.session.can_submit());
    }

    #[test]
    fn submit_dispatches_and_completion_renders_result() {
        let (mut app, cmd_rx, ui_tx) = app_with_queue(4, true);
        app.session.fill_sample_values();
        app.submit();
        assert!(!app.session.can_submit());

        let Ok(BackendCommand::Predict(ticket)) = cmd_rx.try_recv() else {
            panic!("expected a queued prediction");
        };
        assert_eq!(ticket.request.value(FormField::Bui), "30");

        ui_tx
            .send(UiEvent::PredictionSettled(PredictionCompletion {
                seq: ticket.seq,
                outcome: Ok(PredictionResponse {
                    fwi: Some(FwiReading::Text("13.2".to_string())),
                    error: None,
                }),
            }))
            .expect("send completion");
        app.process_ui_events();

        let result = app.session.prediction().expect("result");
        assert_eq!(result.risk(), RiskCategory::High);
        assert!(app.session.can_submit());
        assert_eq!(app.status, "Predicted FWI 13.20 (High)");
    }

    #[test]
    fn dead_backend_still_leaves_loading() {
        let (mut app, cmd_rx, _ui_tx) = app_with_queue(4, true);
        drop(cmd_rx);
        app.session.fill_sample_values();
        app.submit();

        assert_eq!(app.session.lifecycle(), RequestLifecycle::Error);
        assert_eq!(app.session.prediction_error(), Some(PREDICTION_FAILED_MESSAGE));
        assert_eq!(app.alerts.back().map(String::as_str), Some(PREDICTION_FAILED_MESSAGE));
        assert!(app.session.can_submit());
    }

    #[test]
    fn unsupported_geolocation_alerts_and_sends_nothing() {
        let (mut app, cmd_rx, _ui_tx) = app_with_queue(4, false);
        app.request_location();

        assert!(cmd_rx.try_recv().is_err());
        assert_eq!(
            app.alerts.front().map(String::as_str),
            Some("Geolocation not supported.")
        );
        assert_eq!(app.session.form().latitude(), "");
    }

    #[test]
    fn located_position_fills_coordinates_and_map() {
        let (mut app, cmd_rx, ui_tx) = app_with_queue(4, true);
        app.request_location();
        let Ok(BackendCommand::Locate(ticket)) = cmd_rx.try_recv() else {
            panic!("expected a queued locate");
        };

        ui_tx
            .send(UiEvent::LocationSettled(LocateCompletion {
                seq: ticket.seq,
                outcome: Ok(shared::domain::Coordinate::new(28.6139, 77.2090)),
            }))
            .expect("send completion");
        app.process_ui_events();

        assert_eq!(app.session.form().latitude(), "28.613900");
        assert_eq!(app.session.form().longitude(), "77.209000");
        assert_eq!(app.session.map_view().zoom, 12);
        assert_eq!(app.session.map_view().markers.len(), 1);
        assert!(app.alerts.is_empty());
    }

    #[test]
    fn backend_errors_raise_the_banner() {
        let (mut app, _cmd_rx, ui_tx) = app_with_queue(4, true);
        ui_tx
            .send(UiEvent::Error(UiError::from_message(
                UiErrorContext::BackendStartup,
                "backend worker startup failure: failed to build backend runtime",
            )))
            .expect("send error");
        app.process_ui_events();

        let banner = app.status_banner.as_ref().expect("banner");
        assert_eq!(banner.severity, StatusBannerSeverity::Error);
        assert!(app.status.starts_with("Unexpected error"));
    }
}
