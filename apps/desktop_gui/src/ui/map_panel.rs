//! Schematic slippy-map panel: tile grid, center crosshair and the selected-location marker.

use client_core::{map_sync::ViewTransition, MapView};
use eframe::egui;
use shared::domain::Coordinate;

const TILE_SIZE: f64 = 256.0;
const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_78;
const PAN_SECONDS: f32 = 0.6;

const WATER: egui::Color32 = egui::Color32::from_rgb(170, 211, 223);
const GRID: egui::Color32 = egui::Color32::from_rgb(140, 180, 196);
const MARKER: egui::Color32 = egui::Color32::from_rgb(231, 76, 60);

/// Web-mercator world pixel position at `zoom`.
pub fn project(position: Coordinate, zoom: u8) -> [f64; 2] {
    let scale = TILE_SIZE * 2f64.powi(i32::from(zoom));
    let latitude = position
        .latitude
        .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
        .to_radians();
    let x = (position.longitude + 180.0) / 360.0 * scale;
    let mercator = (latitude.tan() + 1.0 / latitude.cos()).ln();
    let y = (1.0 - mercator / std::f64::consts::PI) / 2.0 * scale;
    [x, y]
}

pub fn osm_link(view: &MapView) -> String {
    format!(
        "https://www.openstreetmap.org/#map={}/{:.4}/{:.4}",
        view.zoom, view.center.latitude, view.center.longitude
    )
}

pub fn show_map(ui: &mut egui::Ui, view: &MapView, height: f32) {
    let ctx = ui.ctx().clone();
    let pan_seconds = match view.transition {
        ViewTransition::Animated => PAN_SECONDS,
        ViewTransition::Immediate => 0.0,
    };
    let latitude = ctx.animate_value_with_time(
        egui::Id::new("map_center_latitude"),
        view.center.latitude as f32,
        pan_seconds,
    );
    let longitude = ctx.animate_value_with_time(
        egui::Id::new("map_center_longitude"),
        view.center.longitude as f32,
        pan_seconds,
    );
    let shown_center = Coordinate::new(f64::from(latitude), f64::from(longitude));

    let desired = egui::vec2(ui.available_width(), height);
    let (response, painter) = ui.allocate_painter(desired, egui::Sense::hover());
    let rect = response.rect;
    painter.rect_filled(rect, 8.0, WATER);

    let origin = project(shown_center, view.zoom);
    let to_screen = |world: [f64; 2]| {
        rect.center() + egui::vec2((world[0] - origin[0]) as f32, (world[1] - origin[1]) as f32)
    };

    let grid = egui::Stroke::new(1.0, GRID);
    let half = [f64::from(rect.width()) / 2.0, f64::from(rect.height()) / 2.0];
    let mut x = ((origin[0] - half[0]) / TILE_SIZE).floor() * TILE_SIZE;
    while x <= origin[0] + half[0] {
        let sx = to_screen([x, origin[1]]).x;
        painter.line_segment([egui::pos2(sx, rect.top()), egui::pos2(sx, rect.bottom())], grid);
        x += TILE_SIZE;
    }
    let mut y = ((origin[1] - half[1]) / TILE_SIZE).floor() * TILE_SIZE;
    while y <= origin[1] + half[1] {
        let sy = to_screen([origin[0], y]).y;
        painter.line_segment([egui::pos2(rect.left(), sy), egui::pos2(rect.right(), sy)], grid);
        y += TILE_SIZE;
    }

    let cross = egui::Stroke::new(1.0, egui::Color32::from_gray(90));
    let c = rect.center();
    painter.line_segment([c - egui::vec2(6.0, 0.0), c + egui::vec2(6.0, 0.0)], cross);
    painter.line_segment([c - egui::vec2(0.0, 6.0), c + egui::vec2(0.0, 6.0)], cross);

    for marker in &view.markers {
        let at = to_screen(project(marker.position, view.zoom));
        if !rect.contains(at) {
            continue;
        }
        painter.circle_filled(at, 7.0, MARKER);
        painter.circle_stroke(at, 7.0, egui::Stroke::new(2.0, egui::Color32::WHITE));
        painter.text(
            at + egui::vec2(12.0, -10.0),
            egui::Align2::LEFT_BOTTOM,
            &marker.label,
            egui::FontId::proportional(12.0),
            egui::Color32::from_gray(30),
        );
    }

    painter.text(
        rect.left_bottom() + egui::vec2(8.0, -6.0),
        egui::Align2::LEFT_BOTTOM,
        format!(
            "{:.4}, {:.4}  ·  zoom {}",
            view.center.latitude, view.center.longitude, view.zoom
        ),
        egui::FontId::monospace(11.0),
        egui::Color32::from_gray(40),
    );

    ui.horizontal_wrapped(|ui| {
        ui.label(egui::RichText::new(view.center_tile_url()).small().weak());
        ui.hyperlink_to("Open in OpenStreetMap", osm_link(view));
    });
}
