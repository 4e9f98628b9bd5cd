//! Painting the canvas scene with egui.
//!
//! Everything drawn here comes from a [`Scene`]; this module only decides
//! colors, strokes and fonts. Layers go back to front: stage bands, zones,
//! connections, evolution arrows, nodes, then the connection preview.

use crate::render::{ArrowShape, ButtonShape, ConnectionShape, NodeShape, Scene, ZoneShape};
use crate::types::ZoneType;
use eframe::egui;
use eframe::epaint::{CubicBezierShape, StrokeKind};

/// Base RGB color of each zone type, shared with SVG export.
pub fn zone_rgb(zone_type: ZoneType) -> (u8, u8, u8) {
    match zone_type {
        ZoneType::Opportunity => (76, 175, 80),
        ZoneType::Inertia => (255, 152, 0),
        ZoneType::Threat => (244, 67, 54),
        ZoneType::War => (156, 39, 176),
        ZoneType::Note => (33, 150, 243),
    }
}

/// Colors that change with the light/dark theme.
struct Palette {
    band_even: egui::Color32,
    band_odd: egui::Color32,
    divider: egui::Color32,
    text: egui::Color32,
    muted: egui::Color32,
    node_fill: egui::Color32,
    node_stroke: egui::Color32,
    connection: egui::Color32,
    highlight: egui::Color32,
    evolution: egui::Color32,
}

impl Palette {
    fn new(dark_mode: bool) -> Self {
        if dark_mode {
            Self {
                band_even: egui::Color32::from_gray(30),
                band_odd: egui::Color32::from_gray(36),
                divider: egui::Color32::from_gray(90),
                text: egui::Color32::from_gray(230),
                muted: egui::Color32::from_gray(160),
                node_fill: egui::Color32::from_rgb(45, 52, 64),
                node_stroke: egui::Color32::from_gray(200),
                connection: egui::Color32::from_gray(170),
                highlight: egui::Color32::from_rgb(100, 150, 255),
                evolution: egui::Color32::from_rgb(255, 112, 67),
            }
        } else {
            Self {
                band_even: egui::Color32::from_gray(250),
                band_odd: egui::Color32::from_gray(242),
                divider: egui::Color32::from_gray(180),
                text: egui::Color32::from_gray(30),
                muted: egui::Color32::from_gray(110),
                node_fill: egui::Color32::WHITE,
                node_stroke: egui::Color32::from_gray(60),
                connection: egui::Color32::from_gray(90),
                highlight: egui::Color32::from_rgb(33, 110, 230),
                evolution: egui::Color32::from_rgb(230, 81, 0),
            }
        }
    }
}

fn font(size: f32, zoom: f32) -> egui::FontId {
    egui::FontId::proportional((size * zoom).clamp(7.0, 32.0))
}

/// Paints a scene whose coordinates are relative to `origin` (the canvas widget's top-left).
pub fn paint_scene(painter: &egui::Painter, scene: &Scene, origin: egui::Vec2, dark_mode: bool) {
    let palette = Palette::new(dark_mode);
    let zoom = scene.zoom;

    for (i, band) in scene.bands.iter().enumerate() {
        let rect = band.rect.translate(origin);
        let fill = if i % 2 == 0 { palette.band_even } else { palette.band_odd };
        painter.rect_filled(rect, 0.0, fill);
        if i > 0 {
            painter.add(egui::Shape::dashed_line(
                &[rect.left_top(), rect.left_bottom()],
                egui::Stroke::new(1.0, palette.divider),
                8.0,
                6.0,
            ));
        }
        if let Some(label) = band.label {
            painter.text(
                egui::pos2(rect.center().x, rect.min.y + 8.0),
                egui::Align2::CENTER_TOP,
                label,
                font(15.0, zoom),
                palette.muted,
            );
        }
    }

    for zone in &scene.zones {
        paint_zone(painter, zone, origin, zoom, &palette);
    }
    for connection in &scene.connections {
        paint_connection(painter, connection, origin, &palette);
    }
    for arrow in &scene.arrows {
        paint_arrow(painter, arrow, origin, zoom, &palette);
    }
    for node in &scene.nodes {
        paint_node(painter, node, origin, zoom, &palette);
    }

    if let Some((from, to)) = scene.preview {
        painter.add(egui::Shape::dashed_line(
            &[from + origin, to + origin],
            egui::Stroke::new(2.0, palette.highlight),
            6.0,
            4.0,
        ));
    }
}

fn paint_zone(painter: &egui::Painter, zone: &ZoneShape, origin: egui::Vec2, zoom: f32, palette: &Palette) {
    let rect = zone.rect.translate(origin);
    let (r, g, b) = zone_rgb(zone.zone_type);
    let alpha = if zone.hovered { 48 } else { 28 };
    painter.rect_filled(rect, 6.0, egui::Color32::from_rgba_unmultiplied(r, g, b, alpha));
    painter.rect_stroke(
        rect,
        6.0,
        egui::Stroke::new(1.5, egui::Color32::from_rgb(r, g, b)),
        StrokeKind::Inside,
    );
    painter.text(
        rect.left_top() + egui::vec2(8.0, 6.0),
        egui::Align2::LEFT_TOP,
        zone.zone_type.as_str(),
        font(12.0, zoom),
        egui::Color32::from_rgb(r, g, b),
    );
    if let Some(note) = &zone.note {
        painter.text(
            rect.left_bottom() + egui::vec2(8.0, -6.0),
            egui::Align2::LEFT_BOTTOM,
            format!("📝 {note}"),
            font(11.0, zoom),
            palette.text,
        );
    }
    for (_, handle) in &zone.handles {
        let handle = handle.translate(origin);
        painter.rect_filled(handle, 2.0, egui::Color32::WHITE);
        painter.rect_stroke(
            handle,
            2.0,
            egui::Stroke::new(1.0, egui::Color32::from_rgb(r, g, b)),
            StrokeKind::Inside,
        );
    }
    for button in &zone.buttons {
        paint_button(painter, button, origin, palette);
    }
}

fn paint_connection(painter: &egui::Painter, connection: &ConnectionShape, origin: egui::Vec2, palette: &Palette) {
    let points = connection.curve.map(|p| p + origin);
    let stroke = if connection.selected {
        egui::Stroke::new(3.0, palette.highlight)
    } else {
        egui::Stroke::new(1.5, palette.connection)
    };
    painter.add(CubicBezierShape::from_points_stroke(
        points,
        false,
        egui::Color32::TRANSPARENT,
        stroke,
    ));
}

fn paint_arrow(painter: &egui::Painter, arrow: &ArrowShape, origin: egui::Vec2, zoom: f32, palette: &Palette) {
    let from = arrow.from + origin;
    let to = arrow.to + origin;
    let width = if arrow.active { 3.0 } else { 2.0 };
    let stroke = egui::Stroke::new(width, palette.evolution);
    painter.add(egui::Shape::dashed_line(&[from, to], stroke, 8.0, 5.0));

    // Head
    let direction = (to - from).normalized();
    if direction.is_finite() {
        let back = to - direction * 10.0;
        let side = direction.rot90() * 6.0;
        painter.add(egui::Shape::convex_polygon(
            vec![to, back + side, back - side],
            palette.evolution,
            egui::Stroke::NONE,
        ));
    }
    if arrow.active {
        painter.circle_stroke(to, crate::constants::ARROW_GRAB_RADIUS, egui::Stroke::new(1.0, palette.evolution));
    }
    painter.text(
        to + egui::vec2(0.0, -10.0),
        egui::Align2::CENTER_BOTTOM,
        arrow.label,
        font(11.0, zoom),
        palette.evolution,
    );
}

fn paint_node(painter: &egui::Painter, node: &NodeShape, origin: egui::Vec2, zoom: f32, palette: &Palette) {
    let rect = node.rect.translate(origin);
    let stroke = if node.pending_source {
        egui::Stroke::new(3.0, palette.highlight)
    } else if node.hovered {
        egui::Stroke::new(2.0, palette.highlight)
    } else {
        egui::Stroke::new(1.5, palette.node_stroke)
    };
    painter.rect_filled(rect, 8.0, palette.node_fill);
    painter.rect_stroke(rect, 8.0, stroke, StrokeKind::Inside);

    painter.text(
        rect.center() - egui::vec2(0.0, 5.0 * zoom),
        egui::Align2::CENTER_CENTER,
        &node.label,
        font(13.0, zoom),
        palette.text,
    );
    let badge_color = if node.evolving { palette.evolution } else { palette.muted };
    painter.text(
        rect.center_bottom() - egui::vec2(0.0, 4.0 * zoom),
        egui::Align2::CENTER_BOTTOM,
        &node.badge,
        font(10.0, zoom),
        badge_color,
    );
    if node.note.is_some() {
        painter.text(
            rect.right_top() + egui::vec2(-4.0, 2.0),
            egui::Align2::RIGHT_TOP,
            "📝",
            font(11.0, zoom),
            palette.text,
        );
    }
    for button in &node.actions {
        paint_button(painter, button, origin, palette);
    }
}

fn paint_button<A>(painter: &egui::Painter, button: &ButtonShape<A>, origin: egui::Vec2, palette: &Palette) {
    let rect = button.rect.translate(origin).shrink(1.0);
    let text_color = if button.enabled { palette.text } else { palette.muted };
    painter.rect_filled(rect, 4.0, palette.node_fill);
    painter.rect_stroke(rect, 4.0, egui::Stroke::new(1.0, palette.divider), StrokeKind::Inside);
    painter.text(
        rect.center(),
        egui::Align2::CENTER_CENTER,
        button.label,
        egui::FontId::proportional(11.0),
        text_color,
    );
}
