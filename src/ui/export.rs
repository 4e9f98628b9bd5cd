//! Export utility: render the whole map canvas to SVG.
//!
//! The SVG is written from the same [`Scene`](crate::render::Scene) the canvas
//! paints, built with a 100% viewport over the full canvas, so the image
//! matches what the editor shows minus hover decorations.

use super::rendering::zone_rgb;
use crate::constants::{CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::interaction::InteractionController;
use crate::render::build_scene;
use crate::transform::Viewport;
use crate::types::WardleyMap;
use std::fmt::Write as _;

const STROKE: &str = "#444444";
const EVOLUTION: &str = "#e65100";

/// Renders the map as a standalone SVG document covering the whole canvas.
pub fn render_svg(map: &WardleyMap, show_stage_labels: bool) -> String {
    let viewport = Viewport::new(egui::vec2(CANVAS_WIDTH, CANVAS_HEIGHT));
    let scene = build_scene(map, &viewport, &InteractionController::new(), show_stage_labels);
    let (width, height) = (CANVAS_WIDTH, CANVAS_HEIGHT);

    let mut out = String::with_capacity(4096);
    let _ = writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\" font-family=\"sans-serif\">"
    );

    // Stage columns
    for (i, band) in scene.bands.iter().enumerate() {
        let fill = if i % 2 == 0 { "#fafafa" } else { "#f2f2f2" };
        let r = band.rect;
        let _ = writeln!(
            out,
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{fill}\" />",
            r.min.x,
            r.min.y,
            r.width(),
            r.height()
        );
        if i > 0 {
            let _ = writeln!(
                out,
                "<line x1=\"{x:.1}\" y1=\"0\" x2=\"{x:.1}\" y2=\"{height}\" stroke=\"#b4b4b4\" stroke-dasharray=\"8 6\" />",
                x = r.min.x
            );
        }
        if let Some(label) = band.label {
            let _ = writeln!(
                out,
                "<text x=\"{:.1}\" y=\"24\" font-size=\"15\" fill=\"#6e6e6e\" text-anchor=\"middle\">{}</text>",
                r.center().x,
                escape_xml(label)
            );
        }
    }

    for zone in &scene.zones {
        let (r, g, b) = zone_rgb(zone.zone_type);
        let rect = zone.rect;
        let _ = writeln!(
            out,
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" rx=\"6\" fill=\"rgb({r},{g},{b})\" fill-opacity=\"0.11\" stroke=\"rgb({r},{g},{b})\" stroke-width=\"1.5\" />",
            rect.min.x,
            rect.min.y,
            rect.width(),
            rect.height()
        );
        let _ = writeln!(
            out,
            "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"12\" fill=\"rgb({r},{g},{b})\">{}</text>",
            rect.min.x + 8.0,
            rect.min.y + 18.0,
            zone.zone_type.as_str()
        );
        if let Some(note) = &zone.note {
            let _ = writeln!(
                out,
                "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"11\" fill=\"#1e1e1e\">{}</text>",
                rect.min.x + 8.0,
                rect.max.y - 8.0,
                escape_xml(note)
            );
        }
    }

    let _ = writeln!(out, "<g stroke=\"{STROKE}\" stroke-width=\"1.5\" fill=\"none\">");
    for connection in &scene.connections {
        let [a, c1, c2, b] = connection.curve;
        let _ = writeln!(
            out,
            "  <path d=\"M{:.1},{:.1} C{:.1},{:.1} {:.1},{:.1} {:.1},{:.1}\" />",
            a.x, a.y, c1.x, c1.y, c2.x, c2.y, b.x, b.y
        );
    }
    let _ = writeln!(out, "</g>");

    for arrow in &scene.arrows {
        let (from, to) = (arrow.from, arrow.to);
        let _ = writeln!(
            out,
            "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{EVOLUTION}\" stroke-width=\"2\" stroke-dasharray=\"8 5\" />",
            from.x, from.y, to.x, to.y
        );
        let direction = (to - from).normalized();
        if direction.is_finite() {
            let back = to - direction * 10.0;
            let side = direction.rot90() * 6.0;
            let (l, r) = (back + side, back - side);
            let _ = writeln!(
                out,
                "<polygon points=\"{:.1},{:.1} {:.1},{:.1} {:.1},{:.1}\" fill=\"{EVOLUTION}\" />",
                to.x, to.y, l.x, l.y, r.x, r.y
            );
        }
        let _ = writeln!(
            out,
            "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"11\" fill=\"{EVOLUTION}\" text-anchor=\"middle\">{}</text>",
            to.x,
            to.y - 10.0,
            escape_xml(arrow.label)
        );
    }

    for node in &scene.nodes {
        let rect = node.rect;
        let _ = writeln!(
            out,
            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" rx=\"8\" fill=\"#ffffff\" stroke=\"#3c3c3c\" stroke-width=\"1.5\" />",
            rect.min.x,
            rect.min.y,
            rect.width(),
            rect.height()
        );
        let center = rect.center();
        let _ = writeln!(
            out,
            "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"13\" fill=\"#1e1e1e\" text-anchor=\"middle\" dominant-baseline=\"central\">{}</text>",
            center.x,
            center.y - 5.0,
            escape_xml(&node.label)
        );
        let badge_fill = if node.evolving { EVOLUTION } else { "#6e6e6e" };
        let _ = writeln!(
            out,
            "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"10\" fill=\"{badge_fill}\" text-anchor=\"middle\">{}</text>",
            center.x,
            rect.max.y - 5.0,
            escape_xml(&node.badge)
        );
        if let Some(note) = &node.note {
            let _ = writeln!(out, "<title>{}</title>", escape_xml(note));
        }
    }

    let _ = writeln!(out, "</svg>");
    out
}

fn escape_xml(input: &str) -> String {
    let mut s = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => s.push_str("&amp;"),
            '<' => s.push_str("&lt;"),
            '>' => s.push_str("&gt;"),
            '"' => s.push_str("&quot;"),
            '\'' => s.push_str("&apos;"),
            _ => s.push(ch),
        }
    }
    s
}
