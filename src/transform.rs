//! Pan/zoom state and screen ↔ canvas coordinate conversion.
//!
//! Screen coordinates are local to the canvas widget (its top-left is the
//! origin). Canvas coordinates are the document's logical units.

use crate::constants::{DEFAULT_VIEWPORT_SIZE, MAX_ZOOM, MIN_ZOOM, ZOOM_STEP};
use egui::{Pos2, Vec2};

/// The view onto the canvas: pan offset, zoom factor and visible size.
///
/// `screen = canvas * zoom + pan`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Screen position of the canvas origin
    pub pan: Vec2,
    /// Zoom factor (1.0 = 100%)
    pub zoom: f32,
    /// Size of the visible canvas area in screen pixels
    pub size: Vec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(egui::vec2(DEFAULT_VIEWPORT_SIZE.0, DEFAULT_VIEWPORT_SIZE.1))
    }
}

impl Viewport {
    /// Creates a viewport at 100% zoom showing the canvas origin.
    pub fn new(size: Vec2) -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
            size,
        }
    }

    /// Converts a screen position into canvas coordinates.
    pub fn screen_to_canvas(&self, screen: Pos2) -> Pos2 {
        ((screen.to_vec2() - self.pan) / self.zoom).to_pos2()
    }

    /// Converts a canvas position into screen coordinates.
    pub fn canvas_to_screen(&self, canvas: Pos2) -> Pos2 {
        (canvas.to_vec2() * self.zoom + self.pan).to_pos2()
    }

    /// Converts a screen-space distance into canvas units.
    pub fn screen_delta_to_canvas(&self, delta: Vec2) -> Vec2 {
        delta / self.zoom
    }

    /// Converts a canvas rectangle into screen space.
    pub fn canvas_rect_to_screen(&self, rect: egui::Rect) -> egui::Rect {
        egui::Rect::from_min_max(self.canvas_to_screen(rect.min), self.canvas_to_screen(rect.max))
    }

    /// Moves the view by a screen-space delta, then clamps it to the canvas.
    pub fn pan(&mut self, delta: Vec2) {
        if !delta.x.is_finite() || !delta.y.is_finite() {
            return;
        }
        self.pan += delta;
        self.clamp_pan();
    }

    /// Multiplies the zoom factor, keeping the canvas point under `anchor` fixed.
    ///
    /// The result is clamped to 30%–300%. Non-finite or non-positive factors are ignored.
    pub fn zoom_by(&mut self, factor: f32, anchor: Pos2) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let anchored = self.screen_to_canvas(anchor);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = anchor.to_vec2() - anchored.to_vec2() * self.zoom;
        self.clamp_pan();
    }

    /// Zooms in one step around the center of the view.
    pub fn zoom_in(&mut self) {
        self.zoom_by(ZOOM_STEP, self.center());
    }

    /// Zooms out one step around the center of the view.
    pub fn zoom_out(&mut self) {
        self.zoom_by(1.0 / ZOOM_STEP, self.center());
    }

    /// Back to 100% zoom with the canvas origin at the top-left of the view.
    pub fn reset(&mut self) {
        self.zoom = 1.0;
        self.pan = Vec2::ZERO;
        self.clamp_pan();
    }

    /// Pans so the given canvas point sits in the middle of the view (as far as clamping allows).
    pub fn center_on(&mut self, canvas: Pos2) {
        self.pan = self.center().to_vec2() - canvas.to_vec2() * self.zoom;
        self.clamp_pan();
    }

    /// Updates the visible size, e.g. after a window resize.
    pub fn set_size(&mut self, size: Vec2) {
        if size.x > 0.0 && size.y > 0.0 && size != self.size {
            self.size = size;
            self.clamp_pan();
        }
    }

    /// Current zoom as a rounded percentage.
    pub fn zoom_percent(&self) -> u32 {
        (self.zoom * 100.0).round() as u32
    }

    /// Center of the view in screen coordinates.
    pub fn center(&self) -> Pos2 {
        (self.size / 2.0).to_pos2()
    }

    /// The canvas origin stays between the top-left corner and the center of the view:
    /// the genesis edge can never be pushed off the left side, and the map can never be
    /// pushed out of sight to the right or bottom.
    fn clamp_pan(&mut self) {
        let max = (self.size / 2.0).max(Vec2::ZERO);
        self.pan.x = self.pan.x.clamp(0.0, max.x);
        self.pan.y = self.pan.y.clamp(0.0, max.y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_default_viewport_is_identity() {
        let viewport = Viewport::default();
        let p = egui::pos2(123.0, 45.0);
        assert_eq!(viewport.canvas_to_screen(p), p);
        assert_eq!(viewport.screen_to_canvas(p), p);
        assert_eq!(viewport.zoom_percent(), 100);
    }

    #[test]
    fn test_conversion_round_trip_with_pan_and_zoom() {
        let mut viewport = Viewport::default();
        viewport.zoom = 1.5;
        viewport.pan = egui::vec2(-200.0, -80.0);
        let canvas = egui::pos2(640.0, 320.0);
        let screen = viewport.canvas_to_screen(canvas);
        assert!(approx(screen.x, 640.0 * 1.5 - 200.0));
        let back = viewport.screen_to_canvas(screen);
        assert!(approx(back.x, canvas.x) && approx(back.y, canvas.y));
    }

    #[test]
    fn test_pan_moves_the_canvas() {
        let mut viewport = Viewport::default();
        let before = viewport.canvas_to_screen(egui::pos2(750.0, 120.0));
        viewport.pan(egui::vec2(200.0, 100.0));
        assert_eq!(viewport.pan, egui::vec2(200.0, 100.0));
        let after = viewport.canvas_to_screen(egui::pos2(750.0, 120.0));
        assert_eq!(after - before, egui::vec2(200.0, 100.0));
    }

    #[test]
    fn test_pan_stops_at_genesis_edge() {
        let mut viewport = Viewport::default();
        viewport.pan(egui::vec2(-2000.0, 0.0));
        assert_eq!(viewport.pan.x, 0.0);

        viewport.pan(egui::vec2(150.0, 80.0));
        viewport.pan(egui::vec2(-400.0, -400.0));
        assert_eq!(viewport.pan, Vec2::ZERO);
    }

    #[test]
    fn test_pan_keeps_origin_inside_view() {
        let mut viewport = Viewport::default();
        viewport.pan(egui::vec2(10_000.0, 10_000.0));
        assert_eq!(viewport.pan, egui::vec2(600.0, 400.0));
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut viewport = Viewport::default();
        viewport.zoom_by(1000.0, egui::pos2(10.0, 10.0));
        assert!(approx(viewport.zoom, MAX_ZOOM));
        viewport.zoom_by(0.00001, egui::pos2(10.0, 10.0));
        assert!(approx(viewport.zoom, MIN_ZOOM));
        assert_eq!(viewport.zoom_percent(), 30);
    }

    #[test]
    fn test_zoom_ignores_invalid_factors() {
        let mut viewport = Viewport::default();
        viewport.zoom_by(f32::NAN, egui::pos2(0.0, 0.0));
        viewport.zoom_by(-2.0, egui::pos2(0.0, 0.0));
        viewport.zoom_by(0.0, egui::pos2(0.0, 0.0));
        assert_eq!(viewport.zoom, 1.0);
    }

    #[test]
    fn test_zoom_then_inverse_restores_zoom() {
        let mut viewport = Viewport::default();
        let anchor = egui::pos2(600.0, 400.0);
        for factor in [1.1_f32, 1.7, 2.5, 0.8] {
            let before = viewport.zoom;
            viewport.zoom_by(factor, anchor);
            viewport.zoom_by(1.0 / factor, anchor);
            assert!(approx(viewport.zoom, before), "factor {factor}");
        }
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed() {
        let mut viewport = Viewport::default();
        viewport.pan = egui::vec2(300.0, 200.0);
        let anchor = egui::pos2(600.0, 400.0);
        let under_cursor = viewport.screen_to_canvas(anchor);
        viewport.zoom_by(1.25, anchor);
        let after = viewport.canvas_to_screen(under_cursor);
        assert!(approx(after.x, anchor.x) && approx(after.y, anchor.y));
    }

    #[test]
    fn test_zoom_buttons_and_reset() {
        let mut viewport = Viewport::default();
        viewport.zoom_in();
        assert!(viewport.zoom_percent() > 100);
        viewport.reset();
        assert_eq!(viewport.zoom_percent(), 100);
        viewport.zoom_out();
        assert!(viewport.zoom_percent() < 100);
        viewport.reset();
        assert_eq!(viewport.pan, Vec2::ZERO);
    }

    #[test]
    fn test_center_on_point() {
        let mut viewport = Viewport::default();
        viewport.center_on(egui::pos2(250.0, 120.0));
        let screen = viewport.canvas_to_screen(egui::pos2(250.0, 120.0));
        assert!(approx(screen.x, 600.0) && approx(screen.y, 400.0));

        // Points right of the view center cannot be centered without exposing the left edge
        viewport.center_on(egui::pos2(1750.0, 120.0));
        assert_eq!(viewport.pan.x, 0.0);
    }
}
