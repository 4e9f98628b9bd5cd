//! The map canvas widget.
//!
//! Translates egui's raw input events into interaction controller calls, then
//! paints the scene built from the updated state. Positions handed to the
//! controller are local to the canvas rectangle.

use super::rendering::paint_scene;
use super::state::WardleyApp;
use crate::interaction::{GestureMode, HitTarget};
use crate::render::build_scene;
use crate::types::Corner;
use eframe::egui;

const EMPTY_HINT: &str = "Click \"➕ Add Component\" to start mapping";
const CONNECT_HINT: &str = "Click a component to connect, Esc to cancel";

impl WardleyApp {
    /// Draws the main canvas area and handles its input.
    ///
    /// Pointer presses only count inside the canvas; releases count anywhere so
    /// a drag that leaves the canvas still ends cleanly.
    pub fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let rect = response.rect;
        let origin = rect.min.to_vec2();
        self.viewport.set_size(rect.size());

        let ctx = ui.ctx().clone();
        let keyboard_free = !ctx.wants_keyboard_input() && !self.modals.any_open();
        let accepts_press = response.contains_pointer() && !self.modals.any_open();
        let events = ui.input(|i| i.events.clone());

        for event in events {
            let outcome = match event {
                egui::Event::PointerMoved(pos) => {
                    self.interaction
                        .pointer_moved(&mut self.map, &mut self.viewport, pos - origin)
                }
                egui::Event::PointerButton {
                    pos,
                    button: egui::PointerButton::Primary,
                    pressed: true,
                    ..
                } if accepts_press && rect.contains(pos) => {
                    self.interaction.pointer_pressed(&mut self.map, &self.viewport, pos - origin)
                }
                egui::Event::PointerButton {
                    pos,
                    button: egui::PointerButton::Primary,
                    pressed: false,
                    ..
                } => self
                    .interaction
                    .pointer_released(&mut self.map, &mut self.viewport, pos - origin),
                egui::Event::MouseWheel { delta, .. } if response.contains_pointer() => {
                    match ctx.pointer_hover_pos() {
                        Some(pos) => self.interaction.wheel(&mut self.viewport, pos - origin, delta.y),
                        None => continue,
                    }
                }
                egui::Event::Key {
                    key: egui::Key::Space,
                    pressed,
                    repeat: false,
                    ..
                } if keyboard_free || !pressed => self.interaction.space_changed(pressed),
                egui::Event::Key {
                    key: egui::Key::Escape,
                    pressed: true,
                    ..
                } if keyboard_free => self.interaction.escape(&mut self.map),
                egui::Event::Key {
                    key: egui::Key::Delete | egui::Key::Backspace,
                    pressed: true,
                    ..
                } if keyboard_free => self.interaction.delete_selected(&mut self.map),
                _ => continue,
            };
            self.handle_outcome(outcome);
        }

        if response.contains_pointer() || self.interaction.mode() != GestureMode::Idle {
            ctx.set_cursor_icon(self.cursor_icon());
        }

        let scene = build_scene(
            &self.map,
            &self.viewport,
            &self.interaction,
            self.settings.show_stage_labels,
        );
        paint_scene(&painter, &scene, origin, self.settings.dark_mode);

        if self.map.nodes().is_empty() {
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                EMPTY_HINT,
                egui::FontId::proportional(18.0),
                ui.visuals().weak_text_color(),
            );
        }

        if let Some(hint) = self.mode_hint() {
            let galley = painter.layout_no_wrap(
                hint.to_string(),
                egui::FontId::proportional(14.0),
                ui.visuals().strong_text_color(),
            );
            let badge = egui::Rect::from_center_size(
                egui::pos2(rect.center().x, rect.top() + 24.0),
                galley.size() + egui::vec2(20.0, 10.0),
            );
            painter.rect_filled(badge, 6.0, ui.visuals().extreme_bg_color);
            painter.galley(badge.center() - galley.size() / 2.0, galley, egui::Color32::PLACEHOLDER);
        }
    }

    /// Banner shown at the top of the canvas while a mode needs explaining.
    pub(crate) fn mode_hint(&self) -> Option<&'static str> {
        match self.interaction.mode() {
            GestureMode::Connecting => Some(CONNECT_HINT),
            _ => None,
        }
    }

    fn cursor_icon(&self) -> egui::CursorIcon {
        match self.interaction.mode() {
            GestureMode::Panning => return egui::CursorIcon::Grabbing,
            GestureMode::DraggingNode | GestureMode::DraggingZone => return egui::CursorIcon::Move,
            GestureMode::Connecting => return egui::CursorIcon::Crosshair,
            GestureMode::DraggingEvolutionArrow => return egui::CursorIcon::ResizeHorizontal,
            GestureMode::ResizingZone | GestureMode::Idle => {}
        }
        if self.interaction.space_held() {
            return egui::CursorIcon::Grab;
        }
        match self.interaction.hover().target {
            HitTarget::ZoneHandle(_, Corner::NorthWest | Corner::SouthEast) => egui::CursorIcon::ResizeNwSe,
            HitTarget::ZoneHandle(_, Corner::NorthEast | Corner::SouthWest) => egui::CursorIcon::ResizeNeSw,
            HitTarget::Node(_) | HitTarget::Zone(_) => egui::CursorIcon::Move,
            HitTarget::NodeAction(..) | HitTarget::ZoneAction(..) | HitTarget::Connection(_) => {
                egui::CursorIcon::PointingHand
            }
            HitTarget::EvolutionArrow(_) => egui::CursorIcon::ResizeHorizontal,
            HitTarget::Empty => egui::CursorIcon::Default,
        }
    }
}
