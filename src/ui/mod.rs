//! User interface components and rendering logic for the map editor.
//!
//! This module contains the main application struct and everything egui
//! specific: toolbar, component list, canvas, modal windows and the coach panel.
//!
//! # Module Organization
//!
//! - `state` - Application state structures and the main WardleyApp
//! - `canvas` - Canvas input handling and painting
//! - `rendering` - Drawing a scene with the egui painter
//! - `dialogs` - Modal windows
//! - `coach_panel` - The AI coach side panel
//! - `file_ops` - Native file dialogs for save/load/export
//! - `export` - SVG rendering

mod canvas;
mod coach_panel;
mod dialogs;
mod export;
mod file_ops;
mod rendering;
mod state;


pub use export::render_svg;
pub use state::{FileOperationResult, PendingLoadOperation, PendingSaveOperation, WardleyApp};

use crate::types::ZoneType;
use eframe::egui;

fn zone_button_label(zone_type: ZoneType) -> &'static str {
    match zone_type {
        ZoneType::Opportunity => "＋ Opportunity",
        ZoneType::Threat => "＋ Threat",
        ZoneType::Inertia => "＋ Inertia",
        ZoneType::War => "＋ War",
        ZoneType::Note => "＋ Note",
    }
}

impl eframe::App for WardleyApp {
    /// Persist settings, the map and the coach history between restarts.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        self.settings.save(storage);
        self.persist(storage);
    }

    /// Main update function called by egui for each frame.
    ///
    /// Drains async results, handles shortcuts, lays out the panels and finally
    /// writes any committed change to storage so nothing is lost on a crash.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The egui context
    /// * `frame` - The eframe frame
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        // Apply theme visuals
        let visuals = if self.settings.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };
        ctx.set_visuals(visuals);

        self.poll_coach();
        self.handle_pending_operations(ctx);

        self.handle_undo_redo_keys(ctx);
        self.handle_file_shortcuts(ctx);
        self.handle_modal_escape(ctx);

        egui::TopBottomPanel::top("top_toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });

        egui::SidePanel::left("component_list")
            .resizable(true)
            .default_width(200.0)
            .show(ctx, |ui| {
                self.draw_component_list(ui);
            });

        self.draw_coach_panel(ctx);

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.draw_canvas(ui);
            });

        self.show_dialogs(ctx);

        if let Some(storage) = frame.storage_mut() {
            self.persist(storage);
        }
    }
}

impl WardleyApp {
    /// Handles undo/redo keyboard shortcuts.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The egui context for checking input
    pub fn handle_undo_redo_keys(&mut self, ctx: &egui::Context) {
        // Text fields keep their own undo
        if ctx.wants_keyboard_input() || self.modals.any_open() {
            return;
        }
        // Ctrl+Z for undo
        if ctx.input(|i| i.key_pressed(egui::Key::Z) && i.modifiers.command && !i.modifiers.shift) {
            self.perform_undo();
        }
        // Ctrl+Shift+Z or Ctrl+Y for redo
        else if ctx.input(|i| {
            (i.key_pressed(egui::Key::Z) && i.modifiers.command && i.modifiers.shift)
                || (i.key_pressed(egui::Key::Y) && i.modifiers.command)
        }) {
            self.perform_redo();
        }
    }

    /// Cmd/Ctrl+S saves, Cmd/Ctrl+Shift+S saves as, Cmd/Ctrl+O opens.
    fn handle_file_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() || self.modals.any_open() {
            return;
        }
        ctx.input(|i| {
            let cmd = i.modifiers.command;
            if i.key_pressed(egui::Key::S) && cmd && i.modifiers.shift {
                self.file.pending_save_operation = Some(PendingSaveOperation::SaveAs);
            } else if i.key_pressed(egui::Key::S) && cmd {
                self.file.pending_save_operation = Some(PendingSaveOperation::Save);
            }
            if i.key_pressed(egui::Key::O) && cmd {
                self.file.pending_load_operation = Some(PendingLoadOperation::Load);
            }
        });
    }

    /// Escape dismisses the open dialogs (the error window first).
    fn handle_modal_escape(&mut self, ctx: &egui::Context) {
        if !self.modals.any_open() || !ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            return;
        }
        if self.modals.error.take().is_some() {
            return;
        }
        self.modals.add_component = None;
        self.modals.note = None;
        self.modals.import = None;
        self.modals.export_text = None;
        self.modals.show_help = false;
        self.modals.confirm_clear = false;
    }

    fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            if ui.button("➕ Add Component").clicked() {
                self.open_add_component();
            }
            for zone_type in ZoneType::ALL {
                if ui
                    .button(zone_button_label(zone_type))
                    .on_hover_text(format!("Add a {} zone", zone_type.as_str()))
                    .clicked()
                {
                    self.add_zone(zone_type);
                }
            }

            ui.separator();

            // Undo/Redo operations
            ui.add_enabled_ui(self.undo_history.can_undo(), |ui| {
                if ui.button("⟲ Undo").clicked() {
                    self.perform_undo();
                }
            });
            ui.add_enabled_ui(self.undo_history.can_redo(), |ui| {
                if ui.button("⟳ Redo").clicked() {
                    self.perform_redo();
                }
            });

            ui.separator();

            if ui.button("⬇ Export").clicked() {
                self.open_export();
            }
            if ui.button("⬆ Import").clicked() {
                self.open_import();
            }
            if ui.button("💾 Save file…").clicked() {
                self.file.pending_save_operation = Some(PendingSaveOperation::SaveAs);
            }
            if ui.button("📂 Open file…").clicked() {
                self.file.pending_load_operation = Some(PendingLoadOperation::Load);
            }
            if ui.button("🖼 Export SVG…").clicked() {
                self.file.pending_save_operation = Some(PendingSaveOperation::ExportSvg);
            }
            if ui.button("🗑 Clear").clicked() && !self.map.is_empty() {
                self.modals.confirm_clear = true;
            }

            ui.separator();

            if ui.button("❓ Help").clicked() {
                self.modals.show_help = true;
            }
            if ui.selectable_label(self.coach.open, "🤖 AI Coach").clicked() {
                self.coach.open = !self.coach.open;
            }

            ui.separator();

            // View options
            if ui.button("−").on_hover_text("Zoom out").clicked() {
                self.viewport.zoom_out();
            }
            ui.label(format!("{}%", self.viewport.zoom_percent()));
            if ui.button("+").on_hover_text("Zoom in").clicked() {
                self.viewport.zoom_in();
            }
            if ui.button("Reset").on_hover_text("Reset zoom and pan").clicked() {
                self.viewport.reset();
            }
            ui.checkbox(&mut self.settings.show_stage_labels, "Stage labels");
            ui.checkbox(&mut self.settings.dark_mode, "Dark Mode");

            if let Some(path) = &self.file.current_path {
                ui.separator();
                ui.weak(path);
            }
        });
    }

    /// Left panel listing every component. Clicking one centers the canvas on it.
    fn draw_component_list(&mut self, ui: &mut egui::Ui) {
        ui.heading(format!("Components ({})", self.map.nodes().len()));
        ui.separator();
        if self.map.nodes().is_empty() {
            ui.weak("No components yet.");
            ui.weak("Click \"➕ Add Component\" to start.");
            return;
        }
        let mut focus = None;
        egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
            for node in self.map.nodes() {
                let badge = crate::stage::badge_text(node.stage, node.evolving_to.filter(|_| node.evolving));
                let response = ui
                    .vertical(|ui| {
                        let clicked = ui.selectable_label(false, &node.label).clicked();
                        ui.small(badge);
                        clicked
                    })
                    .inner;
                if response {
                    focus = Some(node.id);
                }
            }
        });
        if let Some(id) = focus {
            self.focus_node(id);
        }
    }
}
