//! Modal windows: add component, note editor, import, export, help, clear
//! confirmation and the blocking error message.

use super::state::{AddComponentDialog, ImportDialog, WardleyApp};
use crate::stage::Stage;
use crate::types::NoteTarget;
use eframe::egui;

fn modal(title: &str) -> egui::Window<'static> {
    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
}

const HELP_TEXT: &[(&str, &str)] = &[
    ("➕ Add Component", "Name a component and pick its starting stage. It appears in that stage's column."),
    ("Move", "Drag a component. Its stage follows the column it lands in."),
    ("Connect", "Hover a component, press Connect, then click the component it depends on."),
    ("Evolve", "Hover a component and press Evolve to project its next stage. Drag the arrow head to adjust it."),
    ("Zones", "Add opportunity, threat, inertia, war or note zones from the toolbar. Drag corners to resize."),
    ("Notes", "Hover a component or zone and press Note (📝) to annotate it."),
    ("Navigate", "Scroll to zoom, hold Space and drag to pan. Click a component in the list to center it."),
    ("Keyboard", "Ctrl+Z undo, Ctrl+Shift+Z or Ctrl+Y redo, Delete removes the selected connection, Escape cancels."),
    ("🤖 AI Strategy Coach", "Open the coach panel and ask about your map. It sees every component, dependency and zone."),
];

impl WardleyApp {
    /// Opens the add component dialog.
    pub fn open_add_component(&mut self) {
        self.modals.add_component = Some(AddComponentDialog::default());
    }

    /// Opens an empty import dialog.
    pub fn open_import(&mut self) {
        self.modals.import = Some(ImportDialog::default());
    }

    /// Shows whichever modal windows are open.
    pub fn show_dialogs(&mut self, ctx: &egui::Context) {
        // The error window sits above everything and blocks the others.
        if self.modals.error.is_some() {
            self.show_error_dialog(ctx);
            return;
        }
        self.show_add_component_dialog(ctx);
        self.show_note_dialog(ctx);
        self.show_import_dialog(ctx);
        self.show_export_dialog(ctx);
        self.show_clear_dialog(ctx);
        self.show_help_dialog(ctx);
    }

    fn show_error_dialog(&mut self, ctx: &egui::Context) {
        let Some(message) = self.modals.error.clone() else {
            return;
        };
        let mut dismissed = false;
        modal("⚠ Error").show(ctx, |ui| {
            ui.label(&message);
            ui.add_space(8.0);
            if ui.button("OK").clicked() || ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                dismissed = true;
            }
        });
        if dismissed {
            self.modals.error = None;
        }
    }

    fn show_add_component_dialog(&mut self, ctx: &egui::Context) {
        let Some(dialog) = self.modals.add_component.as_mut() else {
            return;
        };
        let mut submit = false;
        let mut cancel = false;
        modal("➕ Add Component").show(ctx, |ui| {
            ui.label("Component name:");
            let response = ui.text_edit_singleline(&mut dialog.name);
            if !dialog.focus_requested {
                response.request_focus();
                dialog.focus_requested = true;
            }
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                submit = true;
            }

            ui.add_space(6.0);
            ui.label("Evolution stage:");
            egui::ComboBox::from_id_salt("new_component_stage")
                .selected_text(dialog.stage.label())
                .show_ui(ui, |ui| {
                    for stage in Stage::ALL {
                        ui.selectable_value(&mut dialog.stage, stage, stage.label());
                    }
                });

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("Add").clicked() {
                    submit = true;
                }
                if ui.button("Cancel").clicked() {
                    cancel = true;
                }
            });
        });
        if cancel {
            self.modals.add_component = None;
        } else if submit {
            self.submit_add_component();
        }
    }

    fn show_note_dialog(&mut self, ctx: &egui::Context) {
        let Some(dialog) = self.modals.note.as_mut() else {
            return;
        };
        let title = match dialog.target {
            NoteTarget::Node(_) => "📝 Component Note",
            NoteTarget::Zone(_) => "📝 Zone Note",
        };
        let subject = match dialog.target {
            NoteTarget::Node(id) => self.map.node(id).map(|n| n.label.clone()),
            NoteTarget::Zone(id) => self.map.zone(id).map(|z| format!("{} zone", z.zone_type.as_str())),
        };
        let mut save = false;
        let mut cancel = false;
        modal(title).show(ctx, |ui| {
            if let Some(subject) = &subject {
                ui.strong(subject);
            }
            ui.add(
                egui::TextEdit::multiline(&mut dialog.text)
                    .desired_rows(5)
                    .desired_width(320.0)
                    .hint_text("Leave empty to remove the note"),
            );
            ui.horizontal(|ui| {
                if ui.button("Save").clicked() {
                    save = true;
                }
                if ui.button("Cancel").clicked() {
                    cancel = true;
                }
            });
        });
        if subject.is_none() || cancel {
            self.modals.note = None;
        } else if save {
            self.save_note();
        }
    }

    fn show_import_dialog(&mut self, ctx: &egui::Context) {
        let Some(dialog) = self.modals.import.as_mut() else {
            return;
        };
        let mut import = false;
        let mut cancel = false;
        modal("⬆ Import Map").show(ctx, |ui| {
            ui.label("Paste map JSON:");
            egui::ScrollArea::vertical().max_height(300.0).show(ui, |ui| {
                ui.add(
                    egui::TextEdit::multiline(&mut dialog.text)
                        .code_editor()
                        .desired_rows(12)
                        .desired_width(420.0),
                );
            });
            if let Some(error) = &dialog.error {
                ui.colored_label(ui.visuals().error_fg_color, error);
            }
            ui.horizontal(|ui| {
                if ui.button("Import").clicked() {
                    import = true;
                }
                if ui.button("Cancel").clicked() {
                    cancel = true;
                }
            });
        });
        if cancel {
            self.modals.import = None;
        } else if import {
            self.submit_import();
        }
    }

    fn show_export_dialog(&mut self, ctx: &egui::Context) {
        let Some(json) = self.modals.export_text.clone() else {
            return;
        };
        let mut close = false;
        modal("⬇ Export Map").show(ctx, |ui| {
            egui::ScrollArea::vertical().max_height(300.0).show(ui, |ui| {
                ui.add(
                    egui::TextEdit::multiline(&mut json.as_str())
                        .code_editor()
                        .desired_width(420.0),
                );
            });
            ui.horizontal(|ui| {
                if ui.button("📋 Copy to clipboard").clicked() {
                    ui.ctx().copy_text(json.clone());
                    log::info!("copied map JSON to clipboard");
                }
                if ui.button("Close").clicked() {
                    close = true;
                }
            });
        });
        if close {
            self.modals.export_text = None;
        }
    }

    fn show_clear_dialog(&mut self, ctx: &egui::Context) {
        if !self.modals.confirm_clear {
            return;
        }
        let mut confirmed = false;
        let mut cancel = false;
        modal("Clear Map").show(ctx, |ui| {
            ui.label("Remove every component, connection and zone?");
            ui.label("You can undo this.");
            ui.horizontal(|ui| {
                if ui.button("Clear").clicked() {
                    confirmed = true;
                }
                if ui.button("Cancel").clicked() {
                    cancel = true;
                }
            });
        });
        if confirmed {
            self.clear_map();
        }
        if confirmed || cancel {
            self.modals.confirm_clear = false;
        }
    }

    fn show_help_dialog(&mut self, ctx: &egui::Context) {
        if !self.modals.show_help {
            return;
        }
        let mut close = false;
        modal("❓ How to use").show(ctx, |ui| {
            egui::Grid::new("help_grid").num_columns(2).spacing([12.0, 6.0]).show(ui, |ui| {
                for (topic, text) in HELP_TEXT {
                    ui.strong(*topic);
                    ui.label(*text);
                    ui.end_row();
                }
            });
            ui.add_space(8.0);
            if ui.button("Close").clicked() {
                close = true;
            }
        });
        if close {
            self.modals.show_help = false;
        }
    }
}
