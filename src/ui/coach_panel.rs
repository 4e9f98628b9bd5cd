//! Side panel for the AI strategy coach.

use super::state::WardleyApp;
use crate::coach::{Role, QUICK_PROMPTS};
use eframe::egui;

impl WardleyApp {
    /// Draws the coach panel on the right edge when it is open.
    pub fn draw_coach_panel(&mut self, ctx: &egui::Context) {
        if !self.coach.open {
            return;
        }
        egui::SidePanel::right("coach_panel")
            .resizable(true)
            .default_width(340.0)
            .min_width(260.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("🤖 AI Strategy Coach");
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("✕").on_hover_text("Close").clicked() {
                            self.coach.open = false;
                        }
                        let has_history = !self.coach.conversation.messages.is_empty();
                        if ui
                            .add_enabled(has_history, egui::Button::new("🗑").small())
                            .on_hover_text("Clear conversation")
                            .clicked()
                        {
                            self.clear_coach();
                        }
                    });
                });
                ui.separator();

                let waiting = self.coach.conversation.is_waiting();

                // Input area is laid out bottom-up so the history takes the rest.
                egui::TopBottomPanel::bottom("coach_input")
                    .show_separator_line(false)
                    .show_inside(ui, |ui| {
                        if let Some(error) = &self.coach.conversation.last_error {
                            ui.colored_label(ui.visuals().error_fg_color, error);
                        }
                        ui.horizontal_wrapped(|ui| {
                            for prompt in QUICK_PROMPTS {
                                if ui.add_enabled(!waiting, egui::Button::new(prompt).small()).clicked() {
                                    self.send_coach_message(prompt, Some(ctx));
                                }
                            }
                        });
                        ui.add_space(4.0);
                        let input = ui.add(
                            egui::TextEdit::multiline(&mut self.coach.conversation.draft)
                                .desired_rows(3)
                                .desired_width(f32::INFINITY)
                                .hint_text("Ask about your map…"),
                        );
                        let enter_sends = input.has_focus()
                            && ui.input(|i| i.key_pressed(egui::Key::Enter) && !i.modifiers.shift);
                        let can_send = !waiting && !self.coach.conversation.draft.trim().is_empty();
                        let clicked = ui.add_enabled(can_send, egui::Button::new("Send")).clicked();
                        if can_send && (clicked || enter_sends) {
                            let draft = self.coach.conversation.draft.trim_end().to_string();
                            self.coach.conversation.draft = draft;
                            self.send_coach_draft(Some(ctx));
                        }
                    });

                egui::ScrollArea::vertical()
                    .stick_to_bottom(true)
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        if self.coach.conversation.messages.is_empty() {
                            ui.weak("Ask the coach about your value chain, what to build or buy, and where the risks are.");
                        }
                        for message in &self.coach.conversation.messages {
                            let (title, color) = match message.role {
                                Role::User => ("You", ui.visuals().hyperlink_color),
                                Role::Assistant => ("Coach", ui.visuals().strong_text_color()),
                            };
                            ui.colored_label(color, egui::RichText::new(title).strong());
                            ui.label(&message.content);
                            ui.add_space(8.0);
                        }
                        if waiting {
                            ui.horizontal(|ui| {
                                ui.spinner();
                                ui.weak("Thinking…");
                            });
                        }
                    });
            });
    }
}
