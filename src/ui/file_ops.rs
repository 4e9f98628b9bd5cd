//! File operations for saving, loading and exporting maps.
//!
//! Native file dialogs run on the tokio runtime; their results come back over
//! the file operation channel and are applied at the start of the next frame.

use super::export::render_svg;
use super::state::{spawn_background, FileOperationResult, PendingLoadOperation, PendingSaveOperation, WardleyApp};
use crate::persistence;
use eframe::egui;
use std::sync::mpsc::Sender;

const DEFAULT_FILE_NAME: &str = "wardley-map.json";
const DEFAULT_SVG_NAME: &str = "wardley-map.svg";

impl WardleyApp {
    /// Handles pending file operations.
    ///
    /// This method processes completed async file operations and initiates new ones.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The egui context for requesting repaints
    pub fn handle_pending_operations(&mut self, ctx: &egui::Context) {
        // First, process any completed file operations from the channel
        while let Ok(result) = self.file.file_operation_receiver.try_recv() {
            self.apply_file_result(result);
        }

        // Handle pending save operations
        if let Some(save_op) = self.file.pending_save_operation.take() {
            let sender = self.file.file_operation_sender.clone();
            let ctx = ctx.clone();
            let spawned = match save_op {
                PendingSaveOperation::Save if self.file.current_path.is_some() => {
                    let path = self.file.current_path.clone().unwrap_or_default();
                    match persistence::export_text(&self.map) {
                        Ok(json) => spawn_background(async move {
                            let result = match std::fs::write(&path, json) {
                                Ok(()) => FileOperationResult::SaveCompleted(path),
                                Err(e) => FileOperationResult::OperationFailed(format!("Failed to save file: {e}")),
                            };
                            notify(&sender, &ctx, result);
                        }),
                        Err(err) => Err(err),
                    }
                }
                PendingSaveOperation::Save | PendingSaveOperation::SaveAs => match persistence::export_text(&self.map) {
                    Ok(json) => spawn_background(async move {
                        let Some(handle) = rfd::AsyncFileDialog::new()
                            .add_filter("JSON", &["json"])
                            .set_file_name(DEFAULT_FILE_NAME)
                            .save_file()
                            .await
                        else {
                            return;
                        };
                        let path = handle.path().display().to_string();
                        let result = match std::fs::write(handle.path(), json) {
                            Ok(()) => FileOperationResult::SaveCompleted(path),
                            Err(e) => FileOperationResult::OperationFailed(format!("Failed to save file: {e}")),
                        };
                        notify(&sender, &ctx, result);
                    }),
                    Err(err) => Err(err),
                },
                PendingSaveOperation::ExportSvg => {
                    let svg = render_svg(&self.map, self.settings.show_stage_labels);
                    spawn_background(async move {
                        let Some(handle) = rfd::AsyncFileDialog::new()
                            .add_filter("SVG", &["svg"])
                            .set_file_name(DEFAULT_SVG_NAME)
                            .save_file()
                            .await
                        else {
                            return;
                        };
                        let path = handle.path().display().to_string();
                        let result = match std::fs::write(handle.path(), svg) {
                            Ok(()) => FileOperationResult::ExportCompleted(path),
                            Err(e) => FileOperationResult::OperationFailed(format!("Failed to save SVG: {e}")),
                        };
                        notify(&sender, &ctx, result);
                    })
                }
            };
            if let Err(err) = spawned {
                self.show_error(format!("Could not save: {err}"));
            }
        }

        // Handle pending load operations
        if let Some(PendingLoadOperation::Load) = self.file.pending_load_operation.take() {
            let sender = self.file.file_operation_sender.clone();
            let ctx = ctx.clone();
            let spawned = spawn_background(async move {
                let Some(handle) = rfd::AsyncFileDialog::new()
                    .add_filter("JSON", &["json"])
                    .pick_file()
                    .await
                else {
                    log::debug!("open dialog cancelled");
                    return;
                };
                let path = handle.path().display().to_string();
                let result = match std::fs::read_to_string(handle.path()) {
                    Ok(json) => FileOperationResult::LoadCompleted(path, json),
                    Err(e) => FileOperationResult::OperationFailed(format!("Failed to read file: {e}")),
                };
                notify(&sender, &ctx, result);
            });
            if let Err(err) = spawned {
                self.show_error(format!("Could not open: {err}"));
            }
        }
    }

    /// Applies the outcome of a finished file operation.
    pub fn apply_file_result(&mut self, result: FileOperationResult) {
        match result {
            FileOperationResult::SaveCompleted(path) => {
                log::info!("map saved to {path}");
                self.file.current_path = Some(path);
            }
            FileOperationResult::ExportCompleted(path) => {
                log::info!("SVG exported to {path}");
            }
            FileOperationResult::LoadCompleted(path, content) => match self.import_from_text(&content) {
                Ok(()) => {
                    log::info!("map loaded from {path}");
                    self.file.current_path = Some(path);
                }
                Err(err) => self.show_error(format!("Could not open {path}: {err}")),
            },
            FileOperationResult::OperationFailed(error) => self.show_error(error),
        }
    }
}

fn notify(sender: &Sender<FileOperationResult>, ctx: &egui::Context, result: FileOperationResult) {
    let _ = sender.send(result);
    ctx.request_repaint();
}
