//! Application state management structures.
//!
//! This module holds the editor's state: the map being edited, the view onto
//! it, modal dialogs, the coach conversation and pending file operations. It
//! also owns the mutations the UI triggers outside of canvas gestures, so every
//! change goes through [`WardleyApp::commit`] and lands in the undo history.

use crate::coach::{ChatClient, CoachConversation};
use crate::config::Settings;
use crate::error::MapError;
use crate::interaction::{GestureMode, InteractionController, Outcome, UiRequest};
use crate::persistence;
use crate::stage::Stage;
use crate::transform::Viewport;
use crate::types::*;
use crate::undo::{UndoAction, UndoHistory};
use eframe::egui;
use std::future::Future;
use std::sync::mpsc::{channel, Receiver, Sender};

/// The "Add Component" dialog's fields.
#[derive(Debug, Clone, PartialEq)]
pub struct AddComponentDialog {
    /// Name typed so far
    pub name: String,
    /// Stage picked for the new component
    pub stage: Stage,
    /// Whether the name field already grabbed keyboard focus
    pub focus_requested: bool,
}

impl Default for AddComponentDialog {
    fn default() -> Self {
        Self {
            name: String::new(),
            stage: Stage::Genesis,
            focus_requested: false,
        }
    }
}

/// The note editor's fields.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteDialog {
    /// What the note belongs to
    pub target: NoteTarget,
    /// Note text being edited
    pub text: String,
}

/// The import dialog's fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportDialog {
    /// Pasted JSON
    pub text: String,
    /// Why the last import attempt failed
    pub error: Option<String>,
}

/// Which modal windows are open, with their contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModalState {
    /// Add component dialog
    pub add_component: Option<AddComponentDialog>,
    /// Note editor
    pub note: Option<NoteDialog>,
    /// Import dialog
    pub import: Option<ImportDialog>,
    /// Export dialog showing this JSON
    pub export_text: Option<String>,
    /// Whether the help window is showing
    pub show_help: bool,
    /// Whether the clear-map confirmation is showing
    pub confirm_clear: bool,
    /// Blocking error message
    pub error: Option<String>,
}

impl ModalState {
    /// Whether any modal window is open. The canvas ignores input while one is.
    pub fn any_open(&self) -> bool {
        self.add_component.is_some()
            || self.note.is_some()
            || self.import.is_some()
            || self.export_text.is_some()
            || self.show_help
            || self.confirm_clear
            || self.error.is_some()
    }
}

/// Coach conversation plus the channel its replies come back on.
pub struct CoachState {
    /// Messages, draft and request status
    pub conversation: CoachConversation,
    /// Whether the coach panel is expanded
    pub open: bool,
    /// Sender cloned into each request task
    pub reply_sender: Sender<Result<String, MapError>>,
    /// Receiver drained once per frame
    pub reply_receiver: Receiver<Result<String, MapError>>,
}

impl Default for CoachState {
    fn default() -> Self {
        let (reply_sender, reply_receiver) = channel();
        Self {
            conversation: CoachConversation::default(),
            open: false,
            reply_sender,
            reply_receiver,
        }
    }
}

/// State related to file operations.
///
/// Manages the current file path and async file dialogs.
pub struct FileState {
    /// Current file path for save/load operations
    pub current_path: Option<String>,
    /// Save or export waiting to be started
    pub pending_save_operation: Option<PendingSaveOperation>,
    /// Load waiting to be started
    pub pending_load_operation: Option<PendingLoadOperation>,
    /// Channel for receiving file operation results from async contexts
    pub file_operation_sender: Sender<FileOperationResult>,
    /// Receiver drained once per frame
    pub file_operation_receiver: Receiver<FileOperationResult>,
}

impl Default for FileState {
    fn default() -> Self {
        let (sender, receiver) = channel();
        Self {
            current_path: None,
            pending_save_operation: None,
            pending_load_operation: None,
            file_operation_sender: sender,
            file_operation_receiver: receiver,
        }
    }
}

/// Represents a pending save operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingSaveOperation {
    /// Save with a new file path (show file picker)
    SaveAs,
    /// Save to the existing file path
    Save,
    /// Write the map as an SVG image (show file picker)
    ExportSvg,
}

/// Represents a pending load operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingLoadOperation {
    /// Load from a file (show file picker)
    Load,
}

/// Messages sent from async file operations back to the main app.
#[derive(Debug)]
pub enum FileOperationResult {
    /// Save operation completed successfully with the given path
    SaveCompleted(String),
    /// SVG export completed successfully with the given path
    ExportCompleted(String),
    /// Load operation completed successfully with path and content
    LoadCompleted(String, String),
    /// Operation failed with an error message
    OperationFailed(String),
}

/// The main application structure containing UI state and the map data.
///
/// This struct implements the `eframe::App` trait and handles all user interface
/// rendering and interaction logic.
pub struct WardleyApp {
    /// The map being edited
    pub map: WardleyMap,
    /// Pan and zoom of the canvas
    pub viewport: Viewport,
    /// Canvas gesture state machine
    pub interaction: InteractionController,
    /// Undo/redo history for tracking and reversing actions
    pub undo_history: UndoHistory,
    /// Persisted preferences
    pub settings: Settings,
    /// AI coach panel state
    pub coach: CoachState,
    /// Open dialogs
    pub modals: ModalState,
    /// File operations state
    pub file: FileState,
    /// The map changed since it was last written to storage
    pub dirty: bool,
    /// The coach history changed since it was last written to storage
    pub coach_dirty: bool,
}

impl Default for WardleyApp {
    fn default() -> Self {
        Self {
            map: WardleyMap::new(),
            viewport: Viewport::default(),
            interaction: InteractionController::new(),
            undo_history: UndoHistory::new(),
            settings: Settings::default(),
            coach: CoachState::default(),
            modals: ModalState::default(),
            file: FileState::default(),
            dirty: false,
            coach_dirty: false,
        }
    }
}

impl WardleyApp {
    /// Creates the app, restoring the map, coach history and settings from storage.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings = Settings::load(cc.storage);
        let mut app = Self {
            settings,
            ..Self::default()
        };
        if let Some(storage) = cc.storage {
            app.map = persistence::load_document(storage);
            app.coach.conversation = CoachConversation::load(storage);
        }
        app
    }

    /// Records a committed edit in the undo history and marks the map for saving.
    pub fn commit(&mut self, action: UndoAction) {
        log::debug!("commit: {}", action.describe());
        self.undo_history.push_action(action);
        self.dirty = true;
    }

    /// Applies what the interaction controller asked for.
    pub fn handle_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Committed(action) => self.commit(action),
            Outcome::Request(UiRequest::EditNote(target)) => self.open_note_editor(target),
            Outcome::Redraw | Outcome::Ignored => {}
        }
    }

    /// Shows a blocking error window.
    pub fn show_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{message}");
        self.modals.error = Some(message);
    }

    /// Adds a component at the default position for `stage`.
    pub fn add_component(&mut self, name: &str, stage: Stage) -> Result<NodeId, MapError> {
        let id = self.map.add_node(name, stage)?;
        if let Some(node) = self.map.node(id).cloned() {
            self.commit(UndoAction::NodeCreated { node });
        }
        Ok(id)
    }

    /// Submits the add component dialog. A blank name keeps the dialog open
    /// and shows the validation message.
    pub fn submit_add_component(&mut self) {
        let Some(dialog) = self.modals.add_component.clone() else {
            return;
        };
        match self.add_component(&dialog.name, dialog.stage) {
            Ok(_) => self.modals.add_component = None,
            Err(err) => self.show_error(err.to_string()),
        }
    }

    /// Adds a zone of the given type.
    pub fn add_zone(&mut self, zone_type: ZoneType) -> ZoneId {
        let id = self.map.add_zone(zone_type);
        if let Some(zone) = self.map.zone(id).cloned() {
            self.commit(UndoAction::ZoneCreated { zone });
        }
        id
    }

    /// Opens the note editor pre-filled with the target's current note.
    pub fn open_note_editor(&mut self, target: NoteTarget) {
        let text = self.map.note(target).unwrap_or_default().to_string();
        self.modals.note = Some(NoteDialog { target, text });
    }

    /// Saves the note editor's text and closes it.
    pub fn save_note(&mut self) {
        let Some(dialog) = self.modals.note.take() else {
            return;
        };
        let action = match dialog.target {
            NoteTarget::Node(id) => {
                let Some(before) = self.map.node(id).cloned() else {
                    return;
                };
                if let Err(err) = self.map.set_note(dialog.target, &dialog.text) {
                    log::warn!("note not saved: {err}");
                    return;
                }
                self.map
                    .node(id)
                    .filter(|after| **after != before)
                    .map(|after| UndoAction::NodeChanged {
                        before,
                        after: after.clone(),
                    })
            }
            NoteTarget::Zone(id) => {
                let Some(before) = self.map.zone(id).cloned() else {
                    return;
                };
                if let Err(err) = self.map.set_note(dialog.target, &dialog.text) {
                    log::warn!("note not saved: {err}");
                    return;
                }
                self.map
                    .zone(id)
                    .filter(|after| **after != before)
                    .map(|after| UndoAction::ZoneChanged {
                        before,
                        after: after.clone(),
                    })
            }
        };
        if let Some(action) = action {
            self.commit(action);
        }
    }

    /// Replaces the map with the JSON document in `text`.
    ///
    /// The replacement is a single undoable step. On failure nothing changes.
    pub fn import_from_text(&mut self, text: &str) -> Result<(), MapError> {
        let before = self.map.serialize();
        persistence::import_text(&mut self.map, text)?;
        let after = self.map.serialize();
        self.interaction.reset();
        self.commit(UndoAction::DocumentReplaced { before, after });
        log::info!("imported map with {} components", self.map.nodes().len());
        Ok(())
    }

    /// Submits the import dialog. It stays open showing the error if the text is invalid.
    pub fn submit_import(&mut self) {
        let Some(text) = self.modals.import.as_ref().map(|d| d.text.clone()) else {
            return;
        };
        match self.import_from_text(&text) {
            Ok(()) => self.modals.import = None,
            Err(err) => {
                log::warn!("import failed: {err}");
                if let Some(dialog) = self.modals.import.as_mut() {
                    dialog.error = Some(err.to_string());
                }
            }
        }
    }

    /// Opens the export dialog with the current map as JSON.
    pub fn open_export(&mut self) {
        match persistence::export_text(&self.map) {
            Ok(json) => self.modals.export_text = Some(json),
            Err(err) => self.show_error(format!("Export failed: {err}")),
        }
    }

    /// Empties the map. Undo brings it back.
    pub fn clear_map(&mut self) {
        if self.map.is_empty() {
            return;
        }
        let before = self.map.serialize();
        self.map.clear();
        self.interaction.reset();
        self.commit(UndoAction::DocumentReplaced {
            before,
            after: Document::default(),
        });
        log::info!("map cleared");
    }

    /// Performs an undo operation, reverting the most recent action.
    ///
    /// Ignored while a gesture is in progress: the gesture owns the document until
    /// it is released or cancelled.
    pub fn perform_undo(&mut self) {
        if self.interaction.mode() != GestureMode::Idle {
            return;
        }
        if self.undo_history.undo(&mut self.map) {
            self.interaction.reset();
            self.dirty = true;
        }
    }

    /// Performs a redo operation, reapplying the most recently undone action.
    pub fn perform_redo(&mut self) {
        if self.interaction.mode() != GestureMode::Idle {
            return;
        }
        if self.undo_history.redo(&mut self.map) {
            self.interaction.reset();
            self.dirty = true;
        }
    }

    /// Pans the canvas so the component sits in the middle of the view.
    pub fn focus_node(&mut self, id: NodeId) {
        if let Some(node) = self.map.node(id) {
            self.viewport.center_on(node.position());
        }
    }

    /// Sends the text in the coach input box, emptying it once the message is accepted.
    pub fn send_coach_draft(&mut self, ctx: Option<&egui::Context>) {
        let text = std::mem::take(&mut self.coach.conversation.draft);
        if !self.send_coach_message(&text, ctx) {
            self.coach.conversation.draft = text;
        }
    }

    /// Starts a coach request for `text`.
    ///
    /// Blank text and a second message while one is pending are ignored.
    /// Returns whether the message was accepted.
    pub fn send_coach_message(&mut self, text: &str, ctx: Option<&egui::Context>) -> bool {
        if let Err(err) = self.coach.conversation.begin(text) {
            log::debug!("coach message not sent: {err}");
            return false;
        }
        self.coach_dirty = true;
        let payload = self.coach.conversation.payload(&self.settings.coach, &self.map);
        let client = ChatClient::new(self.settings.coach.endpoint.clone());
        let sender = self.coach.reply_sender.clone();
        let ctx = ctx.cloned();
        let spawned = spawn_background(async move {
            let result = client.send(&payload).await;
            let _ = sender.send(result);
            if let Some(ctx) = ctx {
                ctx.request_repaint();
            }
        });
        if let Err(err) = spawned {
            self.coach.conversation.finish(Err(err));
        }
        true
    }

    /// Records coach replies that arrived since the last frame.
    pub fn poll_coach(&mut self) {
        while let Ok(result) = self.coach.reply_receiver.try_recv() {
            self.coach.conversation.finish(result);
            self.coach_dirty = true;
        }
    }

    /// Forgets the coach conversation.
    pub fn clear_coach(&mut self) {
        self.coach.conversation.clear();
        self.coach_dirty = true;
    }

    /// Writes whatever changed since the last call to storage.
    pub fn persist(&mut self, storage: &mut dyn eframe::Storage) {
        if self.dirty {
            match persistence::save_document(storage, &self.map) {
                Ok(()) => self.dirty = false,
                Err(err) => log::error!("Failed to save map: {err}"),
            }
        }
        if self.coach_dirty {
            self.coach.conversation.save(storage);
            storage.flush();
            self.coach_dirty = false;
        }
    }
}

/// Runs `future` on the ambient tokio runtime.
///
/// Fails with [`MapError::Network`] when no runtime is running on this thread.
pub fn spawn_background<F>(future: F) -> Result<(), MapError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let handle = tokio::runtime::Handle::try_current()
        .map_err(|_| MapError::Network("no async runtime available".to_string()))?;
    handle.spawn(future);
    Ok(())
}
