//! # Wardley Mapper
//!
//! An interactive Wardley Map editor. Components sit on a canvas whose horizontal
//! axis is evolution (genesis → custom-built → product → commodity); they are
//! linked by dependency lines and annotated with strategic zones.
//!
//! ## Features
//! - Component creation, dragging and stage classification by position
//! - Dependency connections and evolution projection arrows
//! - Opportunity, threat, inertia, war and note zones with notes and resizing
//! - Canvas panning and zooming
//! - Undo/redo of every edit
//! - Automatic local persistence, JSON import/export, SVG export
//! - An AI strategy coach backed by a chat proxy
//!
//! Everything except the `ui` module is independent of the windowing toolkit and
//! can be driven directly, which is how the tests exercise it.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod coach;
pub mod config;
pub mod constants;
pub mod error;
pub mod interaction;
pub mod persistence;
pub mod render;
pub mod stage;
pub mod transform;
pub mod types;
pub mod undo;
mod ui;

// Re-export public types and functions
pub use error::MapError;
pub use stage::{classify, Stage};
pub use transform::Viewport;
pub use types::*;
pub use ui::{render_svg, WardleyApp};
pub use undo::{UndoAction, UndoHistory};

/// Runs the map editor with default settings.
///
/// A tokio runtime must be entered on the calling thread; coach requests and
/// file dialogs are spawned onto it.
///
/// # Returns
///
/// Returns `Ok(())` if the application runs successfully, or an `eframe::Error` if
/// initialization fails.
///
/// # Example
///
/// ```no_run
/// use wardley_mapper::run_app;
///
/// fn main() -> Result<(), eframe::Error> {
///     let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
///     let _guard = rt.enter();
///     run_app()
/// }
/// ```
pub fn run_app() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Wardley Mapper")
            .with_inner_size([1400.0, 900.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Wardley Mapper",
        options,
        Box::new(|cc| Ok(Box::new(WardleyApp::new(cc)))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_default() {
        let map = WardleyMap::default();
        assert!(map.nodes().is_empty());
        assert!(map.connections().is_empty());
        assert!(map.zones().is_empty());
    }

    #[test]
    fn test_reexports_cover_the_editing_surface() {
        let mut map = WardleyMap::new();
        let id = map.add_node("Kettle", Stage::Product).unwrap();
        assert_eq!(classify(map.node(id).unwrap().x), Stage::Product);
        assert!(render_svg(&map, true).contains("Kettle"));
    }
}
