//! Shared application-wide constants.
//! Centralizes tweakable values used across the model, interaction and rendering.

// Canvas extent
/// Logical canvas width in canvas units. The four evolution stages split it evenly.
pub const CANVAS_WIDTH: f32 = 2000.0;
/// Logical canvas height in canvas units.
pub const CANVAS_HEIGHT: f32 = 1200.0;
/// Width of a single evolution stage band.
pub const STAGE_WIDTH: f32 = CANVAS_WIDTH / 4.0;

// Node dimensions and placement
/// Node width in canvas units.
pub const NODE_WIDTH: f32 = 140.0;
/// Node height in canvas units.
pub const NODE_HEIGHT: f32 = 44.0;
/// Y coordinate of the first default placement row.
pub const DEFAULT_NODE_Y: f32 = 120.0;
/// Vertical step between default placement rows.
pub const NODE_SPACING: f32 = 70.0;

// Zones
/// Default zone width for newly added zones.
pub const ZONE_DEFAULT_WIDTH: f32 = 300.0;
/// Default zone height for newly added zones.
pub const ZONE_DEFAULT_HEIGHT: f32 = 200.0;
/// Smallest width or height a zone can be resized to.
pub const ZONE_MIN_SIZE: f32 = 50.0;
/// Default top-left corner of a zone added without an explicit position.
pub const DEFAULT_ZONE_POSITION: (f32, f32) = (100.0, 100.0);
/// Offset applied per existing zone so new zones don't stack exactly.
pub const ZONE_CASCADE: f32 = 30.0;

// Zoom
/// Lowest zoom factor (30%).
pub const MIN_ZOOM: f32 = 0.3;
/// Highest zoom factor (300%).
pub const MAX_ZOOM: f32 = 3.0;
/// Multiplicative zoom step for toolbar buttons and one wheel notch.
pub const ZOOM_STEP: f32 = 1.1;
/// Initial viewport size used before the first frame reports the real one.
pub const DEFAULT_VIEWPORT_SIZE: (f32, f32) = (1200.0, 800.0);

// Hit areas, in screen pixels
/// Side length of a zone resize handle.
pub const HANDLE_SIZE: f32 = 10.0;
/// Height of the hover action bar above a node.
pub const ACTION_BAR_HEIGHT: f32 = 20.0;
/// Width of one action button in the node action bar.
pub const ACTION_BUTTON_WIDTH: f32 = 58.0;
/// Size of the square zone action buttons.
pub const ZONE_BUTTON_SIZE: f32 = 18.0;
/// Distance within which a click lands on a connection path.
pub const CLICK_THRESHOLD: f32 = 8.0;
/// Grab radius around an evolution arrow head.
pub const ARROW_GRAB_RADIUS: f32 = 10.0;

// Import limits
/// Largest component or zone id accepted from an imported document
/// (the largest integer a JSON number holds exactly).
pub const MAX_IMPORTED_ID: u64 = 9_007_199_254_740_991;

// Undo/redo
/// Maximum number of undo history entries to retain.
pub const MAX_UNDO_HISTORY: usize = 100;
