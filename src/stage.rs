//! Evolution stages and the position → stage classifier.
//!
//! The canvas is split horizontally into four contiguous bands of equal width,
//! ordered genesis | custom | product | commodity. A node's stage is always the
//! band its center falls in.

use crate::constants::{CANVAS_WIDTH, STAGE_WIDTH};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wardley evolution stage of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Novel, poorly understood
    Genesis,
    /// Custom-built, emerging understanding
    Custom,
    /// Product or rental, increasingly understood
    Product,
    /// Commodity or utility, well understood
    Commodity,
}

impl Stage {
    /// All stages in evolution order.
    pub const ALL: [Stage; 4] = [Stage::Genesis, Stage::Custom, Stage::Product, Stage::Commodity];

    /// Position of the stage along the evolution axis, starting at 0.
    pub fn rank(self) -> usize {
        match self {
            Stage::Genesis => 0,
            Stage::Custom => 1,
            Stage::Product => 2,
            Stage::Commodity => 3,
        }
    }

    /// The stage a component evolves into next. Commodity has none.
    pub fn next(self) -> Option<Stage> {
        Stage::ALL.get(self.rank() + 1).copied()
    }

    /// Horizontal extent `(start, end)` of the stage band in canvas units.
    pub fn band(self) -> (f32, f32) {
        let start = self.rank() as f32 * STAGE_WIDTH;
        (start, start + STAGE_WIDTH)
    }

    /// Horizontal midpoint of the stage band.
    pub fn midpoint(self) -> f32 {
        let (start, end) = self.band();
        (start + end) / 2.0
    }

    /// Identifier used in the persisted document.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Genesis => "genesis",
            Stage::Custom => "custom",
            Stage::Product => "product",
            Stage::Commodity => "commodity",
        }
    }

    /// Human readable band title.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Genesis => "Genesis",
            Stage::Custom => "Custom-Built",
            Stage::Product => "Product",
            Stage::Commodity => "Commodity",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a horizontal canvas position into a stage.
///
/// Total over all inputs: anything left of the canvas (and NaN) is genesis,
/// anything at or past the right edge is commodity.
pub fn classify(x: f32) -> Stage {
    if x.is_nan() || x < STAGE_WIDTH {
        return Stage::Genesis;
    }
    if x >= CANVAS_WIDTH {
        return Stage::Commodity;
    }
    let index = (x / STAGE_WIDTH).floor() as usize;
    Stage::ALL[index.min(Stage::ALL.len() - 1)]
}

/// Text shown in a node's stage badge, e.g. `genesis → custom` while evolving.
pub fn badge_text(stage: Stage, evolving_to: Option<Stage>) -> String {
    match evolving_to {
        Some(target) => format!("{} → {}", stage, target),
        None => stage.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_band_boundaries() {
        assert_eq!(classify(0.0), Stage::Genesis);
        assert_eq!(classify(499.9), Stage::Genesis);
        assert_eq!(classify(500.0), Stage::Custom);
        assert_eq!(classify(1000.0), Stage::Product);
        assert_eq!(classify(1499.0), Stage::Product);
        assert_eq!(classify(1500.0), Stage::Commodity);
        assert_eq!(classify(1999.0), Stage::Commodity);
    }

    #[test]
    fn test_classify_is_total_outside_canvas() {
        assert_eq!(classify(-250.0), Stage::Genesis);
        assert_eq!(classify(f32::NAN), Stage::Genesis);
        assert_eq!(classify(5000.0), Stage::Commodity);
        assert_eq!(classify(f32::INFINITY), Stage::Commodity);
    }

    #[test]
    fn test_classify_is_monotonic() {
        let mut previous = classify(-100.0).rank();
        let mut x = -100.0;
        while x < CANVAS_WIDTH + 100.0 {
            let rank = classify(x).rank();
            assert!(rank >= previous, "stage rank decreased at x = {x}");
            previous = rank;
            x += 7.5;
        }
    }

    #[test]
    fn test_midpoints_classify_to_own_stage() {
        for stage in Stage::ALL {
            assert_eq!(classify(stage.midpoint()), stage);
        }
    }

    #[test]
    fn test_next_stage_chain() {
        assert_eq!(Stage::Genesis.next(), Some(Stage::Custom));
        assert_eq!(Stage::Custom.next(), Some(Stage::Product));
        assert_eq!(Stage::Product.next(), Some(Stage::Commodity));
        assert_eq!(Stage::Commodity.next(), None);
    }

    #[test]
    fn test_badge_text() {
        assert_eq!(badge_text(Stage::Genesis, None), "genesis");
        assert_eq!(badge_text(Stage::Genesis, Some(Stage::Custom)), "genesis → custom");
    }

    #[test]
    fn test_stage_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Stage::Custom).unwrap(), "\"custom\"");
        let parsed: Stage = serde_json::from_str("\"commodity\"").unwrap();
        assert_eq!(parsed, Stage::Commodity);
        assert!(serde_json::from_str::<Stage>("\"utility\"").is_err());
    }
}
