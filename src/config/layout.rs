//! # Document Layout
//!
//! Everything the derivation pipeline needs to know about the physical
//! document: canvas sizes, the minimum usable canvas side and the two regions
//! cut out of the rotated image. The orientation correction itself is fixed
//! and lives with the pipeline.
//!
//! The default is the national ID card layout the fractions were measured on.
//! A different document can be described in JSON:
//!
//! ```json
//! {
//!   "canvas": { "16:9": { "w": 1024, "h": 576 } },
//!   "min_canvas_side": 50,
//!   "id_region": { "x": 0.46, "y": 0.17, "w": 0.27, "h": 0.08 },
//!   "detail_region": { "x": 0.21, "y": 0.24, "w": 0.49, "h": 0.68 }
//! }
//! ```
//!
//! Omitted fields fall back to the ID card defaults.

use std::path::Path;

use cap_scale::region::RegionFraction;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::tables::CanvasTable;
use crate::error::{CaptureError, CaptureResult};

/// Card number band, in fractions of the rotated image.
pub const ID_NUMBER_REGION: RegionFraction = RegionFraction { x: 0.46, y: 0.17, w: 0.27, h: 0.08 };

/// Holder detail block, in fractions of the rotated image.
pub const DETAIL_REGION: RegionFraction = RegionFraction { x: 0.21, y: 0.24, w: 0.49, h: 0.68 };

/// Canvases with a side below this are too small to be useful.
pub const MIN_USABLE_CANVAS_SIDE: u32 = 50;

/// Proportional layout of the document being captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentLayout {
    /// Output canvas per target ratio
    pub canvas: CanvasTable,
    /// Resize is skipped when the canvas width or height is below this
    pub min_canvas_side: u32,
    /// Region of the card number
    pub id_region: RegionFraction,
    /// Region of the holder details
    pub detail_region: RegionFraction,
}

impl Default for DocumentLayout {
    fn default() -> Self {
        Self {
            canvas: CanvasTable::standard().clone(),
            min_canvas_side: MIN_USABLE_CANVAS_SIDE,
            id_region: ID_NUMBER_REGION,
            detail_region: DETAIL_REGION,
        }
    }
}

impl DocumentLayout {
    /// Parse and validate a layout from JSON text.
    pub fn from_json_str(json: &str) -> CaptureResult<Self> {
        let layout: DocumentLayout = serde_json::from_str(json)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Read, parse and validate a layout file.
    pub fn from_json_file(path: impl AsRef<Path>) -> CaptureResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| CaptureError::io("read layout", e).with_path(path.display().to_string()))?;
        let layout = Self::from_json_str(&text)?;
        debug!(path = %path.display(), "Loaded document layout");
        Ok(layout)
    }

    /// Check region fractions and canvas sizes.
    pub fn validate(&self) -> CaptureResult<()> {
        for (name, region) in [("id_region", &self.id_region), ("detail_region", &self.detail_region)] {
            if !region.is_within_unit() {
                return Err(CaptureError::config(
                    name,
                    format!("{region:?}"),
                    "fractions must lie in [0, 1] and the region must end inside the image",
                ));
            }
        }
        if let Some((ratio, size)) = self.canvas.iter().find(|(_, size)| size.is_empty()) {
            return Err(CaptureError::config(
                format!("canvas.{ratio}"),
                size.to_string(),
                "canvas sides must be greater than 0",
            ));
        }
        Ok(())
    }
}
