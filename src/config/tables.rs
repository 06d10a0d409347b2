//! # Static Lookup Tables
//!
//! Two tables keyed by [`RatioLabel`], kept apart:
//!
//! | Table | Meaning | Example (16:9) |
//! |-------|---------|----------------|
//! | [`ResolutionTable`] | capture modes requested from the camera, most preferred first | 1920x1080, 1280x720, ... |
//! | [`CanvasTable`] | output document canvas the frame is resized onto | 1024x576 |
//!
//! The standard instances are built once per process and never mutated.
//! Custom tables (tests, alternative layouts) are plain values.

use std::collections::BTreeMap;

use cap_scale::presets::Size;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::config::ratio::RatioLabel;

/// One capture mode to request from a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolutionCandidate {
    pub width: u32,
    pub height: u32,
}

impl ResolutionCandidate {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn size(&self) -> Size {
        Size { w: self.width, h: self.height }
    }
}

impl std::fmt::Display for ResolutionCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

const WIDE_16X9: [ResolutionCandidate; 4] = [
    ResolutionCandidate::new(1920, 1080),
    ResolutionCandidate::new(1280, 720),
    ResolutionCandidate::new(960, 540),
    ResolutionCandidate::new(640, 360),
];

const WIDE_4X3: [ResolutionCandidate; 6] = [
    ResolutionCandidate::new(1920, 1440),
    ResolutionCandidate::new(1600, 1200),
    ResolutionCandidate::new(1280, 960),
    ResolutionCandidate::new(1024, 768),
    ResolutionCandidate::new(800, 600),
    ResolutionCandidate::new(640, 480),
];

static STANDARD_RESOLUTIONS: Lazy<ResolutionTable> = Lazy::new(|| {
    let transpose = |c: &ResolutionCandidate| ResolutionCandidate::new(c.height, c.width);
    ResolutionTable::new()
        .with_ratio(RatioLabel::Wide16x9, WIDE_16X9.to_vec())
        .with_ratio(RatioLabel::Tall9x16, WIDE_16X9.iter().map(transpose).collect())
        .with_ratio(RatioLabel::Wide4x3, WIDE_4X3.to_vec())
        .with_ratio(RatioLabel::Tall3x4, WIDE_4X3.iter().map(transpose).collect())
});

static STANDARD_CANVASES: Lazy<CanvasTable> = Lazy::new(|| {
    CanvasTable::new()
        .with_ratio(RatioLabel::Wide16x9, Size { w: 1024, h: 576 })
        .with_ratio(RatioLabel::Tall9x16, Size { w: 576, h: 1024 })
        .with_ratio(RatioLabel::Wide4x3, Size { w: 800, h: 600 })
        .with_ratio(RatioLabel::Tall3x4, Size { w: 600, h: 800 })
});

/// Ordered capture candidates per ratio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolutionTable {
    entries: BTreeMap<RatioLabel, Vec<ResolutionCandidate>>,
}

impl ResolutionTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide default table.
    pub fn standard() -> &'static ResolutionTable {
        &STANDARD_RESOLUTIONS
    }

    /// Set (replace) the candidate list for `ratio`.
    pub fn with_ratio(mut self, ratio: RatioLabel, candidates: Vec<ResolutionCandidate>) -> Self {
        self.entries.insert(ratio, candidates);
        self
    }

    /// Candidates for `ratio`, most preferred first. Missing and empty lists
    /// both return `None`: an empty list is a configuration error, not a
    /// ratio with nothing to try.
    pub fn candidates(&self, ratio: RatioLabel) -> Option<&[ResolutionCandidate]> {
        self.entries
            .get(&ratio)
            .map(Vec::as_slice)
            .filter(|list| !list.is_empty())
    }

    pub fn ratios(&self) -> impl Iterator<Item = RatioLabel> + '_ {
        self.entries.keys().copied()
    }
}

/// Output canvas size per ratio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanvasTable {
    entries: BTreeMap<RatioLabel, Size>,
}

impl CanvasTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide default table.
    pub fn standard() -> &'static CanvasTable {
        &STANDARD_CANVASES
    }

    /// Set (replace) the canvas for `ratio`.
    pub fn with_ratio(mut self, ratio: RatioLabel, size: Size) -> Self {
        self.entries.insert(ratio, size);
        self
    }

    pub fn canvas(&self, ratio: RatioLabel) -> Option<Size> {
        self.entries.get(&ratio).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RatioLabel, Size)> + '_ {
        self.entries.iter().map(|(ratio, size)| (*ratio, *size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_ratio_has_candidates() {
        let table = ResolutionTable::standard();
        for ratio in RatioLabel::ALL {
            let list = table.candidates(ratio).expect("candidates");
            assert!(!list.is_empty());
        }
    }

    #[test]
    fn candidates_match_their_ratio_and_descend() {
        let table = ResolutionTable::standard();
        for ratio in RatioLabel::ALL {
            let list = table.candidates(ratio).unwrap();
            for c in list {
                assert_eq!(c.width > c.height, !ratio.is_portrait(), "{ratio}: {c}");
            }
            for pair in list.windows(2) {
                assert!(pair[0].size().area() > pair[1].size().area());
            }
        }
    }

    #[test]
    fn empty_list_counts_as_missing() {
        let table = ResolutionTable::new().with_ratio(RatioLabel::Wide16x9, vec![]);
        assert!(table.candidates(RatioLabel::Wide16x9).is_none());
        assert!(table.candidates(RatioLabel::Wide4x3).is_none());
    }

    #[test]
    fn standard_canvases() {
        let table = CanvasTable::standard();
        assert_eq!(table.canvas(RatioLabel::Wide16x9), Some(Size { w: 1024, h: 576 }));
        assert_eq!(table.canvas(RatioLabel::Tall9x16), Some(Size { w: 576, h: 1024 }));
        assert_eq!(table.canvas(RatioLabel::Wide4x3), Some(Size { w: 800, h: 600 }));
        assert_eq!(table.canvas(RatioLabel::Tall3x4), Some(Size { w: 600, h: 800 }));
    }

    #[test]
    fn canvas_table_from_json() {
        let table: CanvasTable =
            serde_json::from_str(r#"{"16:9": {"w": 30, "h": 40}}"#).unwrap();
        assert_eq!(table.canvas(RatioLabel::Wide16x9), Some(Size { w: 30, h: 40 }));
        assert_eq!(table.canvas(RatioLabel::Wide4x3), None);
    }
}
