// SPDX-License-Identifier: MIT
//! # Canvas Plans
//!
//! A document canvas has a fixed output size per ratio. The source frame is
//! stretched onto the whole canvas, the same way a 2D canvas `drawImage(src, 0,
//! 0, w, h)` behaves: no letterboxing, no aspect preservation. Callers pick a
//! canvas whose ratio matches the capture ratio, so the distortion stays
//! negligible in practice.

use serde::{Deserialize, Serialize};

/// Represents a 2D size with width and height in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    /// The same size with width and height exchanged.
    pub fn transposed(self) -> Self {
        Size { w: self.h, h: self.w }
    }

    /// Number of pixels covered by this size.
    pub fn area(self) -> u64 {
        self.w as u64 * self.h as u64
    }

    /// True when either side is zero.
    pub fn is_empty(self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Smaller of the two sides.
    pub fn min_side(self) -> u32 {
        self.w.min(self.h)
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}

/// Complete resize plan: the whole input is mapped onto the whole output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScalePlan {
    /// Original input dimensions
    pub input: Size,
    /// Final output dimensions (the canvas)
    pub out: Size,
}

impl ScalePlan {
    /// True when the plan is a plain copy.
    pub fn is_identity(&self) -> bool {
        self.input == self.out
    }

    /// Horizontal and vertical scale factors (output / input).
    pub fn factors(&self) -> (f64, f64) {
        (
            self.out.w as f64 / self.input.w.max(1) as f64,
            self.out.h as f64 / self.input.h.max(1) as f64,
        )
    }
}

/// Plan a stretch of `input` onto a fixed `canvas`.
pub fn canvas_plan(input: Size, canvas: Size) -> ScalePlan {
    ScalePlan { input, out: canvas }
}
