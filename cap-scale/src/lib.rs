// SPDX-License-Identifier: MIT
//! # cap-scale: CPU Raster Geometry for Document Capture
//!
//! Pure geometry over tightly packed 8-bit rasters. The crate knows nothing
//! about cameras, ratios or encodings; callers hand it buffers and sizes and
//! get buffers back.
//!
//! ## Key Components
//!
//! - [`presets`]: `Size` and canvas resize plans (stretch a source onto a fixed canvas)
//! - [`cpu`]: SIMD resize of RGBA8 frames via `fast_image_resize`, stride aware
//! - [`rotate`]: lossless quarter-turn rotation of packed rasters
//! - [`region`]: proportional regions resolved to floored pixel rectangles, and cropping
//!
//! ## Usage Example
//!
//! ```rust
//! use cap_scale::presets::{canvas_plan, Size};
//! use cap_scale::region::RegionFraction;
//!
//! let plan = canvas_plan(Size { w: 1280, h: 720 }, Size { w: 1024, h: 576 });
//! assert_eq!(plan.out.w, 1024);
//!
//! let id_number = RegionFraction { x: 0.46, y: 0.17, w: 0.27, h: 0.08 };
//! let rect = id_number.resolve(Size { w: 576, h: 1024 });
//! assert_eq!((rect.w, rect.h), (155, 81));
//! ```

pub mod cpu;
pub mod presets;
pub mod region;
pub mod rotate;
