// SPDX-License-Identifier: MIT
//! Proportional regions and cropping.
//!
//! A region is expressed in fractions of the image it is applied to, so the
//! same layout works for any canvas size. Resolution floors every component
//! independently (origin and size), matching `Math.floor(w * fraction)`.

use serde::{Deserialize, Serialize};

use crate::presets::Size;

/// A rectangle in fractions of the containing image.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionFraction {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// A rectangle in whole pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl PixelRect {
    pub fn size(&self) -> Size {
        Size { w: self.w, h: self.h }
    }

    /// True when the rectangle lies entirely inside an image of `bounds`.
    pub fn fits_within(&self, bounds: Size) -> bool {
        self.x as u64 + self.w as u64 <= bounds.w as u64
            && self.y as u64 + self.h as u64 <= bounds.h as u64
    }
}

/// Reasons a region cannot be cut out of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionError {
    /// One side floored to zero pixels.
    Empty,
    /// The rectangle reaches past the image edge.
    OutOfBounds,
    /// The source buffer is shorter than its declared size.
    BufferTooSmall,
}

impl std::fmt::Display for RegionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegionError::Empty => write!(f, "region is empty"),
            RegionError::OutOfBounds => write!(f, "region exceeds image bounds"),
            RegionError::BufferTooSmall => write!(f, "source buffer too small"),
        }
    }
}

impl std::error::Error for RegionError {}

impl RegionFraction {
    /// Resolve against an image of `size`, flooring each component.
    pub fn resolve(&self, size: Size) -> PixelRect {
        let floor = |extent: u32, fraction: f64| (extent as f64 * fraction).floor().max(0.0) as u32;
        PixelRect {
            x: floor(size.w, self.x),
            y: floor(size.h, self.y),
            w: floor(size.w, self.w),
            h: floor(size.h, self.h),
        }
    }

    /// All components in `[0, 1]` and the far edges no further than 1.
    pub fn is_within_unit(&self) -> bool {
        let unit = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
        unit(self.x)
            && unit(self.y)
            && unit(self.w)
            && unit(self.h)
            && self.x + self.w <= 1.0 + f64::EPSILON
            && self.y + self.h <= 1.0 + f64::EPSILON
    }

    /// True when the two regions share no area.
    pub fn is_disjoint(&self, other: &RegionFraction) -> bool {
        self.x + self.w <= other.x
            || other.x + other.w <= self.x
            || self.y + self.h <= other.y
            || other.y + other.h <= self.y
    }
}

/// Copy `rect` out of a packed raster of `channels` bytes per pixel.
pub fn crop_packed(src: &[u8], size: Size, channels: usize, rect: PixelRect) -> Result<Vec<u8>, RegionError> {
    if rect.w == 0 || rect.h == 0 {
        return Err(RegionError::Empty);
    }
    if !rect.fits_within(size) {
        return Err(RegionError::OutOfBounds);
    }
    let row_bytes = size.w as usize * channels;
    if src.len() < row_bytes * size.h as usize {
        return Err(RegionError::BufferTooSmall);
    }

    let out_row = rect.w as usize * channels;
    let mut out = Vec::with_capacity(out_row * rect.h as usize);
    for y in rect.y as usize..(rect.y + rect.h) as usize {
        let start = y * row_bytes + rect.x as usize * channels;
        out.extend_from_slice(&src[start..start + out_row]);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID_NUMBER: RegionFraction = RegionFraction { x: 0.46, y: 0.17, w: 0.27, h: 0.08 };
    const DETAIL: RegionFraction = RegionFraction { x: 0.21, y: 0.24, w: 0.49, h: 0.68 };

    #[test]
    fn id_number_region_on_portrait_canvas() {
        let rect = ID_NUMBER.resolve(Size { w: 576, h: 1024 });
        assert_eq!(rect, PixelRect { x: 264, y: 174, w: 155, h: 81 });
    }

    #[test]
    fn detail_region_on_portrait_canvas() {
        let rect = DETAIL.resolve(Size { w: 576, h: 1024 });
        assert_eq!(rect, PixelRect { x: 120, y: 245, w: 282, h: 696 });
        assert!(rect.fits_within(Size { w: 576, h: 1024 }));
    }

    #[test]
    fn default_regions_are_valid_but_touch() {
        assert!(ID_NUMBER.is_within_unit());
        assert!(DETAIL.is_within_unit());
        // The number band's lower edge dips one percent into the detail block.
        assert!(!ID_NUMBER.is_disjoint(&DETAIL));
        let moved = RegionFraction { y: 0.10, ..ID_NUMBER };
        assert!(moved.is_disjoint(&DETAIL));
    }

    #[test]
    fn out_of_unit_region_is_invalid() {
        let r = RegionFraction { x: 0.8, y: 0.0, w: 0.3, h: 0.5 };
        assert!(!r.is_within_unit());
        let r = RegionFraction { x: -0.1, y: 0.0, w: 0.3, h: 0.5 };
        assert!(!r.is_within_unit());
    }

    #[test]
    fn crop_copies_the_expected_rows() {
        // 4x3 single channel, values = index
        let src: Vec<u8> = (0..12).collect();
        let rect = PixelRect { x: 1, y: 1, w: 2, h: 2 };
        let out = crop_packed(&src, Size { w: 4, h: 3 }, 1, rect).unwrap();
        assert_eq!(out, vec![5, 6, 9, 10]);
    }

    #[test]
    fn crop_rejects_empty_and_out_of_bounds() {
        let src = vec![0u8; 12];
        let size = Size { w: 4, h: 3 };
        assert_eq!(
            crop_packed(&src, size, 1, PixelRect { x: 0, y: 0, w: 0, h: 2 }),
            Err(RegionError::Empty)
        );
        assert_eq!(
            crop_packed(&src, size, 1, PixelRect { x: 3, y: 0, w: 2, h: 1 }),
            Err(RegionError::OutOfBounds)
        );
    }

    #[test]
    fn tiny_image_floors_to_empty() {
        let rect = ID_NUMBER.resolve(Size { w: 10, h: 10 });
        assert_eq!(rect.h, 0);
    }
}
