// SPDX-License-Identifier: MIT
//! Lossless quarter-turn rotation of tightly packed rasters.
//!
//! Turns are clockwise. `Cw270` is the same as one counter-clockwise quarter
//! turn: the source's top-left pixel lands in the bottom-left corner and the
//! output's width is the source's height.

use crate::presets::Size;

/// Clockwise rotation in whole quarter turns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QuarterTurn {
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl QuarterTurn {
    /// Parse a clockwise angle; only multiples of 90 in `[0, 360)` are accepted.
    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees {
            0 => Some(Self::None),
            90 => Some(Self::Cw90),
            180 => Some(Self::Cw180),
            270 => Some(Self::Cw270),
            _ => None,
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Cw90 => 90,
            Self::Cw180 => 180,
            Self::Cw270 => 270,
        }
    }

    /// Output size for a source of `size`.
    pub fn output_size(self, size: Size) -> Size {
        match self {
            Self::None | Self::Cw180 => size,
            Self::Cw90 | Self::Cw270 => size.transposed(),
        }
    }
}

/// Rotate a packed raster of `channels` bytes per pixel.
///
/// Returns the rotated buffer and its size. `src` must hold at least
/// `size.w * size.h * channels` bytes; shorter input returns `None`.
pub fn rotate_packed(src: &[u8], size: Size, channels: usize, turn: QuarterTurn) -> Option<(Vec<u8>, Size)> {
    let (w, h) = (size.w as usize, size.h as usize);
    if src.len() < w * h * channels {
        return None;
    }
    let out_size = turn.output_size(size);
    if turn == QuarterTurn::None {
        return Some((src[..w * h * channels].to_vec(), out_size));
    }

    let (dw, dh) = (out_size.w as usize, out_size.h as usize);
    let mut out = vec![0u8; dw * dh * channels];
    for dy in 0..dh {
        for dx in 0..dw {
            let (sx, sy) = match turn {
                QuarterTurn::Cw90 => (dy, h - 1 - dx),
                QuarterTurn::Cw180 => (w - 1 - dx, h - 1 - dy),
                QuarterTurn::Cw270 => (w - 1 - dy, dx),
                QuarterTurn::None => (dx, dy),
            };
            let s = (sy * w + sx) * channels;
            let d = (dy * dw + dx) * channels;
            out[d..d + channels].copy_from_slice(&src[s..s + channels]);
        }
    }
    Some((out, out_size))
}
