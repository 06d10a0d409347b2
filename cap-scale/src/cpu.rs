// SPDX-License-Identifier: MIT
// CPU scaler built on fast_image_resize (SIMD-accelerated).
// RGBA8 in → RGBA8 out, direct write into caller-provided dst buffer.

use fast_image_resize as fir;
use fir::images::{TypedImage, TypedImageRef};
use fir::pixels::U8x4;
use fir::{FilterType, ResizeAlg, ResizeOptions, Resizer};

use crate::presets::{ScalePlan, Size};

#[derive(Debug)]
pub enum ScaleError {
    BufferTooSmall,
    EmptyCanvas,
    StrideMismatchAndNoStaging,
    Fir(fir::ResizeError),
    ImageBuf(fir::ImageBufferError),
}

impl From<fir::ResizeError> for ScaleError { fn from(e: fir::ResizeError) -> Self { Self::Fir(e) } }
impl From<fir::ImageBufferError> for ScaleError { fn from(e: fir::ImageBufferError) -> Self { Self::ImageBuf(e) } }

impl std::fmt::Display for ScaleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScaleError::BufferTooSmall => write!(f, "Output buffer too small"),
            ScaleError::EmptyCanvas => write!(f, "Canvas has a zero-length side"),
            ScaleError::StrideMismatchAndNoStaging => write!(f, "Stride mismatch but no staging buffer provided"),
            ScaleError::Fir(e) => write!(f, "Fast image resize error: {}", e),
            ScaleError::ImageBuf(e) => write!(f, "Image buffer error: {}", e),
        }
    }
}

impl std::error::Error for ScaleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScaleError::Fir(e) => Some(e),
            ScaleError::ImageBuf(e) => Some(e),
            _ => None,
        }
    }
}

/// Pre-allocated scratch to compact strided input to tightly packed rows (only if needed).
pub struct Staging {
    pub(crate) buf: Vec<u8>,
}
impl Staging {
    pub fn with_capacity(cap: usize) -> Self { Self { buf: Vec::with_capacity(cap) } }
    pub fn ensure_len(&mut self, len: usize) { if self.buf.len() < len { self.buf.resize(len, 0); } }
    pub fn as_slice(&self) -> &[u8] { &self.buf }
}

/// Main scaling entry point.
/// `src_stride_bytes`: bytes per row of source. If `Some(stride) != width*4`, we compact per-row into staging.
/// `dst` must be at least `plan.out.w * plan.out.h * 4` bytes (RGBA).
pub fn scale_rgba_cpu(
    resizer: &mut Resizer,
    src_rgba: &[u8],
    src: Size,
    src_stride_bytes: Option<usize>,
    plan: &ScalePlan,
    dst: &mut [u8],
    mut staging: Option<&mut Staging>,
) -> Result<(), ScaleError> {
    if plan.out.is_empty() {
        return Err(ScaleError::EmptyCanvas);
    }
    let dst_len = (plan.out.w as usize) * (plan.out.h as usize) * 4;
    if dst.len() < dst_len {
        return Err(ScaleError::BufferTooSmall);
    }

    // --- Build source view (tightly packed) ---
    let tight_row_bytes = (src.w as usize) * 4;
    let src_view: TypedImageRef<U8x4>;
    if let Some(pitch) = src_stride_bytes.filter(|&p| p != tight_row_bytes) {
        let st = staging.as_deref_mut().ok_or(ScaleError::StrideMismatchAndNoStaging)?;
        if src.h > 0 && src_rgba.len() < pitch * (src.h as usize - 1) + tight_row_bytes {
            return Err(ScaleError::BufferTooSmall);
        }
        st.ensure_len(tight_row_bytes * (src.h as usize));
        compact_rows(src_rgba, pitch, st.buf.as_mut_slice(), tight_row_bytes, src.h as usize);
        src_view = TypedImageRef::<U8x4>::from_buffer(src.w, src.h, st.as_slice())?;
    } else {
        src_view = {
            let packed = src_rgba.get(..tight_row_bytes * src.h as usize).unwrap_or(src_rgba);
            TypedImageRef::<U8x4>::from_buffer(src.w, src.h, packed)?
        };
    }

    let mut dst_image = TypedImage::<U8x4>::from_buffer(plan.out.w, plan.out.h, &mut dst[..dst_len])?;

    // Bilinear matches what a browser canvas does for a single drawImage.
    let opts = ResizeOptions::new()
        .resize_alg(ResizeAlg::Convolution(FilterType::Bilinear))
        .use_alpha(false);
    resizer.resize_typed::<U8x4>(&src_view, &mut dst_image, &opts)?;

    Ok(())
}

/// Allocating convenience wrapper around [`scale_rgba_cpu`].
pub fn resize_rgba(
    src_rgba: &[u8],
    src: Size,
    src_stride_bytes: Option<usize>,
    plan: &ScalePlan,
) -> Result<Vec<u8>, ScaleError> {
    let mut resizer = Resizer::new();
    let mut staging = Staging::with_capacity(0);
    let mut out = vec![0u8; plan.out.area() as usize * 4];
    scale_rgba_cpu(
        &mut resizer,
        src_rgba,
        src,
        src_stride_bytes,
        plan,
        &mut out,
        Some(&mut staging),
    )?;
    Ok(out)
}

#[inline]
fn compact_rows(src: &[u8], src_pitch: usize, dst: &mut [u8], row_bytes: usize, rows: usize) {
    for r in 0..rows {
        let s = &src[r * src_pitch .. r * src_pitch + row_bytes];
        let d = &mut dst[r * row_bytes .. (r + 1) * row_bytes];
        d.copy_from_slice(s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::canvas_plan;

    fn solid(size: Size, px: [u8; 4]) -> Vec<u8> {
        px.iter().copied().cycle().take(size.area() as usize * 4).collect()
    }

    #[test]
    fn solid_colour_survives_resize() {
        let src = Size { w: 64, h: 36 };
        let plan = canvas_plan(src, Size { w: 32, h: 18 });
        let out = resize_rgba(&solid(src, [10, 20, 30, 255]), src, None, &plan).unwrap();
        assert_eq!(out.len(), 32 * 18 * 4);
        assert!(out.chunks_exact(4).all(|p| p == [10, 20, 30, 255]));
    }

    #[test]
    fn strided_source_is_compacted() {
        let src = Size { w: 4, h: 2 };
        let pitch = 4 * 4 + 8;
        let mut data = vec![0u8; pitch * 2];
        for row in 0..2 {
            for px in 0..4 {
                let i = row * pitch + px * 4;
                data[i..i + 4].copy_from_slice(&[200, 100, 50, 255]);
            }
        }
        let plan = canvas_plan(src, src);
        let out = resize_rgba(&data, src, Some(pitch), &plan).unwrap();
        assert!(out.chunks_exact(4).all(|p| p == [200, 100, 50, 255]));
    }

    #[test]
    fn strided_source_without_staging_is_rejected() {
        let src = Size { w: 4, h: 2 };
        let plan = canvas_plan(src, src);
        let mut dst = vec![0u8; 32];
        let err = scale_rgba_cpu(&mut Resizer::new(), &[0u8; 64], src, Some(32), &plan, &mut dst, None);
        assert!(matches!(err, Err(ScaleError::StrideMismatchAndNoStaging)));
    }

    #[test]
    fn empty_canvas_is_rejected() {
        let src = Size { w: 4, h: 4 };
        let plan = canvas_plan(src, Size { w: 0, h: 4 });
        assert!(matches!(
            resize_rgba(&[0u8; 64], src, None, &plan),
            Err(ScaleError::EmptyCanvas)
        ));
    }
}
