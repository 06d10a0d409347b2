//! JPEG encode/decode and data-URL rendering.

use base64::{Engine as _, engine::general_purpose};
use cap_scale::presets::Size;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat, RgbImage};

use crate::error::{CaptureError, CaptureResult};

pub const JPEG_MIME: &str = "image/jpeg";

/// Map a quality in (0, 1] to the encoder's 1..=100 scale.
pub fn quality_percent(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Drop the alpha channel of a packed RGBA buffer.
pub fn rgba_to_rgb(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
    }
    rgb
}

/// Encode packed RGB8 pixels as a baseline JPEG.
pub fn encode_jpeg(rgb: &[u8], size: Size, quality: f32, stage: &str) -> CaptureResult<Vec<u8>> {
    let expected = size.area() * 3;
    if rgb.len() as u64 != expected || size.is_empty() {
        return Err(CaptureError::encode(
            stage,
            format!("expected {} bytes of RGB for {}, got {}", expected, size, rgb.len()),
        ));
    }
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality_percent(quality));
    encoder
        .write_image(rgb, size.w, size.h, ExtendedColorType::Rgb8)
        .map_err(|e| CaptureError::encode(stage, e.to_string()).with_metadata("size", size.to_string()))?;
    Ok(buffer)
}

pub fn decode_jpeg(bytes: &[u8], stage: &str) -> CaptureResult<RgbImage> {
    image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
        .map(|decoded| decoded.to_rgb8())
        .map_err(|e| CaptureError::encode(stage, format!("decode: {}", e)))
}

pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_scale() {
        assert_eq!(quality_percent(0.8), 80);
        assert_eq!(quality_percent(1.0), 100);
        assert_eq!(quality_percent(0.001), 1);
    }

    #[test]
    fn alpha_is_dropped() {
        assert_eq!(rgba_to_rgb(&[1, 2, 3, 4, 5, 6, 7, 8]), vec![1, 2, 3, 5, 6, 7]);
    }

    #[test]
    fn jpeg_keeps_dimensions_and_flat_colour() {
        let size = Size { w: 32, h: 16 };
        let rgb: Vec<u8> = [200u8, 40, 40].repeat(size.area() as usize);
        let jpeg = encode_jpeg(&rgb, size, 0.9, "test").unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        let decoded = decode_jpeg(&jpeg, "test").unwrap();
        assert_eq!(decoded.dimensions(), (32, 16));
        let px = decoded.get_pixel(16, 8).0;
        assert!(px[0].abs_diff(200) < 8 && px[1].abs_diff(40) < 8);
    }

    #[test]
    fn lower_quality_is_smaller() {
        let size = Size { w: 64, h: 64 };
        let rgb: Vec<u8> = (0..size.area() as usize * 3).map(|i| (i * 7 % 251) as u8).collect();
        let high = encode_jpeg(&rgb, size, 1.0, "test").unwrap();
        let low = encode_jpeg(&rgb, size, 0.1, "test").unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn short_buffer_is_encode_error() {
        let err = encode_jpeg(&[0; 5], Size { w: 4, h: 4 }, 0.8, "resized").unwrap_err();
        assert_eq!(err.category(), "encode");
        assert!(err.to_string().contains("resized"));
    }

    #[test]
    fn garbage_does_not_decode() {
        assert!(decode_jpeg(b"not a jpeg", "rotated").is_err());
    }
}
