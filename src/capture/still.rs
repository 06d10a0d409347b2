//! Still-image device: every request is granted, frames are always the
//! decoded file at its native size.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use cap_scale::presets::Size;
use image::RgbaImage;
use tracing::{debug, info};

use crate::capture::device::{CaptureDevice, DeviceFailure, MediaStream, StreamRequest};
use crate::capture::synthetic::FixedFrameStream;
use crate::error::{CaptureError, CaptureResult};

#[derive(Debug)]
pub struct StillImageCamera {
    pixels: Arc<Vec<u8>>,
    size: Size,
    live: Arc<AtomicBool>,
}

impl StillImageCamera {
    /// Decode `path` (any format the `image` crate reads) into RGBA.
    pub fn from_path(path: impl AsRef<Path>) -> CaptureResult<Self> {
        let path = path.as_ref();
        let decoded = image::open(path).map_err(|e| {
            CaptureError::external("image", e)
                .with_operation("open still image")
                .with_context(path.display().to_string())
        })?;
        let camera = Self::from_image(decoded.to_rgba8());
        info!(path = %path.display(), size = %camera.size, "still image loaded");
        Ok(camera)
    }

    pub fn from_image(image: RgbaImage) -> Self {
        let size = Size {
            w: image.width(),
            h: image.height(),
        };
        Self {
            pixels: Arc::new(image.into_raw()),
            size,
            live: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }
}

#[async_trait]
impl CaptureDevice for StillImageCamera {
    async fn open(&mut self, request: &StreamRequest) -> Result<Box<dyn MediaStream>, DeviceFailure> {
        if self.live.load(Ordering::Acquire) {
            return Err(DeviceFailure::Hardware("device busy".to_string()));
        }
        debug!(requested = %request.candidate(), delivered = %self.size, "still image stream opened");
        Ok(Box::new(FixedFrameStream::new(
            Arc::clone(&self.pixels),
            self.size,
            Arc::clone(&self.live),
        )))
    }
}
