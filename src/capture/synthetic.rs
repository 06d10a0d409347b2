//! # Synthetic Camera
//!
//! A software [`CaptureDevice`] with a fixed set of native modes. It behaves
//! like a strict driver: exact requests for anything but a native mode are
//! `Overconstrained`, and only one stream may be live at a time.
//!
//! Used by the CLI when no input image is given and by the test suites,
//! which inspect what was requested through a [`DeviceProbe`].
//!
//! ```rust
//! use doc_capture::capture::synthetic::SyntheticCamera;
//! use doc_capture::config::tables::ResolutionCandidate;
//!
//! let camera = SyntheticCamera::new("rear", vec![ResolutionCandidate::new(1280, 720)]);
//! let probe = camera.probe();
//! assert!(probe.requests().is_empty());
//! assert!(!probe.is_streaming());
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cap_scale::presets::Size;
use tracing::debug;

use crate::capture::device::{CaptureDevice, DeviceFailure, MediaStream, RawFrame, StreamRequest};
use crate::config::tables::ResolutionCandidate;

/// Shared view of a [`SyntheticCamera`] that survives moving the camera away.
#[derive(Debug, Clone, Default)]
pub struct DeviceProbe {
    requests: Arc<Mutex<Vec<StreamRequest>>>,
    live: Arc<AtomicBool>,
}

impl DeviceProbe {
    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<StreamRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// True while a stream handed out by the camera has not been stopped.
    pub fn is_streaming(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    fn record(&self, request: &StreamRequest) {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());
    }
}

/// Deterministic RGBA gradient: red grows left to right, green top to bottom.
pub fn test_pattern(size: Size) -> Vec<u8> {
    let w = size.w as usize;
    let h = size.h as usize;
    let span = |extent: usize| extent.saturating_sub(1).max(1);
    let mut out = Vec::with_capacity(w * h * 4);
    for y in 0..h {
        let g = (y * 255 / span(h)) as u8;
        for x in 0..w {
            let r = (x * 255 / span(w)) as u8;
            out.extend_from_slice(&[r, g, 96, 255]);
        }
    }
    out
}

#[derive(Debug)]
pub struct SyntheticCamera {
    device_id: String,
    modes: Vec<ResolutionCandidate>,
    delivered: Option<Size>,
    persistent_failure: Option<DeviceFailure>,
    scripted: VecDeque<DeviceFailure>,
    first_frame_delay: Duration,
    frame_limit: Option<u64>,
    probe: DeviceProbe,
}

impl SyntheticCamera {
    pub fn new(device_id: impl Into<String>, modes: Vec<ResolutionCandidate>) -> Self {
        Self {
            device_id: device_id.into(),
            modes,
            delivered: None,
            persistent_failure: None,
            scripted: VecDeque::new(),
            first_frame_delay: Duration::ZERO,
            frame_limit: None,
            probe: DeviceProbe::default(),
        }
    }

    /// Deliver frames of `size` whatever mode was granted (hardware rounding).
    pub fn delivering(mut self, size: Size) -> Self {
        self.delivered = Some(size);
        self
    }

    /// Fail every open with `failure`.
    pub fn failing_with(mut self, failure: DeviceFailure) -> Self {
        self.persistent_failure = Some(failure);
        self
    }

    pub fn deny_permission(self) -> Self {
        self.failing_with(DeviceFailure::PermissionDenied(
            "camera access denied".to_string(),
        ))
    }

    /// Fail the next open with `failure`; queued failures are used up in order.
    pub fn then_failing(mut self, failure: DeviceFailure) -> Self {
        self.scripted.push_back(failure);
        self
    }

    pub fn with_first_frame_delay(mut self, delay: Duration) -> Self {
        self.first_frame_delay = delay;
        self
    }

    /// End each stream after `frames` frames.
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    pub fn probe(&self) -> DeviceProbe {
        self.probe.clone()
    }

    pub fn modes(&self) -> &[ResolutionCandidate] {
        &self.modes
    }

    fn check(&self, request: &StreamRequest) -> Result<(), DeviceFailure> {
        if let Some(id) = &request.device_id {
            if *id != self.device_id {
                return Err(DeviceFailure::overconstrained("deviceId"));
            }
        }
        let candidate = request.candidate();
        if self.modes.contains(&candidate) {
            return Ok(());
        }
        if self.modes.iter().any(|mode| mode.width == candidate.width) {
            Err(DeviceFailure::overconstrained("height"))
        } else {
            Err(DeviceFailure::overconstrained("width"))
        }
    }
}

#[async_trait]
impl CaptureDevice for SyntheticCamera {
    async fn open(&mut self, request: &StreamRequest) -> Result<Box<dyn MediaStream>, DeviceFailure> {
        self.probe.record(request);

        if let Some(failure) = self.scripted.pop_front() {
            return Err(failure);
        }
        if let Some(failure) = &self.persistent_failure {
            return Err(failure.clone());
        }
        if self.probe.is_streaming() {
            return Err(DeviceFailure::Hardware("device busy".to_string()));
        }
        self.check(request)?;

        let size = self.delivered.unwrap_or(request.candidate().size());
        debug!(
            device = %self.device_id,
            requested = %request.candidate(),
            delivered = %size,
            "synthetic stream opened"
        );
        Ok(Box::new(
            FixedFrameStream::new(Arc::new(test_pattern(size)), size, Arc::clone(&self.probe.live))
                .with_first_frame_delay(self.first_frame_delay)
                .with_frame_limit(self.frame_limit),
        ))
    }
}

/// Repeats one packed RGBA buffer until stopped. Clears `live` on stop.
pub(crate) struct FixedFrameStream {
    pixels: Arc<Vec<u8>>,
    size: Size,
    sequence: u64,
    first_frame_delay: Duration,
    frame_limit: Option<u64>,
    live: Arc<AtomicBool>,
    stopped: bool,
}

impl FixedFrameStream {
    pub(crate) fn new(pixels: Arc<Vec<u8>>, size: Size, live: Arc<AtomicBool>) -> Self {
        live.store(true, Ordering::Release);
        Self {
            pixels,
            size,
            sequence: 0,
            first_frame_delay: Duration::ZERO,
            frame_limit: None,
            live,
            stopped: false,
        }
    }

    pub(crate) fn with_first_frame_delay(mut self, delay: Duration) -> Self {
        self.first_frame_delay = delay;
        self
    }

    pub(crate) fn with_frame_limit(mut self, limit: Option<u64>) -> Self {
        self.frame_limit = limit;
        self
    }
}

#[async_trait]
impl MediaStream for FixedFrameStream {
    async fn next_frame(&mut self) -> Option<RawFrame> {
        if self.stopped || self.frame_limit.is_some_and(|limit| self.sequence >= limit) {
            return None;
        }
        if self.sequence == 0 && !self.first_frame_delay.is_zero() {
            tokio::time::sleep(self.first_frame_delay).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.sequence += 1;
        Some(RawFrame {
            data: Arc::clone(&self.pixels),
            width: self.size.w,
            height: self.size.h,
            stride: self.size.w as usize * 4,
            sequence: self.sequence,
        })
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.live.store(false, Ordering::Release);
        }
    }

    fn is_live(&self) -> bool {
        !self.stopped
    }
}

impl Drop for FixedFrameStream {
    fn drop(&mut self) {
        self.stop();
    }
}
