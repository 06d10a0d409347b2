//! # Camera Device Seam
//!
//! Abstract interface between the negotiator and whatever actually produces
//! frames (a platform camera, a still image, a synthetic test pattern).
//!
//! ## Contract
//!
//! - [`CaptureDevice::open`] receives an *exact* request: width, height and
//!   device id must be honored verbatim or the device answers
//!   [`DeviceFailure::Overconstrained`]. Nothing is silently downgraded.
//! - A device hands out at most one live [`MediaStream`]. The previous stream
//!   must be stopped (or dropped) before the next `open`.
//! - Frames are packed RGBA8 behind an `Arc`, so the session can keep the
//!   latest frame while the stream moves on.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use cap_scale::presets::Size;

use crate::config::tables::ResolutionCandidate;
use crate::error::{CaptureError, DeviceErrorKind};

/// Which way a camera faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facing {
    /// Selfie camera.
    Front,
    /// Rear camera, the one documents are shot with.
    Environment,
}

impl Facing {
    /// Value of the `facingMode` constraint.
    pub fn constraint_value(self) -> &'static str {
        match self {
            Facing::Front => "user",
            Facing::Environment => "environment",
        }
    }

    /// Map a side label from a device picker; only "Front Camera" faces the user.
    pub fn from_side_label(label: &str) -> Self {
        if label == "Front Camera" {
            Facing::Front
        } else {
            Facing::Environment
        }
    }
}

/// A camera as listed by a [`CameraDirectory`](crate::capture::directory::CameraDirectory).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraIdentity {
    pub device_id: Option<String>,
    pub facing: Facing,
    pub label: Option<String>,
}

impl CameraIdentity {
    pub fn new(device_id: impl Into<String>, facing: Facing) -> Self {
        Self {
            device_id: Some(device_id.into()),
            facing,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl fmt::Display for CameraIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.label, &self.device_id) {
            (Some(label), _) => f.write_str(label),
            (None, Some(id)) => f.write_str(id),
            (None, None) => f.write_str(self.facing.constraint_value()),
        }
    }
}

/// One exact stream request sent to a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    /// Exact device id, when the camera has one.
    pub device_id: Option<String>,
    /// Exact width in pixels.
    pub width: u32,
    /// Exact height in pixels.
    pub height: u32,
    /// Facing preference.
    pub facing_mode: Facing,
}

impl StreamRequest {
    /// Request `candidate` from `camera` with every dimension exact.
    pub fn exact(camera: &CameraIdentity, candidate: ResolutionCandidate) -> Self {
        Self {
            device_id: camera.device_id.clone(),
            width: candidate.width,
            height: candidate.height,
            facing_mode: camera.facing,
        }
    }

    pub fn candidate(&self) -> ResolutionCandidate {
        ResolutionCandidate::new(self.width, self.height)
    }
}

/// Why a device refused a [`StreamRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceFailure {
    /// An exact constraint cannot be met; the next candidate may succeed.
    Overconstrained { constraint: String },
    /// Access was refused.
    PermissionDenied(String),
    /// The device vanished or never existed.
    NotFound(String),
    /// Busy device, driver crash, anything else.
    Hardware(String),
}

impl DeviceFailure {
    pub fn overconstrained(constraint: impl Into<String>) -> Self {
        DeviceFailure::Overconstrained {
            constraint: constraint.into(),
        }
    }

    /// True only for constraint violations, the one failure negotiation recovers from.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, DeviceFailure::Overconstrained { .. })
    }

    pub fn kind(&self) -> DeviceErrorKind {
        match self {
            DeviceFailure::Overconstrained { .. } => DeviceErrorKind::Overconstrained,
            DeviceFailure::PermissionDenied(_) => DeviceErrorKind::PermissionDenied,
            DeviceFailure::NotFound(_) => DeviceErrorKind::NotFound,
            DeviceFailure::Hardware(_) => DeviceErrorKind::Hardware,
        }
    }
}

impl fmt::Display for DeviceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceFailure::Overconstrained { constraint } => {
                write!(f, "constraint '{}' cannot be satisfied", constraint)
            }
            DeviceFailure::PermissionDenied(reason)
            | DeviceFailure::NotFound(reason)
            | DeviceFailure::Hardware(reason) => f.write_str(reason),
        }
    }
}

impl std::error::Error for DeviceFailure {}

impl From<DeviceFailure> for CaptureError {
    fn from(failure: DeviceFailure) -> Self {
        CaptureError::device(failure.kind(), failure.to_string())
    }
}

/// A single RGBA8 frame.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub data: Arc<Vec<u8>>,
    pub width: u32,
    pub height: u32,
    /// Bytes per row; at least `width * 4`.
    pub stride: usize,
    /// Monotonic frame counter assigned by the stream.
    pub sequence: u64,
}

impl RawFrame {
    /// Wrap a tightly packed RGBA buffer.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            data: Arc::new(data),
            width,
            height,
            stride: width as usize * 4,
            sequence: 0,
        }
    }

    pub fn size(&self) -> Size {
        Size {
            w: self.width,
            h: self.height,
        }
    }

    pub fn is_tightly_packed(&self) -> bool {
        self.stride == self.width as usize * 4
    }

    /// Pixel rows without stride padding. Borrowed when already packed.
    pub fn packed_rgba(&self) -> Option<Cow<'_, [u8]>> {
        let row = self.width as usize * 4;
        let rows = self.height as usize;
        if self.stride < row || self.data.len() < self.stride * rows.saturating_sub(1) + row {
            return None;
        }
        if self.is_tightly_packed() {
            return Some(Cow::Borrowed(&self.data[..row * rows]));
        }
        let mut out = Vec::with_capacity(row * rows);
        for r in 0..rows {
            let start = r * self.stride;
            out.extend_from_slice(&self.data[start..start + row]);
        }
        Some(Cow::Owned(out))
    }
}

/// A live stream of frames from an opened device.
#[async_trait]
pub trait MediaStream: Send + Sync {
    /// Wait for the next frame. `None` once the stream has ended or was stopped.
    async fn next_frame(&mut self) -> Option<RawFrame>;

    /// Stop every track and release the device. Idempotent.
    fn stop(&mut self);

    fn is_live(&self) -> bool;
}

/// Something that can open exact-resolution streams.
#[async_trait]
pub trait CaptureDevice: Send {
    /// Try to open a stream that satisfies `request` exactly.
    async fn open(&mut self, request: &StreamRequest) -> Result<Box<dyn MediaStream>, DeviceFailure>;
}
