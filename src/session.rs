//! # Capture Session
//!
//! Owns the [`ActiveCapture`] produced by negotiation and tracks whether the
//! stream has delivered anything yet.
//!
//! ## States
//!
//! ```text
//!  Pending ──first frame──▶ Ready{w,h} ──stop()──▶ Stopped
//!     └──────────────stop() / stream ended─────────▲
//! ```
//!
//! - `Pending`: negotiated, no frame yet. Frames cannot be read.
//! - `Ready`: real dimensions known (taken from the first delivered frame,
//!   which may differ from the requested candidate).
//! - `Stopped`: terminal. The stream is released and never restarts; a new
//!   negotiation produces a new session.
//!
//! Dropping a session stops it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use cap_scale::presets::Size;
use tracing::{debug, info, warn};

use crate::capture::device::RawFrame;
use crate::capture::negotiate::ActiveCapture;
use crate::config::ratio::RatioLabel;
use crate::config::tables::ResolutionCandidate;
use crate::error::{CaptureError, CaptureResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Pending,
    Ready { width: u32, height: u32 },
    Stopped,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Pending => "pending",
            SessionState::Ready { .. } => "ready",
            SessionState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Ready { width, height } => write!(f, "ready ({}x{})", width, height),
            other => f.write_str(other.name()),
        }
    }
}

#[derive(Debug)]
pub struct CaptureSession {
    active: ActiveCapture,
    state: SessionState,
    latest: Option<Arc<RawFrame>>,
}

impl CaptureSession {
    pub fn new(active: ActiveCapture) -> Self {
        debug!(ratio = %active.committed_ratio(), requested = %active.requested(), "session pending");
        Self {
            active,
            state: SessionState::Pending,
            latest: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, SessionState::Ready { .. })
    }

    pub fn committed_ratio(&self) -> RatioLabel {
        self.active.committed_ratio()
    }

    pub fn requested(&self) -> ResolutionCandidate {
        self.active.requested()
    }

    /// Dimensions of the delivered frames, once `Ready`.
    pub fn real_size(&self) -> Option<Size> {
        match self.state {
            SessionState::Ready { width, height } => Some(Size { w: width, h: height }),
            _ => None,
        }
    }

    pub fn active(&self) -> &ActiveCapture {
        &self.active
    }

    /// Pull the next frame from the stream and make it current.
    ///
    /// The first frame moves `Pending` to `Ready`. A stream that ends stops
    /// the session.
    pub async fn poll_frame(&mut self) -> CaptureResult<Arc<RawFrame>> {
        if self.state == SessionState::Stopped {
            return Err(CaptureError::not_ready(self.state.name()).with_operation("poll_frame"));
        }

        let Some(frame) = self.active.stream_mut().next_frame().await else {
            warn!(ratio = %self.committed_ratio(), "stream ended");
            self.stop();
            return Err(CaptureError::not_ready(self.state.name())
                .with_operation("poll_frame")
                .with_context("stream ended"));
        };

        if self.state == SessionState::Pending {
            self.state = SessionState::Ready {
                width: frame.width,
                height: frame.height,
            };
            info!(
                ratio = %self.committed_ratio(),
                requested = %self.requested(),
                width = frame.width,
                height = frame.height,
                "session ready"
            );
        }

        let frame = Arc::new(frame);
        self.latest = Some(Arc::clone(&frame));
        Ok(frame)
    }

    /// Poll until the first frame arrives or `timeout` elapses.
    pub async fn wait_ready(&mut self, timeout: Duration) -> CaptureResult<Size> {
        if let Some(size) = self.real_size() {
            return Ok(size);
        }
        match tokio::time::timeout(timeout, self.poll_frame()).await {
            Ok(frame) => frame.map(|frame| frame.size()),
            Err(_) => Err(CaptureError::not_ready(self.state.name())
                .with_operation("wait_ready")
                .with_context(format!("no frame within {:?}", timeout))),
        }
    }

    /// The current frame. Fails with `NotReady` unless the session is `Ready`.
    pub fn frame(&self) -> CaptureResult<Arc<RawFrame>> {
        match (&self.state, &self.latest) {
            (SessionState::Ready { .. }, Some(frame)) => Ok(Arc::clone(frame)),
            _ => Err(CaptureError::not_ready(self.state.name()).with_operation("frame")),
        }
    }

    /// Release the stream. Idempotent; the session cannot be restarted.
    pub fn stop(&mut self) {
        if self.state == SessionState::Stopped {
            return;
        }
        self.active.stop_stream();
        self.latest = None;
        self.state = SessionState::Stopped;
        info!(ratio = %self.committed_ratio(), "session stopped");
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}
