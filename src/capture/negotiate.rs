//! # Resolution Negotiation
//!
//! Walks the capture candidates of a ratio in table order and commits to the
//! first one the device accepts with exact constraints.
//!
//! ## Outcome per attempt
//!
//! | Device answer | Action |
//! |---------------|--------|
//! | stream | commit, stop iterating |
//! | `Overconstrained` | record, try the next candidate |
//! | anything else | abort with `CaptureError::Device` |
//!
//! Running out of candidates is `NoSuitableResolution`. A ratio without
//! candidates is `InvalidRatio` and the device is never asked.

use std::fmt;

use tracing::{debug, info, warn};

use crate::capture::device::{
    CameraIdentity, CaptureDevice, DeviceFailure, MediaStream, StreamRequest,
};
use crate::config::ratio::RatioLabel;
use crate::config::tables::{ResolutionCandidate, ResolutionTable};
use crate::error::{CaptureError, CaptureResult, LookupTable};

/// What happened to one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Accepted,
    /// The device could not satisfy `constraint` exactly.
    Rejected { constraint: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationAttempt {
    pub candidate: ResolutionCandidate,
    pub outcome: AttemptOutcome,
}

/// A committed stream plus the negotiation that produced it.
///
/// Dropping it stops the stream, which releases the device.
pub struct ActiveCapture {
    stream: Box<dyn MediaStream>,
    camera: CameraIdentity,
    requested: ResolutionCandidate,
    committed_ratio: RatioLabel,
    attempts: Vec<NegotiationAttempt>,
}

impl ActiveCapture {
    pub fn camera(&self) -> &CameraIdentity {
        &self.camera
    }

    /// The candidate the device accepted. Delivered frames may still differ.
    pub fn requested(&self) -> ResolutionCandidate {
        self.requested
    }

    pub fn committed_ratio(&self) -> RatioLabel {
        self.committed_ratio
    }

    /// Every attempt in order, the accepted one last.
    pub fn attempts(&self) -> &[NegotiationAttempt] {
        &self.attempts
    }

    pub fn is_live(&self) -> bool {
        self.stream.is_live()
    }

    pub(crate) fn stream_mut(&mut self) -> &mut dyn MediaStream {
        self.stream.as_mut()
    }

    pub(crate) fn stop_stream(&mut self) {
        self.stream.stop();
    }
}

impl fmt::Debug for ActiveCapture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveCapture")
            .field("camera", &self.camera)
            .field("requested", &self.requested)
            .field("committed_ratio", &self.committed_ratio)
            .field("attempts", &self.attempts.len())
            .field("live", &self.stream.is_live())
            .finish()
    }
}

impl Drop for ActiveCapture {
    fn drop(&mut self) {
        self.stream.stop();
    }
}

/// Negotiates capture modes against a [`ResolutionTable`].
#[derive(Debug, Clone)]
pub struct ResolutionNegotiator {
    table: ResolutionTable,
}

impl Default for ResolutionNegotiator {
    fn default() -> Self {
        Self::new(ResolutionTable::standard().clone())
    }
}

impl ResolutionNegotiator {
    pub fn new(table: ResolutionTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &ResolutionTable {
        &self.table
    }

    /// Parse `label` and negotiate. Unknown labels never reach the device.
    pub async fn negotiate_label(
        &self,
        device: &mut dyn CaptureDevice,
        camera: &CameraIdentity,
        label: &str,
    ) -> CaptureResult<ActiveCapture> {
        let ratio = RatioLabel::parse(label)?;
        self.negotiate(device, camera, ratio).await
    }

    /// Open `camera` at the first candidate of `ratio` the device accepts.
    pub async fn negotiate(
        &self,
        device: &mut dyn CaptureDevice,
        camera: &CameraIdentity,
        ratio: RatioLabel,
    ) -> CaptureResult<ActiveCapture> {
        let candidates = self.table.candidates(ratio).ok_or_else(|| {
            warn!(ratio = %ratio, "no capture candidates for ratio");
            CaptureError::invalid_ratio(ratio.as_str(), LookupTable::CaptureResolution)
                .with_operation("negotiate")
        })?;

        let mut attempts = Vec::with_capacity(candidates.len());
        for (index, &candidate) in candidates.iter().enumerate() {
            let request = StreamRequest::exact(camera, candidate);
            debug!(
                ratio = %ratio,
                candidate = %candidate,
                attempt = index,
                camera = %camera,
                "requesting exact capture mode"
            );

            match device.open(&request).await {
                Ok(stream) => {
                    attempts.push(NegotiationAttempt {
                        candidate,
                        outcome: AttemptOutcome::Accepted,
                    });
                    info!(
                        ratio = %ratio,
                        candidate = %candidate,
                        attempts = attempts.len(),
                        "capture mode committed"
                    );
                    return Ok(ActiveCapture {
                        stream,
                        camera: camera.clone(),
                        requested: candidate,
                        committed_ratio: ratio,
                        attempts,
                    });
                }
                Err(DeviceFailure::Overconstrained { constraint }) => {
                    debug!(
                        ratio = %ratio,
                        candidate = %candidate,
                        constraint = %constraint,
                        "capture mode rejected, trying next"
                    );
                    attempts.push(NegotiationAttempt {
                        candidate,
                        outcome: AttemptOutcome::Rejected { constraint },
                    });
                }
                Err(failure) => {
                    warn!(
                        ratio = %ratio,
                        candidate = %candidate,
                        reason = %failure,
                        "error opening camera"
                    );
                    return Err(CaptureError::from(failure)
                        .with_operation("negotiate")
                        .with_metadata("ratio", ratio.as_str())
                        .with_metadata("candidate", candidate.to_string()));
                }
            }
        }

        warn!(ratio = %ratio, attempts = attempts.len(), "no suitable resolution found");
        Err(CaptureError::no_suitable_resolution(ratio.as_str(), attempts.len())
            .with_operation("negotiate"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::device::Facing;
    use crate::capture::synthetic::SyntheticCamera;
    use crate::error::DeviceErrorKind;

    fn back() -> CameraIdentity {
        CameraIdentity::new("rear", Facing::Environment)
    }

    #[tokio::test]
    async fn first_acceptable_candidate_wins() {
        let mut camera = SyntheticCamera::new("rear", vec![ResolutionCandidate::new(960, 540)]);
        let log = camera.probe();
        let active = ResolutionNegotiator::default()
            .negotiate(&mut camera, &back(), RatioLabel::Wide16x9)
            .await
            .unwrap();

        assert_eq!(active.requested(), ResolutionCandidate::new(960, 540));
        assert_eq!(active.committed_ratio(), RatioLabel::Wide16x9);
        assert_eq!(active.attempts().len(), 3);
        let tried: Vec<_> = log.requests().iter().map(StreamRequest::candidate).collect();
        assert_eq!(
            tried,
            vec![
                ResolutionCandidate::new(1920, 1080),
                ResolutionCandidate::new(1280, 720),
                ResolutionCandidate::new(960, 540),
            ]
        );
    }

    #[tokio::test]
    async fn unknown_label_issues_no_request() {
        let mut camera = SyntheticCamera::new("rear", vec![ResolutionCandidate::new(1920, 1080)]);
        let log = camera.probe();
        let err = ResolutionNegotiator::default()
            .negotiate_label(&mut camera, &back(), "5:4")
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::InvalidRatio { .. }));
        assert!(log.requests().is_empty());
    }

    #[tokio::test]
    async fn missing_table_entry_is_invalid_ratio() {
        let table = ResolutionTable::new()
            .with_ratio(RatioLabel::Wide16x9, vec![ResolutionCandidate::new(1280, 720)])
            .with_ratio(RatioLabel::Wide4x3, Vec::new());
        let negotiator = ResolutionNegotiator::new(table);
        let mut camera = SyntheticCamera::new("rear", vec![ResolutionCandidate::new(1280, 720)]);
        let log = camera.probe();

        for ratio in [RatioLabel::Wide4x3, RatioLabel::Tall3x4] {
            let err = negotiator.negotiate(&mut camera, &back(), ratio).await.unwrap_err();
            assert!(matches!(
                err,
                CaptureError::InvalidRatio {
                    table: LookupTable::CaptureResolution,
                    ..
                }
            ));
        }
        assert!(log.requests().is_empty());
    }

    #[tokio::test]
    async fn exhaustion_reports_attempt_count() {
        let mut camera = SyntheticCamera::new("rear", vec![ResolutionCandidate::new(320, 240)]);
        let err = ResolutionNegotiator::default()
            .negotiate(&mut camera, &back(), RatioLabel::Wide4x3)
            .await
            .unwrap_err();
        match err {
            CaptureError::NoSuitableResolution { attempts, ratio, .. } => {
                assert_eq!(attempts, 6);
                assert_eq!(ratio, "4:3");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn non_constraint_failure_aborts_immediately() {
        let mut camera = SyntheticCamera::new("rear", vec![ResolutionCandidate::new(640, 360)])
            .failing_with(DeviceFailure::PermissionDenied("denied".into()));
        let log = camera.probe();
        let err = ResolutionNegotiator::default()
            .negotiate(&mut camera, &back(), RatioLabel::Wide16x9)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CaptureError::Device {
                kind: DeviceErrorKind::PermissionDenied,
                ..
            }
        ));
        assert_eq!(log.requests().len(), 1);
    }
}
