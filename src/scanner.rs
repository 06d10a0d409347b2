//! # Document Scanner
//!
//! The end-to-end flow around one rear camera: open it at a capture ratio,
//! switch document ratios, derive artifacts on demand, close it.
//!
//! ## Ratio handling
//!
//! The selected document ratio picks the output canvas. The camera itself is
//! always opened with the landscape counterpart
//! ([`RatioLabel::capture_ratio`]), so `3:4` captures at `4:3` and `9:16`
//! at `16:9`.
//!
//! ## Exclusivity
//!
//! The scanner owns the device and at most one [`CaptureSession`]. Every
//! re-open stops the current session before negotiating again.

use std::sync::Arc;

use cap_scale::presets::Size;
use tracing::{debug, info, warn};

use crate::capture::device::CaptureDevice;
use crate::capture::directory::CameraDirectory;
use crate::capture::negotiate::ResolutionNegotiator;
use crate::config::config::CaptureConfig;
use crate::config::ratio::RatioLabel;
use crate::error::{CaptureError, CaptureResult};
use crate::notify::{Notifier, ToastPosition, ToastSeverity};
use crate::processing::artifact::{DerivedSet, Stage, StageFailure, StageOutcome};
use crate::processing::pipeline::DerivationPipeline;
use crate::session::CaptureSession;

pub const LOADING_MESSAGE: &str = "Loading...";
pub const CLOSED_MESSAGE: &str = "Camera closed";
pub const RATIO_INCORRECT_MESSAGE: &str = "The ratio is incorrect. Please select the ratio.";
const ALERT_TITLE: &str = "Error";

pub struct DocumentScanner {
    device: Box<dyn CaptureDevice>,
    directory: Box<dyn CameraDirectory>,
    notifier: Arc<dyn Notifier>,
    negotiator: ResolutionNegotiator,
    pipeline: DerivationPipeline,
    config: CaptureConfig,
    selected: RatioLabel,
    session: Option<CaptureSession>,
    last: Option<DerivedSet>,
}

impl DocumentScanner {
    pub fn new(
        device: Box<dyn CaptureDevice>,
        directory: Box<dyn CameraDirectory>,
        notifier: Arc<dyn Notifier>,
        config: CaptureConfig,
    ) -> CaptureResult<Self> {
        config.validate()?;
        let pipeline = DerivationPipeline::new(config.layout.clone())?;
        Ok(Self {
            device,
            directory,
            notifier,
            negotiator: ResolutionNegotiator::default(),
            pipeline,
            selected: config.ratio,
            config,
            session: None,
            last: None,
        })
    }

    pub fn with_negotiator(mut self, negotiator: ResolutionNegotiator) -> Self {
        self.negotiator = negotiator;
        self
    }

    pub fn selected_ratio(&self) -> RatioLabel {
        self.selected
    }

    pub fn session(&self) -> Option<&CaptureSession> {
        self.session.as_ref()
    }

    /// Artifacts of the most recent successful capture.
    pub fn last_capture(&self) -> Option<&DerivedSet> {
        self.last.as_ref()
    }

    /// Open the back camera for the selected ratio and wait for its first frame.
    pub async fn open(&mut self) -> CaptureResult<Size> {
        self.open_at(self.selected.capture_ratio()).await
    }

    /// Select a document ratio and re-open the camera at its capture ratio.
    pub async fn select_ratio(&mut self, label: &str) -> CaptureResult<Size> {
        let ratio = match RatioLabel::parse(label) {
            Ok(ratio) => ratio,
            Err(e) => {
                self.notifier.alert(ALERT_TITLE, e.user_message());
                return Err(e);
            }
        };
        debug!(selected = %ratio, capture = %ratio.capture_ratio(), "ratio selected");
        self.selected = ratio;
        self.last = None;
        self.open_at(ratio.capture_ratio()).await
    }

    /// Derive artifacts from a fresh frame of the live session.
    ///
    /// The previous set is dropped first, so after a failed call
    /// [`DocumentScanner::last_capture`] is empty.
    pub async fn capture(&mut self) -> CaptureResult<&DerivedSet> {
        self.last = None;
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| CaptureError::not_ready("closed").with_operation("capture"))?;
        let set = self
            .pipeline
            .capture_live(session, self.selected.as_str(), self.config.quality)
            .await?;

        if let Some(StageOutcome::Failed(StageFailure::UnknownRatio(ratio))) =
            set.outcome(Stage::Resized)
        {
            warn!(ratio = %ratio, "no output canvas for the selected ratio");
            self.notifier.toast(
                RATIO_INCORRECT_MESSAGE,
                ToastPosition::Bottom,
                ToastSeverity::Danger,
                1,
            );
        }
        Ok(&*self.last.insert(set))
    }

    /// Stop the camera and tell the user.
    pub fn dismiss(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.stop();
        }
        self.notifier
            .toast(CLOSED_MESSAGE, ToastPosition::Bottom, ToastSeverity::Danger, 1);
    }

    async fn open_at(&mut self, capture_ratio: RatioLabel) -> CaptureResult<Size> {
        self.notifier.show_loading(LOADING_MESSAGE);
        let result = self.try_open(capture_ratio).await;
        if let Err(e) = &result {
            self.notifier.alert(ALERT_TITLE, e.user_message());
        }
        self.notifier.dismiss_loading();
        result
    }

    async fn try_open(&mut self, capture_ratio: RatioLabel) -> CaptureResult<Size> {
        let camera = self
            .directory
            .back_camera()
            .await
            .ok_or_else(|| CaptureError::no_camera().with_operation("open"))?;
        debug!(camera = %camera, ratio = %capture_ratio, "back camera found");

        if let Some(mut previous) = self.session.take() {
            previous.stop();
        }

        let active = self
            .negotiator
            .negotiate(&mut *self.device, &camera, capture_ratio)
            .await?;
        let session = self.session.insert(CaptureSession::new(active));
        let size = session.wait_ready(self.config.first_frame_timeout).await?;
        info!(camera = %camera, ratio = %capture_ratio, width = size.w, height = size.h, "camera open");
        Ok(size)
    }
}

impl std::fmt::Debug for DocumentScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentScanner")
            .field("selected", &self.selected)
            .field("session", &self.session.as_ref().map(CaptureSession::state))
            .field("has_capture", &self.last.is_some())
            .finish()
    }
}
