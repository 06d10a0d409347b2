//! # Derivation Pipeline
//!
//! Turns the current frame of a ready [`CaptureSession`] into a
//! [`DerivedSet`]:
//!
//! ```text
//! raw frame ─▶ full (native size, session ratio)
//!     └──────▶ resized (output canvas of the target ratio)
//!                  └─decode─▶ rotated (fixed 270° correction)
//!                                 └─decode─┬─▶ id_region
//!                                          └─▶ detail_region
//! ```
//!
//! Stages run strictly in that order. A stage that cannot run is recorded as
//! skipped or failed and everything downstream of it is skipped; none of that
//! is an error. Errors are reserved for bad arguments (quality, unparsable
//! ratio), a session without a frame, and a frame that cannot be encoded at
//! all.
//!
//! Decoding the previous stage's JPEG happens on the blocking pool and is the
//! only place the call suspends. Each stage works on its own buffer; the raw
//! frame is only read.

use std::sync::Arc;

use cap_scale::cpu::resize_rgba;
use cap_scale::presets::{Size, canvas_plan};
use cap_scale::region::{RegionFraction, crop_packed};
use cap_scale::rotate::{QuarterTurn, rotate_packed};
use futures_util::future::join;
use image::RgbImage;
use tracing::{debug, info, warn};

use crate::capture::device::RawFrame;
use crate::config::config::validate_quality;
use crate::config::layout::DocumentLayout;
use crate::config::ratio::RatioLabel;
use crate::error::{CaptureError, CaptureResult};
use crate::processing::artifact::{
    DerivedSet, ImageArtifact, SkipReason, Stage, StageFailure, StageOutcome,
};
use crate::processing::encode;
use crate::session::CaptureSession;

/// Orientation correction applied to the resized image.
pub const DOCUMENT_ROTATION: QuarterTurn = QuarterTurn::Cw270;

type StageResult = Result<ImageArtifact, StageOutcome>;

#[derive(Debug, Clone)]
pub struct DerivationPipeline {
    layout: Arc<DocumentLayout>,
}

impl Default for DerivationPipeline {
    fn default() -> Self {
        Self {
            layout: Arc::new(DocumentLayout::default()),
        }
    }
}

impl DerivationPipeline {
    /// Build a pipeline for `layout`, rejecting layouts that fail validation.
    pub fn new(layout: DocumentLayout) -> CaptureResult<Self> {
        layout.validate()?;
        Ok(Self {
            layout: Arc::new(layout),
        })
    }

    pub fn layout(&self) -> &DocumentLayout {
        &self.layout
    }

    /// Derive every artifact from the frame the session delivered last.
    ///
    /// The session is only read, so several calls may share it. Use
    /// [`DerivationPipeline::capture_live`] to pull a fresh frame first.
    pub async fn capture(
        &self,
        session: &CaptureSession,
        target_ratio: &str,
        quality: f32,
    ) -> CaptureResult<DerivedSet> {
        validate_quality(quality)?;
        let target = RatioLabel::parse(target_ratio)?;
        let frame = session.frame()?;
        self.derive(frame, session.committed_ratio(), target, quality)
            .await
    }

    /// Pull the stream's next frame from a ready session and derive from it.
    ///
    /// Arguments are checked before the stream is touched. A session that is
    /// not `Ready` fails with `NotReady` without being polled.
    pub async fn capture_live(
        &self,
        session: &mut CaptureSession,
        target_ratio: &str,
        quality: f32,
    ) -> CaptureResult<DerivedSet> {
        validate_quality(quality)?;
        let target = RatioLabel::parse(target_ratio)?;
        if !session.is_ready() {
            return Err(CaptureError::not_ready(session.state().name())
                .with_operation("capture_live"));
        }
        let frame = session.poll_frame().await?;
        debug!(sequence = frame.sequence, target = %target, "capturing live frame");
        self.derive(frame, session.committed_ratio(), target, quality)
            .await
    }

    /// Derive from an explicit frame. `source_ratio` tags the full image.
    pub async fn derive(
        &self,
        frame: Arc<RawFrame>,
        source_ratio: RatioLabel,
        target: RatioLabel,
        quality: f32,
    ) -> CaptureResult<DerivedSet> {
        validate_quality(quality)?;

        let full = self.full_stage(&frame, source_ratio, quality)?;
        let mut set = DerivedSet::new(full);

        let resized = self.resize_stage(&frame, target, quality);
        let Some(resized) = settle(&mut set, Stage::Resized, resized) else {
            skip_after(&mut set, Stage::Resized);
            return Ok(finish(set, target));
        };

        let rotated = self.rotate_stage(&resized, target, quality).await;
        let Some(rotated) = settle(&mut set, Stage::Rotated, rotated) else {
            skip_after(&mut set, Stage::Rotated);
            return Ok(finish(set, target));
        };

        let (id_region, detail_region) = match decode_blocking(&rotated, Stage::Rotated).await {
            Ok(pixels) => {
                let pixels = Arc::new(pixels);
                join(
                    crop_stage(
                        Arc::clone(&pixels),
                        Stage::IdRegion,
                        self.layout.id_region,
                        target,
                        quality,
                    ),
                    crop_stage(
                        pixels,
                        Stage::DetailRegion,
                        self.layout.detail_region,
                        target,
                        quality,
                    ),
                )
                .await
            }
            Err(outcome) => (Err(outcome.clone()), Err(outcome)),
        };
        settle(&mut set, Stage::IdRegion, id_region);
        settle(&mut set, Stage::DetailRegion, detail_region);

        Ok(finish(set, target))
    }

    fn full_stage(
        &self,
        frame: &RawFrame,
        ratio: RatioLabel,
        quality: f32,
    ) -> CaptureResult<ImageArtifact> {
        let rgba = frame.packed_rgba().ok_or_else(|| {
            CaptureError::encode(Stage::Full.name(), "frame buffer shorter than its dimensions")
        })?;
        let rgb = encode::rgba_to_rgb(&rgba);
        let jpeg = encode::encode_jpeg(&rgb, frame.size(), quality, Stage::Full.name())?;
        Ok(ImageArtifact::new(jpeg, frame.size(), ratio, quality))
    }

    fn resize_stage(&self, frame: &RawFrame, target: RatioLabel, quality: f32) -> StageResult {
        let canvas = self
            .layout
            .canvas
            .canvas(target)
            .ok_or(StageOutcome::Failed(StageFailure::UnknownRatio(target)))?;

        let min_side = self.layout.min_canvas_side;
        if canvas.w < min_side || canvas.h < min_side {
            return Err(StageOutcome::Skipped(SkipReason::TooSmall { canvas, min_side }));
        }

        let plan = canvas_plan(frame.size(), canvas);
        let rgba = resize_rgba(&frame.data, frame.size(), Some(frame.stride), &plan)
            .map_err(|e| StageOutcome::Failed(StageFailure::Geometry(e.to_string())))?;
        encode_stage(&encode::rgba_to_rgb(&rgba), canvas, target, quality, Stage::Resized)
    }

    async fn rotate_stage(
        &self,
        resized: &ImageArtifact,
        target: RatioLabel,
        quality: f32,
    ) -> StageResult {
        let pixels = decode_blocking(resized, Stage::Resized).await?;
        let size = Size {
            w: pixels.width(),
            h: pixels.height(),
        };
        let (rotated, rotated_size) = rotate_packed(pixels.as_raw(), size, 3, DOCUMENT_ROTATION)
            .ok_or_else(|| {
                StageOutcome::Failed(StageFailure::Geometry(format!(
                    "cannot rotate {} image",
                    size
                )))
            })?;
        encode_stage(&rotated, rotated_size, target, quality, Stage::Rotated)
    }
}

async fn crop_stage(
    pixels: Arc<RgbImage>,
    stage: Stage,
    region: RegionFraction,
    target: RatioLabel,
    quality: f32,
) -> StageResult {
    let size = Size {
        w: pixels.width(),
        h: pixels.height(),
    };
    let rect = region.resolve(size);
    if rect.w == 0 || rect.h == 0 {
        return Err(StageOutcome::Skipped(SkipReason::EmptyRegion {
            width: size.w,
            height: size.h,
        }));
    }
    debug!(
        stage = %stage,
        x = rect.x,
        y = rect.y,
        width = rect.w,
        height = rect.h,
        "cropping region"
    );

    tokio::task::spawn_blocking(move || {
        let cropped = crop_packed(pixels.as_raw(), size, 3, rect)
            .map_err(|e| StageOutcome::Failed(StageFailure::Geometry(e.to_string())))?;
        encode_stage(&cropped, rect.size(), target, quality, stage)
    })
    .await
    .unwrap_or_else(|e| Err(StageOutcome::Failed(StageFailure::Encode(e.to_string()))))
}

fn encode_stage(
    rgb: &[u8],
    size: Size,
    ratio: RatioLabel,
    quality: f32,
    stage: Stage,
) -> StageResult {
    encode::encode_jpeg(rgb, size, quality, stage.name())
        .map(|jpeg| ImageArtifact::new(jpeg, size, ratio, quality))
        .map_err(|e| StageOutcome::Failed(StageFailure::Encode(e.to_string())))
}

/// Decode an earlier stage's output on the blocking pool.
async fn decode_blocking(
    artifact: &ImageArtifact,
    stage: Stage,
) -> Result<RgbImage, StageOutcome> {
    let bytes = artifact.shared_bytes();
    tokio::task::spawn_blocking(move || encode::decode_jpeg(&bytes, stage.name()))
        .await
        .map_err(CaptureError::from)
        .and_then(|decoded| decoded)
        .map_err(|e| StageOutcome::Failed(StageFailure::Encode(e.to_string())))
}

/// Record a stage result, returning the artifact when one was produced.
fn settle(set: &mut DerivedSet, stage: Stage, result: StageResult) -> Option<ImageArtifact> {
    match result {
        Ok(artifact) => {
            debug!(
                stage = %stage,
                width = artifact.width,
                height = artifact.height,
                bytes = artifact.bytes().len(),
                "stage produced"
            );
            set.store(stage, artifact.clone());
            Some(artifact)
        }
        Err(outcome) => {
            match &outcome {
                StageOutcome::Failed(failure) => {
                    warn!(stage = %stage, reason = %failure, "stage failed")
                }
                other => debug!(stage = %stage, outcome = %other, "stage not run"),
            }
            set.record(stage, outcome);
            None
        }
    }
}

/// Mark every stage after `missing` as skipped.
fn skip_after(set: &mut DerivedSet, missing: Stage) {
    for stage in Stage::ALL.into_iter().filter(|stage| *stage > missing) {
        let predecessor = stage.predecessor().unwrap_or(missing);
        let outcome = StageOutcome::Skipped(SkipReason::PredecessorMissing(predecessor));
        set.record(stage, outcome);
    }
}

fn finish(set: DerivedSet, target: RatioLabel) -> DerivedSet {
    let produced = set.artifacts().count();
    info!(target = %target, produced, complete = set.is_complete(), "capture derived");
    set
}
