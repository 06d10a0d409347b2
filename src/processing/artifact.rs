//! # Derived Artifacts
//!
//! The output side of the derivation pipeline: immutable JPEG images tagged
//! with their dimensions and ratio, grouped per capture in a [`DerivedSet`]
//! together with a per-stage report.

use std::fmt;
use std::sync::Arc;

use cap_scale::presets::Size;
use image::RgbImage;

use crate::config::ratio::RatioLabel;
use crate::error::CaptureResult;
use crate::processing::encode;

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Full,
    Resized,
    Rotated,
    IdRegion,
    DetailRegion,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Full,
        Stage::Resized,
        Stage::Rotated,
        Stage::IdRegion,
        Stage::DetailRegion,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Full => "full",
            Stage::Resized => "resized",
            Stage::Rotated => "rotated",
            Stage::IdRegion => "id_region",
            Stage::DetailRegion => "detail_region",
        }
    }

    /// The stage whose output this one reads.
    pub fn predecessor(self) -> Option<Stage> {
        match self {
            Stage::Full => None,
            Stage::Resized => Some(Stage::Full),
            Stage::Rotated => Some(Stage::Resized),
            Stage::IdRegion | Stage::DetailRegion => Some(Stage::Rotated),
        }
    }

    /// File name an artifact of this stage is saved under.
    pub fn file_name(self) -> String {
        format!("{}.jpg", self.name())
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a stage did not run. Not an error: the rest of the set is still valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The output canvas has a side below the usable minimum.
    TooSmall { canvas: Size, min_side: u32 },
    /// The stage this one reads from produced nothing.
    PredecessorMissing(Stage),
    /// The region floors to zero pixels on this image.
    EmptyRegion { width: u32, height: u32 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TooSmall { canvas, min_side } => {
                write!(f, "canvas {} has a side below {}", canvas, min_side)
            }
            SkipReason::PredecessorMissing(stage) => write!(f, "no {} image", stage),
            SkipReason::EmptyRegion { width, height } => {
                write!(f, "region is empty on a {}x{} image", width, height)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageFailure {
    /// The target ratio has no output canvas.
    UnknownRatio(RatioLabel),
    /// Resize, rotation or crop geometry was rejected.
    Geometry(String),
    /// JPEG encode or decode failed.
    Encode(String),
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageFailure::UnknownRatio(ratio) => write!(f, "no output canvas for ratio {}", ratio),
            StageFailure::Geometry(reason) => write!(f, "geometry: {}", reason),
            StageFailure::Encode(reason) => write!(f, "encode: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Produced,
    Skipped(SkipReason),
    Failed(StageFailure),
}

impl StageOutcome {
    pub fn is_produced(&self) -> bool {
        matches!(self, StageOutcome::Produced)
    }
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageOutcome::Produced => f.write_str("produced"),
            StageOutcome::Skipped(reason) => write!(f, "skipped ({})", reason),
            StageOutcome::Failed(failure) => write!(f, "failed ({})", failure),
        }
    }
}

/// One encoded image. Cheap to clone; the bytes are shared and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageArtifact {
    data: Arc<Vec<u8>>,
    pub width: u32,
    pub height: u32,
    pub source_ratio: RatioLabel,
    pub quality: f32,
}

impl ImageArtifact {
    pub fn new(jpeg: Vec<u8>, size: Size, source_ratio: RatioLabel, quality: f32) -> Self {
        Self {
            data: Arc::new(jpeg),
            width: size.w,
            height: size.h,
            source_ratio,
            quality,
        }
    }

    /// Encoded JPEG bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn size(&self) -> Size {
        Size {
            w: self.width,
            h: self.height,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        encode::JPEG_MIME
    }

    pub(crate) fn shared_bytes(&self) -> Arc<Vec<u8>> {
        Arc::clone(&self.data)
    }

    /// Decode back to RGB pixels.
    pub fn decode(&self) -> CaptureResult<RgbImage> {
        encode::decode_jpeg(&self.data, "artifact")
    }

    /// `data:image/jpeg;base64,...`
    pub fn to_data_url(&self) -> String {
        encode::data_url(self.mime_type(), &self.data)
    }
}

/// Everything one `capture` call produced.
///
/// `full` always exists. The other artifacts are present only when their
/// stage produced output; [`DerivedSet::outcome`] says why one is missing.
#[derive(Debug, Clone)]
pub struct DerivedSet {
    pub full: ImageArtifact,
    pub resized: Option<ImageArtifact>,
    pub rotated: Option<ImageArtifact>,
    pub id_region: Option<ImageArtifact>,
    pub detail_region: Option<ImageArtifact>,
    outcomes: Vec<(Stage, StageOutcome)>,
}

impl DerivedSet {
    pub(crate) fn new(full: ImageArtifact) -> Self {
        Self {
            full,
            resized: None,
            rotated: None,
            id_region: None,
            detail_region: None,
            outcomes: vec![(Stage::Full, StageOutcome::Produced)],
        }
    }

    pub(crate) fn record(&mut self, stage: Stage, outcome: StageOutcome) {
        self.outcomes.push((stage, outcome));
    }

    pub(crate) fn store(&mut self, stage: Stage, artifact: ImageArtifact) {
        match stage {
            Stage::Full => self.full = artifact,
            Stage::Resized => self.resized = Some(artifact),
            Stage::Rotated => self.rotated = Some(artifact),
            Stage::IdRegion => self.id_region = Some(artifact),
            Stage::DetailRegion => self.detail_region = Some(artifact),
        }
        self.record(stage, StageOutcome::Produced);
    }

    pub fn get(&self, stage: Stage) -> Option<&ImageArtifact> {
        match stage {
            Stage::Full => Some(&self.full),
            Stage::Resized => self.resized.as_ref(),
            Stage::Rotated => self.rotated.as_ref(),
            Stage::IdRegion => self.id_region.as_ref(),
            Stage::DetailRegion => self.detail_region.as_ref(),
        }
    }

    /// Stage outcomes in execution order.
    pub fn outcomes(&self) -> &[(Stage, StageOutcome)] {
        &self.outcomes
    }

    pub fn outcome(&self, stage: Stage) -> Option<&StageOutcome> {
        self.outcomes
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, outcome)| outcome)
    }

    /// Present artifacts in stage order.
    pub fn artifacts(&self) -> impl Iterator<Item = (Stage, &ImageArtifact)> + '_ {
        Stage::ALL
            .into_iter()
            .filter_map(move |stage| self.get(stage).map(|artifact| (stage, artifact)))
    }

    pub fn is_complete(&self) -> bool {
        Stage::ALL.iter().all(|stage| self.get(*stage).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(w: u32, h: u32) -> ImageArtifact {
        ImageArtifact::new(vec![0xFF, 0xD8], Size { w, h }, RatioLabel::Wide16x9, 0.8)
    }

    #[test]
    fn stage_names_and_files() {
        assert_eq!(Stage::IdRegion.file_name(), "id_region.jpg");
        assert_eq!(Stage::Full.to_string(), "full");
        assert!(Stage::Full < Stage::DetailRegion);
    }

    #[test]
    fn derived_set_tracks_presence_and_outcomes() {
        let mut set = DerivedSet::new(artifact(1280, 720));
        set.store(Stage::Resized, artifact(1024, 576));
        set.record(
            Stage::Rotated,
            StageOutcome::Failed(StageFailure::Encode("boom".into())),
        );
        set.record(
            Stage::IdRegion,
            StageOutcome::Skipped(SkipReason::PredecessorMissing(Stage::Rotated)),
        );

        assert!(!set.is_complete());
        let present: Vec<_> = set.artifacts().map(|(stage, _)| stage).collect();
        assert_eq!(present, vec![Stage::Full, Stage::Resized]);
        assert_eq!(set.outcome(Stage::Resized), Some(&StageOutcome::Produced));
        assert!(matches!(set.outcome(Stage::Rotated), Some(StageOutcome::Failed(_))));
        assert_eq!(set.outcome(Stage::DetailRegion), None);
    }

    #[test]
    fn data_url_prefix() {
        let url = artifact(1, 1).to_data_url();
        assert_eq!(url, "data:image/jpeg;base64,/9g=");
    }
}
