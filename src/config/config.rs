//! # Capture Configuration
//!
//! The common interface between the CLI and the library: which document
//! ratio is selected, how hard artifacts are compressed, where they go and
//! which layout they are cut with.
//!
//! ## Configuration Parameters
//!
//! | Parameter | Type | Range | Description |
//! |-----------|------|-------|-------------|
//! | `ratio` | `RatioLabel` | 16:9, 9:16, 4:3, 3:4 | Selected document ratio (target canvas) |
//! | `quality` | `f32` | (0, 1] | JPEG quality applied to every artifact |
//! | `output_dir` | `PathBuf` | Any writable path | Where the CLI stores artifacts |
//! | `first_frame_timeout` | `Duration` | > 0 | How long to wait for the first frame after negotiation |
//! | `layout` | `DocumentLayout` | validated | Canvas sizes and crop regions |
//!
//! ## Examples
//!
//! ```rust
//! use doc_capture::config::{CaptureConfig, RatioLabel};
//!
//! let config = CaptureConfig::default();
//! assert_eq!(config.ratio, RatioLabel::Wide16x9);
//! assert!(config.validate().is_ok());
//!
//! let config = CaptureConfig { quality: 0.6, ..CaptureConfig::default() };
//! assert!(config.validate().is_ok());
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::config::layout::DocumentLayout;
use crate::config::ratio::RatioLabel;
use crate::error::{CaptureError, CaptureResult};

/// Quality used when none is configured.
pub const DEFAULT_QUALITY: f32 = 0.8;

/// Configuration for a document capture session.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Selected document ratio.
    ///
    /// The camera is opened with the landscape counterpart
    /// ([`RatioLabel::capture_ratio`]); this label picks the output canvas.
    pub ratio: RatioLabel,

    /// Lossy encoding quality for every derived image, in (0, 1].
    pub quality: f32,

    /// Directory where artifacts are written by the CLI.
    pub output_dir: PathBuf,

    /// Upper bound on waiting for the first frame of a fresh session.
    pub first_frame_timeout: Duration,

    /// Document layout used by the derivation pipeline.
    pub layout: DocumentLayout,
}

impl Default for CaptureConfig {
    /// Defaults: 16:9 document, quality 0.8, `captures/`, 5 s first-frame wait,
    /// ID card layout.
    fn default() -> Self {
        Self {
            ratio: RatioLabel::Wide16x9,
            quality: DEFAULT_QUALITY,
            output_dir: PathBuf::from("captures"),
            first_frame_timeout: Duration::from_secs(5),
            layout: DocumentLayout::default(),
        }
    }
}

impl CaptureConfig {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> CaptureResult<()> {
        validate_quality(self.quality)?;
        if self.first_frame_timeout.is_zero() {
            return Err(CaptureError::config(
                "first_frame_timeout",
                "0",
                "must be greater than 0",
            ));
        }
        self.layout.validate()
    }
}

/// Reject qualities outside `(0, 1]`.
pub fn validate_quality(quality: f32) -> CaptureResult<()> {
    if quality.is_finite() && quality > 0.0 && quality <= 1.0 {
        Ok(())
    } else {
        Err(CaptureError::config(
            "quality",
            quality.to_string(),
            "must be in (0, 1]",
        ))
    }
}
