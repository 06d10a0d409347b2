//! # Document Capture Library
//!
//! Opens a rear camera at an exact, ratio-appropriate resolution and derives a
//! fixed set of ID-card images from one frame.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//! - `config`: ratio labels, the capture and canvas tables, document layout
//! - `capture`: the device seam, camera directory, resolution negotiation,
//!   software devices
//! - `session`: the `Pending → Ready → Stopped` capture session
//! - `processing`: the derivation pipeline (full, resized, rotated, two crops)
//! - `scanner`: the end-to-end flow with user notifications
//! - `error`: the error taxonomy shared by all of the above
//!
//! Raster geometry (resize plans, rotation, region maths) lives in the
//! `cap-scale` workspace crate.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use doc_capture::capture::{CameraIdentity, Facing, ResolutionNegotiator, SyntheticCamera};
//! use doc_capture::config::{RatioLabel, ResolutionCandidate};
//! use doc_capture::processing::DerivationPipeline;
//! use doc_capture::session::CaptureSession;
//!
//! # async fn example() -> doc_capture::CaptureResult<()> {
//! let mut camera = SyntheticCamera::new("rear", vec![ResolutionCandidate::new(1280, 720)]);
//! let back = CameraIdentity::new("rear", Facing::Environment);
//!
//! let active = ResolutionNegotiator::default()
//!     .negotiate(&mut camera, &back, RatioLabel::Wide16x9)
//!     .await?;
//! let mut session = CaptureSession::new(active);
//! session.wait_ready(Duration::from_secs(1)).await?;
//!
//! let set = DerivationPipeline::default().capture(&session, "16:9", 0.8).await?;
//! assert_eq!(set.rotated.as_ref().map(|a| (a.width, a.height)), Some((576, 1024)));
//! # Ok(())
//! # }
//! # tokio::runtime::Runtime::new().unwrap().block_on(example()).unwrap();
//! ```

pub mod capture;
pub mod config;
pub mod error;
pub mod notify;
pub mod processing;
pub mod scanner;
pub mod session;

/// Re-export error types for convenience
pub use error::{
    CaptureError, CaptureResult, HasRecoverySuggestion, HasSeverity, Recoverable, Retryable,
};

pub use config::{CaptureConfig, DocumentLayout, RatioLabel};
pub use processing::{DerivationPipeline, DerivedSet, ImageArtifact, Stage, StageOutcome};
pub use scanner::DocumentScanner;
pub use session::{CaptureSession, SessionState};
