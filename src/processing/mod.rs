//! # Processing Module
//!
//! Derivation of document images from a captured frame: the stage machine,
//! its artifacts and the JPEG codec glue.

pub mod artifact;
pub mod encode;
pub mod pipeline;

pub use artifact::{DerivedSet, ImageArtifact, SkipReason, Stage, StageFailure, StageOutcome};
pub use pipeline::{DOCUMENT_ROTATION, DerivationPipeline};
