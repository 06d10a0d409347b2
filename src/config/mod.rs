//! # Configuration Module
//!
//! Ratio labels, the static capture/canvas tables, the document layout and
//! the top-level capture configuration.

pub mod config;
pub mod layout;
pub mod ratio;
pub mod tables;

pub use config::CaptureConfig;
pub use layout::DocumentLayout;
pub use ratio::RatioLabel;
pub use tables::{CanvasTable, ResolutionCandidate, ResolutionTable};
