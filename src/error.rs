//! # Error Handling
//!
//! Typed failures for negotiation, sessions and derivation, each carrying an
//! [`ErrorContext`] with severity, retry hints and free-form metadata.
//!
//! ## Error Classification
//!
//! - `Retryable`: the same call may succeed later (`NotReady`) or with a
//!   different argument (`NoSuitableResolution`)
//! - `Recoverable`: a fallback exists (another ratio, another camera, waiting)
//! - [`classify::is_fatal`]: the caller must change its input (`InvalidRatio`, `Config`)
//!
//! Stage skips inside the derivation pipeline are *not* errors and never
//! appear here; see `processing::artifact::StageOutcome`.
//!
//! ## Usage
//!
//! ```rust
//! use doc_capture::error::{CaptureError, LookupTable, Retryable};
//!
//! let error = CaptureError::invalid_ratio("5:4", LookupTable::CaptureResolution)
//!     .with_context("opening the back camera");
//! assert!(!error.is_retryable());
//! assert_eq!(error.category(), "invalid_ratio");
//! ```

use std::{error::Error as StdError, fmt, time::SystemTime};

/// Severity levels for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational errors
    Info,
    /// Warnings that may indicate potential issues
    Warning,
    /// Errors that affect operation but can be recovered from
    Error,
    /// Critical errors that require immediate attention
    Critical,
    /// Fatal errors that cannot be recovered from
    Fatal,
}

/// Core error context containing metadata about when and where an error occurred
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// When the error occurred
    pub timestamp: SystemTime,
    /// The operation being performed when the error occurred
    pub operation: Option<String>,
    /// Additional context about the error
    pub context: Option<String>,
    /// Suggested recovery action
    pub recovery_suggestion: Option<String>,
    /// Error severity level
    pub severity: ErrorSeverity,
    /// Whether this error is retryable
    pub retryable: bool,
    /// Additional metadata as key-value pairs
    pub metadata: std::collections::HashMap<String, String>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            timestamp: SystemTime::now(),
            operation: None,
            context: None,
            recovery_suggestion: None,
            severity: ErrorSeverity::Error,
            retryable: false,
            metadata: std::collections::HashMap::new(),
        }
    }
}

impl ErrorContext {
    /// Create a new error context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set recovery suggestion
    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.recovery_suggestion = Some(suggestion.into());
        self
    }

    /// Set severity level
    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Mark as retryable
    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

/// Which lookup table rejected a ratio label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupTable {
    /// The label is not one of the known ratios at all.
    Parse,
    /// Capture-resolution candidates (what the camera is asked for).
    CaptureResolution,
    /// Output canvas sizes (what the document is resized to).
    OutputCanvas,
}

impl fmt::Display for LookupTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupTable::Parse => write!(f, "known ratios"),
            LookupTable::CaptureResolution => write!(f, "capture resolution table"),
            LookupTable::OutputCanvas => write!(f, "output canvas table"),
        }
    }
}

/// Device failure kinds that end a negotiation immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceErrorKind {
    /// The user or platform refused camera access.
    PermissionDenied,
    /// The requested device does not exist (anymore).
    NotFound,
    /// Driver or hardware failure.
    Hardware,
    /// An exact constraint could not be met (only surfaced outside negotiation).
    Overconstrained,
}

/// Base error type for the document capture library
#[derive(Debug)]
pub enum CaptureError {
    /// Ratio label missing from a lookup table
    InvalidRatio {
        ratio: String,
        table: LookupTable,
        context: ErrorContext,
    },
    /// Every capture candidate for the ratio was rejected by the device
    NoSuitableResolution {
        ratio: String,
        attempts: usize,
        context: ErrorContext,
    },
    /// Permission, device or driver failure unrelated to constraints
    Device {
        kind: DeviceErrorKind,
        reason: String,
        context: ErrorContext,
    },
    /// A frame was requested before the first frame arrived, or after stop
    NotReady {
        state: String,
        context: ErrorContext,
    },
    /// The camera directory has no back camera
    NoCamera {
        context: ErrorContext,
    },
    /// Configuration validation errors
    Config {
        field: String,
        value: String,
        reason: String,
        context: ErrorContext,
    },
    /// Image encoding or decoding failed inside a stage
    Encode {
        stage: String,
        reason: String,
        context: ErrorContext,
    },
    /// I/O errors
    Io {
        operation: String,
        path: Option<String>,
        source: std::io::Error,
        context: ErrorContext,
    },
    /// External library errors
    External {
        library: String,
        source: Box<dyn StdError + Send + Sync>,
        context: ErrorContext,
    },
}

impl CaptureError {
    /// Create an invalid-ratio error; never retryable without a new argument.
    pub fn invalid_ratio(ratio: impl Into<String>, table: LookupTable) -> Self {
        Self::InvalidRatio {
            ratio: ratio.into(),
            table,
            context: ErrorContext::new()
                .with_severity(ErrorSeverity::Fatal)
                .with_recovery_suggestion("Select one of 16:9, 9:16, 4:3 or 3:4"),
        }
    }

    /// Create a no-suitable-resolution error.
    pub fn no_suitable_resolution(ratio: impl Into<String>, attempts: usize) -> Self {
        Self::NoSuitableResolution {
            ratio: ratio.into(),
            attempts,
            context: ErrorContext::new()
                .retryable()
                .with_recovery_suggestion("Try a different ratio or camera"),
        }
    }

    /// Create a device error.
    pub fn device(kind: DeviceErrorKind, reason: impl Into<String>) -> Self {
        Self::Device {
            kind,
            reason: reason.into(),
            context: ErrorContext::new().with_severity(ErrorSeverity::Critical),
        }
    }

    /// Create a not-ready error for a session in `state`.
    pub fn not_ready(state: impl Into<String>) -> Self {
        Self::NotReady {
            state: state.into(),
            context: ErrorContext::new()
                .with_severity(ErrorSeverity::Warning)
                .retryable()
                .with_recovery_suggestion("Wait for the first frame before capturing"),
        }
    }

    /// Create a no-camera error.
    pub fn no_camera() -> Self {
        Self::NoCamera {
            context: ErrorContext::new().with_severity(ErrorSeverity::Critical),
        }
    }

    /// Create a configuration error
    pub fn config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Config {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
            context: ErrorContext::new().with_severity(ErrorSeverity::Fatal),
        }
    }

    /// Create an encoding error for `stage`
    pub fn encode(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Encode {
            stage: stage.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: None,
            source,
            context: ErrorContext::new(),
        }
    }

    /// Attach the path an I/O error refers to; other variants are unchanged.
    pub fn with_path(mut self, new_path: impl Into<String>) -> Self {
        if let Self::Io { path, .. } = &mut self {
            *path = Some(new_path.into());
        }
        self
    }

    /// Create an external library error
    pub fn external(
        library: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            library: library.into(),
            source: Box::new(source),
            context: ErrorContext::new(),
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context_mut().context = Some(context.into());
        self
    }

    /// Add operation context
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context_mut().metadata.insert(key.into(), value.into());
        self
    }

    /// Get the error context
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::InvalidRatio { context, .. } => context,
            Self::NoSuitableResolution { context, .. } => context,
            Self::Device { context, .. } => context,
            Self::NotReady { context, .. } => context,
            Self::NoCamera { context } => context,
            Self::Config { context, .. } => context,
            Self::Encode { context, .. } => context,
            Self::Io { context, .. } => context,
            Self::External { context, .. } => context,
        }
    }

    /// Get mutable reference to error context
    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::InvalidRatio { context, .. } => context,
            Self::NoSuitableResolution { context, .. } => context,
            Self::Device { context, .. } => context,
            Self::NotReady { context, .. } => context,
            Self::NoCamera { context } => context,
            Self::Config { context, .. } => context,
            Self::Encode { context, .. } => context,
            Self::Io { context, .. } => context,
            Self::External { context, .. } => context,
        }
    }

    /// Get the error category as a string
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidRatio { .. } => "invalid_ratio",
            Self::NoSuitableResolution { .. } => "no_suitable_resolution",
            Self::Device { .. } => "device",
            Self::NotReady { .. } => "not_ready",
            Self::NoCamera { .. } => "no_camera",
            Self::Config { .. } => "config",
            Self::Encode { .. } => "encode",
            Self::Io { .. } => "io",
            Self::External { .. } => "external",
        }
    }

    /// Short message suitable for an alert dialog.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidRatio { .. } => "Invalid ratio",
            Self::NoSuitableResolution { .. } => "No suitable resolution found for the ratio",
            Self::Device { .. } => "Error opening camera",
            Self::NoCamera { .. } => "Camera not found",
            Self::NotReady { .. } => "Camera is not ready",
            _ => "Something went wrong",
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::InvalidRatio { ratio, table, .. } => {
                write!(f, "Invalid ratio '{}': not present in the {}", ratio, table)
            }
            CaptureError::NoSuitableResolution {
                ratio, attempts, ..
            } => {
                write!(
                    f,
                    "No suitable resolution found for ratio {} after {} attempt(s)",
                    ratio, attempts
                )
            }
            CaptureError::Device { kind, reason, .. } => {
                write!(f, "Device error ({:?}): {}", kind, reason)
            }
            CaptureError::NotReady { state, .. } => {
                write!(f, "Capture session not ready (state: {})", state)
            }
            CaptureError::NoCamera { .. } => write!(f, "No back camera available"),
            CaptureError::Config {
                field,
                value,
                reason,
                ..
            } => {
                write!(
                    f,
                    "Configuration error in '{}': {} (value: {})",
                    field, reason, value
                )
            }
            CaptureError::Encode { stage, reason, .. } => {
                write!(f, "Image encoding failed during {}: {}", stage, reason)
            }
            CaptureError::Io {
                operation,
                path,
                source,
                ..
            } => {
                if let Some(path) = path {
                    write!(
                        f,
                        "I/O error during {} on '{}': {}",
                        operation, path, source
                    )
                } else {
                    write!(f, "I/O error during {}: {}", operation, source)
                }
            }
            CaptureError::External {
                library, source, ..
            } => {
                write!(f, "External library error in {}: {}", library, source)
            }
        }
    }
}

impl StdError for CaptureError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::External { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Result type alias using our custom error type
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Trait for errors that can be retried
pub trait Retryable {
    /// Check if this error can be retried
    fn is_retryable(&self) -> bool;

    /// Get the recommended retry delay in milliseconds
    fn retry_delay_ms(&self) -> Option<u64> {
        None
    }
}

impl Retryable for CaptureError {
    fn is_retryable(&self) -> bool {
        self.context().retryable || matches!(self, Self::Io { .. })
    }

    fn retry_delay_ms(&self) -> Option<u64> {
        match self {
            Self::NotReady { .. } => Some(100),
            Self::Io { .. } => Some(100),
            _ => None,
        }
    }
}

/// Trait for errors that can be recovered from
pub trait Recoverable {
    /// Check if this error can be recovered from
    fn is_recoverable(&self) -> bool;

    /// Get recovery strategies for this error
    fn recovery_strategies(&self) -> Vec<RecoveryStrategy>;
}

/// Recovery strategies for handling errors
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryStrategy {
    /// Retry the operation
    Retry { max_attempts: usize, delay_ms: u64 },
    /// Use a fallback method
    Fallback { description: String },
}

impl Recoverable for CaptureError {
    fn is_recoverable(&self) -> bool {
        !self.recovery_strategies().is_empty()
    }

    fn recovery_strategies(&self) -> Vec<RecoveryStrategy> {
        match self {
            Self::NotReady { .. } => vec![RecoveryStrategy::Retry {
                max_attempts: 10,
                delay_ms: 100,
            }],
            Self::NoSuitableResolution { .. } => vec![
                RecoveryStrategy::Fallback {
                    description: "Negotiate another ratio".to_string(),
                },
                RecoveryStrategy::Fallback {
                    description: "Use another camera".to_string(),
                },
            ],
            Self::Encode { .. } => vec![RecoveryStrategy::Retry {
                max_attempts: 1,
                delay_ms: 0,
            }],
            _ => vec![],
        }
    }
}

/// Trait for errors with severity levels
pub trait HasSeverity {
    /// Get the severity level of this error
    fn severity(&self) -> ErrorSeverity;
}

impl HasSeverity for CaptureError {
    fn severity(&self) -> ErrorSeverity {
        self.context().severity
    }
}

/// Trait for errors that provide recovery suggestions
pub trait HasRecoverySuggestion {
    /// Get recovery suggestion for this error
    fn recovery_suggestion(&self) -> Option<&str>;
}

impl HasRecoverySuggestion for CaptureError {
    fn recovery_suggestion(&self) -> Option<&str> {
        self.context().recovery_suggestion.as_deref()
    }
}

/// Error classification utilities
pub mod classify {
    use super::*;

    /// Check if an error ends a negotiation attempt (as opposed to argument errors)
    pub fn is_negotiation_failure(error: &CaptureError) -> bool {
        matches!(
            error,
            CaptureError::InvalidRatio { .. }
                | CaptureError::NoSuitableResolution { .. }
                | CaptureError::Device { .. }
        )
    }

    /// Check if an error is fatal (the caller must change its input)
    pub fn is_fatal(error: &CaptureError) -> bool {
        matches!(
            error,
            CaptureError::InvalidRatio { .. } | CaptureError::Config { .. }
        ) || error.severity() == ErrorSeverity::Fatal
    }

    /// Check if an error requires user intervention
    pub fn requires_user_intervention(error: &CaptureError) -> bool {
        error.severity() >= ErrorSeverity::Critical
    }
}

/// Error conversion implementations
impl From<std::io::Error> for CaptureError {
    fn from(error: std::io::Error) -> Self {
        Self::io("unknown", error)
    }
}

impl From<serde_json::Error> for CaptureError {
    fn from(error: serde_json::Error) -> Self {
        Self::external("serde_json", error)
    }
}

impl From<tokio::task::JoinError> for CaptureError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::external("tokio", error)
    }
}
