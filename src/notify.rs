//! User feedback hooks.
//!
//! The scanner reports progress through a [`Notifier`]: fire-and-forget
//! toasts, alerts and a loading indicator. Nothing it returns is consumed.

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastPosition {
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastSeverity {
    Success,
    Warning,
    Danger,
}

pub trait Notifier: Send + Sync {
    fn toast(&self, message: &str, position: ToastPosition, severity: ToastSeverity, duration_secs: u32);
    fn alert(&self, title: &str, message: &str);
    fn show_loading(&self, message: &str);
    fn dismiss_loading(&self);
}

/// Renders notifications as log events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn toast(&self, message: &str, position: ToastPosition, severity: ToastSeverity, duration_secs: u32) {
        match severity {
            ToastSeverity::Danger => warn!(?position, duration_secs, "{}", message),
            _ => info!(?position, ?severity, duration_secs, "{}", message),
        }
    }

    fn alert(&self, title: &str, message: &str) {
        error!(title, "{}", message);
    }

    fn show_loading(&self, message: &str) {
        info!(loading = true, "{}", message);
    }

    fn dismiss_loading(&self) {
        info!(loading = false, "loading dismissed");
    }
}

/// One call received by a [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Toast {
        message: String,
        position: ToastPosition,
        severity: ToastSeverity,
        duration_secs: u32,
    },
    Alert { title: String, message: String },
    Loading(String),
    LoadingDismissed,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Toast { message, .. } => write!(f, "toast: {}", message),
            Notification::Alert { title, message } => write!(f, "alert: {}: {}", title, message),
            Notification::Loading(message) => write!(f, "loading: {}", message),
            Notification::LoadingDismissed => f.write_str("loading dismissed"),
        }
    }
}

/// Keeps every notification in order; clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    log: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.log
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Alert messages only.
    pub fn alerts(&self) -> Vec<String> {
        self.notifications()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Alert { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }

    /// True when the last loading indicator shown has been dismissed.
    pub fn loading_dismissed(&self) -> bool {
        self.notifications()
            .iter()
            .rev()
            .find(|n| matches!(n, Notification::Loading(_) | Notification::LoadingDismissed))
            .is_none_or(|n| *n == Notification::LoadingDismissed)
    }

    fn push(&self, notification: Notification) {
        self.log
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(notification);
    }
}

impl Notifier for RecordingNotifier {
    fn toast(&self, message: &str, position: ToastPosition, severity: ToastSeverity, duration_secs: u32) {
        self.push(Notification::Toast {
            message: message.to_string(),
            position,
            severity,
            duration_secs,
        });
    }

    fn alert(&self, title: &str, message: &str) {
        self.push(Notification::Alert {
            title: title.to_string(),
            message: message.to_string(),
        });
    }

    fn show_loading(&self, message: &str) {
        self.push(Notification::Loading(message.to_string()));
    }

    fn dismiss_loading(&self) {
        self.push(Notification::LoadingDismissed);
    }
}
