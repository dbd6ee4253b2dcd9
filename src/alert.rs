//! User-visible notices.
//!
//! An append-only list with no knowledge of cribbage. Per-session: the
//! session manager owns one, every component that can fail appends to it by
//! reference, and the UI drains it. Not a process-wide singleton.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How loud a notice should be.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        write!(f, "{repr}")
    }
}

/// A single notice for the UI to show.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Alert {
    pub message: String,
    pub severity: Severity,
}

/// Append-only sequence of notices. Expiry is the UI layer's concern.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct AlertBus {
    alerts: Vec<Alert>,
}

impl AlertBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>, severity: Severity) {
        self.alerts.push(Alert {
            message: message.into(),
            severity,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&Alert> {
        self.alerts.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Takes every accumulated notice, leaving the bus empty.
    pub fn drain(&mut self) -> Vec<Alert> {
        std::mem::take(&mut self.alerts)
    }
}
