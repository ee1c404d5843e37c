//! User-facing notices
//!
//! Failures the user must see (a denied location permission, a catalog that
//! would not load) are raised as notices on the event bus; presentation of
//! the notice is the host application's concern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How intrusively the host should present a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// Informational, may be shown passively
    Info,
    /// Degraded state the user should know about
    Warning,
    /// The requested action failed outright and cannot proceed
    Blocking,
}

/// A message destined for the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Warning, message)
    }

    pub fn blocking(message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Blocking, message)
    }

    fn with_severity(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            raised_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_constructors_set_severity() {
        assert_eq!(Notice::info("ok").severity, Severity::Info);
        assert_eq!(Notice::warning("hm").severity, Severity::Warning);
        assert_eq!(Notice::blocking("no").severity, Severity::Blocking);
    }
}
