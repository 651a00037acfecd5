//! Status module - lifecycle of a single document analysis
//!
//! ```text
//! Idle ──begin──▶ Processing ──complete──▶ Complete
//!   ▲                 │                       │
//!   │                fail                   reset
//!   │                 ▼                       │
//!   └────reset──── Error ◀────────────────────┘
//! ```
//!
//! A new analysis may begin from `Idle`, `Error` or `Complete`. `retry` is only
//! meaningful from `Error` and reuses the payload of the failed attempt.

use crate::{ExtractedMedicalData, ImagePayload};
use thiserror::Error;

/// Stage of the analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AppStatus {
    /// Waiting for a document
    #[default]
    Idle,

    /// Extraction request in flight
    Processing,

    /// Extraction succeeded, data available
    Complete,

    /// Extraction failed, error message available
    Error,
}

impl AppStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            AppStatus::Idle => "IDLE",
            AppStatus::Processing => "PROCESSING",
            AppStatus::Complete => "COMPLETE",
            AppStatus::Error => "ERROR",
        }
    }

    /// Whether a new document may be submitted
    pub fn accepts_upload(&self) -> bool {
        !matches!(self, AppStatus::Processing)
    }
}

impl std::fmt::Display for AppStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected status transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatusError {
    /// Transition not allowed from the current status
    #[error("cannot {action} while {from}")]
    InvalidTransition {
        /// Status the session was in
        from: AppStatus,
        /// Attempted action
        action: &'static str,
    },

    /// Retry requested but no failed payload is held
    #[error("nothing to retry")]
    NothingToRetry,
}

/// One analysis session: current status plus the data or error it produced
#[derive(Debug, Clone, Default)]
pub struct Session {
    status: AppStatus,
    data: Option<ExtractedMedicalData>,
    error: Option<String>,
    payload: Option<ImagePayload>,
}

impl Session {
    /// Create an idle session
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status
    pub fn status(&self) -> AppStatus {
        self.status
    }

    /// Data from the last successful extraction
    pub fn data(&self) -> Option<&ExtractedMedicalData> {
        self.data.as_ref()
    }

    /// Message from the last failed extraction
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Payload of the current or last attempt
    pub fn payload(&self) -> Option<&ImagePayload> {
        self.payload.as_ref()
    }

    /// Start processing a new document
    pub fn begin(&mut self, payload: ImagePayload) -> Result<(), StatusError> {
        if !self.status.accepts_upload() {
            return Err(StatusError::InvalidTransition {
                from: self.status,
                action: "begin",
            });
        }
        self.status = AppStatus::Processing;
        self.data = None;
        self.error = None;
        self.payload = Some(payload);
        Ok(())
    }

    /// Record a successful extraction
    pub fn complete(&mut self, data: ExtractedMedicalData) -> Result<(), StatusError> {
        self.expect_processing("complete")?;
        self.status = AppStatus::Complete;
        self.data = Some(data);
        Ok(())
    }

    /// Record a failed extraction
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), StatusError> {
        self.expect_processing("fail")?;
        self.status = AppStatus::Error;
        self.error = Some(message.into());
        Ok(())
    }

    /// Record a failure that happened before any request was made
    ///
    /// Used when the document or credentials are rejected up front.
    pub fn reject(&mut self, message: impl Into<String>) -> Result<(), StatusError> {
        if self.status == AppStatus::Processing {
            return Err(StatusError::InvalidTransition {
                from: self.status,
                action: "reject",
            });
        }
        self.status = AppStatus::Error;
        self.data = None;
        self.error = Some(message.into());
        self.payload = None;
        Ok(())
    }

    /// Payload to resubmit after a failure
    pub fn retry_payload(&self) -> Result<ImagePayload, StatusError> {
        if self.status != AppStatus::Error {
            return Err(StatusError::InvalidTransition {
                from: self.status,
                action: "retry",
            });
        }
        self.payload.clone().ok_or(StatusError::NothingToRetry)
    }

    /// Return to idle, dropping data and error
    pub fn reset(&mut self) {
        self.status = AppStatus::Idle;
        self.data = None;
        self.error = None;
        self.payload = None;
    }

    fn expect_processing(&self, action: &'static str) -> Result<(), StatusError> {
        if self.status != AppStatus::Processing {
            return Err(StatusError::InvalidTransition {
                from: self.status,
                action,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ImagePayload {
        ImagePayload::new("image/png", "AAAA", 3).with_source("scan.png")
    }

    #[test]
    fn test_happy_path() {
        let mut session = Session::new();
        assert_eq!(session.status(), AppStatus::Idle);

        session.begin(payload()).unwrap();
        assert_eq!(session.status(), AppStatus::Processing);

        let data = ExtractedMedicalData {
            diagnosis: Some("Flu".to_string()),
            ..Default::default()
        };
        session.complete(data.clone()).unwrap();
        assert_eq!(session.status(), AppStatus::Complete);
        assert_eq!(session.data(), Some(&data));
        assert!(session.error().is_none());
    }

    #[test]
    fn test_failure_then_retry() {
        let mut session = Session::new();
        session.begin(payload()).unwrap();
        session.fail("boom").unwrap();

        assert_eq!(session.status(), AppStatus::Error);
        assert_eq!(session.error(), Some("boom"));

        let retry = session.retry_payload().unwrap();
        assert_eq!(retry.label(), "scan.png");

        session.begin(retry).unwrap();
        assert!(session.error().is_none());
    }

    #[test]
    fn test_begin_clears_previous_results() {
        let mut session = Session::new();
        session.begin(payload()).unwrap();
        session.complete(ExtractedMedicalData::default()).unwrap();

        session.begin(payload()).unwrap();
        assert!(session.data().is_none());
    }

    #[test]
    fn test_invalid_transitions() {
        let mut session = Session::new();
        assert!(session.complete(ExtractedMedicalData::default()).is_err());
        assert!(session.fail("x").is_err());
        assert!(session.retry_payload().is_err());

        session.begin(payload()).unwrap();
        assert_eq!(
            session.begin(payload()),
            Err(StatusError::InvalidTransition {
                from: AppStatus::Processing,
                action: "begin"
            })
        );
        assert!(session.reject("x").is_err());
    }

    #[test]
    fn test_reject_without_payload_cannot_retry() {
        let mut session = Session::new();
        session.reject("API Key is missing.").unwrap();
        assert_eq!(session.status(), AppStatus::Error);
        assert_eq!(session.retry_payload(), Err(StatusError::NothingToRetry));
    }

    #[test]
    fn test_reset() {
        let mut session = Session::new();
        session.begin(payload()).unwrap();
        session.fail("boom").unwrap();
        session.reset();

        assert_eq!(session.status(), AppStatus::Idle);
        assert!(session.error().is_none());
        assert!(session.payload().is_none());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(AppStatus::Processing.to_string(), "PROCESSING");
        let err = StatusError::InvalidTransition {
            from: AppStatus::Idle,
            action: "retry",
        };
        assert_eq!(err.to_string(), "cannot retry while IDLE");
    }
}
