//! Outermost error boundary.
//!
//! Whatever catches a [`DomainError`] last hands it to [`handle_uncaught`],
//! which logs it exactly once and turns it into a generic failure body.

use serde::{Deserialize, Serialize};

use domain::{DomainError, ErrorKind, RunMode};

use crate::error_log::ErrorLog;

/// Failure body returned to callers of the outer surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureResponse {
    pub status: u16,
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub message: String,
    /// Stack detail, development only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Log an uncaught error once and convert it to a [`FailureResponse`].
pub async fn handle_uncaught(error: DomainError, log: &dyn ErrorLog, mode: RunMode) -> FailureResponse {
    tracing::error!(kind = %error.kind(), status = error.status(), "Unhandled error: {}", error.message());
    log.record(&error).await;

    let report = error.report(mode);
    FailureResponse {
        status: report.status,
        kind: report.kind,
        message: report.message,
        details: report.stack,
    }
}
