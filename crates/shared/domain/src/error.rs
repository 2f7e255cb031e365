//! Domain-level errors.
//!
//! Every data-access failure surfaces as a [`DomainError`]: a message, a
//! closed classification ([`ErrorKind`]), an HTTP-style status, an optional
//! description, and the source location and backtrace captured where it was
//! constructed. Errors are plain values; persisting them is the job of a
//! separate log sink.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::status;
use crate::run_mode::RunMode;

/// Failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Input failed a field invariant before reaching the store
    #[serde(rename = "Validation Error")]
    Validation,

    /// Requested identifier has no live entity
    #[serde(rename = "Not Found")]
    NotFound,

    /// Store call rejected or failed for any other reason
    #[serde(rename = "Database Error")]
    Database,

    /// Credential lookup failed
    #[serde(rename = "Authentication Error")]
    Authentication,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "Validation Error",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::Database => "Database Error",
            ErrorKind::Authentication => "Authentication Error",
        }
    }

    /// Status used when the constructor does not override it.
    pub fn default_status(self) -> u16 {
        match self {
            ErrorKind::Validation => status::BAD_REQUEST,
            ErrorKind::NotFound => status::NOT_FOUND,
            ErrorKind::Database => status::INTERNAL_SERVER_ERROR,
            ErrorKind::Authentication => status::UNAUTHORIZED,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified domain failure.
#[derive(Error, Debug, Clone)]
#[error("{kind}: {message}")]
pub struct DomainError {
    kind: ErrorKind,
    message: String,
    status: u16,
    description: Option<String>,
    field: Option<String>,
    location: &'static Location<'static>,
    trace: Arc<Backtrace>,
}

impl DomainError {
    /// Create an error of the given kind with its default status.
    #[track_caller]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: kind.default_status(),
            description: None,
            field: None,
            location: Location::caller(),
            trace: Arc::new(Backtrace::capture()),
        }
    }

    /// Create a validation error
    #[track_caller]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, msg)
    }

    /// Create a validation error naming the offending field
    #[track_caller]
    pub fn invalid_field(field: impl Into<String>, msg: impl Into<String>) -> Self {
        let field = field.into();
        let mut error = Self::new(ErrorKind::Validation, format!("{}: {}", field, msg.into()));
        error.field = Some(field);
        error
    }

    /// Create a not found error
    #[track_caller]
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }

    /// Create a database error
    #[track_caller]
    pub fn database(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, msg)
    }

    /// Create an authentication error
    #[track_caller]
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, msg)
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Field that failed validation, if any
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Source location where the error was constructed
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Externally visible form of this error.
    ///
    /// Development reports carry a source reference and a stack; production
    /// reports carry neither.
    pub fn report(&self, mode: RunMode) -> ErrorReport {
        let base = self
            .description
            .clone()
            .unwrap_or_else(|| self.message.clone());

        let (description, stack) = match mode {
            RunMode::Production => (base, None),
            RunMode::Development => {
                let stack = match self.trace.status() {
                    BacktraceStatus::Captured => self.trace.to_string(),
                    _ => format!("at {}", self.location),
                };
                (format!("{}-Reference:{}", base, self.location), Some(stack))
            }
        };

        ErrorReport {
            message: self.message.clone(),
            kind: self.kind,
            status: self.status,
            description: Some(description),
            stack,
        }
    }
}

/// Serializable shape handed to log consumers and outer boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Result type alias for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
