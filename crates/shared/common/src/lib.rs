//! Common utilities shared across services.
//!
//! This crate provides:
//! - Configuration structures
//! - Response envelopes and pagination parameters
//! - The persistent error log and the outermost-boundary error handler

pub mod boundary;
pub mod config;
pub mod error_log;
pub mod types;

pub use boundary::{handle_uncaught, FailureResponse};
pub use config::*;
pub use error_log::{ErrorLog, FileErrorLog, LogRecord};
pub use types::{PaginationParams, Paginated, ResponseData};
