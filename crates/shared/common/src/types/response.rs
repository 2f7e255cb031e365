use serde::{Deserialize, Serialize};

use domain::status;

/// Standard response envelope: payload plus operation metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseData<T> {
    pub data: T,
    pub status: u16,
    pub message: String,
    /// Number of documents written by the operation, when it wrote any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents_modified: Option<u64>,
}

impl<T> ResponseData<T> {
    pub fn new(data: T, status: u16, message: impl Into<String>) -> Self {
        Self {
            data,
            status,
            message: message.into(),
            documents_modified: None,
        }
    }

    /// `200 OK` envelope
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::new(data, status::OK, message)
    }

    /// `201 Created` envelope
    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::new(data, status::CREATED, message)
    }

    pub fn with_documents_modified(mut self, count: u64) -> Self {
        self.documents_modified = Some(count);
        self
    }
}
