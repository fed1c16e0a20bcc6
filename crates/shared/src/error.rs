use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by every endpoint of the reporting server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct ApiError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i64>,
    pub message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error_code: None,
            message: message.into(),
        }
    }

    pub fn with_code(error_code: i64, message: impl Into<String>) -> Self {
        Self {
            error_code: Some(error_code),
            message: message.into(),
        }
    }
}
