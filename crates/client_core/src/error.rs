use shared::error::ApiError;
use thiserror::Error;

use crate::lock::LockCategory;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("{}", .error.message)]
    Api { status: u16, error: ApiError },
    #[error("{0}")]
    Network(String),
    #[error("invalid server response: {0}")]
    Decode(String),
    #[error("invalid request url: {0}")]
    Url(String),
}

impl TransportError {
    /// Human-readable text shown to the user for this failure.
    pub fn message(&self) -> String {
        match self {
            Self::Api { error, .. } => error.message.clone(),
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Decode(value.to_string())
        } else {
            Self::Network(value.to_string())
        }
    }
}

impl From<url::ParseError> for TransportError {
    fn from(value: url::ParseError) -> Self {
        Self::Url(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("precondition failed: {0}")]
    Precondition(String),
    #[error("{} operation already in progress", .0.name())]
    Busy(LockCategory),
    #[error("unexpected payload: {0}")]
    Decode(String),
}

impl OrchestratorError {
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// Text for the error notification; transport messages pass through verbatim.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(err) => err.message(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for OrchestratorError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

pub type Result<T, E = OrchestratorError> = std::result::Result<T, E>;
