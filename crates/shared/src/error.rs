use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Validation,
    Conflict,
    Unavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("discovery packet is not valid json: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unexpected discovery message tag '{0}'")]
    UnexpectedMessage(String),
    #[error("discovery key {0} is not a version 4 uuid")]
    KeyVersion(uuid::Uuid),
}
