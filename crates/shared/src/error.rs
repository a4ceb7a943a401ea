use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by the prediction endpoint alongside non-2xx statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("response body is not valid JSON: {0}")]
    MalformedBody(String),
    #[error("unknown payload encoding '{0}'")]
    UnknownEncoding(String),
}
