use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;

/// Wire encoding of the form payload sent to `/predict`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadEncoding {
    /// `multipart/form-data` with raw field values.
    #[default]
    Multipart,
    /// JSON object; `name` stays text, every other field becomes a number.
    Json,
}

impl FromStr for PayloadEncoding {
    type Err = ProtocolError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "multipart" | "form" | "multipart/form-data" => Ok(Self::Multipart),
            "json" | "application/json" => Ok(Self::Json),
            other => Err(ProtocolError::UnknownEncoding(other.to_string())),
        }
    }
}

impl fmt::Display for PayloadEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Multipart => f.write_str("multipart"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Body of a `/predict` response. Either field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PredictionResponse {
    pub fn parse(body: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(body).map_err(|e| ProtocolError::MalformedBody(e.to_string()))
    }

    /// Prediction rendered for display; `null` counts as absent.
    pub fn prediction_text(&self) -> Option<String> {
        match self.prediction.as_ref()? {
            Value::Null => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }
}
