use shared::{domain::ElementId, error::ProtocolError};
use thiserror::Error;

/// Failures of a single submission. Each one is rendered as display text by
/// the controller and never escapes the submit handler.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("could not reach the prediction service: {0}")]
    Network(String),
    #[error("{message}")]
    Http { status: u16, message: String },
    #[error("unexpected response from the prediction service: {0}")]
    Payload(String),
    /// 2xx answer that carried no prediction.
    #[error("{0}")]
    Rejected(String),
    #[error("form '{0}' is not available on the page")]
    MissingForm(ElementId),
}

impl SubmitError {
    /// Message used when the endpoint gives no usable `error` text.
    pub fn http_status(status: u16) -> Self {
        Self::Http {
            status,
            message: format!("HTTP error! status: {status}"),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text written to the page for this failure.
    pub fn display_text(&self) -> String {
        format!("Error: {self}")
    }
}

impl From<reqwest::Error> for SubmitError {
    fn from(value: reqwest::Error) -> Self {
        Self::Network(value.to_string())
    }
}

impl From<ProtocolError> for SubmitError {
    fn from(value: ProtocolError) -> Self {
        Self::Payload(value.to_string())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("page element '{0}' was not found")]
pub struct MissingElement(pub ElementId);
