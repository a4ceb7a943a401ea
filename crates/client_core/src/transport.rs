//! HTTP seam between the controller and the prediction endpoint.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client};
use shared::{error::ErrorBody, protocol::PredictionResponse};
use tracing::debug;
use url::Url;

use crate::{config::ClientSettings, error::SubmitError, payload::FormPayload};

/// Status and raw body of a completed exchange with the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait PredictionEndpoint: Send + Sync {
    /// Sends one payload. Only transport failures are errors here; any
    /// status the server answers with comes back as a `RawResponse`.
    async fn post(&self, payload: FormPayload) -> Result<RawResponse, SubmitError>;
}

pub struct HttpPredictionEndpoint {
    http: Client,
    url: Url,
}

impl HttpPredictionEndpoint {
    pub fn new(settings: &ClientSettings) -> Result<Self> {
        let url = settings.endpoint_url()?;
        let mut builder = Client::builder();
        if let Some(secs) = settings.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .context("failed to build HTTP client for prediction endpoint")?;
        Ok(Self { http, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl PredictionEndpoint for HttpPredictionEndpoint {
    async fn post(&self, payload: FormPayload) -> Result<RawResponse, SubmitError> {
        debug!(
            url = %self.url,
            encoding = %payload.encoding(),
            fields = payload.field_count(),
            "posting prediction payload"
        );
        let request = self.http.post(self.url.clone());
        let request = match payload {
            FormPayload::Multipart(fields) => {
                request.multipart(FormPayload::into_multipart(fields))
            }
            FormPayload::Json(map) => request
                .header(header::CONTENT_TYPE, "application/json")
                .json(&map),
        };

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }
}

/// Maps a raw response onto the prediction text to display.
pub fn interpret_response(raw: &RawResponse) -> Result<String, SubmitError> {
    if !raw.is_success() {
        let server_error = serde_json::from_str::<ErrorBody>(&raw.body)
            .ok()
            .map(|body| body.error)
            .filter(|message| !message.trim().is_empty());
        return Err(match server_error {
            Some(message) => SubmitError::Http {
                status: raw.status,
                message,
            },
            None => SubmitError::http_status(raw.status),
        });
    }

    let response = PredictionResponse::parse(&raw.body)?;
    if let Some(prediction) = response.prediction_text() {
        return Ok(prediction);
    }
    Err(SubmitError::Rejected(
        response
            .error
            .unwrap_or_else(|| "Unknown error occurred".to_string()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_with_prediction_yields_value_text() {
        let raw = RawResponse::new(200, r#"{"prediction": 87.5}"#);
        assert_eq!(interpret_response(&raw).expect("prediction"), "87.5");
    }

    #[test]
    fn prediction_wins_over_error_on_success() {
        let raw = RawResponse::new(200, r#"{"prediction": 12, "error": "ignored"}"#);
        assert_eq!(interpret_response(&raw).expect("prediction"), "12");
    }

    #[test]
    fn error_status_prefers_server_message() {
        let raw = RawResponse::new(500, r#"{"error": "model unavailable"}"#);
        let err = interpret_response(&raw).expect_err("http error");
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.display_text(), "Error: model unavailable");
    }

    #[test]
    fn error_status_with_garbage_body_mentions_status_code() {
        let raw = RawResponse::new(500, "Internal Server Error");
        let err = interpret_response(&raw).expect_err("http error");
        assert_eq!(err.display_text(), "Error: HTTP error! status: 500");
    }

    #[test]
    fn success_without_prediction_uses_error_or_fallback() {
        let with_error = RawResponse::new(200, r#"{"error": "Database error"}"#);
        assert_eq!(
            interpret_response(&with_error)
                .expect_err("rejected")
                .display_text(),
            "Error: Database error"
        );

        let empty = RawResponse::new(200, "{}");
        assert!(interpret_response(&empty)
            .expect_err("rejected")
            .to_string()
            .contains("Unknown error occurred"));
    }

    #[test]
    fn success_with_malformed_body_is_payload_error() {
        let raw = RawResponse::new(200, "not json");
        assert!(matches!(
            interpret_response(&raw),
            Err(SubmitError::Payload(_))
        ));
    }
}
