//! HTTP client for the remote analysis service.
//!
//! One POST per submission, no retry. A non-success status is a hard failure
//! regardless of what the body says; the body is only decoded as a response
//! on 2xx.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use super::{AnalysisBackend, AnalysisResponse, UPLOAD_FIELD, UPLOAD_FILENAME, UPLOAD_MIME};
use crate::config::AnalysisConfig;
use crate::error::SessionError;
use crate::http::shared_client;

/// Client bound to a configured analysis service.
pub struct HttpAnalysisClient {
    analyze_url: String,
    ready_url: String,
}

impl HttpAnalysisClient {
    /// Build a client from configuration, validating the base URL up front.
    pub fn new(config: &AnalysisConfig) -> Result<Self> {
        Ok(Self {
            analyze_url: config.analyze_url()?,
            ready_url: config.ready_url()?,
        })
    }

    /// Probe the service root. The reference backend answers
    /// `{"status": "ready"}` once its models are loaded.
    pub async fn check_ready(&self) -> Result<bool> {
        #[derive(Deserialize)]
        struct ReadyResponse {
            status: String,
        }

        let client = shared_client()?;
        let response = client
            .get(&self.ready_url)
            .send()
            .await
            .context("Failed to reach analysis service")?;

        if !response.status().is_success() {
            anyhow::bail!("Analysis service answered HTTP {}", response.status());
        }

        let ready: ReadyResponse = response
            .json()
            .await
            .context("Failed to parse readiness response")?;
        Ok(ready.status == "ready")
    }
}

#[async_trait]
impl AnalysisBackend for HttpAnalysisClient {
    async fn analyze(&self, source: &Path) -> Result<AnalysisResponse, SessionError> {
        let audio = tokio::fs::read(source).await.map_err(|e| {
            SessionError::UploadFailed {
                status: None,
                message: format!("failed to read {}: {e}", source.display()),
            }
        })?;

        crate::verbose!(
            "uploading {:.1} KB clip to {}",
            audio.len() as f64 / 1024.0,
            self.analyze_url
        );

        let part = reqwest::multipart::Part::bytes(audio)
            .file_name(UPLOAD_FILENAME)
            .mime_str(UPLOAD_MIME)
            .map_err(|e| SessionError::UploadFailed {
                status: None,
                message: format!("failed to build upload part: {e}"),
            })?;
        let form = reqwest::multipart::Form::new().part(UPLOAD_FIELD, part);

        let client = shared_client().map_err(|e| SessionError::UploadFailed {
            status: None,
            message: e.to_string(),
        })?;

        let response = client
            .post(&self.analyze_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SessionError::UploadFailed {
                status: None,
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        decode_response(status, &body)
    }
}

/// Map an HTTP status and body to a decoded response or an upload failure.
pub(crate) fn decode_response(
    status: StatusCode,
    body: &str,
) -> Result<AnalysisResponse, SessionError> {
    if !status.is_success() {
        // Hard failure; the body is carried as context, never parsed.
        return Err(SessionError::UploadFailed {
            status: Some(status.as_u16()),
            message: body.to_string(),
        });
    }

    serde_json::from_str(body).map_err(|e| SessionError::UploadFailed {
        status: Some(status.as_u16()),
        message: format!("response was not valid JSON: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_success_status_is_rejected_before_parsing() {
        let err = decode_response(StatusCode::INTERNAL_SERVER_ERROR, "not even json").unwrap_err();
        match err {
            SessionError::UploadFailed { status, message } => {
                assert_eq!(status, Some(500));
                assert_eq!(message, "not even json");
            }
            other => panic!("expected UploadFailed, got {other:?}"),
        }
    }

    #[test]
    fn success_body_decodes() {
        let response = decode_response(StatusCode::OK, r#"{"midi": "QUJD"}"#).unwrap();
        assert_eq!(response.midi.as_deref(), Some("QUJD"));
    }

    #[test]
    fn success_with_non_json_body_is_an_upload_failure() {
        let err = decode_response(StatusCode::OK, "<html>oops</html>").unwrap_err();
        match err {
            SessionError::UploadFailed { status, message } => {
                assert_eq!(status, Some(200));
                assert!(message.contains("not valid JSON"));
            }
            other => panic!("expected UploadFailed, got {other:?}"),
        }
    }
}
