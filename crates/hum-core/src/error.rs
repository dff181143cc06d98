//! Error taxonomy for the recording session.
//!
//! Every operation boundary catches its failure, records it in the session's
//! `last_error`, and leaves the session in a valid enumerated state. Nothing
//! is retried automatically.

use thiserror::Error;

use crate::session::SessionState;

/// Failures surfaced by session operations and the upload pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// Microphone access was not granted by the platform.
    #[error("microphone permission denied")]
    PermissionDenied,

    /// The operation is not legal in the current state; nothing was changed.
    #[error("cannot {op} while {state}")]
    InvalidState {
        op: &'static str,
        state: SessionState,
    },

    /// Starting or finalizing the capture resource failed at the platform layer.
    #[error("capture failed: {0}")]
    CaptureFailed(String),

    /// Network/transport failure or a non-success HTTP status from the
    /// analysis service. The local recording remains intact.
    #[error("upload failed ({}): {message}", status_label(.status))]
    UploadFailed {
        status: Option<u16>,
        message: String,
    },

    /// The analysis service returned an explicit error payload.
    #[error("analysis rejected: {0}")]
    AnalysisFailed(String),

    /// Loading or starting the sound resource failed.
    #[error("playback failed: {0}")]
    PlaybackFailed(String),

    /// The decoded artifact could not be written to local storage.
    #[error("failed to store artifact: {0}")]
    StorageWriteFailed(String),
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("HTTP {code}"),
        None => "transport".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_failed_display_includes_status() {
        let err = SessionError::UploadFailed {
            status: Some(500),
            message: "Internal Server Error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "upload failed (HTTP 500): Internal Server Error"
        );

        let err = SessionError::UploadFailed {
            status: None,
            message: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "upload failed (transport): connection refused");
    }

    #[test]
    fn invalid_state_names_the_operation() {
        let err = SessionError::InvalidState {
            op: "stop recording",
            state: SessionState::Idle,
        };
        assert_eq!(err.to_string(), "cannot stop recording while idle");
    }
}
