//! Upload/response pipeline for the remote analysis service.
//!
//! The session hands a finalized recording to an [`AnalysisBackend`]; the
//! real implementation ([`client::HttpAnalysisClient`]) posts it as multipart
//! form data and decodes the JSON response. Tests substitute a fake backend
//! through the same trait, so the state machine never needs a network.

mod client;

pub use client::HttpAnalysisClient;

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::SessionError;

/// Field name of the uploaded file part.
pub const UPLOAD_FIELD: &str = "file";

/// Declared filename of the uploaded clip.
pub const UPLOAD_FILENAME: &str = "recording.wav";

/// Declared media type of the uploaded clip. A lossy-fallback build ships
/// compressed audio under the same declaration; the service decodes by
/// content, not by name.
pub const UPLOAD_MIME: &str = "audio/wav";

/// Confidence below which a pitch frame is considered unvoiced. Matches the
/// gate the analysis service applies when rendering MIDI.
pub const VOICED_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Decoded response body of the analyze endpoint.
///
/// `midi` and `error` are both optional; a response carrying neither is a
/// valid (if empty) success.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisResponse {
    /// Base64-encoded MIDI rendition of the detected melody.
    pub midi: Option<String>,

    /// Server-side failure description; non-empty means the clip was rejected.
    pub error: Option<String>,

    /// Detected pitch in Hz, one entry per analysis frame.
    #[serde(default)]
    pub frequencies: Vec<f32>,

    /// Voicing confidence per frame, 0.0 to 1.0.
    #[serde(default)]
    pub confidence: Vec<f32>,

    /// Frame timestamps in seconds.
    #[serde(default)]
    pub times: Vec<f32>,
}

/// The pitch track portion of a response, surfaced to the UI for summaries.
#[derive(Debug, Clone, Default)]
pub struct PitchTrack {
    pub frequencies: Vec<f32>,
    pub confidence: Vec<f32>,
    pub times: Vec<f32>,
}

impl PitchTrack {
    /// Number of analysis frames.
    pub fn frames(&self) -> usize {
        self.frequencies.len()
    }

    /// Number of frames the service considered voiced.
    pub fn voiced_frames(&self) -> usize {
        self.confidence
            .iter()
            .filter(|&&c| c > VOICED_CONFIDENCE_THRESHOLD)
            .count()
    }

    /// Duration covered by the track, in seconds.
    pub fn duration_secs(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }
}

/// Transport seam for the upload pipeline.
#[async_trait]
pub trait AnalysisBackend: Send {
    /// Upload the recorded clip at `source` and return the decoded response.
    ///
    /// Implementations must map transport failures and non-success HTTP
    /// statuses to [`SessionError::UploadFailed`] without attempting to parse
    /// the body as a response.
    async fn analyze(&self, source: &Path) -> Result<AnalysisResponse, SessionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_with_pitch_track_decodes() {
        let body = r#"{
            "frequencies": [220.0, 246.9, 261.6],
            "confidence": [0.9, 0.4, 0.8],
            "times": [0.0, 0.25, 0.5],
            "midi": "QUJD"
        }"#;
        let response: AnalysisResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.midi.as_deref(), Some("QUJD"));
        assert!(response.error.is_none());
        assert_eq!(response.frequencies.len(), 3);
    }

    #[test]
    fn bare_response_is_valid() {
        let response: AnalysisResponse = serde_json::from_str("{}").unwrap();
        assert!(response.midi.is_none());
        assert!(response.error.is_none());
        assert!(response.frequencies.is_empty());
    }

    #[test]
    fn voiced_frames_apply_the_confidence_gate() {
        let track = PitchTrack {
            frequencies: vec![220.0, 246.9, 261.6],
            confidence: vec![0.9, 0.4, 0.8],
            times: vec![0.0, 0.25, 0.5],
        };
        assert_eq!(track.frames(), 3);
        assert_eq!(track.voiced_frames(), 2);
        assert!((track.duration_secs() - 0.5).abs() < f32::EPSILON);
    }
}
