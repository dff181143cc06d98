//! Recording-session state machine.
//!
//! A [`RecordingSession`] owns the lifecycle of a single recording: permission
//! acquisition, capture, stop/finalize, upload, artifact persistence, and
//! playback. It is the single source of truth for UI-observable state; every
//! operation checks a transition guard first and every failure path leaves the
//! session in a valid enumerated state with `last_error` set.
//!
//! The capture, playback, and upload collaborators sit behind traits so the
//! machine can be driven in tests without hardware or a network.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tokio::sync::mpsc::UnboundedSender;

use crate::analysis::{AnalysisBackend, AnalysisResponse, PitchTrack};
use crate::artifact::ArtifactStore;
use crate::error::SessionError;

/// Observable state of the recording session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionState {
    Idle,
    RequestingPermission,
    Recording,
    Stopped,
    Uploading,
    Ready,
    Playing,
    Failed,
}

impl SessionState {
    /// Get the string identifier for this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::RequestingPermission => "requesting-permission",
            SessionState::Recording => "recording",
            SessionState::Stopped => "stopped",
            SessionState::Uploading => "uploading",
            SessionState::Ready => "ready",
            SessionState::Playing => "playing",
            SessionState::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Events delivered to the driving loop from backend threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A sound finished playing naturally. The generation identifies which
    /// playback it belongs to; stale events are ignored by the session.
    PlaybackFinished { generation: u64 },
}

/// Fired exactly once by a playback backend when the sound drains naturally.
pub type CompletionNotifier = Box<dyn FnOnce() + Send + 'static>;

/// Platform capture seam.
#[async_trait]
pub trait CaptureBackend: Send {
    /// Ask the platform for microphone access.
    async fn request_permission(&mut self) -> Result<(), SessionError>;

    /// Acquire the capture resource and start recording.
    async fn start(&mut self) -> Result<Box<dyn CaptureHandle>, SessionError>;
}

/// A live capture resource. At most one exists at any time.
#[async_trait]
pub trait CaptureHandle: Send {
    /// Stop the stream, encode the clip, and return the recorded file path.
    async fn finalize(self: Box<Self>) -> Result<PathBuf, SessionError>;

    /// Release the capture resource without producing a file.
    fn abort(self: Box<Self>);
}

/// Platform playback seam.
#[async_trait]
pub trait PlaybackBackend: Send {
    /// Load `source` and start playing it. `done` fires once if the sound
    /// finishes naturally; it must not fire after the handle is stopped.
    async fn play(
        &mut self,
        source: &Path,
        done: CompletionNotifier,
    ) -> Result<Box<dyn PlaybackHandle>, SessionError>;
}

/// A live sound resource. At most one exists at any time.
pub trait PlaybackHandle: Send {
    /// Stop playback and release the sound resource.
    fn stop(self: Box<Self>);
}

/// Result of a successful submission.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// Where the decoded MIDI landed, if the service returned one.
    pub artifact: Option<PathBuf>,

    /// The detected pitch track, for UI summaries.
    pub pitch: PitchTrack,
}

/// State machine for one capture/upload/playback lifecycle.
pub struct RecordingSession {
    state: SessionState,
    source_uri: Option<PathBuf>,
    last_error: Option<SessionError>,
    capture: Box<dyn CaptureBackend>,
    playback: Box<dyn PlaybackBackend>,
    analysis: Box<dyn AnalysisBackend>,
    artifacts: ArtifactStore,
    capture_handle: Option<Box<dyn CaptureHandle>>,
    playback_handle: Option<Box<dyn PlaybackHandle>>,
    playback_generation: u64,
    events: UnboundedSender<SessionEvent>,
}

impl RecordingSession {
    pub fn new(
        capture: Box<dyn CaptureBackend>,
        playback: Box<dyn PlaybackBackend>,
        analysis: Box<dyn AnalysisBackend>,
        artifacts: ArtifactStore,
        events: UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            state: SessionState::Idle,
            source_uri: None,
            last_error: None,
            capture,
            playback,
            analysis,
            artifacts,
            capture_handle: None,
            playback_handle: None,
            playback_generation: 0,
            events,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Path of the recorded clip, set by a successful stop.
    pub fn source_uri(&self) -> Option<&Path> {
        self.source_uri.as_deref()
    }

    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    /// Whether the record control should be enabled.
    pub fn can_record(&self) -> bool {
        self.state != SessionState::Uploading
    }

    /// Whether the playback control should be enabled.
    pub fn can_play(&self) -> bool {
        !matches!(
            self.state,
            SessionState::Recording | SessionState::Uploading
        )
    }

    /// Begin a new recording attempt.
    ///
    /// Releases any live sound first (never two audio resources of a kind),
    /// clears the previous error, and replaces the previous clip. Permission
    /// denial and capture failure both return the session to idle.
    pub async fn start_recording(&mut self) -> Result<(), SessionError> {
        if matches!(
            self.state,
            SessionState::Recording | SessionState::Uploading
        ) {
            return Err(self.reject("start recording"));
        }

        self.release_playback();
        self.last_error = None;
        self.state = SessionState::RequestingPermission;

        if let Err(err) = self.capture.request_permission().await {
            self.state = SessionState::Idle;
            return Err(self.fail(err));
        }

        // Single recording slot: this attempt replaces the previous clip.
        if let Some(prev) = self.source_uri.take() {
            let _ = std::fs::remove_file(&prev);
        }

        match self.capture.start().await {
            Ok(handle) => {
                self.capture_handle = Some(handle);
                self.state = SessionState::Recording;
                Ok(())
            }
            Err(err) => {
                self.state = SessionState::Idle;
                Err(self.fail(err))
            }
        }
    }

    /// Finalize the live capture and remember where the clip landed.
    pub async fn stop_recording(&mut self) -> Result<PathBuf, SessionError> {
        if self.state != SessionState::Recording {
            return Err(self.reject("stop recording"));
        }

        let handle = match self.capture_handle.take() {
            Some(handle) => handle,
            None => {
                self.state = SessionState::Idle;
                return Err(self.fail(SessionError::CaptureFailed(
                    "no live capture resource".to_string(),
                )));
            }
        };

        match handle.finalize().await {
            Ok(path) => {
                self.source_uri = Some(path.clone());
                self.state = SessionState::Stopped;
                Ok(path)
            }
            Err(err) => {
                self.state = SessionState::Idle;
                Err(self.fail(err))
            }
        }
    }

    /// Upload the finalized clip and apply the analysis result.
    ///
    /// Safe to call again with the same clip: the network call repeats and
    /// the stored artifact is overwritten.
    pub async fn submit(&mut self) -> Result<AnalysisOutcome, SessionError> {
        if matches!(
            self.state,
            SessionState::Recording | SessionState::Playing | SessionState::Uploading
        ) {
            return Err(self.reject("upload"));
        }

        let source = match &self.source_uri {
            Some(path) if !path.as_os_str().is_empty() => path.clone(),
            _ => return Err(self.reject("upload")),
        };

        self.last_error = None;
        self.state = SessionState::Uploading;

        let response = match self.analysis.analyze(&source).await {
            Ok(response) => response,
            Err(err) => {
                self.state = SessionState::Failed;
                return Err(self.fail(err));
            }
        };

        self.apply_response(response)
    }

    /// Map a decoded response onto the session.
    fn apply_response(
        &mut self,
        response: AnalysisResponse,
    ) -> Result<AnalysisOutcome, SessionError> {
        let AnalysisResponse {
            midi,
            error,
            frequencies,
            confidence,
            times,
        } = response;

        // An explicit error payload rejects the clip but the local recording
        // stays usable for playback and resubmission.
        if let Some(message) = error.filter(|m| !m.is_empty()) {
            self.state = SessionState::Stopped;
            return Err(self.fail(SessionError::AnalysisFailed(message)));
        }

        let mut artifact = None;
        if let Some(encoded) = midi {
            let bytes = match BASE64.decode(encoded.as_bytes()) {
                Ok(bytes) => bytes,
                Err(err) => {
                    self.state = SessionState::Stopped;
                    return Err(self.fail(SessionError::AnalysisFailed(format!(
                        "midi payload is not valid base64: {err}"
                    ))));
                }
            };

            match self.artifacts.write(&bytes) {
                Ok(path) => artifact = Some(path),
                Err(err) => {
                    self.state = SessionState::Failed;
                    return Err(self.fail(err));
                }
            }
        }

        // A response with neither midi nor error is an empty success.
        self.state = SessionState::Ready;
        Ok(AnalysisOutcome {
            artifact,
            pitch: PitchTrack {
                frequencies,
                confidence,
                times,
            },
        })
    }

    /// Play the recorded clip, replacing any sound already playing.
    pub async fn start_playback(&mut self) -> Result<(), SessionError> {
        if matches!(
            self.state,
            SessionState::Recording | SessionState::Uploading
        ) {
            return Err(self.reject("play"));
        }

        let source = match &self.source_uri {
            Some(path) if !path.as_os_str().is_empty() => path.clone(),
            _ => return Err(self.reject("play")),
        };

        self.release_playback();
        self.playback_generation += 1;
        let generation = self.playback_generation;
        let events = self.events.clone();
        let done: CompletionNotifier = Box::new(move || {
            let _ = events.send(SessionEvent::PlaybackFinished { generation });
        });

        match self.playback.play(&source, done).await {
            Ok(handle) => {
                self.playback_handle = Some(handle);
                self.state = SessionState::Playing;
                Ok(())
            }
            Err(err) => {
                self.state = SessionState::Stopped;
                Err(self.fail(err))
            }
        }
    }

    /// Stop the live sound.
    pub fn stop_playback(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Playing {
            return Err(self.reject("stop playback"));
        }
        self.release_playback();
        self.state = SessionState::Stopped;
        Ok(())
    }

    /// Apply a natural-completion edge from the playback backend.
    ///
    /// Only the generation of the currently live sound counts; completions
    /// from replaced or already-stopped sounds are ignored.
    pub fn notify_playback_finished(&mut self, generation: u64) {
        if self.state != SessionState::Playing || generation != self.playback_generation {
            return;
        }
        self.release_playback();
        self.state = SessionState::Stopped;
    }

    /// Teardown obligation for the owning UI: release every live resource.
    ///
    /// A live capture is aborted (resource released, no file produced); a
    /// live sound is stopped.
    pub fn dispose(&mut self) {
        self.release_playback();
        if let Some(handle) = self.capture_handle.take() {
            handle.abort();
        }
        self.state = SessionState::Idle;
    }

    fn release_playback(&mut self) {
        if let Some(handle) = self.playback_handle.take() {
            handle.stop();
        }
    }

    fn reject(&mut self, op: &'static str) -> SessionError {
        let err = SessionError::InvalidState {
            op,
            state: self.state,
        };
        self.last_error = Some(err.clone());
        err
    }

    fn fail(&mut self, err: SessionError) -> SessionError {
        self.last_error = Some(err.clone());
        err
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        self.dispose();
    }
}
