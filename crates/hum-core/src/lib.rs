pub mod analysis;
pub mod artifact;
pub mod audio;
pub mod config;
pub mod error;
pub mod http;
pub mod playback;
pub mod resample;
pub mod session;
pub mod verbose;

pub use analysis::{AnalysisBackend, AnalysisResponse, HttpAnalysisClient, PitchTrack};
pub use artifact::ArtifactStore;
pub use audio::{AudioDeviceInfo, CpalCapture, list_input_devices};
pub use config::AnalysisConfig;
pub use error::SessionError;
pub use playback::RodioPlayback;
pub use session::{
    AnalysisOutcome, CaptureBackend, CaptureHandle, PlaybackBackend, PlaybackHandle,
    RecordingSession, SessionEvent, SessionState,
};
pub use verbose::set_verbose;
