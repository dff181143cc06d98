//! Clip encoding for the upload pipeline.
//!
//! The capture format contract is 16-bit PCM WAV; builds for platforms
//! without a usable PCM pipeline fall back to an embedded MP3 encoder and
//! declare the same upload contract.

#[cfg(feature = "pcm-encoder")]
mod pcm;

#[cfg(feature = "lossy-fallback")]
mod lossy;

use crate::error::SessionError;

/// Trait for encoding finalized capture samples into the uploaded clip.
pub trait AudioEncoder: Send + Sync {
    /// Encode mono f32 PCM samples at the given rate.
    fn encode_samples(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, SessionError>;

    /// File extension of the produced container.
    fn file_extension(&self) -> &'static str;
}

/// Create the encoder for this build.
///
/// Priority:
/// 1. PCM WAV encoder (if `pcm-encoder` feature enabled)
/// 2. Lossy encoder (if `lossy-fallback` feature enabled)
/// 3. Panic if no encoder available
pub fn create_encoder() -> Box<dyn AudioEncoder> {
    #[cfg(feature = "pcm-encoder")]
    return Box::new(pcm::PcmWavEncoder::new());

    #[cfg(all(feature = "lossy-fallback", not(feature = "pcm-encoder")))]
    return Box::new(lossy::LossyEncoder::new());

    #[cfg(not(any(feature = "pcm-encoder", feature = "lossy-fallback")))]
    panic!("No audio encoder available. Enable either 'pcm-encoder' or 'lossy-fallback'.");
}
