//! Embedded LAME encoder for builds without the PCM pipeline.
//!
//! Produces MP3 at a fixed bitrate. The upload contract is declared
//! unchanged; the analysis service decodes by content.

use mp3lame_encoder::{Builder, FlushNoGap, MonoPcm};

use super::AudioEncoder;
use crate::error::SessionError;

pub struct LossyEncoder;

impl LossyEncoder {
    pub fn new() -> Self {
        Self
    }

    fn build_encoder(&self, sample_rate: u32) -> Result<mp3lame_encoder::Encoder, SessionError> {
        let mut builder = Builder::new()
            .ok_or_else(|| SessionError::CaptureFailed("failed to create LAME builder".into()))?;

        builder
            .set_num_channels(1)
            .map_err(|e| SessionError::CaptureFailed(format!("failed to set channels: {e:?}")))?;
        builder
            .set_sample_rate(sample_rate)
            .map_err(|e| SessionError::CaptureFailed(format!("failed to set sample rate: {e:?}")))?;
        builder
            .set_brate(mp3lame_encoder::Bitrate::Kbps128)
            .map_err(|e| SessionError::CaptureFailed(format!("failed to set bitrate: {e:?}")))?;
        builder
            .set_quality(mp3lame_encoder::Quality::Best)
            .map_err(|e| SessionError::CaptureFailed(format!("failed to set quality: {e:?}")))?;

        builder
            .build()
            .map_err(|e| SessionError::CaptureFailed(format!("failed to initialize LAME: {e:?}")))
    }
}

impl Default for LossyEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEncoder for LossyEncoder {
    fn encode_samples(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, SessionError> {
        let pcm: Vec<i16> = samples
            .iter()
            .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
            .collect();

        let mut encoder = self.build_encoder(sample_rate)?;

        let mut mp3_data = Vec::new();
        mp3_data.reserve(mp3lame_encoder::max_required_buffer_size(pcm.len()));

        let encoded_size = encoder
            .encode(MonoPcm(&pcm), mp3_data.spare_capacity_mut())
            .map_err(|e| SessionError::CaptureFailed(format!("failed to encode MP3: {e:?}")))?;
        // SAFETY: encode guarantees exactly encoded_size bytes of the spare
        // capacity are initialized on success.
        unsafe {
            mp3_data.set_len(encoded_size);
        }

        let flush_size = encoder
            .flush::<FlushNoGap>(mp3_data.spare_capacity_mut())
            .map_err(|e| SessionError::CaptureFailed(format!("failed to flush MP3: {e:?}")))?;
        // SAFETY: flush guarantees flush_size additional initialized bytes.
        unsafe {
            mp3_data.set_len(mp3_data.len() + flush_size);
        }

        Ok(mp3_data)
    }

    fn file_extension(&self) -> &'static str {
        "mp3"
    }
}
