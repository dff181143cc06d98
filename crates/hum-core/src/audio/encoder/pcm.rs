//! 16-bit PCM WAV encoder, the capture format contract.

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};

use super::AudioEncoder;
use crate::error::SessionError;

pub struct PcmWavEncoder {
    channels: u16,
}

impl PcmWavEncoder {
    /// Create a new WAV encoder. Always configured for mono output.
    pub fn new() -> Self {
        Self { channels: 1 }
    }
}

impl Default for PcmWavEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEncoder for PcmWavEncoder {
    fn encode_samples(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, SessionError> {
        let spec = WavSpec {
            channels: self.channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        let mut writer = WavWriter::new(&mut cursor, spec).map_err(|e| {
            SessionError::CaptureFailed(format!("failed to create WAV writer: {e}"))
        })?;

        for &sample in samples {
            let clamped = sample.clamp(-1.0, 1.0);
            writer
                .write_sample((clamped * i16::MAX as f32) as i16)
                .map_err(|e| SessionError::CaptureFailed(format!("failed to encode WAV: {e}")))?;
        }

        writer
            .finalize()
            .map_err(|e| SessionError::CaptureFailed(format!("failed to finalize WAV: {e}")))?;

        Ok(cursor.into_inner())
    }

    fn file_extension(&self) -> &'static str {
        "wav"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_clip_honors_the_format_contract() {
        let samples = vec![0.0f32; 1600];
        let encoder = PcmWavEncoder::new();
        let bytes = encoder.encode_samples(&samples, 16_000).unwrap();

        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16_000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, SampleFormat::Int);
        assert_eq!(reader.len(), 1600);
    }

    #[test]
    fn out_of_range_samples_are_clamped() {
        let encoder = PcmWavEncoder::new();
        let bytes = encoder.encode_samples(&[2.0, -2.0], 16_000).unwrap();

        let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, vec![i16::MAX, i16::MIN + 1]);
    }
}
