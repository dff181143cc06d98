//! Resampling to the capture format contract.
//!
//! Capture runs at whatever rate and channel count the device offers; the
//! clip is converted to 16 kHz mono here before encoding, so the uploaded
//! file always honors the contract the analysis service expects.

use anyhow::{Context, Result};
use rubato::{FftFixedIn, Resampler};

/// Sample rate of the capture format contract.
pub const CONTRACT_SAMPLE_RATE: u32 = 16_000;

/// Convert device-rate samples to 16 kHz mono.
///
/// Multichannel input is downmixed first; input already at the contract rate
/// passes through untouched.
pub fn resample_to_contract(samples: &[f32], source_rate: u32, channels: u16) -> Result<Vec<f32>> {
    let mono = if channels > 1 {
        downmix_to_mono(samples, channels)
    } else {
        samples.to_vec()
    };

    if source_rate == CONTRACT_SAMPLE_RATE {
        return Ok(mono);
    }

    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        CONTRACT_SAMPLE_RATE as usize,
        1024, // chunk size
        2,    // sub-chunks
        1,    // channels (mono)
    )
    .context("Failed to create resampler")?;

    let chunk_size = resampler.input_frames_max();
    let mut output = Vec::with_capacity(
        (mono.len() as f64 * CONTRACT_SAMPLE_RATE as f64 / source_rate as f64) as usize,
    );

    for chunk in mono.chunks(chunk_size) {
        let mut padded = chunk.to_vec();
        if padded.len() < chunk_size {
            padded.resize(chunk_size, 0.0);
        }

        let result = resampler
            .process(&[padded], None)
            .context("Resampling failed")?;
        output.extend_from_slice(&result[0]);
    }

    Ok(output)
}

/// Downmix interleaved multichannel audio by averaging the channels of each
/// frame.
fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    samples
        .chunks(channels as usize)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_averages_frames() {
        let stereo = vec![0.5, 0.3, 0.8, 0.2, 1.0, 0.0];
        let mono = downmix_to_mono(&stereo, 2);
        assert_eq!(mono.len(), 3);
        assert!((mono[0] - 0.4).abs() < 0.001);
        assert!((mono[1] - 0.5).abs() < 0.001);
        assert!((mono[2] - 0.5).abs() < 0.001);
    }

    #[test]
    fn contract_rate_passes_through() {
        let samples = vec![0.1, 0.2, 0.3, 0.4, 0.5];
        let result = resample_to_contract(&samples, CONTRACT_SAMPLE_RATE, 1).unwrap();
        assert_eq!(result, samples);
    }

    #[test]
    fn downsampling_hits_contract_length() {
        // A second of silence at 48 kHz should come out near a third as long.
        let samples = vec![0.0f32; 48_000];
        let result = resample_to_contract(&samples, 48_000, 1).unwrap();
        let expected = 16_000usize;
        let tolerance = expected / 10;
        assert!(
            result.len().abs_diff(expected) <= tolerance,
            "got {} samples, expected about {}",
            result.len(),
            expected
        );
    }
}
