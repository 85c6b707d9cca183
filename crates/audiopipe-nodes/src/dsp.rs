//! Small, self-contained PCM helpers shared by the built-in filters.
//!
//! These implement real, audible transformations — format conversion,
//! linear resampling, simple channel mixing, gain scaling — without
//! claiming bit-exactness against any reference resampler or mixer.

use alloc::vec::Vec;

use audiopipe_core::SampleFormat;

/// Decodes an interleaved PCM buffer to interleaved `f32` in `[-1, 1]`.
/// Compressed formats are not PCM and must never reach this function.
pub fn to_f32_interleaved(bytes: &[u8], format: SampleFormat) -> Vec<f32> {
    match format {
        SampleFormat::U8 => bytes.iter().map(|&b| (b as f32 - 128.0) / 128.0).collect(),
        SampleFormat::S16 => bytes
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]) as f32 / i16::MAX as f32)
            .collect(),
        SampleFormat::S32 => bytes
            .chunks_exact(4)
            .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f32 / i32::MAX as f32)
            .collect(),
        SampleFormat::Float32 => bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
        SampleFormat::Float64 => bytes
            .chunks_exact(8)
            .map(|c| {
                f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]) as f32
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Encodes interleaved `f32` samples back to an interleaved PCM buffer of
/// `format`, clamping to the target format's range.
pub fn from_f32_interleaved(samples: &[f32], format: SampleFormat) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * format.bytes_per_sample());
    match format {
        SampleFormat::U8 => {
            for &s in samples {
                out.push(((s.clamp(-1.0, 1.0) * 128.0) + 128.0) as u8);
            }
        }
        SampleFormat::S16 => {
            for &s in samples {
                let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
        SampleFormat::S32 => {
            for &s in samples {
                let v = (s.clamp(-1.0, 1.0) * i32::MAX as f32) as i32;
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
        SampleFormat::Float32 => {
            for &s in samples {
                out.extend_from_slice(&s.to_le_bytes());
            }
        }
        SampleFormat::Float64 => {
            for &s in samples {
                out.extend_from_slice(&(s as f64).to_le_bytes());
            }
        }
        _ => {}
    }
    out
}

/// Naive linear-interpolation resample of interleaved `f32` audio from
/// `from_rate` to `to_rate`, channel count unchanged.
pub fn resample_linear(samples: &[f32], channels: usize, from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || channels == 0 || samples.is_empty() {
        return samples.to_vec();
    }
    let frames_in = samples.len() / channels;
    let ratio = from_rate as f64 / to_rate as f64;
    let frames_out = ((frames_in as f64) / ratio).round().max(0.0) as usize;
    let mut out = Vec::with_capacity(frames_out * channels);
    for frame_idx in 0..frames_out {
        let src_pos = frame_idx as f64 * ratio;
        let i0 = src_pos.floor() as usize;
        let frac = (src_pos - i0 as f64) as f32;
        let i1 = (i0 + 1).min(frames_in.saturating_sub(1));
        let i0 = i0.min(frames_in.saturating_sub(1));
        for ch in 0..channels {
            let a = samples[i0 * channels + ch];
            let b = samples[i1 * channels + ch];
            out.push(a + (b - a) * frac);
        }
    }
    out
}

/// Simple channel-count conversion: downmix by averaging extra channels
/// into the first `to_channels`, upmix by duplicating the last available
/// channel into the new ones. Not a substitute for a real mixing matrix,
/// but audible and channel-count-correct.
pub fn remix_channels(samples: &[f32], from_channels: usize, to_channels: usize) -> Vec<f32> {
    if from_channels == to_channels || from_channels == 0 || to_channels == 0 {
        return samples.to_vec();
    }
    let frames = samples.len() / from_channels;
    let mut out = Vec::with_capacity(frames * to_channels);
    for frame_idx in 0..frames {
        let frame = &samples[frame_idx * from_channels..(frame_idx + 1) * from_channels];
        if to_channels < from_channels {
            let shared = from_channels - to_channels;
            for ch in 0..to_channels {
                if ch == to_channels - 1 {
                    let tail: f32 = frame[ch..].iter().sum::<f32>() / (shared + 1) as f32;
                    out.push(tail);
                } else {
                    out.push(frame[ch]);
                }
            }
        } else {
            for ch in 0..to_channels {
                out.push(frame[ch.min(from_channels - 1)]);
            }
        }
    }
    out
}

/// Scales every sample by `gain` in place.
pub fn apply_gain(samples: &mut [f32], gain: f32) {
    for s in samples {
        *s *= gain;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn s16_round_trip_is_close() {
        let original = [0.5_f32, -0.25, 0.0, 1.0];
        let bytes = from_f32_interleaved(&original, SampleFormat::S16);
        let back = to_f32_interleaved(&bytes, SampleFormat::S16);
        for (a, b) in original.iter().zip(back.iter()) {
            assert!((a - b).abs() < 0.001, "{a} vs {b}");
        }
    }

    #[test]
    fn resample_preserves_channel_count() {
        let samples = alloc::vec![0.0_f32; 2 * 100];
        let out = resample_linear(&samples, 2, 44_100, 48_000);
        assert_eq!(out.len() % 2, 0);
    }

    #[test]
    fn downmix_reduces_channel_count() {
        let stereo = alloc::vec![1.0_f32, -1.0, 0.5, -0.5];
        let mono = remix_channels(&stereo, 2, 1);
        assert_eq!(mono.len(), 2);
    }
}
