//! # Sample Format Converter
//!
//! Normalizes symphonia's decoded buffers (any sample format, planar layout)
//! to interleaved f32 in `[-1.0, 1.0]`, the layout the
//! [`crate::AudioSource`] contract hands to callers.

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::conv::IntoSample;
use symphonia::core::sample::Sample;
use tracing::warn;

/// Converter from symphonia buffers to the contract sample layout.
pub struct SampleConverter;

impl SampleConverter {
    /// Convert a decoded buffer to interleaved f32 samples.
    ///
    /// Output ordering for stereo is `[L0, R0, L1, R1, ...]`. Integer formats
    /// are normalized to `[-1.0, 1.0]` by symphonia's sample conversion.
    pub fn to_interleaved_f32(buffer: &AudioBufferRef<'_>) -> Vec<f32> {
        match buffer {
            AudioBufferRef::U8(buf) => interleave(buf),
            AudioBufferRef::U16(buf) => interleave(buf),
            AudioBufferRef::U24(buf) => interleave(buf),
            AudioBufferRef::U32(buf) => interleave(buf),
            AudioBufferRef::S8(buf) => interleave(buf),
            AudioBufferRef::S16(buf) => interleave(buf),
            AudioBufferRef::S24(buf) => interleave(buf),
            AudioBufferRef::S32(buf) => interleave(buf),
            AudioBufferRef::F32(buf) => interleave(buf),
            AudioBufferRef::F64(buf) => interleave(buf),
        }
    }

    /// Count samples outside `[-1.0, 1.0]`, warning when any are found.
    pub fn count_clipped(samples: &[f32]) -> usize {
        let clipped = samples.iter().filter(|&&s| !(-1.0..=1.0).contains(&s)).count();
        if clipped > 0 {
            warn!(
                clipped,
                total = samples.len(),
                "decoded samples outside nominal range"
            );
        }
        clipped
    }

    /// Clamp samples to `[-1.0, 1.0]`.
    pub fn clamp(samples: &mut [f32]) {
        for sample in samples.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }
    }
}

/// Interleave one planar buffer of any sample type into f32.
fn interleave<S>(buf: &AudioBuffer<S>) -> Vec<f32>
where
    S: Sample + IntoSample<f32>,
{
    let channels = buf.spec().channels.count();
    let frames = buf.frames();
    let mut out = vec![0.0f32; frames * channels];

    for ch in 0..channels {
        let plane = buf.chan(ch);
        for (frame, sample) in plane.iter().take(frames).enumerate() {
            out[frame * channels + ch] = (*sample).into_sample();
        }
    }

    out
}
