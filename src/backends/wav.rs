//! # Native WAV Backend
//!
//! Decoder backend for RIFF WAVE files over the hound crate. PCM in a WAV
//! container is addressable per frame, so this backend seeks exactly and is
//! preferred over the generic symphonia path for `.wav`.

use crate::error::{DecodeError, Result};
use crate::metadata::{self, TrackMetadata};
use crate::traits::{
    AudioCodec, AudioSource, FileRef, ProviderPriority, SeekAccuracy, SoundSourceProvider,
};
use hound::{SampleFormat, WavReader, WavSpec};
use std::fs::File;
use std::io::BufReader;
use tracing::{debug, instrument};

/// Backend provider for RIFF WAVE files.
pub struct WavProvider;

impl SoundSourceProvider for WavProvider {
    fn name(&self) -> &'static str {
        "wav"
    }

    fn supported_suffixes(&self) -> &'static [&'static str] {
        &["wav", "wave"]
    }

    fn priority(&self) -> ProviderPriority {
        ProviderPriority::Preferred
    }

    fn open_source(&self, file: &FileRef) -> Result<Box<dyn AudioSource>> {
        Ok(Box::new(WavSource::open(file)?))
    }

    fn parse_track_metadata(&self, file: &FileRef) -> Result<TrackMetadata> {
        metadata::parse_track_metadata(file.path())
    }
}

/// A live WAV decoding session.
pub struct WavSource {
    reader: WavReader<BufReader<File>>,
    spec: WavSpec,
    frame_count: u64,
    position: u64,
}

impl WavSource {
    /// Open `file` and validate its sample format against what this backend
    /// can normalize to f32.
    #[instrument(skip_all, fields(file = %file))]
    pub fn open(file: &FileRef) -> Result<Self> {
        let reader = WavReader::open(file.path())
            .map_err(|e| DecodeError::Source(format!("failed to open {file}: {e}")))?;
        let spec = reader.spec();

        match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Float, 32) => {}
            (SampleFormat::Int, 1..=32) => {}
            (format, bits) => {
                return Err(DecodeError::UnsupportedCodec(format!(
                    "{bits}-bit {format:?} PCM"
                )));
            }
        }

        let frame_count = u64::from(reader.duration());
        debug!(
            channels = spec.channels,
            rate = spec.sample_rate,
            bits = spec.bits_per_sample,
            frame_count,
            "opened wav source"
        );

        Ok(Self {
            reader,
            spec,
            frame_count,
            position: 0,
        })
    }
}

fn read_error(e: hound::Error) -> DecodeError {
    match e {
        hound::Error::IoError(io) => DecodeError::Io(io),
        other => DecodeError::CorruptedStream(other.to_string()),
    }
}

impl AudioSource for WavSource {
    fn codec(&self) -> AudioCodec {
        AudioCodec::Wav
    }

    fn channel_count(&self) -> u16 {
        self.spec.channels
    }

    fn sampling_rate(&self) -> u32 {
        self.spec.sample_rate
    }

    fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn current_frame_index(&self) -> u64 {
        self.position
    }

    fn seek_accuracy(&self) -> SeekAccuracy {
        SeekAccuracy::Exact
    }

    fn seek_sample_frame(&mut self, target: u64) -> Result<u64> {
        if target > self.frame_count {
            return Err(DecodeError::SeekOutOfBounds {
                requested: target,
                frame_count: self.frame_count,
            });
        }
        // PCM frames have a fixed byte size; every frame is addressable.
        self.reader.seek(target as u32)?;
        self.position = target;
        Ok(target)
    }

    fn read_sample_frames(&mut self, frames: usize, dest: &mut [f32]) -> Result<usize> {
        let channels = usize::from(self.spec.channels);
        let required = frames * channels;
        if dest.len() < required {
            return Err(DecodeError::BufferTooSmall {
                required,
                actual: dest.len(),
            });
        }

        let remaining = (self.frame_count - self.position) as usize;
        let wanted = frames.min(remaining) * channels;
        let mut written = 0;

        match (self.spec.sample_format, self.spec.bits_per_sample) {
            (SampleFormat::Float, _) => {
                for sample in self.reader.samples::<f32>().take(wanted) {
                    dest[written] = sample.map_err(read_error)?;
                    written += 1;
                }
            }
            (SampleFormat::Int, bits @ 1..=16) => {
                let scale = 1.0 / (1i64 << (bits - 1)) as f32;
                for sample in self.reader.samples::<i16>().take(wanted) {
                    dest[written] = sample.map_err(read_error)? as f32 * scale;
                    written += 1;
                }
            }
            (SampleFormat::Int, bits) => {
                let scale = 1.0 / (1i64 << (bits - 1)) as f32;
                for sample in self.reader.samples::<i32>().take(wanted) {
                    dest[written] = sample.map_err(read_error)? as f32 * scale;
                    written += 1;
                }
            }
        }

        let frames_read = written / channels;
        self.position += frames_read as u64;
        Ok(frames_read)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_ramp_wav(dir: &std::path::Path, name: &str, channels: u16, frames: u32) -> PathBuf {
        let path = dir.join(name);
        let spec = WavSpec {
            channels,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).expect("create wav");
        for frame in 0..frames {
            for ch in 0..channels {
                writer
                    .write_sample(((frame as i32 + i32::from(ch) * 7) % 8000 - 4000) as i16)
                    .expect("write sample");
            }
        }
        writer.finalize().expect("finalize wav");
        path
    }

    #[test]
    fn open_reports_stream_parameters() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_ramp_wav(dir.path(), "ramp.wav", 2, 500);

        let source = WavSource::open(&FileRef::new(path)).expect("open");
        assert_eq!(source.channel_count(), 2);
        assert_eq!(source.sampling_rate(), 44100);
        assert_eq!(source.frame_count(), 500);
        assert_eq!(source.current_frame_index(), 0);
        assert!(source.seek_accuracy().is_exact());
        assert_eq!(source.codec(), AudioCodec::Wav);
    }

    #[test]
    fn reads_are_interleaved_and_cursor_advances() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_ramp_wav(dir.path(), "ramp.wav", 2, 100);
        let mut source = WavSource::open(&FileRef::new(path)).expect("open");

        let mut buffer = vec![0.0f32; source.frames_to_samples(10) as usize];
        let read = source.read_sample_frames(10, &mut buffer).expect("read");
        assert_eq!(read, 10);
        assert_eq!(source.current_frame_index(), 10);

        // frame 3: left = 3 - 4000, right = 3 + 7 - 4000, scaled by 1/32768
        assert_eq!(buffer[6], (3 - 4000) as f32 / 32768.0);
        assert_eq!(buffer[7], (10 - 4000) as f32 / 32768.0);
    }

    #[test]
    fn seek_is_exact_and_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_ramp_wav(dir.path(), "ramp.wav", 1, 200);
        let mut source = WavSource::open(&FileRef::new(path)).expect("open");

        assert_eq!(source.seek_sample_frame(150).expect("seek"), 150);
        let mut first = vec![0.0f32; 20];
        assert_eq!(source.read_sample_frames(20, &mut first).expect("read"), 20);

        assert_eq!(source.seek_sample_frame(150).expect("seek again"), 150);
        let mut second = vec![0.0f32; 20];
        assert_eq!(source.read_sample_frames(20, &mut second).expect("read"), 20);
        assert_eq!(first, second);
    }

    #[test]
    fn short_read_only_at_end_of_stream() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_ramp_wav(dir.path(), "ramp.wav", 2, 50);
        let mut source = WavSource::open(&FileRef::new(path)).expect("open");

        source.seek_sample_frame(40).expect("seek");
        let mut buffer = vec![0.0f32; source.frames_to_samples(20) as usize];
        let read = source.read_sample_frames(20, &mut buffer).expect("read");
        assert_eq!(read, 10);
        assert_eq!(source.current_frame_index(), source.frame_count());

        // at the end the cursor stays put and reads return zero frames
        assert_eq!(source.read_sample_frames(20, &mut buffer).expect("read"), 0);

        // seeking to frame_count itself is a valid end-of-stream position
        assert_eq!(source.seek_sample_frame(50).expect("seek"), 50);
        assert!(matches!(
            source.seek_sample_frame(51),
            Err(DecodeError::SeekOutOfBounds { .. })
        ));
    }

    #[test]
    fn undersized_destination_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_ramp_wav(dir.path(), "ramp.wav", 2, 50);
        let mut source = WavSource::open(&FileRef::new(path)).expect("open");

        let mut buffer = vec![0.0f32; 10];
        assert!(matches!(
            source.read_sample_frames(10, &mut buffer),
            Err(DecodeError::BufferTooSmall { .. })
        ));
    }
}
