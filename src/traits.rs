//! # Core Source Contract
//!
//! Defines the behavioral contract every opened audio source must satisfy,
//! regardless of which decoder backend produced it, plus the capability
//! contract the backends themselves implement.
//!
//! ## Frames and samples
//!
//! A **frame** is one time slice across all channels; a **sample** is one
//! scalar value for one channel within a frame. All buffers are interleaved
//! f32 in `[-1.0, 1.0]` (stereo is `LRLRLR...`), so
//! `samples = frames * channel_count` everywhere. [`AudioSource`] carries the
//! arithmetic as default methods so buffer sizing and decode calls can never
//! drift apart on channel count.
//!
//! ## Seek semantics
//!
//! Backends that can only address block/page boundaries round a seek target
//! **down** to the nearest addressable frame and report the index they really
//! landed on. Callers must not assume the requested and returned index are
//! equal; [`SeekAccuracy`] declares how far decoded output may diverge from a
//! continuous read after such a seek.

use crate::error::Result;
use crate::metadata::TrackMetadata;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// ============================================================================
// Codec identity and capabilities
// ============================================================================

/// Decoded payload codecs.
///
/// Use [`AudioCodec::Other`] for codecs a backend decodes but this layer does
/// not classify.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    /// MPEG-1 Audio Layer 3
    Mp3,
    /// Advanced Audio Coding (AAC/M4A)
    Aac,
    /// Free Lossless Audio Codec
    Flac,
    /// Ogg Vorbis
    Vorbis,
    /// Opus
    Opus,
    /// Raw PCM in a WAV/AIFF style container
    Wav,
    /// Apple Lossless Audio Codec
    Alac,
    /// Codec not recognized
    Unknown,
    /// Custom or proprietary codec
    Other(String),
}

impl AudioCodec {
    /// Returns `true` if this is a lossless codec.
    pub fn is_lossless(&self) -> bool {
        matches!(self, AudioCodec::Flac | AudioCodec::Wav | AudioCodec::Alac)
    }

    /// Returns `true` if this codec is lossy.
    pub fn is_lossy(&self) -> bool {
        matches!(
            self,
            AudioCodec::Mp3 | AudioCodec::Aac | AudioCodec::Vorbis | AudioCodec::Opus
        )
    }
}

/// A backend's declared guarantee about seek-then-decode output.
///
/// Lossy transform codecs legitimately re-synthesize slightly different
/// samples after a seek than a continuous decode would produce at the same
/// position. Rather than special-casing codecs at comparison sites, each
/// opened source declares its class here and comparisons apply
/// [`SeekAccuracy::samples_match`] uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeekAccuracy {
    /// Seek-then-decode is sample-identical to a continuous decode.
    Exact,
    /// Seek-then-decode may diverge by at most `epsilon` per sample.
    Bounded { epsilon: f32 },
}

impl SeekAccuracy {
    /// Returns `true` for the sample-identical class.
    pub fn is_exact(&self) -> bool {
        matches!(self, SeekAccuracy::Exact)
    }

    /// Compare two samples under this accuracy class.
    pub fn samples_match(&self, a: f32, b: f32) -> bool {
        match *self {
            SeekAccuracy::Exact => a == b,
            SeekAccuracy::Bounded { epsilon } => (a - b).abs() <= epsilon,
        }
    }
}

/// Registry ordering input when several providers claim the same suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProviderPriority {
    /// Try after everything else.
    Fallback,
    /// Regular priority.
    Default,
    /// Try first.
    Preferred,
}

// ============================================================================
// File reference
// ============================================================================

/// An opaque, immutable handle to an audio file on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileRef {
    path: PathBuf,
}

impl FileRef {
    /// Create a reference from any path-like value.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The referenced path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file name component, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    /// Whether the referenced file currently exists.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.path.display().fmt(f)
    }
}

impl From<PathBuf> for FileRef {
    fn from(path: PathBuf) -> Self {
        Self { path }
    }
}

impl From<&Path> for FileRef {
    fn from(path: &Path) -> Self {
        Self::new(path)
    }
}

impl From<&str> for FileRef {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl AsRef<Path> for FileRef {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

// ============================================================================
// The audio source contract
// ============================================================================

/// A live decoding session over one audio file.
///
/// All operations are synchronous and block the calling thread; no operation
/// is re-entrant on the same handle. Independent handles, even on the same
/// file, share no mutable state and may be driven from different threads.
/// Every backend resource (file handle, decoder state, carry buffers) is
/// owned by the implementing value and released on drop.
///
/// Invariants, fixed once the handle is returned by the proxy:
///
/// - `channel_count() > 0` and `sampling_rate() > 0`
/// - `frame_count()` is exact and stable
/// - `0 <= current_frame_index() <= frame_count()`
pub trait AudioSource: Send {
    /// The decoded payload codec.
    fn codec(&self) -> AudioCodec;

    /// Number of channels, fixed for the handle lifetime.
    fn channel_count(&self) -> u16;

    /// Sampling rate in Hz, fixed for the handle lifetime.
    fn sampling_rate(&self) -> u32;

    /// Total decodable frames, exact and fixed for the handle lifetime.
    fn frame_count(&self) -> u64;

    /// The read cursor: index of the next frame a read will produce.
    fn current_frame_index(&self) -> u64;

    /// Declared seek-then-decode guarantee for this source.
    fn seek_accuracy(&self) -> SeekAccuracy;

    /// Seek to `target` frames from the start of the stream.
    ///
    /// Any `target` in `0..=frame_count()` succeeds. Backends with
    /// block-granular addressing land on the nearest addressable frame
    /// `<= target` and return the index actually reached; the cursor is set
    /// to that index. Targets beyond `frame_count()` are an error. Seeking
    /// twice to the same target lands on the same index and yields the same
    /// subsequent output.
    fn seek_sample_frame(&mut self, target: u64) -> Result<u64>;

    /// Decode up to `frames` frames starting at the cursor into `dest`.
    ///
    /// Writes interleaved samples, never more than
    /// `frames_to_samples(frames_read)` of them, and advances the cursor by
    /// the frames actually produced. Returns fewer than `frames` only when
    /// the end of the stream is reached. `dest` must hold at least
    /// `frames_to_samples(frames)` samples.
    fn read_sample_frames(&mut self, frames: usize, dest: &mut [f32]) -> Result<usize>;

    /// Pure arithmetic: `frames * channel_count`.
    fn frames_to_samples(&self, frames: u64) -> u64 {
        frames * u64::from(self.channel_count())
    }

    /// Inverse of [`AudioSource::frames_to_samples`] for whole buffers.
    fn samples_to_frames(&self, samples: u64) -> u64 {
        samples / u64::from(self.channel_count().max(1))
    }

    /// `true` iff `index` addresses a decodable frame.
    ///
    /// `index == frame_count()` is not valid for reading but marks exactly
    /// the end of the stream for iteration termination.
    fn is_valid_frame_index(&self, index: u64) -> bool {
        index < self.frame_count()
    }

    /// Index of the last decodable frame (`0` for empty streams).
    fn max_frame_index(&self) -> u64 {
        self.frame_count().saturating_sub(1)
    }

    /// `true` iff the stream holds no frames.
    fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }
}

// ============================================================================
// The backend capability contract
// ============================================================================

/// A decoder backend: one independent implementation able to open some set of
/// formats and hand out [`AudioSource`] sessions.
///
/// Providers are stateless (registration data only) and shared behind `Arc`;
/// the registry queries them concurrently without synchronization.
#[cfg_attr(test, mockall::automock)]
pub trait SoundSourceProvider: Send + Sync {
    /// Stable identifier used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// File name suffixes this backend is willing to attempt, lowercase,
    /// without the leading dot.
    ///
    /// Claiming a suffix is a necessary condition only: the payload codec may
    /// still turn out to be undecodable (AAC vs. ALAC inside `.m4a`), in
    /// which case [`SoundSourceProvider::open_source`] must fail cleanly so
    /// the proxy can try the next candidate.
    fn supported_suffixes(&self) -> &'static [&'static str];

    /// Ordering input when several providers claim the same suffix.
    fn priority(&self) -> ProviderPriority;

    /// Attempt to open a decoding session for `file`.
    fn open_source(&self, file: &FileRef) -> Result<Box<dyn AudioSource>>;

    /// Extract tag metadata from `file`.
    fn parse_track_metadata(&self, file: &FileRef) -> Result<TrackMetadata>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_codec_classification() {
        assert!(AudioCodec::Flac.is_lossless());
        assert!(AudioCodec::Wav.is_lossless());
        assert!(AudioCodec::Alac.is_lossless());

        assert!(AudioCodec::Mp3.is_lossy());
        assert!(AudioCodec::Opus.is_lossy());
        assert!(!AudioCodec::Unknown.is_lossy());
        assert!(!AudioCodec::Unknown.is_lossless());
    }

    #[test]
    fn seek_accuracy_comparison_policy() {
        assert!(SeekAccuracy::Exact.samples_match(0.5, 0.5));
        assert!(!SeekAccuracy::Exact.samples_match(0.5, 0.5000001));

        let bounded = SeekAccuracy::Bounded { epsilon: 0.2 };
        assert!(bounded.samples_match(0.5, 0.69));
        assert!(bounded.samples_match(0.5, 0.7));
        assert!(!bounded.samples_match(0.5, 0.75));
        assert!(!bounded.is_exact());
    }

    #[test]
    fn provider_priority_ordering() {
        assert!(ProviderPriority::Preferred > ProviderPriority::Default);
        assert!(ProviderPriority::Default > ProviderPriority::Fallback);
    }

    #[test]
    fn file_ref_accessors() {
        let file = FileRef::new("/music/cover-test.flac");
        assert_eq!(file.file_name(), Some("cover-test.flac"));
        assert!(!file.exists());
        assert_eq!(file.to_string(), "/music/cover-test.flac");
    }

    struct FixedSource {
        channels: u16,
        frames: u64,
    }

    impl AudioSource for FixedSource {
        fn codec(&self) -> AudioCodec {
            AudioCodec::Wav
        }
        fn channel_count(&self) -> u16 {
            self.channels
        }
        fn sampling_rate(&self) -> u32 {
            44100
        }
        fn frame_count(&self) -> u64 {
            self.frames
        }
        fn current_frame_index(&self) -> u64 {
            0
        }
        fn seek_accuracy(&self) -> SeekAccuracy {
            SeekAccuracy::Exact
        }
        fn seek_sample_frame(&mut self, target: u64) -> Result<u64> {
            Ok(target)
        }
        fn read_sample_frames(&mut self, _frames: usize, _dest: &mut [f32]) -> Result<usize> {
            Ok(0)
        }
    }

    #[test]
    fn frame_sample_arithmetic() {
        let source = FixedSource {
            channels: 2,
            frames: 100,
        };
        for n in [0u64, 1, 7, 4096] {
            assert_eq!(source.frames_to_samples(n), n * 2);
            assert_eq!(source.samples_to_frames(n * 2), n);
        }
        assert!(source.is_valid_frame_index(0));
        assert!(source.is_valid_frame_index(99));
        assert!(!source.is_valid_frame_index(100));
        assert_eq!(source.max_frame_index(), 99);
        assert!(!source.is_empty());

        let empty = FixedSource {
            channels: 1,
            frames: 0,
        };
        assert!(empty.is_empty());
        assert_eq!(empty.max_frame_index(), 0);
        assert!(!empty.is_valid_frame_index(0));
    }
}
