//! # soundsource
//!
//! A uniform contract for opening, seeking, and reading interleaved f32 PCM
//! from heterogeneous audio file formats, backed by independent decoder
//! backends.
//!
//! ## Overview
//!
//! - [`FormatRegistry`] maps a file's trailing extension to the ordered list
//!   of backends willing to attempt it.
//! - [`SoundSourceProxy`] tries each candidate in order and returns the first
//!   source that opens and satisfies the contract invariants, or `None` when
//!   the payload is not decodable. A supported suffix is necessary but never
//!   sufficient.
//! - [`AudioSource`] is the per-handle contract: fixed channel count, rate,
//!   and exact frame count; frame-indexed seeks that report the index really
//!   reached; reads that return short only at end of stream.
//! - [`SeekAccuracy`] declares, per backend, whether seek-then-decode is
//!   sample-identical to a continuous decode or bounded by a per-sample
//!   tolerance (lossy transform codecs).
//!
//! ## Example
//!
//! ```rust,no_run
//! use soundsource::{FileRef, SoundSourceProxy};
//!
//! let proxy = SoundSourceProxy::with_default_providers();
//! let file = FileRef::new("/music/take.flac");
//!
//! if let Some(mut source) = proxy.open(&file) {
//!     let mut buffer = vec![0.0f32; source.frames_to_samples(4096) as usize];
//!     let landed = source.seek_sample_frame(44100)?;
//!     let frames = source.read_sample_frames(4096, &mut buffer)?;
//!     println!("decoded {frames} frames starting at {landed}");
//! }
//! # Ok::<(), soundsource::DecodeError>(())
//! ```

pub mod backends;
pub mod error;
pub mod metadata;
pub mod proxy;
pub mod registry;
pub mod traits;

pub use error::{DecodeError, Result};
pub use metadata::TrackMetadata;
pub use proxy::SoundSourceProxy;
pub use registry::{FormatCandidate, FormatRegistry};
pub use traits::{
    AudioCodec, AudioSource, FileRef, ProviderPriority, SeekAccuracy, SoundSourceProvider,
};
