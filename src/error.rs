//! # Decode Error Types
//!
//! Error taxonomy for opening, seeking, and reading audio sources.
//!
//! A failure while one backend attempts a file is not fatal: the proxy absorbs
//! it and tries the next candidate. Only the verification helpers and direct
//! backend users see these errors; [`crate::SoundSourceProxy::open`] converts
//! exhaustion into `None`.

use thiserror::Error;

/// Errors that can occur while opening or driving an audio source.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Failed to open or read the underlying file.
    #[error("failed to open audio source: {0}")]
    Source(String),

    /// The container/stream is not recognized or is missing required
    /// parameters (sample rate, channel layout, total frame count).
    #[error("unsupported or invalid audio format: {0}")]
    InvalidFormat(String),

    /// The container was parsed but the payload codec cannot be decoded.
    #[error("unsupported codec: {0}")]
    UnsupportedCodec(String),

    /// The stream contains data the decoder cannot recover from.
    #[error("corrupted audio stream: {0}")]
    CorruptedStream(String),

    /// Decoder-internal failure.
    #[error("decoder error: {0}")]
    Decoder(String),

    /// Seek target lies beyond the end of the stream.
    #[error("seek target {requested} beyond frame count {frame_count}")]
    SeekOutOfBounds { requested: u64, frame_count: u64 },

    /// The destination buffer cannot hold the requested frames.
    #[error("destination buffer holds {actual} samples, {required} required")]
    BufferTooSmall { required: usize, actual: usize },

    /// Tag/metadata extraction failed.
    #[error("metadata extraction failed: {0}")]
    Metadata(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DecodeError {
    /// Returns `true` if this error is related to format/codec recognition,
    /// i.e. the kind of failure another backend may be able to handle.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            DecodeError::InvalidFormat(_) | DecodeError::UnsupportedCodec(_)
        )
    }
}

/// Result type for decoding operations.
pub type Result<T> = std::result::Result<T, DecodeError>;
