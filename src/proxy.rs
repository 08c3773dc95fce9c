//! # Sound Source Proxy
//!
//! The façade applications hold. Given a file reference, asks the registry
//! for candidate backends, attempts each in priority order, and returns the
//! first source that both opens and satisfies the contract invariants.
//!
//! A supported suffix never implies an openable payload (AAC vs. ALAC inside
//! `.m4a`, stray data with an audio extension), so per-candidate failures are
//! expected and absorbed: they are logged and the next candidate is tried.
//! Only exhaustion of all candidates surfaces to the caller, as `None`.

use crate::error::{DecodeError, Result};
use crate::metadata::TrackMetadata;
use crate::registry::FormatRegistry;
use crate::traits::{AudioSource, FileRef};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Dispatching façade over a [`FormatRegistry`].
#[derive(Clone)]
pub struct SoundSourceProxy {
    registry: Arc<FormatRegistry>,
}

impl SoundSourceProxy {
    /// Create a proxy over an already-populated registry.
    pub fn new(registry: Arc<FormatRegistry>) -> Self {
        Self { registry }
    }

    /// Create a proxy over the default backend set.
    pub fn with_default_providers() -> Self {
        Self::new(Arc::new(FormatRegistry::with_default_providers()))
    }

    /// The registry this proxy dispatches through.
    pub fn registry(&self) -> &Arc<FormatRegistry> {
        &self.registry
    }

    /// Whether any backend claims the trailing extension of `name_or_path`.
    ///
    /// Purely syntactic: necessary for [`SoundSourceProxy::open`] to succeed,
    /// never sufficient.
    pub fn is_file_name_supported(&self, name_or_path: &str) -> bool {
        self.registry.supports(name_or_path)
    }

    /// Open an audio source for `file`.
    ///
    /// Tries each candidate backend in registry order. A returned source has
    /// already been validated against the contract invariants
    /// (`channel_count > 0`, `sampling_rate > 0`). `None` means no backend
    /// could decode the payload; this is an expected outcome, not a fault.
    #[instrument(skip_all, fields(file = %file))]
    pub fn open(&self, file: &FileRef) -> Option<Box<dyn AudioSource>> {
        for candidate in self.registry.candidates(file) {
            let provider = candidate.provider();
            match provider.open_source(file) {
                Ok(source) => {
                    if source.channel_count() == 0 || source.sampling_rate() == 0 {
                        warn!(
                            provider = provider.name(),
                            channels = source.channel_count(),
                            rate = source.sampling_rate(),
                            "rejecting malformed source, trying next candidate"
                        );
                        continue;
                    }
                    debug!(
                        provider = provider.name(),
                        channels = source.channel_count(),
                        rate = source.sampling_rate(),
                        frames = source.frame_count(),
                        "opened audio source"
                    );
                    return Some(source);
                }
                Err(err) => {
                    debug!(
                        provider = provider.name(),
                        error = %err,
                        "backend could not open file, trying next candidate"
                    );
                }
            }
        }
        debug!("no backend could open file");
        None
    }

    /// Extract tag metadata for `file`, routed through the same candidate
    /// resolution used for decoding.
    #[instrument(skip_all, fields(file = %file))]
    pub fn parse_track_metadata(&self, file: &FileRef) -> Result<TrackMetadata> {
        let mut last_error = None;
        for candidate in self.registry.candidates(file) {
            let provider = candidate.provider();
            match provider.parse_track_metadata(file) {
                Ok(metadata) => return Ok(metadata),
                Err(err) => {
                    debug!(
                        provider = provider.name(),
                        error = %err,
                        "backend could not parse metadata, trying next candidate"
                    );
                    last_error = Some(err);
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| DecodeError::Metadata(format!("no backend claims {file}"))))
    }
}
