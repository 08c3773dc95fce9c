//! # Decoder Backends
//!
//! The independent decoder implementations shipped with this crate. Each
//! backend owns its format-specific open/seek/decode logic and exposes it
//! through the [`crate::SoundSourceProvider`] capability contract; the
//! registry discovers them as plugins, nothing here is special-cased at call
//! sites.

mod sample_converter;
mod symphonia;
mod wav;

pub use sample_converter::SampleConverter;
pub use symphonia::{SymphoniaProvider, SymphoniaSource};
pub use wav::{WavProvider, WavSource};

use crate::traits::SoundSourceProvider;
use std::sync::Arc;

/// The default backend set, in registration order.
///
/// The native WAV backend registers at preferred priority so `.wav` resolves
/// to it ahead of the generic symphonia path; everything else falls to
/// symphonia.
pub fn default_providers() -> Vec<Arc<dyn SoundSourceProvider>> {
    vec![Arc::new(WavProvider), Arc::new(SymphoniaProvider)]
}
