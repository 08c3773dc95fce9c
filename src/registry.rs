//! # Format Registry
//!
//! Maps file name suffixes to the ordered list of decoder backends willing to
//! attempt them.
//!
//! The registry is a pure lookup service: it owns no per-file state, performs
//! no I/O, and is immutable once constructed. Build it fully (e.g. at process
//! startup) before handing it out behind an `Arc`; afterwards any number of
//! threads may query it without synchronization.
//!
//! Matching compares the *whole* trailing extension, case-insensitively.
//! Substring matching would misclassify decoy double extensions such as
//! `cover-art.png.mp3`, which must resolve to `mp3`.

use crate::traits::{FileRef, ProviderPriority, SoundSourceProvider};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// One backend the registry deems worth attempting for a file, prior to
/// confirming it can actually open the payload.
#[derive(Clone)]
pub struct FormatCandidate {
    provider: Arc<dyn SoundSourceProvider>,
    priority: ProviderPriority,
}

impl FormatCandidate {
    /// The backend to attempt.
    pub fn provider(&self) -> &Arc<dyn SoundSourceProvider> {
        &self.provider
    }

    /// The rank that placed this candidate in the returned order.
    pub fn priority(&self) -> ProviderPriority {
        self.priority
    }
}

impl std::fmt::Debug for FormatCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatCandidate")
            .field("provider", &self.provider.name())
            .field("priority", &self.priority)
            .finish()
    }
}

/// Immutable suffix -> ordered providers lookup table.
pub struct FormatRegistry {
    providers: Vec<Arc<dyn SoundSourceProvider>>,
    // suffix (lowercase, no dot) -> indices into `providers`, in try order
    by_suffix: HashMap<String, Vec<usize>>,
}

impl FormatRegistry {
    /// Build a registry from the given providers.
    ///
    /// For each suffix, candidates are ordered by descending
    /// [`ProviderPriority`], ties broken by registration order, so the order
    /// is deterministic and stable across runs.
    pub fn new(providers: Vec<Arc<dyn SoundSourceProvider>>) -> Self {
        let mut by_suffix: HashMap<String, Vec<usize>> = HashMap::new();

        for (index, provider) in providers.iter().enumerate() {
            for suffix in provider.supported_suffixes() {
                by_suffix
                    .entry(suffix.to_ascii_lowercase())
                    .or_default()
                    .push(index);
            }
        }

        for indices in by_suffix.values_mut() {
            indices.sort_by(|&a, &b| {
                providers[b]
                    .priority()
                    .cmp(&providers[a].priority())
                    .then(a.cmp(&b))
            });
        }

        debug!(
            providers = providers.len(),
            suffixes = by_suffix.len(),
            "format registry initialized"
        );

        Self {
            providers,
            by_suffix,
        }
    }

    /// Build a registry with the crate's default backend set.
    pub fn with_default_providers() -> Self {
        Self::new(crate::backends::default_providers())
    }

    /// Whether any registered backend claims the trailing extension of
    /// `name_or_suffix`.
    ///
    /// Accepts full paths, bare file names, and bare suffixes like `".mp3"`.
    /// This is a purely syntactic check: it is necessary but not sufficient
    /// for a subsequent open to succeed.
    pub fn supports(&self, name_or_suffix: &str) -> bool {
        match trailing_suffix(name_or_suffix) {
            Some(suffix) => self.by_suffix.contains_key(&suffix),
            None => false,
        }
    }

    /// The ordered candidate backends for `file`, empty when no backend
    /// claims its suffix.
    pub fn candidates(&self, file: &FileRef) -> Vec<FormatCandidate> {
        let Some(name) = file.file_name() else {
            return Vec::new();
        };
        let Some(suffix) = trailing_suffix(name) else {
            return Vec::new();
        };

        let candidates: Vec<FormatCandidate> = self
            .by_suffix
            .get(&suffix)
            .map(|indices| {
                indices
                    .iter()
                    .map(|&index| FormatCandidate {
                        provider: Arc::clone(&self.providers[index]),
                        priority: self.providers[index].priority(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        debug!(
            file = %file,
            suffix = %suffix,
            candidates = candidates.len(),
            "resolved format candidates"
        );
        candidates
    }
}

/// The whole trailing extension of `name`, lowercased, without the dot.
///
/// Returns `None` when there is no dot or nothing follows the last one.
fn trailing_suffix(name: &str) -> Option<String> {
    let (_, suffix) = name.rsplit_once('.')?;
    if suffix.is_empty() {
        return None;
    }
    Some(suffix.to_ascii_lowercase())
}
