//! # Track Metadata Extraction
//!
//! Tag and audio-property extraction shared by the decoder backends, built on
//! the `lofty` crate (ID3v2, Vorbis Comments, MP4 tags, RIFF INFO, FLAC).
//!
//! The proxy routes [`crate::SoundSourceProxy::parse_track_metadata`] to the
//! backend resolved for decoding; backends delegate here so every container
//! reports the same field set.

use crate::error::{DecodeError, Result};
use lofty::config::ParseOptions;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, Tag};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Metadata extracted from one audio file.
///
/// Text fields are normalized: whitespace collapsed, control characters
/// stripped. Absent tags stay `None`; audio properties are always reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    /// Track title.
    pub title: Option<String>,
    /// Primary artist.
    pub artist: Option<String>,
    /// Album name.
    pub album: Option<String>,
    /// Album artist (compilations).
    pub album_artist: Option<String>,
    /// Genre classification.
    pub genre: Option<String>,
    /// Free-form comment.
    pub comment: Option<String>,
    /// Release year.
    pub year: Option<u32>,
    /// Track number on the album.
    pub track_number: Option<u32>,

    /// Duration in milliseconds.
    pub duration_ms: u64,
    /// Average bitrate in kbps, if known.
    pub bitrate: Option<u32>,
    /// Sample rate in Hz, if known.
    pub sample_rate: Option<u32>,
    /// Channel count, if known.
    pub channels: Option<u8>,
}

/// Extract metadata from `path`.
///
/// Some taggers store album information under the "original" ID3 frame
/// pairing (TOPE/TOAL) instead of the standard fields. When a standard field
/// is absent, extraction falls back to its original-frame counterpart so such
/// files still yield usable artist/album values.
pub fn parse_track_metadata(path: &Path) -> Result<TrackMetadata> {
    debug!(file = %path.display(), "extracting track metadata");

    let tagged_file = Probe::open(path)
        .map_err(|e| DecodeError::Metadata(format!("failed to open {}: {e}", path.display())))?
        .options(ParseOptions::new())
        .guess_file_type()
        .map_err(|e| DecodeError::Metadata(format!("failed to probe file type: {e}")))?
        .read()
        .map_err(|e| DecodeError::Metadata(format!("failed to parse tags: {e}")))?;

    let properties = tagged_file.properties();
    let mut metadata = TrackMetadata {
        duration_ms: properties.duration().as_millis() as u64,
        bitrate: properties.audio_bitrate(),
        sample_rate: properties.sample_rate(),
        channels: properties.channels(),
        ..TrackMetadata::default()
    };

    let tag = tagged_file.primary_tag().or_else(|| tagged_file.first_tag());
    match tag {
        Some(tag) => read_tag_fields(tag, &mut metadata),
        None => warn!(file = %path.display(), "no tags found in file"),
    }

    Ok(metadata)
}

fn read_tag_fields(tag: &Tag, metadata: &mut TrackMetadata) {
    metadata.title = tag.title().map(|s| normalize_text(s.as_ref()));
    metadata.artist = tag
        .artist()
        .map(|s| normalize_text(s.as_ref()))
        .or_else(|| tag.get_string(&ItemKey::OriginalArtist).map(normalize_text));
    metadata.album = tag.album().map(|s| normalize_text(s.as_ref())).or_else(|| {
        tag.get_string(&ItemKey::OriginalAlbumTitle)
            .map(normalize_text)
    });
    metadata.album_artist = tag.get_string(&ItemKey::AlbumArtist).map(normalize_text);
    metadata.genre = tag.genre().map(|s| normalize_text(s.as_ref()));
    metadata.comment = tag.comment().map(|s| normalize_text(s.as_ref()));
    metadata.year = tag.year();
    metadata.track_number = tag.track();
}

/// Collapse whitespace runs to single spaces and strip control characters.
fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .filter(|c| !c.is_control())
        .collect()
}
