//! # Symphonia Backend
//!
//! Multi-format decoder backend over the symphonia library. One provider
//! covers every container/codec symphonia ships: the probe demultiplexes the
//! container, a codec decoder produces PCM packets, and the source adapts
//! both to the frame-indexed [`AudioSource`] contract.
//!
//! Packets rarely align with requested read sizes, so decoded samples are
//! carried in a pending buffer between reads. Seeks go through symphonia's
//! accurate mode and report the frame the demuxer really landed on, which for
//! block-addressed codecs is the nearest addressable frame at or before the
//! target.

use crate::backends::sample_converter::SampleConverter;
use crate::error::{DecodeError, Result};
use crate::metadata::{self, TrackMetadata};
use crate::traits::{
    AudioCodec, AudioSource, FileRef, ProviderPriority, SeekAccuracy, SoundSourceProvider,
};
use std::fs::File;
use symphonia::core::codecs::{
    CodecType, Decoder, DecoderOptions, CODEC_TYPE_AAC, CODEC_TYPE_ALAC, CODEC_TYPE_FLAC,
    CODEC_TYPE_MP3, CODEC_TYPE_NULL, CODEC_TYPE_OPUS, CODEC_TYPE_PCM_F32BE, CODEC_TYPE_PCM_F32LE,
    CODEC_TYPE_PCM_F64BE, CODEC_TYPE_PCM_F64LE, CODEC_TYPE_PCM_S16BE, CODEC_TYPE_PCM_S16LE,
    CODEC_TYPE_PCM_S24BE, CODEC_TYPE_PCM_S24LE, CODEC_TYPE_PCM_S32BE, CODEC_TYPE_PCM_S32LE,
    CODEC_TYPE_PCM_S8, CODEC_TYPE_PCM_U8, CODEC_TYPE_VORBIS,
};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::{Time, TimeBase};
use tracing::{debug, instrument, warn};

/// Per-sample divergence bound declared for lossy transform codecs, whose
/// re-synthesis after a seek is not guaranteed sample-identical to a
/// continuous decode.
const LOSSY_SEEK_EPSILON: f32 = 0.2;

/// Consecutive corrupted packets tolerated before the stream is declared
/// undecodable.
const MAX_CONSECUTIVE_ERRORS: usize = 10;

/// Backend provider for all symphonia-supported formats.
pub struct SymphoniaProvider;

impl SymphoniaProvider {
    const SUFFIXES: &'static [&'static str] = &[
        "aiff", "aif", "flac", "mp3", "m4a", "mp4", "aac", "ogg", "oga", "wav", "wave",
    ];
}

impl SoundSourceProvider for SymphoniaProvider {
    fn name(&self) -> &'static str {
        "symphonia"
    }

    fn supported_suffixes(&self) -> &'static [&'static str] {
        Self::SUFFIXES
    }

    fn priority(&self) -> ProviderPriority {
        ProviderPriority::Default
    }

    fn open_source(&self, file: &FileRef) -> Result<Box<dyn AudioSource>> {
        Ok(Box::new(SymphoniaSource::open(file)?))
    }

    fn parse_track_metadata(&self, file: &FileRef) -> Result<TrackMetadata> {
        metadata::parse_track_metadata(file.path())
    }
}

/// Map symphonia's codec identity onto the contract codec enum.
fn detect_codec(codec_type: CodecType) -> AudioCodec {
    if codec_type == CODEC_TYPE_MP3 {
        AudioCodec::Mp3
    } else if codec_type == CODEC_TYPE_AAC {
        AudioCodec::Aac
    } else if codec_type == CODEC_TYPE_FLAC {
        AudioCodec::Flac
    } else if codec_type == CODEC_TYPE_VORBIS {
        AudioCodec::Vorbis
    } else if codec_type == CODEC_TYPE_OPUS {
        AudioCodec::Opus
    } else if codec_type == CODEC_TYPE_ALAC {
        AudioCodec::Alac
    } else if is_pcm_codec(codec_type) {
        AudioCodec::Wav
    } else {
        AudioCodec::Unknown
    }
}

// symphonia has one CODEC_TYPE per PCM layout; this covers the layouts the
// sample converter can normalize.
fn is_pcm_codec(codec_type: CodecType) -> bool {
    [
        CODEC_TYPE_PCM_S8,
        CODEC_TYPE_PCM_U8,
        CODEC_TYPE_PCM_S16LE,
        CODEC_TYPE_PCM_S16BE,
        CODEC_TYPE_PCM_S24LE,
        CODEC_TYPE_PCM_S24BE,
        CODEC_TYPE_PCM_S32LE,
        CODEC_TYPE_PCM_S32BE,
        CODEC_TYPE_PCM_F32LE,
        CODEC_TYPE_PCM_F32BE,
        CODEC_TYPE_PCM_F64LE,
        CODEC_TYPE_PCM_F64BE,
    ]
    .contains(&codec_type)
}

/// A live symphonia decoding session.
pub struct SymphoniaSource {
    format_reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    codec: AudioCodec,
    channels: u16,
    sample_rate: u32,
    frame_count: u64,
    time_base: Option<TimeBase>,
    /// Index of the next frame a read will produce.
    position: u64,
    /// Decoded samples not yet handed out, drained before the next packet.
    pending: Vec<f32>,
    pending_offset: usize,
    eof: bool,
}

impl SymphoniaSource {
    /// Probe `file`, select the first decodable track, and prepare a codec
    /// decoder for it.
    ///
    /// Fails when the container is unrecognized, required stream parameters
    /// (sample rate, channel layout) are absent, or the total frame count is
    /// unknown. The last case covers streams with non-fixed sample durations,
    /// which cannot honor the exact frame-indexing contract and are excluded
    /// rather than opened with an estimate.
    #[instrument(skip_all, fields(file = %file))]
    pub fn open(file: &FileRef) -> Result<Self> {
        let handle = File::open(file.path())
            .map_err(|e| DecodeError::Source(format!("failed to open {file}: {e}")))?;

        let mut hint = Hint::new();
        if let Some(extension) = file.path().extension().and_then(|e| e.to_str()) {
            hint.with_extension(extension);
        }

        let stream = MediaSourceStream::new(Box::new(handle), Default::default());
        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                stream,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| DecodeError::InvalidFormat(format!("failed to probe format: {e}")))?;

        let format_reader = probed.format;

        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| {
                DecodeError::InvalidFormat("no decodable audio tracks".to_string())
            })?;
        let track_id = track.id;
        let params = track.codec_params.clone();

        let codec = detect_codec(params.codec);
        let sample_rate = params
            .sample_rate
            .ok_or_else(|| DecodeError::InvalidFormat("missing sample rate".to_string()))?;
        let channels = params
            .channels
            .map(|c| c.count() as u16)
            .ok_or_else(|| DecodeError::InvalidFormat("missing channel layout".to_string()))?;
        let frame_count = params.n_frames.ok_or_else(|| {
            DecodeError::InvalidFormat(
                "total frame count unknown, stream is not frame-addressable".to_string(),
            )
        })?;

        let decoder = symphonia::default::get_codecs()
            .make(&params, &DecoderOptions::default())
            .map_err(|e| DecodeError::UnsupportedCodec(format!("{:?}: {e}", params.codec)))?;

        debug!(
            ?codec,
            sample_rate,
            channels,
            frame_count,
            "opened symphonia source"
        );

        Ok(Self {
            format_reader,
            decoder,
            track_id,
            codec,
            channels,
            sample_rate,
            frame_count,
            time_base: params.time_base,
            position: 0,
            pending: Vec::new(),
            pending_offset: 0,
            eof: false,
        })
    }

    fn ts_for_frame(&self, frame: u64) -> u64 {
        match self.time_base {
            Some(tb) => {
                let rate = u64::from(self.sample_rate);
                let time = Time::new(frame / rate, (frame % rate) as f64 / rate as f64);
                tb.calc_timestamp(time)
            }
            None => frame,
        }
    }

    fn frame_for_ts(&self, ts: u64) -> u64 {
        match self.time_base {
            Some(tb) => {
                let rate = u64::from(self.sample_rate);
                let time = tb.calc_time(ts);
                time.seconds * rate + (time.frac * rate as f64).round() as u64
            }
            None => ts,
        }
    }

    fn pending_is_drained(&self) -> bool {
        self.pending_offset >= self.pending.len()
    }

    /// Decode packets until one for our track yields samples.
    ///
    /// Skips corrupted packets within a bounded consecutive-error budget and
    /// truncates trailing encoder padding so no sample past `frame_count`
    /// escapes. Must only be called with the pending buffer drained, since
    /// the clamp is computed from the cursor.
    fn decode_next_packet(&mut self) -> Result<Option<Vec<f32>>> {
        if self.eof {
            return Ok(None);
        }

        let mut consecutive_errors = 0;

        loop {
            let packet = match self.format_reader.next_packet() {
                Ok(packet) => {
                    consecutive_errors = 0;
                    packet
                }
                Err(SymphoniaError::ResetRequired) => {
                    return Err(DecodeError::Decoder(
                        "track list changed mid-stream".to_string(),
                    ));
                }
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    debug!(position = self.position, "end of stream");
                    self.eof = true;
                    return Ok(None);
                }
                Err(SymphoniaError::IoError(e)) => {
                    consecutive_errors += 1;
                    warn!(attempt = consecutive_errors, error = %e, "I/O error reading packet");
                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        return Err(DecodeError::Source(format!(
                            "stream I/O failure after {MAX_CONSECUTIVE_ERRORS} attempts: {e}"
                        )));
                    }
                    continue;
                }
                Err(e) => {
                    return Err(DecodeError::Decoder(format!("failed to read packet: {e}")));
                }
            };

            // Consume metadata revisions read alongside the packet.
            while !self.format_reader.metadata().is_latest() {
                self.format_reader.metadata().pop();
            }

            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    let mut samples = SampleConverter::to_interleaved_f32(&decoded);

                    // Encoders may emit trailing padding past the declared
                    // frame count; the contract never hands it out.
                    let remaining =
                        self.frame_count.saturating_sub(self.position) as usize;
                    let max_samples = remaining * usize::from(self.channels);
                    if samples.len() > max_samples {
                        samples.truncate(max_samples);
                        self.eof = true;
                    }

                    if samples.is_empty() {
                        if self.eof {
                            return Ok(None);
                        }
                        continue;
                    }
                    return Ok(Some(samples));
                }
                Err(SymphoniaError::IoError(e)) => {
                    consecutive_errors += 1;
                    warn!(attempt = consecutive_errors, error = %e, "skipping corrupted packet");
                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        return Err(DecodeError::CorruptedStream(format!(
                            "stream corruption after {MAX_CONSECUTIVE_ERRORS} failed packets"
                        )));
                    }
                    continue;
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    consecutive_errors += 1;
                    warn!(attempt = consecutive_errors, error = %e, "skipping undecodable packet");
                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        return Err(DecodeError::Decoder(format!(
                            "decoder failure after {MAX_CONSECUTIVE_ERRORS} failed packets: {e}"
                        )));
                    }
                    continue;
                }
                Err(e) => {
                    return Err(DecodeError::Decoder(format!("failed to decode packet: {e}")));
                }
            }
        }
    }
}

impl AudioSource for SymphoniaSource {
    fn codec(&self) -> AudioCodec {
        self.codec.clone()
    }

    fn channel_count(&self) -> u16 {
        self.channels
    }

    fn sampling_rate(&self) -> u32 {
        self.sample_rate
    }

    fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn current_frame_index(&self) -> u64 {
        self.position
    }

    fn seek_accuracy(&self) -> SeekAccuracy {
        // Unrecognized codecs get the bounded guarantee; only codecs known to
        // be lossless may promise sample-identical output after a seek.
        if self.codec.is_lossless() {
            SeekAccuracy::Exact
        } else {
            SeekAccuracy::Bounded {
                epsilon: LOSSY_SEEK_EPSILON,
            }
        }
    }

    fn seek_sample_frame(&mut self, target: u64) -> Result<u64> {
        if target > self.frame_count {
            return Err(DecodeError::SeekOutOfBounds {
                requested: target,
                frame_count: self.frame_count,
            });
        }

        self.pending.clear();
        self.pending_offset = 0;

        // Seeking exactly to the end is a valid cursor position with nothing
        // left to decode; the demuxer has no packet to land on there.
        if target == self.frame_count {
            self.position = target;
            self.eof = true;
            return Ok(target);
        }

        let seeked_to = self
            .format_reader
            .seek(
                SeekMode::Accurate,
                SeekTo::TimeStamp {
                    ts: self.ts_for_frame(target),
                    track_id: self.track_id,
                },
            )
            .map_err(|e| DecodeError::Decoder(format!("seek failed: {e}")))?;

        // Codec state is position-dependent; start clean from the landing
        // point reported by the demuxer.
        self.decoder.reset();
        self.eof = false;
        self.position = self.frame_for_ts(seeked_to.actual_ts);

        debug!(
            target,
            landed = self.position,
            "seeked sample frame"
        );
        Ok(self.position)
    }

    fn read_sample_frames(&mut self, frames: usize, dest: &mut [f32]) -> Result<usize> {
        let channels = usize::from(self.channels);
        let required = frames * channels;
        if dest.len() < required {
            return Err(DecodeError::BufferTooSmall {
                required,
                actual: dest.len(),
            });
        }

        let mut frames_read = 0;
        while frames_read < frames {
            if self.pending_is_drained() {
                match self.decode_next_packet()? {
                    Some(samples) => {
                        self.pending = samples;
                        self.pending_offset = 0;
                    }
                    None => break,
                }
            }

            let available = self.pending.len() - self.pending_offset;
            let wanted = (frames - frames_read) * channels;
            let take = wanted.min(available);
            let dest_offset = frames_read * channels;
            dest[dest_offset..dest_offset + take]
                .copy_from_slice(&self.pending[self.pending_offset..self.pending_offset + take]);

            self.pending_offset += take;
            frames_read += take / channels;
            self.position += (take / channels) as u64;
        }

        Ok(frames_read)
    }
}
