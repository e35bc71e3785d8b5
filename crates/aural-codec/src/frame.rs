//! Frame codec: streaming framing around a [`FramePrimitive`].
//!
//! Encoding cuts arbitrary-sized PCM into the primitive's fixed block size,
//! zero-padding the final short block. Decoding scans for the primitive's
//! sync byte, hands each candidate position to the primitive, and on any
//! failure advances one byte and scans again. Every decode step moves the
//! cursor forward, so total work is bounded by the input length even when
//! the input is entirely garbage.

use std::marker::PhantomData;

use crate::primitive::{BlockEncoder, FrameDecoder, FramePrimitive};
use crate::{AudioCodec, AudioFormat, CodecError};

/// Outcome of decoding one compressed buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeReport {
    /// Concatenated PCM of every decoded frame, in stream order.
    pub pcm: Vec<u8>,
    /// Number of frames decoded.
    pub frames: usize,
    /// Input bytes stepped over without producing a frame: leading garbage,
    /// bytes between frames, false sync candidates, and trailing partials.
    pub skipped_bytes: usize,
    /// Sync candidates the primitive rejected.
    pub false_syncs: usize,
    /// `(sample_rate, channels)` declared by the last decoded frame.
    pub stream_format: Option<(u32, u16)>,
}

/// Encode `pcm` block by block, zero-padding the final partial block.
///
/// Stops at the first primitive error and returns the bytes produced so far.
pub fn encode_blocks<E>(encoder: &mut E, pcm: &[u8], block_bytes: usize) -> Vec<u8>
where
    E: BlockEncoder + ?Sized,
{
    let mut out = Vec::new();
    if pcm.is_empty() || block_bytes == 0 {
        return out;
    }

    let mut padded = Vec::new();
    let mut blocks = 0usize;
    for chunk in pcm.chunks(block_bytes) {
        let block = if chunk.len() == block_bytes {
            chunk
        } else {
            padded.clear();
            padded.extend_from_slice(chunk);
            padded.resize(block_bytes, 0);
            padded.as_slice()
        };

        match encoder.encode_block(block, &mut out) {
            Ok(consumed) => {
                if consumed != block_bytes {
                    tracing::trace!(consumed, block_bytes, "Primitive consumed a partial block");
                }
                blocks += 1;
            }
            Err(e) => {
                tracing::warn!(
                    block = blocks,
                    produced = out.len(),
                    "Encoding stopped early: {}",
                    e
                );
                break;
            }
        }
    }

    tracing::debug!(blocks, input = pcm.len(), output = out.len(), "Encoded PCM");
    out
}

/// Decode every frame found in `input`, skipping anything that is not one.
pub fn decode_stream<D>(decoder: &mut D, sync: u8, input: &[u8]) -> DecodeReport
where
    D: FrameDecoder + ?Sized,
{
    let mut report = DecodeReport::default();
    let mut cursor = 0usize;

    while cursor < input.len() {
        let Some(offset) = input[cursor..].iter().position(|&b| b == sync) else {
            report.skipped_bytes += input.len() - cursor;
            break;
        };
        report.skipped_bytes += offset;
        cursor += offset;

        let remaining = input.len() - cursor;
        match decoder.decode_frame(&input[cursor..]) {
            Ok(frame) if frame.consumed > 0 && frame.consumed <= remaining => {
                report.pcm.extend_from_slice(frame.pcm);
                report.stream_format = Some((frame.sample_rate, frame.channels));
                report.frames += 1;
                cursor += frame.consumed;
            }
            Ok(frame) => {
                tracing::trace!(
                    offset = cursor,
                    consumed = frame.consumed,
                    "Rejecting frame with impossible length"
                );
                report.false_syncs += 1;
                report.skipped_bytes += 1;
                cursor += 1;
            }
            Err(e) => {
                tracing::trace!(offset = cursor, "False sync: {}", e);
                report.false_syncs += 1;
                report.skipped_bytes += 1;
                cursor += 1;
            }
        }
    }

    tracing::debug!(
        frames = report.frames,
        skipped = report.skipped_bytes,
        false_syncs = report.false_syncs,
        output = report.pcm.len(),
        "Decoded stream"
    );
    report
}

/// Codec built from a [`FramePrimitive`].
///
/// Holds independent encoder and decoder contexts; either, both, or neither
/// may be live. The encoder exists only after a successful `initialize`
/// and keeps that format until the next `initialize` or `reset`. The decoder
/// is created on first use and revises the reported format from each frame
/// it decodes.
pub struct FrameCodec<P: FramePrimitive> {
    /// Reported by [`AudioCodec::format`]; decoding may revise it.
    format: AudioFormat,
    /// Fixed by `initialize`; sizes encoder blocks.
    encode_format: AudioFormat,
    encoder: Option<P::Encoder>,
    decoder: Option<P::Decoder>,
    _primitive: PhantomData<fn() -> P>,
}

impl<P: FramePrimitive> FrameCodec<P> {
    pub fn new() -> Self {
        Self {
            format: AudioFormat::UNSET,
            encode_format: AudioFormat::UNSET,
            encoder: None,
            decoder: None,
            _primitive: PhantomData,
        }
    }

    /// Bytes of PCM in one encoder block at the initialized format.
    pub fn block_bytes(&self) -> usize {
        P::BLOCK_SAMPLES * self.encode_format.frame_bytes()
    }

    /// Whether an encoder context is live.
    pub fn is_encoding_ready(&self) -> bool {
        self.encoder.is_some()
    }

    /// Whether a decoder context is live.
    pub fn is_decoding_ready(&self) -> bool {
        self.decoder.is_some()
    }

    /// Decode like [`AudioCodec::decode`], returning the full report.
    pub fn decode_with_report(&mut self, data: &[u8]) -> DecodeReport {
        if data.is_empty() {
            return DecodeReport::default();
        }

        let decoder = self.decoder.get_or_insert_with(P::open_decoder);
        let report = decode_stream(decoder, P::SYNC_BYTE, data);

        if let Some((sample_rate, channels)) = report.stream_format {
            self.format = AudioFormat::new(sample_rate, channels, P::OUTPUT_BITS);
        }
        report
    }
}

impl<P: FramePrimitive> Default for FrameCodec<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: FramePrimitive> AudioCodec for FrameCodec<P> {
    fn initialize(&mut self, format: AudioFormat) -> Result<(), CodecError> {
        self.reset();
        format.validate()?;

        match P::open_encoder(format) {
            Ok(encoder) => {
                self.encoder = Some(encoder);
                self.encode_format = format;
                self.format = format;
                tracing::debug!(codec = P::NAME, %format, "Frame codec initialized");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(codec = P::NAME, %format, "Rejected configuration: {}", e);
                Err(e)
            }
        }
    }

    fn encode(&mut self, pcm: &[u8]) -> Vec<u8> {
        let block_bytes = self.block_bytes();
        match self.encoder.as_mut() {
            Some(encoder) => encode_blocks(encoder, pcm, block_bytes),
            None => {
                if !pcm.is_empty() {
                    tracing::warn!(codec = P::NAME, "encode called before initialize");
                }
                Vec::new()
            }
        }
    }

    fn decode(&mut self, data: &[u8]) -> Vec<u8> {
        self.decode_with_report(data).pcm
    }

    fn format(&self) -> AudioFormat {
        self.format
    }

    fn reset(&mut self) {
        if self.encoder.is_some() || self.decoder.is_some() {
            tracing::debug!(codec = P::NAME, "Releasing codec contexts");
        }
        self.encoder = None;
        self.decoder = None;
        self.encode_format = AudioFormat::UNSET;
        self.format = AudioFormat::UNSET;
    }

    fn name(&self) -> &str {
        P::NAME
    }
}
