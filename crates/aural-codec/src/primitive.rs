//! Contract between the framing engine and a block/frame codec primitive.
//!
//! A primitive knows how to turn one fixed-size PCM block into compressed
//! bytes and how to turn the bytes at a sync position back into one PCM
//! block. It knows nothing about arbitrary-sized buffers, padding, or
//! resynchronization; [`FrameCodec`](crate::FrameCodec) handles those.

use crate::error::Result;
use crate::AudioFormat;

/// One successfully decoded frame.
///
/// `pcm` borrows the decoder's scratch buffer and is valid until the next
/// call into the decoder.
#[derive(Debug, PartialEq, Eq)]
pub struct DecodedFrame<'a> {
    /// Input bytes occupied by the frame, sync byte included.
    pub consumed: usize,
    /// Sample rate declared by the frame header.
    pub sample_rate: u32,
    /// Channel count declared by the frame header.
    pub channels: u16,
    /// Interleaved little-endian PCM at the primitive's output bit depth.
    pub pcm: &'a [u8],
}

/// Encoder side of a primitive, configured for one [`AudioFormat`].
pub trait BlockEncoder: Send {
    /// Encode exactly one PCM block, appending zero or more bytes to `out`.
    ///
    /// Returns the number of input bytes consumed.
    fn encode_block(&mut self, block: &[u8], out: &mut Vec<u8>) -> Result<usize>;
}

/// Decoder side of a primitive.
pub trait FrameDecoder: Send {
    /// Decode the frame starting at `input[0]`, which is a sync byte.
    ///
    /// `input` extends to the end of the caller's buffer; the decoder must
    /// not assume any more bytes exist.
    fn decode_frame<'a>(&'a mut self, input: &[u8]) -> Result<DecodedFrame<'a>>;
}

/// A block/frame codec primitive pluggable into [`FrameCodec`](crate::FrameCodec).
pub trait FramePrimitive: Send + 'static {
    type Encoder: BlockEncoder;
    type Decoder: FrameDecoder;

    /// Registry key and codec name.
    const NAME: &'static str;
    /// First byte of every frame.
    const SYNC_BYTE: u8;
    /// Samples per channel in one encoder block.
    const BLOCK_SAMPLES: usize;
    /// Bit depth of decoded PCM.
    const OUTPUT_BITS: u16;

    /// Build an encoder for `format`, rejecting unsupported configurations.
    fn open_encoder(format: AudioFormat) -> Result<Self::Encoder>;

    /// Build a fresh decoder. Decoders learn the format from the stream.
    fn open_decoder() -> Self::Decoder;
}
