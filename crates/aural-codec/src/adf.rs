//! # ADF: Aural Delta Frames
//!
//! Built-in frame primitive backing the `"adf"` codec. Each frame carries one
//! block of [`ADF_BLOCK_SAMPLES`] samples per channel, coded as a verbatim
//! first sample followed by zigzag-coded first-order residuals bit-packed at
//! the narrowest width that fits the block.
//!
//! ## Frame layout
//!
//! - `[0]`      sync: `0xAA`
//! - `[1]`      `rate_index << 5 | channel_mode << 3` (low 3 bits zero)
//! - `[2..4]`   payload length: u16 big-endian
//! - `[4]`      CRC-8 of bytes `[0..4]`
//! - payload    per channel: first sample (i16 BE), residual width (u8),
//!   127 residuals packed MSB-first, padded to a byte boundary
//! - trailer    CRC-8 of the payload
//!
//! Encoder input may be 16, 24 or 32-bit signed little-endian PCM; wider
//! samples keep their top 16 bits. Decoded PCM is always 16-bit.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::error::{CodecError, Result};
use crate::frame::FrameCodec;
use crate::primitive::{BlockEncoder, DecodedFrame, FrameDecoder, FramePrimitive};
use crate::AudioFormat;

/// Registry key of the ADF codec, also its file extension.
pub const ADF_CODEC_NAME: &str = "adf";

/// First byte of every ADF frame.
pub const ADF_SYNC: u8 = 0xAA;

/// Samples per channel carried by one frame.
pub const ADF_BLOCK_SAMPLES: usize = 128;

/// Size of the fixed frame header in bytes.
pub const ADF_HEADER_SIZE: usize = 5;

/// Sample rates expressible in the header, indexed by `rate_index`.
pub const ADF_SAMPLE_RATES: [u32; 4] = [44100, 48000, 88200, 96000];

/// Bit depth of decoded PCM.
pub const ADF_OUTPUT_BITS: u16 = 16;

/// Zigzag residuals of 16-bit samples span at most 17 bits.
const MAX_RESIDUAL_BITS: u8 = 17;

const RESIDUALS_PER_CHANNEL: usize = ADF_BLOCK_SAMPLES - 1;

/// The `"adf"` codec.
pub type AdfCodec = FrameCodec<AdfPrimitive>;

/// Marker type implementing [`FramePrimitive`] for ADF.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdfPrimitive;

impl FramePrimitive for AdfPrimitive {
    type Encoder = AdfEncoder;
    type Decoder = AdfDecoder;

    const NAME: &'static str = ADF_CODEC_NAME;
    const SYNC_BYTE: u8 = ADF_SYNC;
    const BLOCK_SAMPLES: usize = ADF_BLOCK_SAMPLES;
    const OUTPUT_BITS: u16 = ADF_OUTPUT_BITS;

    fn open_encoder(format: AudioFormat) -> Result<AdfEncoder> {
        AdfEncoder::new(format)
    }

    fn open_decoder() -> AdfDecoder {
        AdfDecoder::default()
    }
}

// ───────────────────────────── header ─────────────────────────────

/// Decoded form of the 5-byte frame header.
///
/// Only [`FrameHeader::parse`] and the encoder build one, so `rate_index`
/// always names an entry of [`ADF_SAMPLE_RATES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    rate_index: u8,
    /// Two channels when set, one otherwise.
    stereo: bool,
    /// Payload length in bytes (excluding header and trailer).
    payload_len: u16,
}

impl FrameHeader {
    pub fn sample_rate(&self) -> u32 {
        ADF_SAMPLE_RATES
            .get(self.rate_index as usize)
            .copied()
            .unwrap_or(0)
    }

    pub fn payload_len(&self) -> usize {
        self.payload_len as usize
    }

    pub fn channels(&self) -> u16 {
        if self.stereo {
            2
        } else {
            1
        }
    }

    /// Total frame size: header, payload and trailer.
    pub fn frame_len(&self) -> usize {
        ADF_HEADER_SIZE + self.payload_len as usize + 1
    }

    fn write(&self, out: &mut Vec<u8>) {
        let mut header = [0u8; ADF_HEADER_SIZE];
        header[0] = ADF_SYNC;
        header[1] = (self.rate_index << 5) | ((self.stereo as u8) << 3);
        BigEndian::write_u16(&mut header[2..4], self.payload_len);
        header[4] = crc8(&header[..4]);
        out.extend_from_slice(&header);
    }

    /// Parse and verify the header at the start of `input`.
    pub fn parse(input: &[u8]) -> Result<Self> {
        if input.len() < ADF_HEADER_SIZE {
            return Err(CodecError::Truncated {
                needed: ADF_HEADER_SIZE,
                available: input.len(),
            });
        }
        if input[0] != ADF_SYNC {
            return Err(CodecError::BadSync {
                expected: ADF_SYNC,
                found: input[0],
            });
        }
        let expected = crc8(&input[..4]);
        if input[4] != expected {
            return Err(CodecError::HeaderChecksum {
                expected,
                actual: input[4],
            });
        }

        let config = input[1];
        if config & 0x07 != 0 {
            return Err(CodecError::InvalidFrame("reserved header bits set".into()));
        }
        let rate_index = config >> 5;
        if rate_index as usize >= ADF_SAMPLE_RATES.len() {
            return Err(CodecError::InvalidFrame(format!(
                "sample rate index {rate_index} out of range"
            )));
        }
        let channel_mode = (config >> 3) & 0x03;
        if channel_mode > 1 {
            return Err(CodecError::InvalidFrame(format!(
                "channel mode {channel_mode} out of range"
            )));
        }

        Ok(Self {
            rate_index,
            stereo: channel_mode == 1,
            payload_len: BigEndian::read_u16(&input[2..4]),
        })
    }
}

/// CRC-8, polynomial 0x07, zero initial value.
fn crc8(bytes: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in bytes {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x07
            } else {
                crc << 1
            };
        }
    }
    crc
}

fn zigzag(delta: i32) -> u32 {
    ((delta << 1) ^ (delta >> 31)) as u32
}

fn unzigzag(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

fn packed_len(width: u8) -> usize {
    (RESIDUALS_PER_CHANNEL * width as usize).div_ceil(8)
}

// ───────────────────────────── bit packing ─────────────────────────────

struct BitWriter<'a> {
    out: &'a mut Vec<u8>,
    acc: u64,
    bits: u32,
}

impl<'a> BitWriter<'a> {
    fn new(out: &'a mut Vec<u8>) -> Self {
        Self { out, acc: 0, bits: 0 }
    }

    fn write(&mut self, value: u32, width: u32) {
        self.acc = (self.acc << width) | value as u64;
        self.bits += width;
        while self.bits >= 8 {
            self.bits -= 8;
            self.out.push((self.acc >> self.bits) as u8);
        }
        self.acc &= (1u64 << self.bits) - 1;
    }

    fn finish(self) {
        if self.bits > 0 {
            self.out.push((self.acc << (8 - self.bits)) as u8);
        }
    }
}

struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    acc: u64,
    bits: u32,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            acc: 0,
            bits: 0,
        }
    }

    fn read(&mut self, width: u32) -> Option<u32> {
        while self.bits < width {
            let byte = *self.data.get(self.pos)?;
            self.pos += 1;
            self.acc = (self.acc << 8) | byte as u64;
            self.bits += 8;
        }
        self.bits -= width;
        let value = (self.acc >> self.bits) & ((1u64 << width) - 1);
        self.acc &= (1u64 << self.bits) - 1;
        Some(value as u32)
    }
}

// ───────────────────────────── encoder ─────────────────────────────

/// ADF block encoder configured for one input format.
#[derive(Debug)]
pub struct AdfEncoder {
    format: AudioFormat,
    rate_index: u8,
    channels: Vec<Vec<i16>>,
    payload: Vec<u8>,
}

impl AdfEncoder {
    /// Validate `format` against what the frame header can express.
    pub fn new(format: AudioFormat) -> Result<Self> {
        let rate_index = ADF_SAMPLE_RATES
            .iter()
            .position(|&rate| rate == format.sample_rate)
            .ok_or(CodecError::UnsupportedSampleRate(format.sample_rate))?;
        if !matches!(format.channels, 1 | 2) {
            return Err(CodecError::UnsupportedChannels(format.channels));
        }
        if !matches!(format.bits_per_sample, 16 | 24 | 32) {
            return Err(CodecError::UnsupportedBitDepth(format.bits_per_sample));
        }

        Ok(Self {
            format,
            rate_index: rate_index as u8,
            channels: vec![Vec::with_capacity(ADF_BLOCK_SAMPLES); format.channels as usize],
            payload: Vec::new(),
        })
    }

    fn read_sample(&self, bytes: &[u8]) -> i16 {
        match self.format.bits_per_sample {
            24 => (LittleEndian::read_i24(bytes) >> 8) as i16,
            32 => (LittleEndian::read_i32(bytes) >> 16) as i16,
            _ => LittleEndian::read_i16(bytes),
        }
    }
}

impl BlockEncoder for AdfEncoder {
    fn encode_block(&mut self, block: &[u8], out: &mut Vec<u8>) -> Result<usize> {
        let expected = ADF_BLOCK_SAMPLES * self.format.frame_bytes();
        if block.len() != expected {
            return Err(CodecError::BlockSize {
                expected,
                actual: block.len(),
            });
        }

        let bytes_per_sample = self.format.bytes_per_sample();
        let mut channels = std::mem::take(&mut self.channels);
        for samples in channels.iter_mut() {
            samples.clear();
        }
        for frame in block.chunks_exact(self.format.frame_bytes()) {
            for (samples, sample) in channels.iter_mut().zip(frame.chunks_exact(bytes_per_sample)) {
                samples.push(self.read_sample(sample));
            }
        }

        self.payload.clear();
        for samples in &channels {
            encode_channel(samples, &mut self.payload);
        }
        self.channels = channels;

        let header = FrameHeader {
            rate_index: self.rate_index,
            stereo: self.format.channels == 2,
            payload_len: self.payload.len() as u16,
        };
        header.write(out);
        out.extend_from_slice(&self.payload);
        out.push(crc8(&self.payload));

        Ok(block.len())
    }
}

fn encode_channel(samples: &[i16], payload: &mut Vec<u8>) {
    let first = samples[0];
    payload.extend_from_slice(&first.to_be_bytes());

    let residuals: Vec<u32> = samples
        .windows(2)
        .map(|pair| zigzag(pair[1] as i32 - pair[0] as i32))
        .collect();
    let max = residuals.iter().copied().max().unwrap_or(0);
    let width = u32::BITS - max.leading_zeros();
    payload.push(width as u8);

    let mut writer = BitWriter::new(payload);
    for &residual in &residuals {
        writer.write(residual, width);
    }
    writer.finish();
}

// ───────────────────────────── decoder ─────────────────────────────

/// ADF frame decoder. Stateless between frames apart from scratch buffers.
#[derive(Debug, Default)]
pub struct AdfDecoder {
    channels: Vec<Vec<i16>>,
    pcm: Vec<u8>,
}

impl FrameDecoder for AdfDecoder {
    fn decode_frame<'a>(&'a mut self, input: &[u8]) -> Result<DecodedFrame<'a>> {
        let header = FrameHeader::parse(input)?;
        let frame_len = header.frame_len();
        if input.len() < frame_len {
            return Err(CodecError::Truncated {
                needed: frame_len,
                available: input.len(),
            });
        }

        let payload = &input[ADF_HEADER_SIZE..frame_len - 1];
        let expected = crc8(payload);
        let actual = input[frame_len - 1];
        if actual != expected {
            return Err(CodecError::PayloadChecksum { expected, actual });
        }

        let channel_count = header.channels() as usize;
        self.channels.resize_with(channel_count, Vec::new);
        let mut offset = 0usize;
        for samples in self.channels.iter_mut().take(channel_count) {
            offset += decode_channel(&payload[offset..], samples)?;
        }
        if offset != payload.len() {
            return Err(CodecError::InvalidFrame(format!(
                "payload length {} but channels occupy {}",
                payload.len(),
                offset
            )));
        }

        self.pcm.clear();
        self.pcm.resize(ADF_BLOCK_SAMPLES * channel_count * 2, 0);
        for (i, out) in self.pcm.chunks_exact_mut(2).enumerate() {
            let sample = self.channels[i % channel_count][i / channel_count];
            LittleEndian::write_i16(out, sample);
        }

        Ok(DecodedFrame {
            consumed: frame_len,
            sample_rate: header.sample_rate(),
            channels: header.channels(),
            pcm: &self.pcm,
        })
    }
}

/// Decode one channel from the front of `payload`; returns bytes used.
fn decode_channel(payload: &[u8], samples: &mut Vec<i16>) -> Result<usize> {
    if payload.len() < 3 {
        return Err(CodecError::InvalidFrame("channel header cut short".into()));
    }
    let first = BigEndian::read_i16(&payload[..2]);
    let width = payload[2];
    if width > MAX_RESIDUAL_BITS {
        return Err(CodecError::InvalidFrame(format!(
            "residual width {width} exceeds {MAX_RESIDUAL_BITS}"
        )));
    }
    let used = 3 + packed_len(width);
    if payload.len() < used {
        return Err(CodecError::InvalidFrame("channel residuals cut short".into()));
    }

    samples.clear();
    samples.push(first);
    let mut reader = BitReader::new(&payload[3..used]);
    let mut previous = first as i32;
    for _ in 0..RESIDUALS_PER_CHANNEL {
        let residual = reader
            .read(width as u32)
            .ok_or_else(|| CodecError::InvalidFrame("residual bits exhausted".into()))?;
        let sample = previous + unzigzag(residual);
        let sample = i16::try_from(sample)
            .map_err(|_| CodecError::InvalidFrame(format!("sample {sample} out of range")))?;
        samples.push(sample);
        previous = sample as i32;
    }

    Ok(used)
}
