//! Audio format description shared by every codec.

use std::fmt;

use crate::error::{CodecError, Result};

/// PCM layout of an audio stream: rate, channel count and sample width.
///
/// A zeroed format (see [`AudioFormat::UNSET`]) means "not yet established":
/// codecs report it before `initialize` and after `reset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AudioFormat {
    /// Sample rate in Hz (e.g., 44100, 48000).
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: u16,
    /// Width of one sample in bits (16, 24, 32).
    pub bits_per_sample: u16,
}

impl AudioFormat {
    /// The all-zero format reported by uninitialized codecs.
    pub const UNSET: AudioFormat = AudioFormat {
        sample_rate: 0,
        channels: 0,
        bits_per_sample: 0,
    };

    pub const fn new(sample_rate: u32, channels: u16, bits_per_sample: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample,
        }
    }

    /// Whether this is the zeroed "not established" format.
    pub fn is_unset(&self) -> bool {
        *self == Self::UNSET
    }

    /// Bytes occupied by one sample of one channel.
    pub fn bytes_per_sample(&self) -> usize {
        (self.bits_per_sample as usize).div_ceil(8)
    }

    /// Bytes occupied by one sample of every channel (the WAV "block align").
    pub fn frame_bytes(&self) -> usize {
        self.bytes_per_sample() * self.channels as usize
    }

    /// Check that every field is positive and the bit depth is byte-aligned.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(CodecError::InvalidFormat("sample rate must be positive".into()));
        }
        if self.channels == 0 {
            return Err(CodecError::InvalidFormat("channel count must be positive".into()));
        }
        if self.bits_per_sample == 0 || self.bits_per_sample % 8 != 0 {
            return Err(CodecError::UnsupportedBitDepth(self.bits_per_sample));
        }
        Ok(())
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}Hz, {}ch, {}bit",
            self.sample_rate, self.channels, self.bits_per_sample
        )
    }
}
