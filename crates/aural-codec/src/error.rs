//! Error types for the Aural codec crate.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Unsupported sample rate: {0}")]
    UnsupportedSampleRate(u32),

    #[error("Unsupported channel count: {0}")]
    UnsupportedChannels(u16),

    #[error("Unsupported bits per sample: {0}")]
    UnsupportedBitDepth(u16),

    #[error("Invalid audio format: {0}")]
    InvalidFormat(String),

    #[error("PCM block must be {expected} bytes, got {actual}")]
    BlockSize { expected: usize, actual: usize },

    #[error("Frame truncated: need {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("Missing sync byte: expected {expected:#04x}, found {found:#04x}")]
    BadSync { expected: u8, found: u8 },

    #[error("Header checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    HeaderChecksum { expected: u8, actual: u8 },

    #[error("Payload checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    PayloadChecksum { expected: u8, actual: u8 },

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
}

pub type Result<T> = std::result::Result<T, CodecError>;
