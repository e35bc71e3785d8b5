//! # aural-codec
//!
//! Pluggable audio codecs behind one capability interface.
//! Provides:
//! - **[`AudioCodec`]**: the six-operation contract every codec satisfies
//! - **[`CodecRegistry`]**: process-wide, lock-guarded name → constructor map
//! - **[`PcmCodec`]**: pass-through baseline (`"pcm"`)
//! - **[`FrameCodec`]**: block chunking on encode, sync-byte resynchronization
//!   on decode, generic over a [`FramePrimitive`]
//! - **[`AdfPrimitive`]**: built-in delta-frame primitive (`"adf"`)
//!
//! ## Example
//! ```rust
//! use aural_codec::{AudioFormat, CodecRegistry};
//!
//! let mut codec = CodecRegistry::global().create("adf").unwrap();
//! codec.initialize(AudioFormat::new(44100, 2, 16)).unwrap();
//!
//! let silence = vec![0u8; 128 * 2 * 2];
//! let compressed = codec.encode(&silence);
//! assert!(!compressed.is_empty());
//!
//! let pcm = codec.decode(&compressed);
//! assert_eq!(pcm, silence);
//! assert_eq!(codec.format(), AudioFormat::new(44100, 2, 16));
//! ```

pub mod adf;
pub mod error;
pub mod format;
pub mod frame;
pub mod pcm;
pub mod primitive;
pub mod registry;

pub use adf::{AdfCodec, AdfPrimitive};
pub use error::CodecError;
pub use format::AudioFormat;
pub use frame::{DecodeReport, FrameCodec};
pub use pcm::PcmCodec;
pub use primitive::{BlockEncoder, DecodedFrame, FrameDecoder, FramePrimitive};
pub use registry::{CodecConstructor, CodecRegistry};

/// Unified codec trait for all hosted codecs.
///
/// Instances are single-owner and not internally synchronized; callers
/// serialize access. `encode` and `decode` never fail: an empty vector is
/// returned when there is no input or nothing could be produced.
pub trait AudioCodec: Send {
    /// (Re)configure the codec for the given PCM format.
    ///
    /// Always resets prior state first. On error the codec is left reset and
    /// may be initialized again with different parameters.
    fn initialize(&mut self, format: AudioFormat) -> Result<(), CodecError>;

    /// Encode interleaved PCM bytes into the codec's compressed form.
    fn encode(&mut self, pcm: &[u8]) -> Vec<u8>;

    /// Decode compressed bytes back to interleaved PCM.
    ///
    /// May revise [`AudioCodec::format`] to whatever the stream declares.
    fn decode(&mut self, data: &[u8]) -> Vec<u8>;

    /// The most recently configured or discovered format.
    fn format(&self) -> AudioFormat;

    /// Release internal state and zero the format. Idempotent.
    fn reset(&mut self);

    /// Registry key this codec was constructed under.
    fn name(&self) -> &str;
}
