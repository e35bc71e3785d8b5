//! PCM codec: raw pass-through. Encode and decode both copy their input.
//! Used as the conformance baseline for the [`AudioCodec`] contract.

use crate::{AudioCodec, AudioFormat, CodecError};

/// Registry key of the pass-through codec.
pub const PCM_CODEC_NAME: &str = "pcm";

/// Pass-through codec: the "compressed" form is the PCM itself.
///
/// `initialize` only records the format; any positive format is accepted.
#[derive(Debug, Default)]
pub struct PcmCodec {
    format: AudioFormat,
}

impl PcmCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioCodec for PcmCodec {
    fn initialize(&mut self, format: AudioFormat) -> Result<(), CodecError> {
        self.reset();
        format.validate()?;
        self.format = format;
        tracing::debug!(%format, "PCM codec initialized");
        Ok(())
    }

    /// Copy the input unchanged.
    fn encode(&mut self, pcm: &[u8]) -> Vec<u8> {
        pcm.to_vec()
    }

    /// Copy the input unchanged.
    fn decode(&mut self, data: &[u8]) -> Vec<u8> {
        data.to_vec()
    }

    fn format(&self) -> AudioFormat {
        self.format
    }

    fn reset(&mut self) {
        self.format = AudioFormat::UNSET;
    }

    fn name(&self) -> &str {
        PCM_CODEC_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn initialized() -> PcmCodec {
        let mut codec = PcmCodec::new();
        codec.initialize(AudioFormat::new(44100, 2, 16)).unwrap();
        codec
    }

    #[test]
    fn test_pcm_round_trip() {
        let mut codec = initialized();
        let original: Vec<u8> = (0..=255u8).cycle().take(1000).collect();

        let encoded = codec.encode(&original);
        assert_eq!(encoded, original);

        let decoded = codec.decode(&encoded);
        assert_eq!(original, decoded, "PCM round-trip must be bit-perfect");
    }

    #[test]
    fn test_pcm_empty_input() {
        let mut codec = initialized();
        assert!(codec.encode(&[]).is_empty());
        assert!(codec.decode(&[]).is_empty());
    }

    #[test]
    fn test_pcm_format_lifecycle() {
        let mut codec = PcmCodec::new();
        assert!(codec.format().is_unset());

        codec.initialize(AudioFormat::new(96000, 6, 24)).unwrap();
        assert_eq!(codec.format(), AudioFormat::new(96000, 6, 24));

        // Decoding never revises the format of a pass-through codec.
        codec.decode(&[1, 2, 3, 4]);
        assert_eq!(codec.format(), AudioFormat::new(96000, 6, 24));

        codec.reset();
        assert!(codec.format().is_unset());
        codec.reset();
        assert!(codec.format().is_unset());
    }

    #[test]
    fn test_pcm_rejects_zero_format() {
        let mut codec = initialized();
        let result = codec.initialize(AudioFormat::new(0, 2, 16));
        assert!(matches!(result, Err(CodecError::InvalidFormat(_))));
        assert!(codec.format().is_unset(), "failed initialize leaves codec reset");

        codec.initialize(AudioFormat::new(48000, 1, 16)).unwrap();
        assert_eq!(codec.format().sample_rate, 48000);
    }

    #[test]
    fn test_pcm_name() {
        assert_eq!(PcmCodec::new().name(), "pcm");
    }
}
