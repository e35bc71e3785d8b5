//! Audio file I/O for the converter.
//!
//! WAV goes through `hound` and keeps its native integer bit depth. FLAC and
//! MP3 go through `symphonia` and come out as 16-bit PCM.

use std::fs::File;
use std::path::Path;

use anyhow::{bail, Context, Result};
use aural_codec::AudioFormat;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Interleaved little-endian integer PCM plus its format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmAudio {
    pub format: AudioFormat,
    pub data: Vec<u8>,
}

impl PcmAudio {
    /// Duration in seconds, or 0 for an unusable format.
    pub fn duration_secs(&self) -> f64 {
        let frame_bytes = self.format.frame_bytes();
        if frame_bytes == 0 || self.format.sample_rate == 0 {
            return 0.0;
        }
        (self.data.len() / frame_bytes) as f64 / self.format.sample_rate as f64
    }
}

/// Lower-cased file extension, or an empty string.
pub fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

/// Load a `.wav`, `.flac` or `.mp3` file as PCM.
pub fn load(path: &Path) -> Result<PcmAudio> {
    match extension(path).as_str() {
        "wav" => read_wav(path),
        ext @ ("flac" | "mp3") => read_compressed(path, ext),
        other => bail!("Unsupported input format: .{}", other),
    }
}

/// Read a WAV file, preserving 16/24/32-bit integer samples as-is.
///
/// 8-bit and float WAVs are converted to 16-bit.
fn read_wav(path: &Path) -> Result<PcmAudio> {
    let reader = hound::WavReader::open(path)
        .with_context(|| format!("Cannot open WAV file: {}", path.display()))?;

    let spec = reader.spec();
    let mut data = Vec::with_capacity(reader.len() as usize * 2);

    let bits = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, 16) => {
            for s in reader.into_samples::<i16>() {
                let s = s.context("Failed to read WAV sample")?;
                data.extend_from_slice(&s.to_le_bytes());
            }
            16
        }
        (hound::SampleFormat::Int, 24) => {
            for s in reader.into_samples::<i32>() {
                let s = s.context("Failed to read WAV sample")?;
                data.extend_from_slice(&s.to_le_bytes()[..3]);
            }
            24
        }
        (hound::SampleFormat::Int, 32) => {
            for s in reader.into_samples::<i32>() {
                let s = s.context("Failed to read WAV sample")?;
                data.extend_from_slice(&s.to_le_bytes());
            }
            32
        }
        (hound::SampleFormat::Int, 8) => {
            for s in reader.into_samples::<i8>() {
                let s = s.context("Failed to read WAV sample")?;
                data.extend_from_slice(&(i16::from(s) << 8).to_le_bytes());
            }
            16
        }
        (hound::SampleFormat::Float, 32) => {
            for s in reader.into_samples::<f32>() {
                let s = s.context("Failed to read WAV sample")?;
                data.extend_from_slice(&f32_to_i16(s).to_le_bytes());
            }
            16
        }
        (format, bits) => bail!("Unsupported WAV sample format: {:?} {}-bit", format, bits),
    };

    Ok(PcmAudio {
        format: AudioFormat::new(spec.sample_rate, spec.channels, bits),
        data,
    })
}

fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Decode a FLAC or MP3 file to interleaved 16-bit PCM.
fn read_compressed(path: &Path, ext: &str) -> Result<PcmAudio> {
    let file =
        File::open(path).with_context(|| format!("Cannot open file: {}", path.display()))?;
    let stream = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    hint.with_extension(ext);

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .with_context(|| format!("Failed to probe {}", path.display()))?;
    let mut reader = probed.format;

    let track = reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No decodable audio track")?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create audio decoder")?;

    let mut data = Vec::new();
    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => {
                tracing::warn!("Track list changed mid-stream, stopping");
                break;
            }
            Err(e) => return Err(e).context("Failed to read packet"),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate = spec.rate;
                channels = spec.channels.count() as u16;

                let mut samples = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
                samples.copy_interleaved_ref(decoded);
                for s in samples.samples() {
                    data.extend_from_slice(&s.to_le_bytes());
                }
            }
            Err(SymphoniaError::DecodeError(err)) => {
                tracing::warn!("Skipping undecodable packet: {}", err);
            }
            Err(e) => return Err(e).context("Failed to decode packet"),
        }
    }

    if sample_rate == 0 || channels == 0 {
        bail!("Could not determine the audio format of {}", path.display());
    }
    tracing::debug!(sample_rate, channels, bytes = data.len(), "Decoded compressed input");

    Ok(PcmAudio {
        format: AudioFormat::new(sample_rate, channels, 16),
        data,
    })
}

/// Write PCM to a canonical integer WAV file.
pub fn write_wav(path: &Path, audio: &PcmAudio) -> Result<()> {
    let format = audio.format;
    let spec = hound::WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: format.bits_per_sample,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Cannot create WAV file: {}", path.display()))?;

    match format.bits_per_sample {
        16 => {
            for b in audio.data.chunks_exact(2) {
                writer.write_sample(i16::from_le_bytes([b[0], b[1]]))?;
            }
        }
        24 => {
            for b in audio.data.chunks_exact(3) {
                writer.write_sample(i32::from_le_bytes([0, b[0], b[1], b[2]]) >> 8)?;
            }
        }
        32 => {
            for b in audio.data.chunks_exact(4) {
                writer.write_sample(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))?;
            }
        }
        other => bail!("Cannot write {}-bit WAV", other),
    }

    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_int_wav(path: &Path, bits: u16, samples: &[i32]) {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: bits,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_extension_is_lowercased() {
        assert_eq!(extension(Path::new("a/b/Song.WAV")), "wav");
        assert_eq!(extension(Path::new("track.adf")), "adf");
        assert_eq!(extension(Path::new("noext")), "");
    }

    #[test]
    fn test_read_wav_16bit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.wav");
        write_int_wav(&path, 16, &[1, -1, 300, -300]);

        let audio = load(&path).unwrap();
        assert_eq!(audio.format, AudioFormat::new(44100, 2, 16));
        assert_eq!(audio.data, vec![1, 0, 0xFF, 0xFF, 0x2C, 0x01, 0xD4, 0xFE]);
    }

    #[test]
    fn test_read_wav_24bit_keeps_depth() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.wav");
        write_int_wav(&path, 24, &[0x12_3456, -2]);

        let audio = load(&path).unwrap();
        assert_eq!(audio.format.bits_per_sample, 24);
        assert_eq!(audio.data, vec![0x56, 0x34, 0x12, 0xFE, 0xFF, 0xFF]);
    }

    #[test]
    fn test_write_wav_round_trip_24bit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let audio = PcmAudio {
            format: AudioFormat::new(48000, 2, 24),
            data: vec![0x56, 0x34, 0x12, 0xFE, 0xFF, 0xFF],
        };

        write_wav(&path, &audio).unwrap();
        assert_eq!(load(&path).unwrap(), audio);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load(Path::new("song.ogg")).unwrap_err();
        assert!(err.to_string().contains("Unsupported input format"));
    }

    #[test]
    fn test_duration() {
        let audio = PcmAudio {
            format: AudioFormat::new(48000, 2, 16),
            data: vec![0; 48000 * 4],
        };
        assert!((audio.duration_secs() - 1.0).abs() < 1e-9);
        assert_eq!(PcmAudio { format: AudioFormat::UNSET, data: vec![1] }.duration_secs(), 0.0);
    }
}
