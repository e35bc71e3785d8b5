//! Aural CLI: converts between PCM audio files and compressed codec streams.
//!
//! Direction is chosen from the file extensions: any supported audio input
//! with a `.<codec>` output encodes; a `.<codec>` input with a `.wav` output
//! decodes.
//!
//! # Usage
//!
//! ```bash
//! aural if=song.wav of=song.adf
//! aural if=song.flac                 # writes song.flac.adf
//! aural if=song.adf of=restored.wav
//! aural --codec pcm if=song.mp3 of=song.pcm
//! aural --list-codecs
//! ```

mod audio;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use aural_codec::{AudioCodec, AudioFormat, CodecRegistry};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::audio::PcmAudio;

/// Format assumed for decoded audio when the codec reports none.
const FALLBACK_FORMAT: AudioFormat = AudioFormat::new(48000, 2, 16);

// ───────────────────────────── CLI definition ─────────────────────────────

/// Top-level CLI entry point for the `aural` binary.
#[derive(Parser)]
#[command(
    name = "aural",
    about = "Convert audio files to and from Aural codec streams",
    version
)]
struct Cli {
    /// `if=<input_file>` and `of=<output_file>` operands.
    #[arg(value_name = "OPERAND", value_parser = parse_operand)]
    operands: Vec<Operand>,

    /// Codec to convert with; also the compressed file extension.
    #[arg(short, long, default_value = "adf")]
    codec: String,

    /// Print the registered codecs and exit.
    #[arg(long)]
    list_codecs: bool,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long)]
    verbose: bool,
}

/// A dd-style `key=value` operand.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Operand {
    Input(PathBuf),
    Output(PathBuf),
}

fn parse_operand(arg: &str) -> Result<Operand, String> {
    if let Some(path) = arg.strip_prefix("if=") {
        Ok(Operand::Input(PathBuf::from(path)))
    } else if let Some(path) = arg.strip_prefix("of=") {
        Ok(Operand::Output(PathBuf::from(path)))
    } else {
        Err(format!("expected if=<path> or of=<path>, got '{arg}'"))
    }
}

/// Conversion direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Encode,
    Decode,
}

/// Pick the direction from the file extensions.
fn detect_mode(input: &Path, output: &Path, codec_ext: &str) -> Result<Mode> {
    let in_ext = audio::extension(input);
    let out_ext = audio::extension(output);

    if out_ext == codec_ext {
        Ok(Mode::Encode)
    } else if in_ext == codec_ext && out_ext == "wav" {
        Ok(Mode::Decode)
    } else {
        bail!(
            "Invalid conversion path: must be audio -> .{codec_ext} or .{codec_ext} -> .wav"
        )
    }
}

/// Output path used when `of=` is omitted.
fn default_output(input: &Path, codec_ext: &str) -> PathBuf {
    let suffix = if audio::extension(input) == codec_ext {
        "wav"
    } else {
        codec_ext
    };
    let mut name = input.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

fn print_usage(codec_ext: &str) {
    println!("Usage: aural if=<input_file> [of=<output_file>] [--codec <name>]");
    println!("  Auto-detects direction based on extension.");
    println!("  Supported input:  .wav, .flac, .mp3, .{codec_ext}");
    println!("  Supported output: .{codec_ext}, .wav");
}

// ────────────────────────────── main ──────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if cli.list_codecs {
        for name in CodecRegistry::global().names() {
            println!("{name}");
        }
        return Ok(());
    }

    let mut input = None;
    let mut output = None;
    for operand in cli.operands {
        match operand {
            Operand::Input(path) => input = Some(path),
            Operand::Output(path) => output = Some(path),
        }
    }

    let codec_ext = cli.codec.to_ascii_lowercase();
    let Some(input) = input else {
        print_usage(&codec_ext);
        return Ok(());
    };
    let output = output.unwrap_or_else(|| default_output(&input, &codec_ext));

    let mode = detect_mode(&input, &output, &codec_ext)?;
    let codec = create_codec(&cli.codec)?;

    match mode {
        Mode::Encode => cmd_encode(codec, &input, &output),
        Mode::Decode => cmd_decode(codec, &input, &output),
    }
}

fn create_codec(name: &str) -> Result<Box<dyn AudioCodec>> {
    let registry = CodecRegistry::global();
    registry.create(name).with_context(|| {
        format!(
            "Unknown codec '{}'. Available codecs: {}",
            name,
            registry.names().join(", ")
        )
    })
}

// ──────────────────────────── encode ──────────────────────────────

/// Encode a WAV/FLAC/MP3 file into a compressed stream file.
fn cmd_encode(mut codec: Box<dyn AudioCodec>, input: &Path, output: &Path) -> Result<()> {
    let audio = audio::load(input)
        .with_context(|| format!("Failed to load input file: {}", input.display()))?;

    println!("\n  Aural Encoder");
    println!("  ============================================");
    println!("  Input:  {}", input.display());
    println!("  Source: {} ({:.2}s)", audio.format, audio.duration_secs());
    println!("  Codec:  {}", codec.name());

    codec
        .initialize(audio.format)
        .with_context(|| format!("Codec '{}' cannot encode {}", codec.name(), audio.format))?;

    let encoded = codec.encode(&audio.data);
    if encoded.is_empty() {
        bail!("Encoding failed: codec produced no output");
    }

    std::fs::write(output, &encoded)
        .with_context(|| format!("Failed to write output file: {}", output.display()))?;

    let ratio = audio.data.len() as f64 / encoded.len() as f64;
    println!("  --------------------------------------------");
    println!("  Output: {} ({} bytes)", output.display(), encoded.len());
    println!("  Ratio:  {:.2}:1", ratio);
    println!("  Done!\n");

    Ok(())
}

// ──────────────────────────── decode ──────────────────────────────

/// Decode a compressed stream file into a 16-bit PCM WAV.
fn cmd_decode(mut codec: Box<dyn AudioCodec>, input: &Path, output: &Path) -> Result<()> {
    let data = std::fs::read(input)
        .with_context(|| format!("Failed to open input file: {}", input.display()))?;
    if data.is_empty() {
        bail!("Input file is empty: {}", input.display());
    }

    println!("\n  Aural Decoder");
    println!("  ============================================");
    println!("  Input:  {} ({} bytes)", input.display(), data.len());
    println!("  Codec:  {}", codec.name());

    let pcm = codec.decode(&data);
    if pcm.is_empty() {
        bail!("Decoding failed: no audio frames found");
    }

    let mut format = codec.format();
    if format.is_unset() {
        tracing::warn!(
            "Could not retrieve decoded format, defaulting to {}",
            FALLBACK_FORMAT
        );
        format = FALLBACK_FORMAT;
    }
    println!("  Decoded format: {}", format);

    let audio = PcmAudio { format, data: pcm };
    audio::write_wav(output, &audio)
        .with_context(|| format!("Failed to write WAV file: {}", output.display()))?;

    println!("  --------------------------------------------");
    println!("  Output: {} ({:.2}s)", output.display(), audio.duration_secs());
    println!("  Done!\n");

    Ok(())
}
