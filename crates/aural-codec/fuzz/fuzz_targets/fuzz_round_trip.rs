//! Fuzz target for ADF encode → decode.
//!
//! Interprets the input as 16-bit PCM and checks that decoding the encoded
//! stream reproduces it, zero padding aside.

#![no_main]

use aural_codec::{AdfCodec, AudioCodec, AudioFormat};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&selector, pcm)) = data.split_first() else {
        return;
    };
    let channels = if selector & 1 == 0 { 1 } else { 2 };

    let mut codec = AdfCodec::new();
    if codec
        .initialize(AudioFormat::new(48000, channels, 16))
        .is_err()
    {
        return;
    }

    let encoded = codec.encode(pcm);
    let decoded = codec.decode(&encoded);

    assert!(decoded.len() >= pcm.len());
    assert_eq!(&decoded[..pcm.len()], pcm);
    assert!(decoded[pcm.len()..].iter().all(|&b| b == 0));
});
