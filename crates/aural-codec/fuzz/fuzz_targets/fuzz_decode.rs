//! Fuzz target for the ADF stream decoder.
//!
//! Feeds arbitrary bytes to the frame codec to find panics and hangs in
//! the resynchronization loop and the frame parser.

#![no_main]

use aural_codec::AdfCodec;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut codec = AdfCodec::new();
    let report = codec.decode_with_report(data);

    assert!(report.skipped_bytes <= data.len());
    assert!(report.false_syncs <= report.skipped_bytes);
});
