//! C FFI bindings for the Aural codec library.
//!
//! Exposes codecs from the process-wide registry through opaque handles, so
//! any language that can call C functions (Python, Swift, Go, C++, etc.) can
//! encode and decode without knowing the Rust object model.
//!
//! # Ownership
//!
//! - A handle from [`aural_codec_create`] belongs to the caller until it is
//!   passed to [`aural_codec_destroy`].
//! - Every non-null buffer returned by [`aural_codec_encode`] or
//!   [`aural_codec_decode`] must be released exactly once with
//!   [`aural_free_buffer`], and never with `free()`.
//! - Strings returned by [`aural_version`] and [`aural_codec_name`] are
//!   owned by the library and must not be freed.
//!
//! # Safety
//!
//! All functions in this module use raw pointers and are `unsafe` by nature
//! of the C FFI. Null handles and null buffers are rejected (null/false is
//! returned). Callers must ensure that:
//! - Non-null pointers are valid for the stated lengths
//! - Strings are null-terminated
//! - A handle is used from one thread at a time

pub mod buffer;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use aural_codec::{AudioCodec, AudioFormat, CodecRegistry};

/// Opaque handle to one codec instance.
///
/// Created by [`aural_codec_create`] and must be freed with
/// [`aural_codec_destroy`].
pub struct AuralCodecHandle {
    codec: Box<dyn AudioCodec>,
    name: CString,
}

/// Which direction a buffer call runs the codec in.
#[derive(Clone, Copy)]
enum Direction {
    Encode,
    Decode,
}

// ─────────────────────────── Core API ───────────────────────────

/// Return the library version string.
///
/// The returned pointer is valid for the lifetime of the library.
/// Do NOT free the returned string.
#[no_mangle]
pub extern "C" fn aural_version() -> *const c_char {
    c"0.1.0".as_ptr()
}

/// Create a codec instance by registry name (e.g. `"adf"`, `"pcm"`).
///
/// Returns null for unknown names. The caller must call
/// [`aural_codec_destroy`] when done.
///
/// # Safety
///
/// `name` must be a valid null-terminated string, or null.
#[no_mangle]
pub unsafe extern "C" fn aural_codec_create(name: *const c_char) -> *mut AuralCodecHandle {
    if name.is_null() {
        return ptr::null_mut();
    }

    let c_name = unsafe { CStr::from_ptr(name) };
    let Ok(key) = c_name.to_str() else {
        return ptr::null_mut();
    };

    match CodecRegistry::global().create(key) {
        Some(codec) => Box::into_raw(Box::new(AuralCodecHandle {
            codec,
            name: c_name.to_owned(),
        })),
        None => ptr::null_mut(),
    }
}

/// Destroy a codec handle, releasing all codec state.
///
/// # Safety
///
/// `handle` must be a valid pointer returned by [`aural_codec_create`], or
/// null. After calling this function, the handle is invalid and must not be
/// used.
#[no_mangle]
pub unsafe extern "C" fn aural_codec_destroy(handle: *mut AuralCodecHandle) {
    if !handle.is_null() {
        let mut handle = unsafe { Box::from_raw(handle) };
        handle.codec.reset();
    }
}

/// Configure the codec for the given PCM format.
///
/// Returns `false` for null handles, negative or out-of-range values, and
/// formats the codec does not support. The handle stays usable either way.
///
/// # Safety
///
/// `handle` must be a valid pointer returned by [`aural_codec_create`], or
/// null.
#[no_mangle]
pub unsafe extern "C" fn aural_codec_initialize(
    handle: *mut AuralCodecHandle,
    sample_rate: i32,
    channels: i32,
    bits_per_sample: i32,
) -> bool {
    let Some(handle) = (unsafe { handle.as_mut() }) else {
        return false;
    };

    let format = match (
        u32::try_from(sample_rate),
        u16::try_from(channels),
        u16::try_from(bits_per_sample),
    ) {
        (Ok(rate), Ok(ch), Ok(bits)) => AudioFormat::new(rate, ch, bits),
        _ => {
            handle.codec.reset();
            return false;
        }
    };

    handle.codec.initialize(format).is_ok()
}

/// Encode `in_size` bytes of interleaved PCM.
///
/// Returns a buffer of `*out_size` bytes that must be released with
/// [`aural_free_buffer`]. Returns null with `*out_size = 0` when there is
/// nothing to return, when an argument is null, or when allocation fails.
///
/// # Safety
///
/// `handle` must be valid or null. `input` must point to `in_size` readable
/// bytes or be null. `out_size` must be a valid writable pointer or null.
#[no_mangle]
pub unsafe extern "C" fn aural_codec_encode(
    handle: *mut AuralCodecHandle,
    input: *const u8,
    in_size: usize,
    out_size: *mut usize,
) -> *mut u8 {
    unsafe { run(handle, input, in_size, out_size, Direction::Encode) }
}

/// Decode `in_size` compressed bytes to interleaved PCM.
///
/// Ownership and failure reporting are the same as [`aural_codec_encode`].
/// May update the format reported by [`aural_codec_get_last_format`].
///
/// # Safety
///
/// Same requirements as [`aural_codec_encode`].
#[no_mangle]
pub unsafe extern "C" fn aural_codec_decode(
    handle: *mut AuralCodecHandle,
    input: *const u8,
    in_size: usize,
    out_size: *mut usize,
) -> *mut u8 {
    unsafe { run(handle, input, in_size, out_size, Direction::Decode) }
}

unsafe fn run(
    handle: *mut AuralCodecHandle,
    input: *const u8,
    in_size: usize,
    out_size: *mut usize,
    direction: Direction,
) -> *mut u8 {
    let Some(out_size) = (unsafe { out_size.as_mut() }) else {
        return ptr::null_mut();
    };
    *out_size = 0;

    let Some(handle) = (unsafe { handle.as_mut() }) else {
        return ptr::null_mut();
    };
    if input.is_null() || in_size == 0 {
        return ptr::null_mut();
    }

    let input = unsafe { std::slice::from_raw_parts(input, in_size) };
    let output = match direction {
        Direction::Encode => handle.codec.encode(input),
        Direction::Decode => handle.codec.decode(input),
    };

    let exported = buffer::export(&output);
    if !exported.is_null() {
        *out_size = output.len();
    }
    exported
}

/// Read the most recently configured or discovered format.
///
/// Returns `false` if any pointer is null. An uninitialized codec reports
/// zeros.
///
/// # Safety
///
/// `handle` must be valid or null; the out pointers must be writable or
/// null.
#[no_mangle]
pub unsafe extern "C" fn aural_codec_get_last_format(
    handle: *const AuralCodecHandle,
    sample_rate: *mut i32,
    channels: *mut i32,
    bits_per_sample: *mut i32,
) -> bool {
    let Some(handle) = (unsafe { handle.as_ref() }) else {
        return false;
    };
    if sample_rate.is_null() || channels.is_null() || bits_per_sample.is_null() {
        return false;
    }

    let format = handle.codec.format();
    let Ok(rate) = i32::try_from(format.sample_rate) else {
        return false;
    };
    unsafe {
        *sample_rate = rate;
        *channels = i32::from(format.channels);
        *bits_per_sample = i32::from(format.bits_per_sample);
    }
    true
}

/// Release codec state and zero the format. Null is ignored.
///
/// # Safety
///
/// `handle` must be a valid pointer returned by [`aural_codec_create`], or
/// null.
#[no_mangle]
pub unsafe extern "C" fn aural_codec_reset(handle: *mut AuralCodecHandle) {
    if let Some(handle) = unsafe { handle.as_mut() } {
        handle.codec.reset();
    }
}

/// Registry name of the codec behind `handle`, or null.
///
/// The string is owned by the handle and valid until it is destroyed.
///
/// # Safety
///
/// `handle` must be a valid pointer returned by [`aural_codec_create`], or
/// null.
#[no_mangle]
pub unsafe extern "C" fn aural_codec_name(handle: *const AuralCodecHandle) -> *const c_char {
    match unsafe { handle.as_ref() } {
        Some(handle) => handle.name.as_ptr(),
        None => ptr::null(),
    }
}

/// Free a buffer returned by [`aural_codec_encode`] or
/// [`aural_codec_decode`]. Null is ignored.
///
/// # Safety
///
/// `ptr` must be null or a buffer returned by this library that has not
/// been freed yet.
#[no_mangle]
pub unsafe extern "C" fn aural_free_buffer(ptr: *mut u8) {
    unsafe { buffer::release(ptr) };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(name: &CStr) -> *mut AuralCodecHandle {
        let handle = unsafe { aural_codec_create(name.as_ptr()) };
        assert!(!handle.is_null(), "codec {name:?} should exist");
        handle
    }

    fn silence() -> Vec<u8> {
        vec![0u8; 128 * 2 * 2]
    }

    // ───────────────── aural_version ─────────────────

    #[test]
    fn test_aural_version() {
        let version = unsafe { CStr::from_ptr(aural_version()) };
        assert_eq!(version.to_str().unwrap(), "0.1.0");
    }

    // ───────────────── aural_codec_create / destroy ─────────────────

    #[test]
    fn test_create_known_codecs() {
        for name in [c"adf", c"pcm"] {
            let handle = create(name);
            let reported = unsafe { CStr::from_ptr(aural_codec_name(handle)) };
            assert_eq!(reported, name);
            unsafe { aural_codec_destroy(handle) };
        }
    }

    #[test]
    fn test_create_unknown_codec() {
        let handle = unsafe { aural_codec_create(c"unknown-codec".as_ptr()) };
        assert!(handle.is_null());
    }

    #[test]
    fn test_create_null_name() {
        assert!(unsafe { aural_codec_create(ptr::null()) }.is_null());
    }

    #[test]
    fn test_destroy_null() {
        // Must not crash.
        unsafe { aural_codec_destroy(ptr::null_mut()) };
    }

    // ───────────────── Null handle is rejected everywhere ─────────────────

    #[test]
    fn test_null_handle_calls_fail() {
        let handle: *mut AuralCodecHandle = ptr::null_mut();
        let data = silence();
        let mut out_size = 123usize;
        let (mut rate, mut ch, mut bits) = (0i32, 0i32, 0i32);

        unsafe {
            assert!(!aural_codec_initialize(handle, 44100, 2, 16));
            assert!(aural_codec_encode(handle, data.as_ptr(), data.len(), &mut out_size).is_null());
            assert_eq!(out_size, 0);
            out_size = 123;
            assert!(aural_codec_decode(handle, data.as_ptr(), data.len(), &mut out_size).is_null());
            assert_eq!(out_size, 0);
            assert!(!aural_codec_get_last_format(handle, &mut rate, &mut ch, &mut bits));
            assert!(aural_codec_name(handle).is_null());
            aural_codec_reset(handle);
        }
    }

    // ───────────────── aural_codec_initialize ─────────────────

    #[test]
    fn test_initialize_rejects_bad_values() {
        let handle = create(c"adf");
        unsafe {
            assert!(!aural_codec_initialize(handle, -44100, 2, 16));
            assert!(!aural_codec_initialize(handle, 44100, -2, 16));
            assert!(!aural_codec_initialize(handle, 44100, 70000, 16));
            assert!(!aural_codec_initialize(handle, 22050, 2, 16));
            assert!(!aural_codec_initialize(handle, 44100, 8, 16));
            // Still usable after rejections.
            assert!(aural_codec_initialize(handle, 44100, 2, 16));
            aural_codec_destroy(handle);
        }
    }

    // ───────────────── aural_codec_encode / decode ─────────────────

    #[test]
    fn test_encode_zero_size_returns_null() {
        let handle = create(c"adf");
        let data = silence();
        let mut out_size = 99usize;
        unsafe {
            assert!(aural_codec_initialize(handle, 44100, 2, 16));
            let out = aural_codec_encode(handle, data.as_ptr(), 0, &mut out_size);
            assert!(out.is_null());
            assert_eq!(out_size, 0);
            aural_codec_destroy(handle);
        }
    }

    #[test]
    fn test_encode_null_input_returns_null() {
        let handle = create(c"pcm");
        let mut out_size = 99usize;
        unsafe {
            assert!(aural_codec_initialize(handle, 44100, 2, 16));
            let out = aural_codec_encode(handle, ptr::null(), 16, &mut out_size);
            assert!(out.is_null());
            assert_eq!(out_size, 0);
            assert!(aural_codec_encode(handle, [1u8].as_ptr(), 1, ptr::null_mut()).is_null());
            aural_codec_destroy(handle);
        }
    }

    #[test]
    fn test_adf_round_trip() {
        let handle = create(c"adf");
        let pcm: Vec<u8> = (0..512i16)
            .map(|i| i.wrapping_mul(61))
            .flat_map(|s| s.to_le_bytes())
            .collect();

        unsafe {
            assert!(aural_codec_initialize(handle, 48000, 2, 16));

            let mut encoded_len = 0usize;
            let encoded = aural_codec_encode(handle, pcm.as_ptr(), pcm.len(), &mut encoded_len);
            assert!(!encoded.is_null());
            assert!(encoded_len > 0);
            assert_eq!(buffer::len(encoded), encoded_len);

            let decoder = create(c"adf");
            let mut decoded_len = 0usize;
            let decoded = aural_codec_decode(decoder, encoded, encoded_len, &mut decoded_len);
            assert!(!decoded.is_null());
            assert_eq!(std::slice::from_raw_parts(decoded, decoded_len), &pcm[..]);

            let (mut rate, mut ch, mut bits) = (0i32, 0i32, 0i32);
            assert!(aural_codec_get_last_format(decoder, &mut rate, &mut ch, &mut bits));
            assert_eq!((rate, ch, bits), (48000, 2, 16));

            aural_free_buffer(decoded);
            aural_free_buffer(encoded);
            aural_codec_destroy(decoder);
            aural_codec_destroy(handle);
        }
    }

    #[test]
    fn test_decode_garbage_returns_null() {
        let handle = create(c"adf");
        let garbage = [0x11u8, 0x22, 0xAA, 0x00, 0x33];
        let mut out_size = 7usize;
        unsafe {
            let out = aural_codec_decode(handle, garbage.as_ptr(), garbage.len(), &mut out_size);
            assert!(out.is_null());
            assert_eq!(out_size, 0);
            aural_codec_destroy(handle);
        }
    }

    #[test]
    fn test_pcm_pass_through() {
        let handle = create(c"pcm");
        let data: Vec<u8> = (0..=255u8).collect();
        unsafe {
            assert!(aural_codec_initialize(handle, 44100, 1, 8));
            let mut out_size = 0usize;
            let out = aural_codec_encode(handle, data.as_ptr(), data.len(), &mut out_size);
            assert_eq!(std::slice::from_raw_parts(out, out_size), &data[..]);
            aural_free_buffer(out);
            aural_codec_destroy(handle);
        }
    }

    // ───────────────── aural_codec_get_last_format / reset ─────────────────

    #[test]
    fn test_get_last_format_lifecycle() {
        let handle = create(c"adf");
        let (mut rate, mut ch, mut bits) = (-1i32, -1i32, -1i32);
        unsafe {
            assert!(aural_codec_get_last_format(handle, &mut rate, &mut ch, &mut bits));
            assert_eq!((rate, ch, bits), (0, 0, 0));

            assert!(aural_codec_initialize(handle, 96000, 1, 24));
            assert!(aural_codec_get_last_format(handle, &mut rate, &mut ch, &mut bits));
            assert_eq!((rate, ch, bits), (96000, 1, 24));

            assert!(!aural_codec_get_last_format(handle, ptr::null_mut(), &mut ch, &mut bits));

            aural_codec_reset(handle);
            aural_codec_reset(handle);
            assert!(aural_codec_get_last_format(handle, &mut rate, &mut ch, &mut bits));
            assert_eq!((rate, ch, bits), (0, 0, 0));

            aural_codec_destroy(handle);
        }
    }

    // ───────────────── aural_free_buffer null safety ─────────────────

    #[test]
    fn test_free_buffer_null() {
        // Must not crash.
        unsafe { aural_free_buffer(ptr::null_mut()) };
    }
}
