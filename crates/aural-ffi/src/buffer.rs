//! Buffers handed across the C boundary.
//!
//! Each buffer is one allocation with a hidden header in front of the bytes
//! the caller sees. The header records the payload length so that
//! [`release`] can rebuild the exact layout from the pointer alone.

use std::alloc::{self, Layout};
use std::mem;
use std::ptr;

/// Header size; also the alignment of every boundary buffer.
const PREFIX: usize = 16;

fn layout_for(len: usize) -> Option<Layout> {
    let size = len.checked_add(PREFIX)?;
    Layout::from_size_align(size, PREFIX).ok()
}

/// Copy `data` into a new boundary buffer.
///
/// Returns null for empty input and when allocation fails.
pub fn export(data: &[u8]) -> *mut u8 {
    if data.is_empty() {
        return ptr::null_mut();
    }
    let Some(layout) = layout_for(data.len()) else {
        return ptr::null_mut();
    };

    // SAFETY: `layout` has non-zero size. The header write is aligned to
    // PREFIX >= align_of::<usize>(), and the payload copy stays within the
    // `PREFIX + data.len()` bytes just allocated.
    unsafe {
        let base = alloc::alloc(layout);
        if base.is_null() {
            tracing::warn!(bytes = data.len(), "Boundary buffer allocation failed");
            return ptr::null_mut();
        }
        base.cast::<usize>().write(data.len());
        let payload = base.add(PREFIX);
        ptr::copy_nonoverlapping(data.as_ptr(), payload, data.len());
        payload
    }
}

/// Free a buffer produced by [`export`]. Null is ignored.
///
/// # Safety
///
/// `payload` must be null or a pointer returned by [`export`] that has not
/// been released yet.
pub unsafe fn release(payload: *mut u8) {
    if payload.is_null() {
        return;
    }
    let base = unsafe { payload.sub(PREFIX) };
    let len = unsafe { base.cast::<usize>().read() };
    // `export` succeeded with this length, so the layout is valid.
    if let Some(layout) = layout_for(len) {
        unsafe { alloc::dealloc(base, layout) };
    }
}

/// Payload length recorded in a live buffer's header.
///
/// # Safety
///
/// `payload` must be a live, non-null pointer returned by [`export`].
pub unsafe fn len(payload: *const u8) -> usize {
    unsafe { payload.sub(PREFIX).cast::<usize>().read() }
}

const _: () = assert!(PREFIX >= mem::size_of::<usize>() && PREFIX >= mem::align_of::<usize>());
