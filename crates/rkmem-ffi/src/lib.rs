//! C bindings for the rkmem region arena.
//!
//! Exposes the arena as `u64` handles plus `i32` status codes. This crate
//! is one of two that may contain `unsafe` code (along with
//! `rkmem-arena`).
//!
//! Every entry point runs inside [`ffi_guard!`], which turns a Rust panic
//! into [`RkStatus::Panicked`] and stores the panic message for
//! [`rk_last_panic_message`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

use std::cell::RefCell;
use std::ffi::c_char;

/// Run an FFI body, converting a panic into `RkStatus::Panicked`.
macro_rules! ffi_guard {
    ($body:block) => {{
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| -> i32 { $body })) {
            Ok(status) => status,
            Err(payload) => {
                $crate::record_panic(payload.as_ref());
                $crate::status::RkStatus::Panicked as i32
            }
        }
    }};
}

/// Lock a mutex inside an FFI body, returning `InternalError` if poisoned.
macro_rules! ffi_lock {
    ($mutex:expr) => {
        match $mutex.lock() {
            Ok(guard) => guard,
            Err(_) => return $crate::status::RkStatus::InternalError as i32,
        }
    };
}

pub mod arena;
mod handle;
pub mod status;

pub use arena::{
    rk_arena_alloc, rk_arena_alloc_zeroed, rk_arena_create, rk_arena_create_with_page_size,
    rk_arena_debug, rk_arena_free, rk_arena_page_count, rk_arena_realloc, rk_arena_reset,
};
pub use status::RkStatus;

thread_local! {
    pub(crate) static LAST_PANIC: RefCell<String> = const { RefCell::new(String::new()) };
}

pub(crate) fn record_panic(payload: &(dyn std::any::Any + Send)) {
    let msg = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };
    LAST_PANIC.with(|cell| *cell.borrow_mut() = msg);
}

/// Copy the calling thread's last caught panic message into `buf`.
///
/// Returns the full message length in bytes (excluding the NUL). When
/// `buf` is non-null and `cap > 0`, writes at most `cap - 1` bytes plus a
/// terminating NUL. Pass a null `buf` to query the length. Returns 0 if no
/// panic has been caught on this thread.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn rk_last_panic_message(buf: *mut c_char, cap: usize) -> i32 {
    LAST_PANIC.with(|cell| {
        let msg = cell.borrow();
        let bytes = msg.as_bytes();
        if !buf.is_null() && cap > 0 {
            let n = bytes.len().min(cap - 1);
            // SAFETY: buf points to at least cap writable bytes and n < cap.
            unsafe {
                std::ptr::copy_nonoverlapping(bytes.as_ptr(), buf.cast::<u8>(), n);
                *buf.add(n) = 0;
            }
        }
        i32::try_from(bytes.len()).unwrap_or(i32::MAX)
    })
}
