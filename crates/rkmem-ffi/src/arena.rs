//! Arena lifecycle FFI: create, alloc, realloc, reset, free, debug.
//!
//! Arenas live in a global `ARENAS` handle table behind a mutex. The lock
//! is held for the whole call; an arena is single-threaded, and callers
//! that want parallel allocation should create one arena per thread.

use std::ptr::NonNull;
use std::sync::Mutex;

use rkmem_arena::{Arena, ArenaConfig};

use crate::handle::HandleTable;
use crate::status::RkStatus;

static ARENAS: Mutex<HandleTable<Arena>> = Mutex::new(HandleTable::new());

#[allow(unsafe_code)]
fn create(config: ArenaConfig, arena_out: *mut u64) -> i32 {
    if arena_out.is_null() {
        return RkStatus::InvalidArgument as i32;
    }
    let arena = match Arena::with_config(config) {
        Ok(a) => a,
        Err(e) => return RkStatus::from(&e) as i32,
    };
    let handle = ffi_lock!(ARENAS).insert(arena);
    // SAFETY: arena_out is non-null and valid per caller contract.
    unsafe { *arena_out = handle };
    RkStatus::Ok as i32
}

/// Create an arena with the default 8 KiB page size.
///
/// On success writes the arena handle to `arena_out` and returns `RK_OK`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn rk_arena_create(arena_out: *mut u64) -> i32 {
    ffi_guard!({ create(ArenaConfig::default(), arena_out) })
}

/// Create an arena whose pages hold `page_size` bytes each.
///
/// A `page_size` of 0 returns `RK_INVALID_ARGUMENT`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn rk_arena_create_with_page_size(page_size: usize, arena_out: *mut u64) -> i32 {
    ffi_guard!({ create(ArenaConfig::new(page_size), arena_out) })
}

/// Release every page of an arena and invalidate its handle.
///
/// Freeing a handle twice returns `RK_INVALID_HANDLE` the second time.
/// If the OS refuses to unmap a page the handle is still invalidated and
/// `RK_RELEASE_FAILED` is returned.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn rk_arena_free(arena_handle: u64) -> i32 {
    ffi_guard!({
        let arena = match ffi_lock!(ARENAS).remove(arena_handle) {
            Some(a) => a,
            None => return RkStatus::InvalidHandle as i32,
        };
        match arena.free() {
            Ok(()) => RkStatus::Ok as i32,
            Err(e) => RkStatus::from(&e) as i32,
        }
    })
}

/// Rewind every page of an arena. All pointers it handed out become invalid.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn rk_arena_reset(arena_handle: u64) -> i32 {
    ffi_guard!({
        let mut arenas = ffi_lock!(ARENAS);
        match arenas.get_mut(arena_handle) {
            Some(arena) => {
                arena.reset();
                RkStatus::Ok as i32
            }
            None => RkStatus::InvalidHandle as i32,
        }
    })
}

#[allow(unsafe_code)]
fn alloc_with(
    arena_handle: u64,
    ptr_out: *mut *mut u8,
    f: impl FnOnce(&mut Arena) -> Result<NonNull<u8>, rkmem_arena::ArenaError>,
) -> i32 {
    if ptr_out.is_null() {
        return RkStatus::InvalidArgument as i32;
    }
    let mut arenas = ffi_lock!(ARENAS);
    let Some(arena) = arenas.get_mut(arena_handle) else {
        return RkStatus::InvalidHandle as i32;
    };
    match f(arena) {
        Ok(ptr) => {
            // SAFETY: ptr_out is non-null and valid per caller contract.
            unsafe { *ptr_out = ptr.as_ptr() };
            RkStatus::Ok as i32
        }
        Err(e) => RkStatus::from(&e) as i32,
    }
}

/// Allocate `num_bytes` from an arena and write the pointer to `ptr_out`.
///
/// `num_bytes` must be in `1..=page_size`. `ptr_out` is left untouched on
/// error.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn rk_arena_alloc(arena_handle: u64, num_bytes: usize, ptr_out: *mut *mut u8) -> i32 {
    ffi_guard!({ alloc_with(arena_handle, ptr_out, |arena| arena.alloc(num_bytes)) })
}

/// Like [`rk_arena_alloc`], with the returned bytes set to zero.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn rk_arena_alloc_zeroed(
    arena_handle: u64,
    num_bytes: usize,
    ptr_out: *mut *mut u8,
) -> i32 {
    ffi_guard!({ alloc_with(arena_handle, ptr_out, |arena| arena.alloc_zeroed(num_bytes)) })
}

/// Copy `old_size` bytes at `ptr` into a fresh `new_size` allocation.
///
/// `ptr` must be memory this arena handed out since its last reset, and
/// `old_size <= new_size`. The old region is left in place, unchanged.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn rk_arena_realloc(
    arena_handle: u64,
    ptr: *mut u8,
    old_size: usize,
    new_size: usize,
    ptr_out: *mut *mut u8,
) -> i32 {
    ffi_guard!({
        let Some(ptr) = NonNull::new(ptr) else {
            return RkStatus::InvalidArgument as i32;
        };
        alloc_with(arena_handle, ptr_out, |arena| {
            arena.realloc(ptr, old_size, new_size)
        })
    })
}

/// Print the arena's page chain to stderr.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn rk_arena_debug(arena_handle: u64) -> i32 {
    ffi_guard!({
        let arenas = ffi_lock!(ARENAS);
        match arenas.get(arena_handle) {
            Some(arena) => {
                arena.debug_dump();
                RkStatus::Ok as i32
            }
            None => {
                eprintln!("Arena {{ NULL }}");
                RkStatus::InvalidHandle as i32
            }
        }
    })
}

/// Write the number of pages an arena owns to `count_out`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn rk_arena_page_count(arena_handle: u64, count_out: *mut usize) -> i32 {
    ffi_guard!({
        if count_out.is_null() {
            return RkStatus::InvalidArgument as i32;
        }
        let arenas = ffi_lock!(ARENAS);
        let Some(arena) = arenas.get(arena_handle) else {
            return RkStatus::InvalidHandle as i32;
        };
        // SAFETY: count_out is non-null and valid per caller contract.
        unsafe { *count_out = arena.page_count() };
        RkStatus::Ok as i32
    })
}
