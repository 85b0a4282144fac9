// C ABI over the hashcore handle registry.
//
// Handles are registry ids, not pointers: a stale or forged handle can only miss the
// lookup and report HASHCORE_ERR_INVALID_CTX. Contexts live in one process-wide registry.
//
// Tracing: span 'ffi' with field api_func on every entry point.

use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_void};
use std::path::Path;

use hashcore::{Algorithm, Handle, HashOptions, Registry, ResultCode};
use once_cell::sync::Lazy;

pub type HashHandle = u64;

pub type CProgressCallback = extern "C" fn(u64, u64, *mut c_void);

// ── Result codes ────────────────────────────────────────────────────

pub const HASHCORE_SUCCESS: c_int = ResultCode::Success as c_int;
pub const HASHCORE_ERR_INVALID_CTX: c_int = ResultCode::InvalidContext as c_int;
pub const HASHCORE_ERR_NOT_FOUND: c_int = ResultCode::NotFound as c_int;
pub const HASHCORE_ERR_CANCELLED: c_int = ResultCode::Cancelled as c_int;
pub const HASHCORE_ERR_IO: c_int = ResultCode::IoError as c_int;

// ── Algorithms ──────────────────────────────────────────────────────

pub const HASHCORE_ALGO_XXH64: c_int = 0;
pub const HASHCORE_ALGO_SHA256: c_int = 1;
pub const HASHCORE_ALGO_BLAKE3: c_int = 2;

pub const HASHCORE_MAX_DIGEST_LEN: usize = 32;

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// # Safety
/// `path` must be null or a valid null-terminated C string that outlives `'a`.
unsafe fn path_from_ptr<'a>(path: *const c_char) -> Option<&'a Path> {
    if path.is_null() {
        return None;
    }
    let path = unsafe { CStr::from_ptr(path) }.to_str().ok()?;
    Some(Path::new(path))
}

// ── hash_ffi_init ───────────────────────────────────────────────────

/// Open `path` for xxh64 hashing. Returns `0` when the file cannot be opened.
///
/// # Safety
/// `path` must be null or a valid null-terminated C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hash_ffi_init(path: *const c_char, buf_size: u32) -> HashHandle {
    let mut handle: HashHandle = 0;
    unsafe { hash_ffi_init_ex(path, buf_size, HASHCORE_ALGO_XXH64, &mut handle) };
    handle
}

/// Open `path` with an explicit algorithm, reporting why opening failed.
///
/// # Safety
/// - `path` must be null or a valid null-terminated C string.
/// - `out_handle` must be null or point to writable storage for one `HashHandle`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hash_ffi_init_ex(
    path: *const c_char,
    buf_size: u32,
    algorithm: c_int,
    out_handle: *mut HashHandle,
) -> c_int {
    let _span = tracing::info_span!("ffi", api_func = "init").entered();

    if out_handle.is_null() {
        return HASHCORE_ERR_INVALID_CTX;
    }
    unsafe { out_handle.write(Handle::INVALID.as_raw()) };

    let Some(algorithm) = Algorithm::from_raw(algorithm) else {
        tracing::warn!(target: "hashcore.ffi", algorithm, "unknown algorithm");
        return HASHCORE_ERR_INVALID_CTX;
    };
    let Some(path) = (unsafe { path_from_ptr(path) }) else {
        return HASHCORE_ERR_INVALID_CTX;
    };

    let options = HashOptions::new()
        .buffer_size(buf_size as usize)
        .algorithm(algorithm);

    match REGISTRY.open(path, options) {
        Ok(handle) => {
            tracing::info!(target: "hashcore.ffi", %handle, path = %path.display(), "hash_ffi_init");
            unsafe { out_handle.write(handle.as_raw()) };
            HASHCORE_SUCCESS
        }
        Err(e) => {
            tracing::warn!(target: "hashcore.ffi", error = %e, "hash_ffi_init failed");
            e.code().as_raw()
        }
    }
}

// ── hash_ffi_process ────────────────────────────────────────────────

/// Run the read/hash loop. `cb` is invoked on the calling thread after every chunk.
///
/// While the loop runs, `hash_ffi_process`, `hash_ffi_finalize` and `hash_ffi_cleanup` on the
/// same handle fail with `HASHCORE_ERR_INVALID_CTX` instead of waiting; `hash_ffi_cancel` and
/// `hash_ffi_state` are always safe, including from inside `cb`.
#[unsafe(no_mangle)]
pub extern "C" fn hash_ffi_process(
    handle: HashHandle,
    cb: Option<CProgressCallback>,
    user_data: *mut c_void,
) -> c_int {
    let _span = tracing::info_span!("ffi", api_func = "process").entered();

    let result = REGISTRY.process(Handle::from_raw(handle), |progress| {
        if let Some(callback) = cb {
            callback(progress.processed, progress.total, user_data);
        }
    });

    if let Err(e) = &result {
        tracing::info!(target: "hashcore.ffi", handle, error = %e, "hash_ffi_process stopped");
    }
    ResultCode::of(&result).as_raw()
}

// ── hash_ffi_finalize ───────────────────────────────────────────────

/// Consume the handle and return the leading 64 bits of its digest, or `0` when the run
/// did not complete.
#[unsafe(no_mangle)]
pub extern "C" fn hash_ffi_finalize(handle: HashHandle) -> u64 {
    let _span = tracing::info_span!("ffi", api_func = "finalize").entered();

    match REGISTRY.finalize(Handle::from_raw(handle)) {
        Ok(digest) => digest.truncate_u64(),
        Err(e) => {
            tracing::warn!(target: "hashcore.ffi", handle, error = %e, "hash_ffi_finalize failed");
            0
        }
    }
}

/// Consume the handle and copy the full digest into `out`.
///
/// `cap` must be at least `HASHCORE_MAX_DIGEST_LEN` for every algorithm, including xxh64
/// whose digest is 8 bytes; the actual length is written to `out_len`. Argument errors are
/// reported before the handle is touched.
///
/// # Safety
/// - `out` must be null or point to `cap` writable bytes.
/// - `out_len` must be null or point to writable storage for one `size_t`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hash_ffi_finalize_bytes(
    handle: HashHandle,
    out: *mut u8,
    cap: usize,
    out_len: *mut usize,
) -> c_int {
    let _span = tracing::info_span!("ffi", api_func = "finalize_bytes").entered();

    if out.is_null() || out_len.is_null() || cap < HASHCORE_MAX_DIGEST_LEN {
        return HASHCORE_ERR_INVALID_CTX;
    }
    unsafe { out_len.write(0) };

    match REGISTRY.finalize(Handle::from_raw(handle)) {
        Ok(digest) => {
            let bytes = digest.as_bytes();
            unsafe {
                std::ptr::copy_nonoverlapping(bytes.as_ptr(), out, bytes.len());
                out_len.write(bytes.len());
            }
            HASHCORE_SUCCESS
        }
        Err(e) => {
            tracing::warn!(target: "hashcore.ffi", handle, error = %e, "hash_ffi_finalize_bytes failed");
            e.code().as_raw()
        }
    }
}

// ── hash_ffi_cancel / hash_ffi_cleanup / hash_ffi_state ─────────────

/// Request cancellation. Safe from any thread; stale handles are ignored.
///
/// Never waits on `hash_ffi_process`; at most it waits for one concurrent handle table update.
#[unsafe(no_mangle)]
pub extern "C" fn hash_ffi_cancel(handle: HashHandle) {
    let _span = tracing::info_span!("ffi", api_func = "cancel").entered();
    REGISTRY.cancel(Handle::from_raw(handle));
}

/// Release the handle without producing a digest.
#[unsafe(no_mangle)]
pub extern "C" fn hash_ffi_cleanup(handle: HashHandle) {
    let _span = tracing::info_span!("ffi", api_func = "cleanup").entered();
    if let Err(e) = REGISTRY.cleanup(Handle::from_raw(handle)) {
        tracing::debug!(target: "hashcore.ffi", handle, error = %e, "hash_ffi_cleanup ignored");
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn hash_ffi_state(handle: HashHandle) -> c_int {
    match REGISTRY.state(Handle::from_raw(handle)) {
        Ok(state) => state.as_raw(),
        Err(e) => e.code().as_raw(),
    }
}
