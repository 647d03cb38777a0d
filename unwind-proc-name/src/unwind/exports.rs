//! Exported C functions
//!
//! Every cursor entry point funnels into [`write_proc_name`], which works on
//! plain Rust values so it can be exercised without a libunwind cursor.
//! None of these functions panic; results are libunwind return codes.

#![allow(unsafe_code)] // FFI boundary

use std::ffi::c_int;

use super::abi::{UnwWord, UNW_ENOINFO, UNW_ESUCCESS, UNW_EUNSPEC};
use crate::provider::SymbolSource;
use crate::registry::{self, Resolution, SymbolRegistry};

/// Resolve `ip` and copy the symbol name into `buf` as a C string
///
/// Builds the table on first use. The name is truncated to `buf.len() - 1`
/// bytes; `offp` receives the distance from the symbol start.
#[cfg_attr(not(windows), allow(dead_code))]
pub(crate) fn write_proc_name<S: SymbolSource>(
    registry: &SymbolRegistry<S>,
    ip: UnwWord,
    buf: &mut [u8],
    offp: Option<&mut UnwWord>,
) -> c_int {
    if buf.is_empty() || !registry.ensure_ready() {
        return UNW_EUNSPEC;
    }
    if ip == 0 {
        return UNW_ENOINFO;
    }

    match registry.resolve(ip as u64) {
        Resolution::Symbol(found) => {
            found.name.copy_to_c_buf(buf);
            if let Some(off) = offp {
                *off = UnwWord::try_from(found.offset).unwrap_or(UnwWord::MAX);
            }
            UNW_ESUCCESS
        }
        Resolution::Miss | Resolution::Unavailable => UNW_ENOINFO,
    }
}

/// Build the process symbol table now instead of on first lookup
///
/// Returns 0 on success, -1 if the table could not be built.
#[no_mangle]
pub extern "C" fn unw_windows_sym_init() -> c_int {
    match registry::global().initialize() {
        Ok(()) => 0,
        Err(_) => -1,
    }
}

/// Free the process symbol table
///
/// # Safety
/// No other thread may be resolving a name while this runs.
#[no_mangle]
pub unsafe extern "C" fn unw_windows_sym_cleanup() {
    // SAFETY: forwarded to the caller
    unsafe { registry::global().cleanup() };
}

#[cfg(windows)]
mod cursor {
    use std::ffi::{c_char, c_int};
    use std::slice;

    use super::write_proc_name;
    use crate::registry;
    use crate::unwind::abi::{UnwCursor, UnwRegNum, UnwWord, UNW_ESUCCESS, UNW_EUNSPEC, UNW_REG_IP};

    // Needed in both modes: the cdylib must resolve it either way
    #[link(name = "unwind")]
    extern "C" {
        fn unw_get_reg(cursor: *mut UnwCursor, reg: UnwRegNum, valp: *mut UnwWord) -> c_int;
    }

    /// Shared body of the exported `get_proc_name` variants
    ///
    /// # Safety
    /// `cursor` must be null or a live libunwind cursor; `buf` must be null
    /// or valid for `buf_len` writable bytes; `offp` must be null or valid.
    unsafe fn proc_name_from_cursor(
        cursor: *mut UnwCursor,
        buf: *mut c_char,
        buf_len: usize,
        offp: *mut UnwWord,
    ) -> c_int {
        if cursor.is_null() || buf.is_null() || buf_len == 0 {
            return UNW_EUNSPEC;
        }

        let registry = registry::global();
        if !registry.ensure_ready() {
            return UNW_EUNSPEC;
        }

        let mut ip: UnwWord = 0;
        // SAFETY: cursor is non-null and owned by libunwind per the contract
        if unsafe { unw_get_reg(cursor, UNW_REG_IP, &mut ip) } != UNW_ESUCCESS {
            return UNW_EUNSPEC;
        }

        // SAFETY: non-null and valid for buf_len bytes per the contract
        let buf = unsafe { slice::from_raw_parts_mut(buf.cast::<u8>(), buf_len) };
        // SAFETY: null or valid per the contract
        let offp = unsafe { offp.as_mut() };

        write_proc_name(registry, ip, buf, offp)
    }

    /// `unw_get_proc_name` replacement resolving names from the COFF symbol table
    ///
    /// # Safety
    /// See [`proc_name_from_cursor`].
    #[no_mangle]
    pub unsafe extern "C" fn unw_get_proc_name_windows(
        cursor: *mut UnwCursor,
        buf: *mut c_char,
        buf_len: usize,
        offp: *mut UnwWord,
    ) -> c_int {
        unsafe { proc_name_from_cursor(cursor, buf, buf_len, offp) }
    }

    /// Overrides the weak stub in MinGW (nongnu) libunwind
    ///
    /// # Safety
    /// See [`proc_name_from_cursor`].
    #[no_mangle]
    #[allow(non_snake_case)]
    pub unsafe extern "C" fn _Ux86_64_get_proc_name(
        cursor: *mut UnwCursor,
        buf: *mut c_char,
        buf_len: usize,
        offp: *mut UnwWord,
    ) -> c_int {
        unsafe { proc_name_from_cursor(cursor, buf, buf_len, offp) }
    }

    /// Target of `-Wl,--wrap=_Ux86_64_get_proc_name`
    ///
    /// # Safety
    /// See [`proc_name_from_cursor`].
    #[no_mangle]
    #[allow(non_snake_case)]
    pub unsafe extern "C" fn __wrap__Ux86_64_get_proc_name(
        cursor: *mut UnwCursor,
        buf: *mut c_char,
        buf_len: usize,
        offp: *mut UnwWord,
    ) -> c_int {
        unsafe { proc_name_from_cursor(cursor, buf, buf_len, offp) }
    }

    /// LLVM libunwind internal name behind `unw_get_proc_name`
    ///
    /// Only effective when this library is linked before `libunwind.a`.
    ///
    /// # Safety
    /// See [`proc_name_from_cursor`].
    #[cfg(not(feature = "standalone"))]
    #[no_mangle]
    pub unsafe extern "C" fn __unw_get_proc_name(
        cursor: *mut UnwCursor,
        buf: *mut c_char,
        buf_len: usize,
        offp: *mut UnwWord,
    ) -> c_int {
        unsafe { proc_name_from_cursor(cursor, buf, buf_len, offp) }
    }

    /// Public libunwind API name
    ///
    /// # Safety
    /// See [`proc_name_from_cursor`].
    #[cfg(not(feature = "standalone"))]
    #[no_mangle]
    pub unsafe extern "C" fn unw_get_proc_name(
        cursor: *mut UnwCursor,
        buf: *mut c_char,
        buf_len: usize,
        offp: *mut UnwWord,
    ) -> c_int {
        unsafe { proc_name_from_cursor(cursor, buf, buf_len, offp) }
    }
}

#[cfg(windows)]
pub use cursor::*;
