//! libunwind types and return codes used by the exported functions

use std::ffi::c_int;
use std::marker::{PhantomData, PhantomPinned};

/// `unw_word_t`: pointer-sized on every target libunwind supports
pub type UnwWord = usize;

/// `unw_regnum_t`
pub type UnwRegNum = c_int;

pub const UNW_ESUCCESS: c_int = 0;
/// Unspecified error
pub const UNW_EUNSPEC: c_int = -6540;
/// No unwind info / no symbol for this address
pub const UNW_ENOINFO: c_int = -6549;

/// Pseudo-register holding the frame's instruction pointer
pub const UNW_REG_IP: UnwRegNum = -1;

/// `unw_cursor_t`, only ever handled behind a pointer owned by libunwind
#[repr(C)]
pub struct UnwCursor {
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}
