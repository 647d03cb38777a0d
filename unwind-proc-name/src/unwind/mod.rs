//! # libunwind Integration
//!
//! MinGW and LLVM libunwind ship a `get_proc_name` that always answers
//! `UNW_ENOINFO` on Windows. This module exports replacements under every
//! name libunwind routes through:
//!
//! | Symbol                          | Used by                               |
//! |---------------------------------|---------------------------------------|
//! | `_Ux86_64_get_proc_name`        | nongnu libunwind (weak stub override) |
//! | `__wrap__Ux86_64_get_proc_name` | `-Wl,--wrap=_Ux86_64_get_proc_name`   |
//! | `__unw_get_proc_name`           | LLVM libunwind internal alias         |
//! | `unw_get_proc_name`             | public API name                       |
//! | `unw_get_proc_name_windows`     | direct callers                        |
//!
//! The two LLVM names are left out with the `standalone` feature, so a shared
//! library build does not collide with `libunwind.a`. The overrides only take
//! effect when this library is linked before libunwind.

pub mod abi;
pub mod exports;

pub use abi::{UnwCursor, UnwRegNum, UnwWord, UNW_ENOINFO, UNW_ESUCCESS, UNW_EUNSPEC, UNW_REG_IP};
pub use exports::{unw_windows_sym_cleanup, unw_windows_sym_init};
