//! Locate the running executable
//!
//! Finds the on-disk path of the process's main image and the address the
//! loader placed it at. With ASLR the load base differs from run to run, so
//! it has to be queried from the loader rather than read from the headers.

#![allow(unsafe_code)] // GetModuleHandleW is an FFI call

use std::path::PathBuf;

use crate::domain::SymbolError;

/// Where the main image lives on disk and in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLocation {
    pub path: PathBuf,
    /// Runtime load base (the module handle on Windows)
    pub load_base: u64,
}

/// Find the path and runtime load base of the current process's executable
///
/// # Errors
/// Returns an image-access error if either the path or the base cannot be
/// determined, and [`SymbolError::Unsupported`] on platforms where the main
/// image is not a PE file.
#[cfg(windows)]
pub fn locate_main_image() -> Result<ImageLocation, SymbolError> {
    use windows_sys::Win32::System::LibraryLoader::GetModuleHandleW;

    let path = std::env::current_exe().map_err(SymbolError::ImagePathUnavailable)?;

    // SAFETY: a null module name asks for the handle of the process executable;
    // the call has no other preconditions.
    let module = unsafe { GetModuleHandleW(std::ptr::null()) };
    if module == 0 {
        return Err(SymbolError::LoadBaseUnavailable);
    }

    Ok(ImageLocation { path, load_base: module as u64 })
}

/// Find the path and runtime load base of the current process's executable
///
/// # Errors
/// Always [`SymbolError::Unsupported`]: the main image is not a PE file here.
#[cfg(not(windows))]
pub fn locate_main_image() -> Result<ImageLocation, SymbolError> {
    Err(SymbolError::Unsupported)
}
