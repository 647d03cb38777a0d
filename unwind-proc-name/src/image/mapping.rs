#![allow(unsafe_code)] // memmap2::Mmap::map is unsafe

use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::domain::SymbolError;

/// Read-only mapping of an image file
///
/// This maps the file as it is on disk, not the loaded module, so raw headers
/// and the symbol table (which the loader never maps) can be parsed. The file
/// handle is closed once the mapping exists; dropping the value unmaps it.
pub struct MappedImage {
    path: PathBuf,
    map: Mmap,
}

impl MappedImage {
    /// Open and map `path` read-only
    ///
    /// # Errors
    /// Returns [`SymbolError::ImageOpenFailed`] or [`SymbolError::ImageMapFailed`].
    pub fn open(path: &Path) -> Result<Self, SymbolError> {
        let file = File::open(path)
            .map_err(|source| SymbolError::ImageOpenFailed { path: path.to_path_buf(), source })?;

        // SAFETY: the mapping is read-only and only ever viewed as bytes. An
        // executable that is running cannot be rewritten in place on Windows;
        // elsewhere a concurrent truncation would fault, which is the same risk
        // any mmap-based reader takes.
        let map = unsafe { Mmap::map(&file) }
            .map_err(|source| SymbolError::ImageMapFailed { path: path.to_path_buf(), source })?;

        Ok(Self { path: path.to_path_buf(), map })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.map
    }
}
