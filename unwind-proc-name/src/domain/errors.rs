//! Structured error types for symbol table construction
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! Only initialization can fail; a lookup that finds nothing is a
//! [`Resolution::Miss`](crate::registry::Resolution::Miss), not an error.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SymbolError {
    #[error("Cannot determine the path of the running executable: {0}")]
    ImagePathUnavailable(#[source] std::io::Error),

    #[error("Cannot determine the load base of the running executable")]
    LoadBaseUnavailable,

    #[error("Failed to open {path}: {source}")]
    ImageOpenFailed { path: PathBuf, source: std::io::Error },

    #[error("Failed to map {path}: {source}")]
    ImageMapFailed { path: PathBuf, source: std::io::Error },

    #[error("Malformed image: {0}")]
    Format(#[from] FormatError),

    #[error("Symbol resolution from the process image is not supported on this platform")]
    Unsupported,

    /// The table source asked for the table it is building
    #[error("Symbol table requested while this thread is building it")]
    Reentrant,
}

impl SymbolError {
    /// True for failures to locate, open or map the image
    #[must_use]
    pub fn is_image_access(&self) -> bool {
        matches!(
            self,
            Self::ImagePathUnavailable(_)
                | Self::LoadBaseUnavailable
                | Self::ImageOpenFailed { .. }
                | Self::ImageMapFailed { .. }
        )
    }
}

/// Header or layout violation found while walking the image
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Bad DOS signature 0x{0:04x}")]
    BadDosSignature(u16),

    #[error("Bad PE signature 0x{0:08x}")]
    BadPeSignature(u32),

    #[error("Unknown optional header magic 0x{0:04x}")]
    BadOptionalMagic(u16),

    #[error("{what} at offset 0x{offset:x} ({len} bytes) lies outside the {file_len}-byte image")]
    OutOfBounds { what: &'static str, offset: u64, len: u64, file_len: usize },
}
