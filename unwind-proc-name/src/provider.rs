//! Where symbol tables come from
//!
//! The registry does not care how a table is produced, only that producing it
//! may fail. [`ProcessImage`] is the real source inside a running Windows
//! executable; [`ImageFile`] serves the CLI and tests, and [`NoSymbols`] stands
//! in on platforms without a process image to read.

use std::path::PathBuf;

use log::{debug, info};

use crate::coff::parse_headers;
use crate::domain::SymbolError;
use crate::image::{locate_main_image, MappedImage};
use crate::symbolization::SymbolTable;

/// Produces a [`SymbolTable`] on demand
pub trait SymbolSource: Send + Sync {
    /// Build a fresh table
    ///
    /// # Errors
    /// Returns the reason no table could be built.
    fn load(&self) -> Result<SymbolTable, SymbolError>;
}

impl<F> SymbolSource for F
where
    F: Fn() -> Result<SymbolTable, SymbolError> + Send + Sync,
{
    fn load(&self) -> Result<SymbolTable, SymbolError> {
        self()
    }
}

/// A PE file on disk, indexed as if loaded at `load_base`
///
/// With no load base the link-time `ImageBase` is used, which gives the
/// addresses a disassembler or `nm` would print.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub path: PathBuf,
    pub load_base: Option<u64>,
}

impl ImageFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, load_base: Option<u64>) -> Self {
        Self { path: path.into(), load_base }
    }
}

impl SymbolSource for ImageFile {
    fn load(&self) -> Result<SymbolTable, SymbolError> {
        let mapped = MappedImage::open(&self.path)?;
        let image = parse_headers(mapped.bytes())?;

        if !image.has_symbols() {
            debug!("{} carries no COFF symbol table", self.path.display());
        }

        let load_base = self.load_base.unwrap_or(image.preferred_base);
        let table = SymbolTable::build(&image, load_base);

        info!(
            "Loaded {} function symbols from {} (base 0x{load_base:x})",
            table.len(),
            self.path.display()
        );

        Ok(table)
    }
}

/// The executable of the current process, at its actual load base
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessImage;

impl SymbolSource for ProcessImage {
    fn load(&self) -> Result<SymbolTable, SymbolError> {
        let location = locate_main_image()?;
        debug!(
            "Main image {} loaded at 0x{:x}",
            location.path.display(),
            location.load_base
        );
        ImageFile::new(location.path, Some(location.load_base)).load()
    }
}

/// Always yields an empty table
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSymbols;

impl SymbolSource for NoSymbols {
    fn load(&self) -> Result<SymbolTable, SymbolError> {
        Ok(SymbolTable::empty())
    }
}

/// Source used by the process-wide registry
#[cfg(windows)]
pub type DefaultSource = ProcessImage;

/// Source used by the process-wide registry
#[cfg(not(windows))]
pub type DefaultSource = NoSymbols;
