use log::debug;

use crate::coff::{function_symbols, parse_headers, CoffImage};
use crate::domain::{FormatError, SymbolName};

/// Maximum distance from a symbol's start that still counts as inside it
///
/// Larger gaps almost always mean the address is past the last indexed symbol
/// or inside code that has no symbols of its own (stripped static libraries).
pub const PROXIMITY_LIMIT: u64 = 0x10_0000;

/// A function symbol at its absolute runtime address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    pub address: u64,
    pub name: SymbolName,
}

/// Result of a successful lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolMatch<'a> {
    pub name: &'a SymbolName,
    /// Start address of the matched symbol
    pub address: u64,
    /// Distance from the symbol start to the queried address
    pub offset: u64,
}

/// Function symbols sorted by runtime address
///
/// Built once, never modified afterwards. Entries own their names, so the
/// table does not depend on the mapping it was built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    entries: Box<[SymbolEntry]>,
}

impl SymbolTable {
    /// A table with no entries; every lookup misses
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from arbitrary entries, sorting them by address
    #[must_use]
    pub fn from_entries(mut entries: Vec<SymbolEntry>) -> Self {
        entries.sort_by_key(|entry| entry.address);
        Self { entries: entries.into_boxed_slice() }
    }

    /// Index the function symbols of a parsed image loaded at `load_base`
    ///
    /// The first pass counts qualifying symbols so the entry array is
    /// allocated once at its final size; the second pass fills it.
    #[must_use]
    pub fn build(image: &CoffImage<'_>, load_base: u64) -> Self {
        let count = function_symbols(image).count();

        let mut entries = Vec::with_capacity(count);
        entries.extend(function_symbols(image).filter_map(|symbol| {
            Some(SymbolEntry {
                address: symbol.rva.to_runtime(load_base)?,
                name: SymbolName::new(symbol.name),
            })
        }));

        debug!(
            "Indexed {} of {} symbol records at load base 0x{load_base:x}",
            entries.len(),
            image.symbol_count
        );

        Self::from_entries(entries)
    }

    /// Parse `data` as a PE image and index it
    ///
    /// # Errors
    /// Returns the [`FormatError`] from header parsing.
    pub fn from_image_bytes(data: &[u8], load_base: u64) -> Result<Self, FormatError> {
        let image = parse_headers(data)?;
        Ok(Self::build(&image, load_base))
    }

    /// Find the symbol containing `address`
    ///
    /// Floor search: the entry with the greatest address not above `address`,
    /// accepted only if `address` is less than [`PROXIMITY_LIMIT`] past it.
    /// Does not allocate.
    #[must_use]
    pub fn lookup(&self, address: u64) -> Option<SymbolMatch<'_>> {
        let upper = self.entries.partition_point(|entry| entry.address <= address);
        let best = self.entries.get(upper.checked_sub(1)?)?;

        let offset = address - best.address;
        if offset >= PROXIMITY_LIMIT {
            return None;
        }

        Some(SymbolMatch { name: &best.name, address: best.address, offset })
    }

    #[must_use]
    pub fn entries(&self) -> &[SymbolEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
