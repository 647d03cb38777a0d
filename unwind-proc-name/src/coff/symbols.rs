//! COFF symbol records and the function-symbol filter

use object::endian::LittleEndian as LE;
use object::pe;

use super::headers::{CoffImage, SectionInfo};
use crate::domain::{Rva, MAX_SYMBOL_NAME_LEN};

/// Derived-type value marking a function (`IMAGE_SYM_DTYPE_FUNCTION`)
const DTYPE_FUNCTION: u16 = 2;
const DTYPE_SHIFT: u16 = 4;
const DTYPE_MASK: u16 = 0x3;

/// Leading byte of compiler-internal names (`.text`, `.file`, `.bss`, ...)
const INTERNAL_MARKER: u8 = b'.';

/// A primary symbol record
#[derive(Debug, Clone, Copy)]
pub struct SymbolRecord<'data> {
    /// Index into the raw record array (auxiliary records count)
    pub index: usize,
    raw: &'data pe::ImageSymbol,
}

impl<'data> SymbolRecord<'data> {
    #[must_use]
    pub fn value(&self) -> u32 {
        self.raw.value.get(LE)
    }

    /// 1-based section number; zero and negatives are pseudo-sections
    #[must_use]
    pub fn section_number(&self) -> i16 {
        self.raw.section_number.get(LE) as i16
    }

    #[must_use]
    pub fn derived_type(&self) -> u16 {
        (self.raw.typ.get(LE) >> DTYPE_SHIFT) & DTYPE_MASK
    }

    #[must_use]
    pub fn storage_class(&self) -> u8 {
        self.raw.storage_class
    }

    #[must_use]
    pub fn aux_count(&self) -> u8 {
        self.raw.number_of_aux_symbols
    }

    /// Raw name bytes, up to the first NUL and at most [`MAX_SYMBOL_NAME_LEN`]
    ///
    /// Short names come from the inline 8-byte field. Long names (first four
    /// bytes zero) are read from `strings` at the stored offset; `None` if that
    /// offset lies outside the string table.
    #[must_use]
    pub fn name(&self, strings: &'data [u8]) -> Option<&'data [u8]> {
        let raw: &'data pe::ImageSymbol = self.raw;
        let field = &raw.name;
        let bytes: &'data [u8] = if field[..4] == [0u8; 4] {
            let offset = u32::from_le_bytes([field[4], field[5], field[6], field[7]]);
            strings.get(usize::try_from(offset).ok()?..)?
        } else {
            &field[..]
        };

        let window = &bytes[..bytes.len().min(MAX_SYMBOL_NAME_LEN)];
        let end = window.iter().position(|&b| b == 0).unwrap_or(window.len());
        Some(&window[..end])
    }
}

/// Iterator over primary records; auxiliary records are skipped unread
#[derive(Debug, Clone)]
pub struct SymbolRecords<'data> {
    records: &'data [pe::ImageSymbol],
    index: usize,
}

impl<'data> SymbolRecords<'data> {
    pub(crate) fn new(records: &'data [pe::ImageSymbol]) -> Self {
        Self { records, index: 0 }
    }
}

impl<'data> Iterator for SymbolRecords<'data> {
    type Item = SymbolRecord<'data>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = self.records.get(self.index)?;
        let record = SymbolRecord { index: self.index, raw };
        self.index = self.index.saturating_add(1 + usize::from(raw.number_of_aux_symbols));
        Some(record)
    }
}

/// True if `record` looks like a function defined in an executable section
///
/// The storage-class clause admits external and static symbols even without
/// function typing; MinGW and clang leave the type field zero for most code.
#[must_use]
pub fn is_function_symbol(record: &SymbolRecord<'_>, section: &SectionInfo) -> bool {
    if !section.is_executable() {
        return false;
    }
    record.derived_type() == DTYPE_FUNCTION
        || matches!(
            record.storage_class(),
            pe::IMAGE_SYM_CLASS_EXTERNAL | pe::IMAGE_SYM_CLASS_STATIC
        )
}

/// A function symbol as found in the image, name still borrowed from the mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSymbol<'data> {
    pub name: &'data [u8],
    pub rva: Rva,
}

/// All function symbols in `image`, in symbol-table order
///
/// Records in pseudo-sections or non-executable sections, internal names
/// (leading `.`), empty names, and long names with a bad string offset are
/// left out.
pub fn function_symbols<'a, 'data>(
    image: &'a CoffImage<'data>,
) -> impl Iterator<Item = FunctionSymbol<'data>> + 'a {
    let strings = image.strings();
    image.symbols().filter_map(move |record| {
        let section = image.section(record.section_number())?;
        if !is_function_symbol(&record, section) {
            return None;
        }
        let name = record.name(strings)?;
        if name.first().map_or(true, |&b| b == INTERNAL_MARKER) {
            return None;
        }
        let rva = u64::from(section.virtual_address) + u64::from(record.value());
        Some(FunctionSymbol { name, rva: Rva(rva) })
    })
}
