//! PE header chain: DOS header → NT headers → section table → symbol table
//!
//! Every header-declared offset and count is checked against the size of the
//! mapped file before it is used; a violation is a [`FormatError`].

use log::debug;
use object::endian::{LittleEndian as LE, U16, U32};
use object::pe;
use object::read::ReadRef;
use std::mem::size_of;
use std::path::PathBuf;

use super::symbols::SymbolRecords;
use crate::domain::FormatError;

/// Size of one COFF symbol record (primary or auxiliary)
pub const SYMBOL_RECORD_SIZE: u64 = size_of::<pe::ImageSymbol>() as u64;

/// The parts of a section header needed for address translation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionInfo {
    pub name: [u8; 8],
    pub virtual_address: u32,
    pub characteristics: u32,
}

impl SectionInfo {
    /// Code sections, or any section the loader maps executable
    #[must_use]
    pub fn is_executable(&self) -> bool {
        self.characteristics & (pe::IMAGE_SCN_CNT_CODE | pe::IMAGE_SCN_MEM_EXECUTE) != 0
    }

    /// Section name with NUL padding removed (long `/N` names are left as-is)
    #[must_use]
    pub fn name_lossy(&self) -> String {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(self.name.len());
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }
}

/// Summary of an image: where it lives, where it was meant to live, and its sections
///
/// `runtime_address = load_base + section.virtual_address + symbol.value`
#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub load_base: u64,
    /// Link-time `ImageBase` from the optional header
    pub preferred_base: u64,
    pub sections: Vec<SectionInfo>,
}

/// A parsed image, borrowing the symbol and string tables from the mapping
#[derive(Debug, Clone)]
pub struct CoffImage<'data> {
    pub preferred_base: u64,
    pub sections: Vec<SectionInfo>,
    pub symbol_table_offset: u32,
    /// Raw record count from the file header, auxiliary records included
    pub symbol_count: u32,
    records: &'data [pe::ImageSymbol],
    strings: &'data [u8],
}

impl<'data> CoffImage<'data> {
    /// False for stripped images (no embedded COFF symbols)
    #[must_use]
    pub fn has_symbols(&self) -> bool {
        !self.records.is_empty()
    }

    /// Iterate primary symbol records, stepping over auxiliary records
    #[must_use]
    pub fn symbols(&self) -> SymbolRecords<'data> {
        SymbolRecords::new(self.records)
    }

    /// The string table, starting at its 4-byte length field
    #[must_use]
    pub fn strings(&self) -> &'data [u8] {
        self.strings
    }

    /// Look up a section by its 1-based COFF section number
    ///
    /// Zero and negative numbers are reserved pseudo-sections (undefined,
    /// absolute, debug) and never resolve.
    #[must_use]
    pub fn section(&self, number: i16) -> Option<&SectionInfo> {
        let index = usize::try_from(number).ok()?.checked_sub(1)?;
        self.sections.get(index)
    }

    #[must_use]
    pub fn info(&self, path: PathBuf, load_base: u64) -> ImageInfo {
        ImageInfo {
            path,
            load_base,
            preferred_base: self.preferred_base,
            sections: self.sections.clone(),
        }
    }
}

fn out_of_bounds<T>(data: &[u8], what: &'static str, offset: u64, count: usize) -> FormatError {
    FormatError::OutOfBounds {
        what,
        offset,
        len: (size_of::<T>() as u64).saturating_mul(count as u64),
        file_len: data.len(),
    }
}

fn read<'data, T: object::pod::Pod>(
    data: &'data [u8],
    what: &'static str,
    offset: u64,
) -> Result<&'data T, FormatError> {
    data.read_at::<T>(offset).map_err(|()| out_of_bounds::<T>(data, what, offset, 1))
}

fn read_slice<'data, T: object::pod::Pod>(
    data: &'data [u8],
    what: &'static str,
    offset: u64,
    count: usize,
) -> Result<&'data [T], FormatError> {
    data.read_slice_at::<T>(offset, count)
        .map_err(|()| out_of_bounds::<T>(data, what, offset, count))
}

/// Walk the header chain of a PE image held in `data`
///
/// An image whose symbol table pointer or count is zero parses successfully
/// with no symbols; that is what stripped release builds look like.
///
/// # Errors
/// Returns a [`FormatError`] for a bad signature at either level, an unknown
/// optional header magic, or a table that extends past the end of `data`.
pub fn parse_headers(data: &[u8]) -> Result<CoffImage<'_>, FormatError> {
    let dos: &pe::ImageDosHeader = read(data, "DOS header", 0)?;
    let dos_magic = dos.e_magic.get(LE);
    if dos_magic != pe::IMAGE_DOS_SIGNATURE {
        return Err(FormatError::BadDosSignature(dos_magic));
    }

    let nt_offset = u64::from(dos.e_lfanew.get(LE));
    let signature = read::<U32<LE>>(data, "PE signature", nt_offset)?.get(LE);
    if signature != pe::IMAGE_NT_SIGNATURE {
        return Err(FormatError::BadPeSignature(signature));
    }

    let file_header_offset = nt_offset + 4;
    let file_header: &pe::ImageFileHeader = read(data, "file header", file_header_offset)?;

    let optional_offset = file_header_offset + size_of::<pe::ImageFileHeader>() as u64;
    let optional_magic = read::<U16<LE>>(data, "optional header", optional_offset)?.get(LE);
    let preferred_base = match optional_magic {
        pe::IMAGE_NT_OPTIONAL_HDR64_MAGIC => {
            let optional: &pe::ImageOptionalHeader64 =
                read(data, "optional header", optional_offset)?;
            optional.image_base.get(LE)
        }
        pe::IMAGE_NT_OPTIONAL_HDR32_MAGIC => {
            let optional: &pe::ImageOptionalHeader32 =
                read(data, "optional header", optional_offset)?;
            u64::from(optional.image_base.get(LE))
        }
        other => return Err(FormatError::BadOptionalMagic(other)),
    };

    // The section table follows the variable-length optional header
    let section_offset = optional_offset + u64::from(file_header.size_of_optional_header.get(LE));
    let section_count = usize::from(file_header.number_of_sections.get(LE));
    let sections = read_slice::<pe::ImageSectionHeader>(
        data,
        "section table",
        section_offset,
        section_count,
    )?
    .iter()
    .map(|section| SectionInfo {
        name: section.name,
        virtual_address: section.virtual_address.get(LE),
        characteristics: section.characteristics.get(LE),
    })
    .collect();

    let symbol_table_offset = file_header.pointer_to_symbol_table.get(LE);
    let symbol_count = file_header.number_of_symbols.get(LE);

    debug!(
        "PE headers: image base 0x{preferred_base:x}, {section_count} sections, \
         {symbol_count} symbol records at 0x{symbol_table_offset:x}"
    );

    let (records, strings) = if symbol_table_offset == 0 || symbol_count == 0 {
        (&[][..], &[][..])
    } else {
        symbol_area(data, symbol_table_offset, symbol_count)?
    };

    Ok(CoffImage {
        preferred_base,
        sections,
        symbol_table_offset,
        symbol_count,
        records,
        strings,
    })
}

/// Locate the symbol records and the string table that follows them
fn symbol_area(
    data: &[u8],
    offset: u32,
    count: u32,
) -> Result<(&[pe::ImageSymbol], &[u8]), FormatError> {
    let offset = u64::from(offset);
    let count = usize::try_from(count).unwrap_or(usize::MAX);
    let records = read_slice::<pe::ImageSymbol>(data, "symbol table", offset, count)?;

    // In bounds: the record slice above ends exactly here
    let strings_offset = offset + records.len() as u64 * SYMBOL_RECORD_SIZE;

    // A missing or short string table only costs the long names
    let strings = match data.read_at::<U32<LE>>(strings_offset) {
        Ok(declared) => {
            let available = data.len() as u64 - strings_offset;
            let len = u64::from(declared.get(LE)).clamp(4, available);
            data.read_bytes_at(strings_offset, len).unwrap_or_default()
        }
        Err(()) => &[][..],
    };

    Ok((records, strings))
}
