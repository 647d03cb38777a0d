//! In-memory PE image builder for integration tests

#![allow(dead_code)]

use std::io::Write;

use tempfile::NamedTempFile;

pub const TEXT: u32 = 0x6000_0020;
pub const DATA: u32 = 0xc000_0040;

pub const CLASS_EXTERNAL: u8 = 2;
pub const CLASS_STATIC: u8 = 3;
pub const CLASS_LABEL: u8 = 6;
pub const CLASS_FILE: u8 = 103;

/// Type field with derived type "function"
pub const TYPE_FUNCTION: u16 = 0x20;

const NT_OFFSET: usize = 0x80;
const FILE_HEADER_SIZE: usize = 20;
const SECTION_HEADER_SIZE: usize = 40;
const RECORD_SIZE: usize = 18;

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub value: u32,
    pub section: i16,
    pub typ: u16,
    pub class: u8,
    pub aux: u8,
}

#[derive(Debug, Clone)]
struct Section {
    name: [u8; 8],
    rva: u32,
    characteristics: u32,
}

/// Builds a PE image holding only headers, a section table and a COFF
/// symbol table; section contents are never needed for symbolization.
#[derive(Debug, Clone)]
pub struct PeBuilder {
    pe32: bool,
    image_base: u64,
    sections: Vec<Section>,
    symbols: Vec<Symbol>,
    stripped: bool,
    drop_string_table: bool,
}

impl Default for PeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PeBuilder {
    /// PE32+ image with the usual 64-bit preferred base
    pub fn new() -> Self {
        Self {
            pe32: false,
            image_base: 0x1_4000_0000,
            sections: Vec::new(),
            symbols: Vec::new(),
            stripped: false,
            drop_string_table: false,
        }
    }

    /// Switch to a PE32 optional header with the usual 32-bit base
    pub fn pe32(mut self) -> Self {
        self.pe32 = true;
        self.image_base = 0x40_0000;
        self
    }

    pub fn image_base(mut self, base: u64) -> Self {
        self.image_base = base;
        self
    }

    pub fn section(mut self, name: &str, rva: u32, characteristics: u32) -> Self {
        let mut raw = [0u8; 8];
        raw[..name.len()].copy_from_slice(name.as_bytes());
        self.sections.push(Section { name: raw, rva, characteristics });
        self
    }

    /// Typed external function in `section` (1-based)
    pub fn function(self, name: &str, section: i16, value: u32) -> Self {
        self.symbol(name, section, value, TYPE_FUNCTION, CLASS_EXTERNAL, 0)
    }

    pub fn symbol(mut self, name: &str, section: i16, value: u32, typ: u16, class: u8, aux: u8) -> Self {
        self.symbols.push(Symbol { name: name.to_string(), value, section, typ, class, aux });
        self
    }

    /// Leave the symbol table pointer and count at zero
    pub fn stripped(mut self) -> Self {
        self.stripped = true;
        self
    }

    /// End the file right after the symbol records
    pub fn without_string_table(mut self) -> Self {
        self.drop_string_table = true;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let optional_size: usize = if self.pe32 { 224 } else { 240 };
        let sections_offset = NT_OFFSET + 4 + FILE_HEADER_SIZE + optional_size;
        let symbols_offset = sections_offset + self.sections.len() * SECTION_HEADER_SIZE;

        let mut data = vec![0u8; symbols_offset];

        // DOS header
        data[0..2].copy_from_slice(b"MZ");
        put_u32(&mut data, 0x3c, NT_OFFSET as u32);

        // NT signature and file header
        data[NT_OFFSET..NT_OFFSET + 4].copy_from_slice(b"PE\0\0");
        let fh = NT_OFFSET + 4;
        let machine: u16 = if self.pe32 { 0x14c } else { 0x8664 };
        put_u16(&mut data, fh, machine);
        put_u16(&mut data, fh + 2, self.sections.len() as u16);
        put_u16(&mut data, fh + 16, optional_size as u16);

        // Optional header
        let opt = fh + FILE_HEADER_SIZE;
        if self.pe32 {
            put_u16(&mut data, opt, 0x10b);
            put_u32(&mut data, opt + 28, self.image_base as u32);
        } else {
            put_u16(&mut data, opt, 0x20b);
            data[opt + 24..opt + 32].copy_from_slice(&self.image_base.to_le_bytes());
        }

        // Section table
        for (idx, section) in self.sections.iter().enumerate() {
            let at = sections_offset + idx * SECTION_HEADER_SIZE;
            data[at..at + 8].copy_from_slice(&section.name);
            put_u32(&mut data, at + 12, section.rva);
            put_u32(&mut data, at + 36, section.characteristics);
        }

        if self.stripped {
            return data;
        }

        // Symbol records, then the string table
        let mut strings = vec![0u8; 4];
        let mut record_count = 0u32;
        for symbol in &self.symbols {
            let mut name = [0u8; 8];
            if symbol.name.len() <= 8 {
                name[..symbol.name.len()].copy_from_slice(symbol.name.as_bytes());
            } else {
                name[4..].copy_from_slice(&(strings.len() as u32).to_le_bytes());
                strings.extend_from_slice(symbol.name.as_bytes());
                strings.push(0);
            }
            data.extend_from_slice(&record(name, symbol.value, symbol.section, symbol.typ, symbol.class, symbol.aux));
            record_count += 1;

            // Aux payload shaped like a qualifying function record
            for _ in 0..symbol.aux {
                data.extend_from_slice(&record(*b"auxjunk\0", 0, 1, TYPE_FUNCTION, CLASS_EXTERNAL, 0));
                record_count += 1;
            }
        }
        let strings_len = strings.len() as u32;
        strings[0..4].copy_from_slice(&strings_len.to_le_bytes());
        if !self.drop_string_table {
            data.extend_from_slice(&strings);
        }

        put_u32(&mut data, fh + 8, symbols_offset as u32);
        put_u32(&mut data, fh + 12, record_count);

        data
    }

    pub fn write_temp(&self) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("create temp file");
        file.write_all(&self.build()).expect("write image");
        file.flush().expect("flush image");
        file
    }
}

fn record(name: [u8; 8], value: u32, section: i16, typ: u16, class: u8, aux: u8) -> [u8; RECORD_SIZE] {
    let mut raw = [0u8; RECORD_SIZE];
    raw[0..8].copy_from_slice(&name);
    raw[8..12].copy_from_slice(&value.to_le_bytes());
    raw[12..14].copy_from_slice(&section.to_le_bytes());
    raw[14..16].copy_from_slice(&typ.to_le_bytes());
    raw[16] = class;
    raw[17] = aux;
    raw
}

fn put_u16(data: &mut [u8], at: usize, value: u16) {
    data[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(data: &mut [u8], at: usize, value: u32) {
    data[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

/// `.text` at 0x1000 and `.data` at 0x5000 with a handful of functions
pub fn sample_image() -> PeBuilder {
    PeBuilder::new()
        .section(".text", 0x1000, TEXT)
        .section(".data", 0x5000, DATA)
        .symbol(".file", -2, 0, 0, CLASS_FILE, 1)
        .symbol(".text", 1, 0, 0, CLASS_STATIC, 1)
        .function("main", 1, 0x0)
        .function("worker_loop_with_a_long_name", 1, 0x120)
        .symbol("helper", 1, 0x300, 0, CLASS_STATIC, 0)
        .symbol("retry", 1, 0x340, 0, CLASS_LABEL, 0)
        .function("counter", 2, 0x10)
        .function("imported", 0, 0)
}
