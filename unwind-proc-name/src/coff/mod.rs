//! # PE/COFF Parsing
//!
//! Reads the COFF symbol table that MinGW and clang leave in PE executables
//! unless they are stripped. The loader never maps this table, so it is read
//! from the on-disk file.
//!
//! ## Layout
//!
//! ```text
//! 0x00         DOS header ("MZ", e_lfanew at 0x3c)
//! e_lfanew     "PE\0\0"
//!              IMAGE_FILE_HEADER      (PointerToSymbolTable, NumberOfSymbols)
//!              optional header        (magic 0x10b / 0x20b, ImageBase)
//!              section headers        (VirtualAddress, Characteristics)
//! ...
//! PtrToSymTab  symbol records, 18 bytes each, primary + N auxiliary
//!              string table           (u32 size, then NUL-terminated names)
//! ```
//!
//! - **`headers`**: walks the chain above and bounds-checks every table
//! - **`symbols`**: iterates primary records and selects function symbols

pub mod headers;
pub mod symbols;

pub use headers::{parse_headers, CoffImage, ImageInfo, SectionInfo, SYMBOL_RECORD_SIZE};
pub use symbols::{function_symbols, is_function_symbol, FunctionSymbol, SymbolRecord, SymbolRecords};
