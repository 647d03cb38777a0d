//! # Symbol Table and Address Lookup
//!
//! Turns the function symbols of a parsed image into a sorted, immutable table
//! and answers "which function contains this address" against it.
//!
//! ## Address Translation
//!
//! COFF symbols store an offset inside their section. The section header
//! gives the section's RVA, and the loader gives the base the image actually
//! landed at (ASLR changes it on every run):
//!
//! ```text
//! runtime_address = load_base + section.VirtualAddress + symbol.Value
//!
//! load_base   = 0x7ff6_1a20_0000   (GetModuleHandleW(NULL))
//! .text RVA   = 0x1000
//! main.Value  = 0x0450
//! main        = 0x7ff6_1a20_1450
//! ```
//!
//! ## Lookup
//!
//! Entries are sorted by address, so a lookup is a floor search: the last
//! entry whose address is not above the query. A hit must also be closer than
//! [`PROXIMITY_LIMIT`] (1 MiB) to its symbol. Anything further away is treated
//! as a miss rather than attributed to whatever symbol happens to precede it.
//!
//! ```text
//!   0x1000 alpha      0x2000 beta                    0x2000 + 1 MiB
//!      |-----------------|------------------ ... --------|
//!           0x1abc                 0x2004                     0x2000 + 1 MiB
//!        -> alpha+0xabc         -> beta+0x4                -> miss
//! ```
//!
//! ## Module Structure
//!
//! - **`table`**: [`SymbolTable`] construction and floor-search lookup
//! - **`frame`**: owned [`ResolvedFrame`] and its one-line display format,
//!   used by the inspection CLI

pub mod frame;
pub mod table;

pub use frame::{ResolvedFrame, ResolvedSymbol};
pub use table::{SymbolEntry, SymbolMatch, SymbolTable, PROXIMITY_LIMIT};
