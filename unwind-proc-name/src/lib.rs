//! # unwind-proc-name - Function Names for libunwind on Windows
//!
//! libunwind walks stacks fine on Windows, but its `unw_get_proc_name` has no
//! symbol source there and always answers `UNW_ENOINFO`. Executables built by
//! MinGW or clang keep a COFF symbol table in the PE file unless stripped.
//! This crate reads that table once, indexes the function symbols by runtime
//! address, and exports `get_proc_name` replacements that answer from it.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Application + libunwind                      │
//! │        unw_step() ... unw_get_proc_name(cursor, buf, ...)       │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ overridden symbol
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 unwind-proc-name (This Crate)                   │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │    unwind    │──▶│   registry   │──▶│ symbolization│         │
//! │  │ (C exports)  │   │ (lifecycle)  │   │   (lookup)   │         │
//! │  └──────────────┘   └──────┬───────┘   └──────────────┘         │
//! │                            │ first use                          │
//! │                            ▼                                    │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │   provider   │──▶│    image     │──▶│     coff     │         │
//! │  │  (sources)   │   │ (locate/map) │   │ (parse/filter│         │
//! │  └──────────────┘   └──────────────┘   └──────────────┘         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`domain`]: `SymbolName`, `Rva` and the error types
//! - [`image`]: find the main executable and its load base; map the file
//! - [`coff`]: PE headers, section table, symbol records, function filter
//! - [`symbolization`]: the sorted `SymbolTable` and its floor-search lookup
//! - [`provider`]: where tables come from (`ProcessImage`, `ImageFile`, ...)
//! - [`registry`]: build-once lifecycle with explicit cleanup
//! - [`unwind`]: libunwind ABI and the exported C functions
//! - [`cli`]: arguments of the `unwind-proc-name` inspection binary
//!
//! ## Linking
//!
//! ```bash
//! # Linked into the program, ahead of libunwind (overrides every name)
//! cargo xtask build-lib
//! clang main.c -L target/release -lunwind_proc_name -lunwind -o app.exe
//!
//! # Shared library, leaves libunwind's own exported names alone
//! cargo xtask build-lib --standalone
//!
//! # nongnu libunwind, via the linker's wrap option
//! clang main.c -lunwind_proc_name -lunwind -Wl,--wrap=_Ux86_64_get_proc_name
//! ```
//!
//! ## Key Concepts
//!
//! - **Load base**: where the loader placed the image; ASLR varies it per run
//! - **RVA**: address relative to the image base; sections carry one
//! - **Floor search**: nearest symbol at or below an address, within 1 MiB
//! - **Never abort**: every failure is a return code, since the caller may
//!   already be handling a crash

pub mod cli;
pub mod coff;
pub mod domain;
pub mod image;
pub mod provider;
pub mod registry;
pub mod symbolization;
pub mod unwind;
