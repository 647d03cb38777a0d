//! Domain model for unwind-proc-name
//!
//! This module contains core domain types and errors that provide:
//! - Compile-time safety via newtype pattern
//! - Bounded, owned symbol names
//! - Structured error handling

pub mod errors;
pub mod types;

// Re-export common types for convenience
pub use types::{Rva, SymbolName, MAX_SYMBOL_NAME_LEN};

pub use errors::{FormatError, SymbolError};
