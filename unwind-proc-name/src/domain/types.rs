//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers keep section-relative addresses apart from absolute
//! runtime addresses, and give symbol names their fixed length bound.

use std::fmt;

/// Maximum stored length of a symbol name, in bytes.
///
/// Callers on the C side size their buffers as `MAX_SYMBOL_NAME_LEN + 1` to
/// leave room for the NUL terminator. Longer names are truncated.
pub const MAX_SYMBOL_NAME_LEN: usize = 255;

/// Relative virtual address (offset from the image base)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rva(pub u64);

impl Rva {
    /// Translate to an absolute runtime address for an image loaded at `load_base`.
    ///
    /// Returns `None` if the sum does not fit in 64 bits.
    #[must_use]
    pub fn to_runtime(self, load_base: u64) -> Option<u64> {
        load_base.checked_add(self.0)
    }
}

/// Symbol name, truncated to [`MAX_SYMBOL_NAME_LEN`] bytes
///
/// Names are raw bytes as found in the image. They are usually ASCII but
/// nothing in the object format guarantees it, so the bytes are kept as-is
/// and only decoded (lossily) for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolName(Box<[u8]>);

impl SymbolName {
    /// Create a name from raw bytes, stopping at the first NUL and truncating
    /// to [`MAX_SYMBOL_NAME_LEN`] bytes.
    #[must_use]
    pub fn new(raw: &[u8]) -> Self {
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        let len = end.min(MAX_SYMBOL_NAME_LEN);
        Self(raw[..len].into())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Demangle a Rust symbol name, falling back to the raw name
    #[must_use]
    pub fn demangled(&self) -> String {
        let raw = String::from_utf8_lossy(&self.0);
        format!("{:#}", rustc_demangle::demangle(&raw))
    }

    /// Copy the name into a C buffer of `buf.len()` bytes, NUL-terminated.
    ///
    /// Copies at most `buf.len() - 1` bytes and returns the number of name
    /// bytes written (excluding the terminator). An empty buffer is left
    /// untouched.
    pub fn copy_to_c_buf(&self, buf: &mut [u8]) -> usize {
        let Some(room) = buf.len().checked_sub(1) else {
            return 0;
        };
        let n = self.0.len().min(room);
        buf[..n].copy_from_slice(&self.0[..n]);
        buf[n] = 0;
        n
    }
}

impl fmt::Display for SymbolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl From<&str> for SymbolName {
    fn from(s: &str) -> Self {
        SymbolName::new(s.as_bytes())
    }
}
