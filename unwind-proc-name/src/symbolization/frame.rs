use super::table::SymbolMatch;

/// An address together with what it resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFrame {
    pub addr: u64,
    pub symbol: Option<ResolvedSymbol>,
}

/// Owned copy of a [`SymbolMatch`], for output that outlives the table borrow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSymbol {
    /// Raw name as stored in the symbol table
    pub name: String,
    /// Demangled form, identical to `name` when it is not a Rust symbol
    pub demangled: String,
    pub offset: u64,
}

impl ResolvedFrame {
    #[must_use]
    pub fn new(addr: u64, found: Option<SymbolMatch<'_>>) -> Self {
        let symbol = found.map(|m| ResolvedSymbol {
            name: m.name.to_string(),
            demangled: m.name.demangled(),
            offset: m.offset,
        });
        Self { addr, symbol }
    }

    /// Format the frame for display
    ///
    /// `#0  0x0000000140001234 main+0x34`, or `<unknown>` when unresolved.
    #[must_use]
    pub fn format(&self, frame_num: usize, demangle: bool) -> String {
        let Some(symbol) = &self.symbol else {
            return format!("#{frame_num:<2} 0x{:016x} <unknown>", self.addr);
        };

        let name = if demangle { &symbol.demangled } else { &symbol.name };
        if symbol.offset == 0 {
            format!("#{frame_num:<2} 0x{:016x} {name}", self.addr)
        } else {
            format!("#{frame_num:<2} 0x{:016x} {name}+0x{:x}", self.addr, symbol.offset)
        }
    }
}
