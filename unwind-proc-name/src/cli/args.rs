//! CLI argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "unwind-proc-name",
    about = "Inspect the COFF function symbols libunwind resolves names from",
    after_help = "\
EXAMPLES:
    unwind-proc-name info app.exe                     Header and section summary
    unwind-proc-name dump app.exe --demangle          List indexed functions
    unwind-proc-name resolve app.exe 0x140001234      Name an address
    unwind-proc-name resolve app.exe 0x7ff61a201450 --base 0x7ff61a200000"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// List indexed function symbols in address order
    Dump {
        /// PE image to read
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Load base to relocate to (default: the image's preferred base)
        #[arg(long, value_name = "ADDR", value_parser = parse_address)]
        base: Option<u64>,

        /// Emit a JSON array instead of text
        #[arg(long)]
        json: bool,

        /// Demangle Rust symbol names
        #[arg(short, long)]
        demangle: bool,
    },

    /// Resolve addresses to `name+offset`
    Resolve {
        /// PE image to read
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Addresses to resolve (hex with 0x prefix, or decimal)
        #[arg(value_name = "ADDR", required = true, num_args = 1.., value_parser = parse_address)]
        addresses: Vec<u64>,

        /// Load base the addresses were captured at
        #[arg(long, value_name = "ADDR", value_parser = parse_address)]
        base: Option<u64>,

        /// Demangle Rust symbol names
        #[arg(short, long)]
        demangle: bool,
    },

    /// Print header, section and symbol table summary
    Info {
        /// PE image to read
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
    },
}

/// Parse `0x`-prefixed hex or plain decimal
///
/// # Errors
/// Returns a message suitable for clap when the text is not a valid `u64`.
pub fn parse_address(text: &str) -> Result<u64, String> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => text.replace('_', "").parse(),
    };
    parsed.map_err(|e| format!("invalid address '{text}': {e}"))
}
