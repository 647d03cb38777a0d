//! # unwind-proc-name - Inspection CLI
//!
//! Runs the same parse, filter and index pipeline as the exported libunwind
//! hook, but against any PE file given on the command line, on any host OS:
//! - **`info`**: header summary (preferred base, sections, symbol table)
//! - **`dump`**: every indexed function symbol, text or JSON
//! - **`resolve`**: `name+offset` for addresses captured from a running process

use anyhow::{Context, Result};
use clap::Parser;
use log::debug;
use serde::Serialize;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use unwind_proc_name::cli::{Args, Command};
use unwind_proc_name::coff::parse_headers;
use unwind_proc_name::domain::SymbolName;
use unwind_proc_name::image::MappedImage;
use unwind_proc_name::provider::{ImageFile, SymbolSource};
use unwind_proc_name::symbolization::{ResolvedFrame, SymbolTable};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;

fn main() {
    env_logger::init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { EXIT_USAGE } else { EXIT_SUCCESS };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    std::process::exit(match run(&args) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            EXIT_ERROR
        }
    });
}

fn run(args: &Args) -> Result<()> {
    match &args.command {
        Command::Info { image } => print_info(image),
        Command::Dump { image, base, json, demangle } => {
            let table = load_table(image, *base)?;
            if *json {
                print_json(&table, *demangle)
            } else {
                print_dump(&table, *demangle, args.quiet)
            }
        }
        Command::Resolve { image, addresses, base, demangle } => {
            let table = load_table(image, *base)?;
            print_resolved(&table, addresses, *demangle)
        }
    }
}

fn load_table(image: &Path, base: Option<u64>) -> Result<SymbolTable> {
    ImageFile::new(image, base)
        .load()
        .with_context(|| format!("Failed to build symbol table for {}", image.display()))
}

fn print_info(path: &Path) -> Result<()> {
    let mapped = MappedImage::open(path)?;
    let image = parse_headers(mapped.bytes())
        .with_context(|| format!("Failed to parse {}", mapped.path().display()))?;
    let info = image.info(mapped.path().to_path_buf(), image.preferred_base);
    let functions = SymbolTable::build(&image, image.preferred_base).len();
    debug!("Parsed {} sections from {}", info.sections.len(), info.path.display());

    let mut out = BufWriter::new(io::stdout().lock());
    writeln!(out, "Image:          {}", info.path.display())?;
    writeln!(out, "Preferred base: 0x{:x}", info.preferred_base)?;
    writeln!(out, "Sections:       {}", info.sections.len())?;
    for (idx, section) in info.sections.iter().enumerate() {
        writeln!(
            out,
            "  [{:>2}] {:<8} RVA 0x{:08x} flags 0x{:08x}{}",
            idx + 1,
            section.name_lossy(),
            section.virtual_address,
            section.characteristics,
            if section.is_executable() { "  exec" } else { "" }
        )?;
    }
    if image.has_symbols() {
        writeln!(
            out,
            "Symbol table:   offset 0x{:x}, {} records",
            image.symbol_table_offset, image.symbol_count
        )?;
    } else {
        writeln!(out, "Symbol table:   none (stripped)")?;
    }
    writeln!(out, "Functions:      {functions}")?;
    out.flush()?;
    Ok(())
}

fn display_name(name: &SymbolName, demangle: bool) -> String {
    if demangle {
        name.demangled()
    } else {
        name.to_string()
    }
}

fn print_dump(table: &SymbolTable, demangle: bool, quiet: bool) -> Result<()> {
    let mut out = BufWriter::new(io::stdout().lock());
    for entry in table.entries() {
        writeln!(out, "0x{:016x} {}", entry.address, display_name(&entry.name, demangle))?;
    }
    if !quiet {
        writeln!(out, "{} function symbols", table.len())?;
    }
    out.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct DumpEntry {
    address: String,
    name: String,
}

fn print_json(table: &SymbolTable, demangle: bool) -> Result<()> {
    let entries: Vec<DumpEntry> = table
        .entries()
        .iter()
        .map(|entry| DumpEntry {
            address: format!("0x{:x}", entry.address),
            name: display_name(&entry.name, demangle),
        })
        .collect();

    let mut out = BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut out, &entries).context("Failed to write JSON")?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

fn print_resolved(table: &SymbolTable, addresses: &[u64], demangle: bool) -> Result<()> {
    let mut out = BufWriter::new(io::stdout().lock());
    for (frame_num, &addr) in addresses.iter().enumerate() {
        let frame = ResolvedFrame::new(addr, table.lookup(addr));
        writeln!(out, "{}", frame.format(frame_num, demangle))?;
    }
    out.flush()?;
    Ok(())
}
