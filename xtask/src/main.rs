use anyhow::{Context, Result};
use clap::Parser;
use std::process::Command;

#[derive(Parser)]
struct Args {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Parser)]
enum Cmd {
    /// Build the static and shared libraries
    BuildLib {
        /// Omit the libunwind override symbols (shared-library mode)
        #[arg(long)]
        standalone: bool,
        /// Target triple, e.g. x86_64-pc-windows-gnu
        #[arg(long)]
        target: Option<String>,
        #[arg(long)]
        debug: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Cmd::BuildLib { standalone, target, debug } => {
            build_lib(standalone, target.as_deref(), debug)?;
        }
    }

    Ok(())
}

fn build_lib(standalone: bool, target: Option<&str>, debug: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("build").arg("--package").arg("unwind-proc-name").arg("--lib");
    if !debug {
        cmd.arg("--release");
    }
    if standalone {
        cmd.arg("--features").arg("standalone");
    }
    if let Some(target) = target {
        cmd.arg("--target").arg(target);
    }

    let status = cmd.status().context("Failed to run cargo build")?;

    if !status.success() {
        anyhow::bail!("Failed to build unwind-proc-name");
    }

    println!("✓ unwind-proc-name built successfully");
    println!("  Mode: {}", if standalone { "standalone shared library" } else { "linked directly" });
    println!("  Target: {}", target.unwrap_or("host"));
    println!("  Profile: {}", if debug { "debug" } else { "release" });
    println!("  Header: unwind-proc-name/include/unwind_proc_name.h");

    Ok(())
}
