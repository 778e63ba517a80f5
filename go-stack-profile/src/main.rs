//! # go-stack-profile - Main Entry Point
//!
//! Two modes, picked by argument count:
//! - **List** (`go-stack-profile <binary>`): print `name: delta` per function
//! - **Rewrite** (`go-stack-profile <binary> <profile>`): write the stack
//!   space profile to stdout or `--output`

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use go_stack_profile::binary::{CompiledImage, FunctionIndex};
use go_stack_profile::cli::Args;
use go_stack_profile::profile::{
    encode_profile, read_profile, rewrite_with_stats, write_profile, Profile,
};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            EXIT_ERROR
        }
    });
}

fn run() -> Result<()> {
    let args = Args::parse();

    let image = CompiledImage::open(&args.binary).context("failed to parse binary")?;
    let index = FunctionIndex::new(&image).context("failed to parse binary")?;

    let Some(profile_path) = args.profile.as_deref() else {
        return list_functions(&index);
    };

    let goroutines = read_profile(profile_path).context("failed to parse profile")?;
    let (stacks, stats) =
        rewrite_with_stats(&index, &goroutines).context("failed to rewrite profile")?;
    info!(
        "{} functions decoded, {} bytes reserved for {} goroutines",
        index.decode_count(),
        stats.reserved_bytes(),
        stats.goroutines
    );

    match args.output.as_deref() {
        Some(path) => write_to_file(&stacks, path),
        None => write_profile(&stacks, io::stdout().lock()).context("failed to write profile"),
    }
}

fn list_functions(index: &FunctionIndex<'_>) -> Result<()> {
    let mut out = BufWriter::new(io::stdout().lock());
    for name in index.func_names() {
        writeln!(out, "{name}: {}", index.resolve(name))?;
    }
    out.flush()?;
    Ok(())
}

fn write_to_file(stacks: &Profile, path: &Path) -> Result<()> {
    // Encode before touching the file so a failure leaves nothing behind.
    let bytes = encode_profile(stacks).context("failed to write profile")?;
    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}
