//! # valgrade CLI
//!
//! This is the binary entry point for the `valgrade` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Running the upgrade with the parsed arguments.
//! - Reporting top-level errors to the user with a non-zero exit code.
//!
//! The upgrade logic lives in the `lib.rs` library crate; the binary is a
//! thin wrapper around it.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
