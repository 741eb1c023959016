//! # mzbin Converter
//!
//! Command-line front end for converting mass spectrometry RAW files into
//! per-scan binary artifacts.
//!
//! ## Usage
//!
//! ```bash
//! # Convert a RAW file with 8 partitioned workers
//! mzbin convert run01.raw run01.bin --workers 8
//!
//! # Convert a synthetic run
//! mzbin demo demo.bin --scans 10000
//!
//! # Inspect and validate the artifact
//! mzbin inspect run01.bin --records 20
//! mzbin validate run01.bin
//!
//! # Viewer payloads
//! mzbin view --root data spectrum run01.raw 42
//! ```
//!
//! Exit codes: 0 success, 1 failure, 2 source could not be opened,
//! 3 artifact failed validation.

use clap::Parser;
use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());

    match cli::dispatch(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            cli::exit_code_for(&e)
        }
    }
}
