use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

use mzbin::viewer::{ViewerError, ViewerService};

/// Viewer queries
#[derive(Subcommand, Debug)]
pub enum ViewQuery {
    /// List source files in the root directory
    Files,
    /// First and last scan number of a file
    Range {
        /// File name relative to the root
        file: String,
    },
    /// Human-readable description of a scan
    Details {
        /// File name relative to the root
        file: String,
        /// Scan number
        scan: i32,
    },
    /// Peaks of a scan
    Spectrum {
        /// File name relative to the root
        file: String,
        /// Scan number
        scan: i32,
    },
}

/// Run one viewer query and print its JSON payload
pub fn run(root: PathBuf, query: ViewQuery) -> Result<ExitCode> {
    let viewer = ViewerService::new(root);
    let result = match &query {
        ViewQuery::Files => viewer.list_files().and_then(to_json),
        ViewQuery::Range { file } => viewer.scan_range(file).and_then(to_json),
        ViewQuery::Details { file, scan } => viewer.scan_details(file, *scan).and_then(to_json),
        ViewQuery::Spectrum { file, scan } => viewer.spectrum(file, *scan).and_then(to_json),
    };

    match result {
        Ok(json) => {
            println!("{}", json);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            let body = serde_json::to_string(&e.to_response())
                .context("Failed to serialize error response")?;
            println!("{}", body);
            Err(e).with_context(|| format!("Viewer query {:?} failed", query))
        }
    }
}

fn to_json<T: Serialize>(value: T) -> Result<String, ViewerError> {
    Ok(serde_json::to_string_pretty(&value)?)
}
