use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

use mzbin::convert::{ConversionError, SinkKind, WriteMode};
use mzbin::source::SourceError;

mod config;
mod convert;
mod demo;
mod inspect;
mod validate;
mod view;

/// Exit code for a source that could not be opened
pub const EXIT_SETUP_FAILURE: u8 = 2;
/// Exit code for an artifact that failed validation
pub const EXIT_VALIDATION_FAILURE: u8 = 3;

/// mzbin - parallel RAW to binary scan converter
#[derive(Parser)]
#[command(name = "mzbin")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Write mode selection.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ModeArg {
    /// One accessor, one stream
    Sequential,
    /// Partitioned workers merged in scan order
    Parallel,
    /// Workers appending to one locked stream (unordered)
    Shared,
}

impl From<ModeArg> for WriteMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Sequential => WriteMode::Sequential,
            ModeArg::Parallel => WriteMode::Parallel,
            ModeArg::Shared => WriteMode::Shared,
        }
    }
}

/// Partition sink selection.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SinkArg {
    /// Temporary file per partition
    File,
    /// Memory buffer per partition
    Memory,
}

impl From<SinkArg> for SinkKind {
    fn from(arg: SinkArg) -> Self {
        match arg {
            SinkArg::File => SinkKind::File,
            SinkArg::Memory => SinkKind::Memory,
        }
    }
}

/// Conversion flags shared by `convert` and `demo`
#[derive(clap::Args, Debug, Default, Clone)]
pub struct ConversionArgs {
    /// Write mode
    #[arg(short = 'm', long, value_enum)]
    mode: Option<ModeArg>,

    /// Number of workers (defaults to the available cores)
    #[arg(short = 'w', long)]
    workers: Option<usize>,

    /// Where partition workers buffer records before the merge
    #[arg(long, value_enum)]
    sink: Option<SinkArg>,

    /// Directory for partition temp files
    #[arg(long, value_name = "DIR")]
    temp_dir: Option<PathBuf>,

    /// Log progress every N scans (0 disables)
    #[arg(long, value_name = "N")]
    progress_interval: Option<usize>,

    /// Write <OUTPUT>.metadata.json next to the artifact
    #[arg(long)]
    metadata: bool,

    /// Load settings from a TOML config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a RAW file (or re-encode an artifact) into a scan artifact
    Convert {
        /// Input file (.raw, or .bin to re-encode)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output artifact path (defaults to INPUT with a .bin extension)
        #[arg(value_name = "OUTPUT")]
        output: Option<PathBuf>,

        #[command(flatten)]
        conversion: ConversionArgs,
    },

    /// Convert a synthetic DDA run for testing and benchmarking
    Demo {
        /// Output artifact path
        #[arg(value_name = "OUTPUT", default_value = "demo.bin")]
        output: PathBuf,

        /// Number of scans
        #[arg(long, default_value = "1000")]
        scans: usize,

        /// Points per scan
        #[arg(long, default_value = "64")]
        points: usize,

        #[command(flatten)]
        conversion: ConversionArgs,
    },

    /// Display the header and records of an artifact
    Inspect {
        /// Artifact path
        #[arg(value_name = "ARTIFACT")]
        file: PathBuf,

        /// Number of records to list
        #[arg(short = 'n', long, default_value = "10")]
        records: usize,

        /// Export every point to a CSV file
        #[arg(long, value_name = "FILE")]
        csv: Option<PathBuf>,
    },

    /// Validate artifact integrity
    Validate {
        /// Artifact path
        #[arg(value_name = "ARTIFACT")]
        file: PathBuf,
    },

    /// Print spectrum viewer payloads as JSON
    View {
        /// Directory holding the source files
        #[arg(long, default_value = ".", global = true)]
        root: PathBuf,

        #[command(subcommand)]
        query: view::ViewQuery,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Convert {
            input,
            output,
            conversion,
        } => convert::run(input, output, conversion),
        Commands::Demo {
            output,
            scans,
            points,
            conversion,
        } => demo::run(output, scans, points, conversion),
        Commands::Inspect { file, records, csv } => inspect::run(file, records, csv),
        Commands::Validate { file } => validate::run(file),
        Commands::View { root, query } => view::run(root, query),
    }
}

/// Exit code for a failed command: setup failures (the source could not be
/// opened) get their own code, everything else is a general failure
pub fn exit_code_for(error: &anyhow::Error) -> ExitCode {
    let setup = error.chain().any(|cause| {
        cause.downcast_ref::<SourceError>().is_some()
            || matches!(
                cause.downcast_ref::<ConversionError>(),
                Some(ConversionError::SourceError(_))
            )
    });
    if setup {
        ExitCode::from(EXIT_SETUP_FAILURE)
    } else {
        ExitCode::FAILURE
    }
}
