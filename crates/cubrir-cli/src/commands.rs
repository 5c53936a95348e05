//! CLI command definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Cubridor: CLI for Cubrir - coverage aggregation and JSON export
#[derive(Parser, Debug)]
#[command(name = "cubridor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export coverage as the versioned JSON document
    Export(ExportArgs),

    /// Print a per-file coverage summary table
    Report(ReportArgs),
}

/// Arguments for the export command
#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// Instrumented object files carrying coverage mappings
    #[arg(required = true, value_name = "OBJECT")]
    pub objects: Vec<PathBuf>,

    /// Indexed execution profile
    #[arg(long, value_name = "FILE", env = "CUBRIR_PROFILE")]
    pub instr_profile: PathBuf,

    /// Architecture to select, one per object (omit to accept any)
    #[arg(long, value_name = "ARCH")]
    pub arch: Vec<String>,

    /// Restrict the export to these source files or directories
    #[arg(long = "sources", value_name = "PATH")]
    pub sources: Vec<String>,

    /// Write the document here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Arguments for the report command
#[derive(Parser, Debug)]
pub struct ReportArgs {
    /// Instrumented object files carrying coverage mappings
    #[arg(required = true, value_name = "OBJECT")]
    pub objects: Vec<PathBuf>,

    /// Indexed execution profile
    #[arg(long, value_name = "FILE", env = "CUBRIR_PROFILE")]
    pub instr_profile: PathBuf,

    /// Architecture to select, one per object (omit to accept any)
    #[arg(long, value_name = "ARCH")]
    pub arch: Vec<String>,

    /// Restrict the report to these source files or directories
    #[arg(long = "sources", value_name = "PATH")]
    pub sources: Vec<String>,
}
