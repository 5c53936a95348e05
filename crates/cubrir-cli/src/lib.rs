//! Cubridor: command-line interface for the Cubrir coverage engine.
//!
//! ## Usage
//!
//! ```bash
//! cubridor export app.bin --instr-profile default.cprof     # JSON to stdout
//! cubridor export app.bin --instr-profile default.cprof \
//!     --sources src/ --output coverage.json
//! cubridor report app.bin --instr-profile default.cprof     # summary table
//! ```

#![warn(missing_docs)]

mod commands;
mod error;
mod handlers;
mod output;

pub use commands::{Cli, Commands, ExportArgs, ReportArgs};
pub use error::{CliError, CliResult};
pub use handlers::{execute_export, execute_report};
pub use output::render_report_table;
