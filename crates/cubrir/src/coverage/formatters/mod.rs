//! Coverage export formatters.
//!
//! A single tagged [`ExportFormat`] selects the renderer; adding a format
//! means adding a variant, not a subclass.

mod json;

use crate::coverage::model::CoverageModel;
use crate::result::CubrirResult;

/// Output format for a coverage export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// The versioned `llvm.coverage.json.export` schema
    #[default]
    Json,
}

/// Renders a loaded coverage model in a chosen format
#[derive(Debug)]
pub struct Exporter<'a> {
    format: ExportFormat,
    model: &'a CoverageModel,
}

impl<'a> Exporter<'a> {
    /// Create an exporter over `model`.
    #[must_use]
    pub fn new(format: ExportFormat, model: &'a CoverageModel) -> Self {
        Self { format, model }
    }

    /// Render the whole model, or only `source_files` when given.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_root(&self, source_files: Option<&[String]>) -> CubrirResult<String> {
        match self.format {
            ExportFormat::Json => json::render_root(self.model, source_files),
        }
    }
}
