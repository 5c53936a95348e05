//! Coverage session: the reader cache and the public entry point.
//!
//! Coverage is typically queried many times against the same stable test
//! binaries (after each test case, say); re-parsing their mapping sections
//! every time is the dominant cost. A [`CoverageSession`] is an explicit,
//! caller-owned handle over that cache: the first query parses every object
//! file, later queries reset each reader's record cursor and reuse the
//! decoded buffers. The indexed profile is re-read on every query; it is
//! the part that changes between test runs.
//!
//! The cache is never invalidated by file-content changes; if the binaries
//! change, start a new session. A session serves one logical query at a
//! time (`&mut self` enforces the no-concurrent-resets rule).

use std::path::{Path, PathBuf};

use crate::coverage::formatters::{ExportFormat, Exporter};
use crate::coverage::mapping::MappingReader;
use crate::coverage::model::CoverageModel;
use crate::coverage::profile::ProfileData;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::result::{CubrirError, CubrirResult};

/// A caller-owned coverage query session over a fixed object-file set
#[derive(Debug)]
pub struct CoverageSession {
    profile_path: PathBuf,
    object_paths: Vec<PathBuf>,
    architectures: Vec<String>,
    /// Parsed once per session; `None` until the first query.
    readers: Option<Vec<MappingReader>>,
    diagnostics: DiagnosticSink,
}

impl CoverageSession {
    /// Create a session for one (profile, object set, architectures)
    /// combination.
    ///
    /// `architectures` must be empty or name one architecture per object.
    ///
    /// # Errors
    ///
    /// [`CubrirError::ArchitectureCount`] when the architecture list does
    /// not line up with the object list.
    pub fn new(
        profile_path: impl Into<PathBuf>,
        object_paths: &[PathBuf],
        architectures: &[String],
    ) -> CubrirResult<Self> {
        if !architectures.is_empty() && architectures.len() != object_paths.len() {
            return Err(CubrirError::ArchitectureCount {
                objects: object_paths.len(),
                architectures: architectures.len(),
            });
        }
        Ok(Self {
            profile_path: profile_path.into(),
            object_paths: object_paths.to_vec(),
            architectures: architectures.to_vec(),
            readers: None,
            diagnostics: DiagnosticSink::new(),
        })
    }

    /// Load the coverage model: fresh profile counters joined against the
    /// (possibly cached) mapping readers.
    ///
    /// # Errors
    ///
    /// [`CubrirError::FatalLoad`] when the profile is missing/corrupt or an
    /// object file is structurally unparseable. Per-object "no coverage
    /// data" and function hash mismatches are warnings, not errors.
    pub fn load(&mut self) -> CubrirResult<CoverageModel> {
        let profile = ProfileData::load(&self.profile_path)
            .map_err(|e| CubrirError::fatal(&self.profile_path, e))?;

        match self.readers.as_mut() {
            Some(readers) => {
                // Warm session: rewind the record cursors, touch no bytes.
                for reader in readers.iter_mut() {
                    reader.reset();
                }
            }
            None => {
                let parsed = Self::parse_objects(
                    &self.object_paths,
                    &self.architectures,
                    &mut self.diagnostics,
                )?;
                self.readers = Some(parsed);
            }
        }
        let readers = self.readers.get_or_insert_with(Vec::new);

        let model = CoverageModel::build(&profile, readers)?;
        if model.mismatched_count() > 0 {
            self.diagnostics.warning(
                None,
                format!("{} functions have mismatched data", model.mismatched_count()),
            );
        }
        Ok(model)
    }

    fn parse_objects(
        object_paths: &[PathBuf],
        architectures: &[String],
        sink: &mut DiagnosticSink,
    ) -> CubrirResult<Vec<MappingReader>> {
        let mut readers = Vec::with_capacity(object_paths.len());
        for (index, path) in object_paths.iter().enumerate() {
            let bytes =
                std::fs::read(path).map_err(|e| CubrirError::fatal(path, CubrirError::Io(e)))?;
            let reader = match MappingReader::parse(&bytes) {
                Ok(reader) => reader,
                Err(CubrirError::BadMagic { .. }) => {
                    // No coverage section in this object; it contributes
                    // nothing and the batch continues.
                    let whence = path.display().to_string();
                    sink.warning(Some(&whence), "no coverage data found");
                    continue;
                }
                Err(e) => return Err(CubrirError::fatal(path, e)),
            };
            if let Some(requested) = architectures.get(index) {
                if !requested.is_empty() && reader.arch() != requested {
                    return Err(CubrirError::ArchMismatch {
                        path: path.display().to_string(),
                        requested: requested.clone(),
                        found: reader.arch().to_string(),
                    });
                }
            }
            readers.push(reader);
        }
        Ok(readers)
    }

    /// Render the coverage JSON document, reusing cached readers.
    ///
    /// On any fatal failure this returns an empty string; the failure is
    /// recorded in [`diagnostics`](Self::diagnostics) and logged.
    pub fn export_json(&mut self, source_filter: Option<&[String]>) -> String {
        match self.try_export(ExportFormat::Json, source_filter) {
            Ok(json) => json,
            Err(e) => {
                self.diagnostics.error(None, e.to_string());
                String::new()
            }
        }
    }

    fn try_export(
        &mut self,
        format: ExportFormat,
        source_filter: Option<&[String]>,
    ) -> CubrirResult<String> {
        let model = self.load()?;
        Exporter::new(format, &model).render_root(source_filter)
    }

    /// Diagnostics collected so far, in arrival order
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics.entries()
    }

    /// Whether the session's object set has been parsed yet
    #[must_use]
    pub fn is_warm(&self) -> bool {
        self.readers.is_some()
    }
}

/// One-shot convenience around [`CoverageSession`]: load, export, done.
///
/// Returns the JSON document, or an empty string (plus a logged
/// diagnostic) on fatal failure. Callers that query repeatedly should hold
/// a session instead to keep the parsed readers warm.
#[must_use]
pub fn compute_coverage_json(
    profile_path: &Path,
    object_paths: &[PathBuf],
    architectures: &[String],
    source_filter: Option<&[String]>,
) -> String {
    match CoverageSession::new(profile_path, object_paths, architectures) {
        Ok(mut session) => session.export_json(source_filter),
        Err(e) => {
            tracing::error!(target: "cubrir", "failed to open coverage session: {e}");
            String::new()
        }
    }
}
