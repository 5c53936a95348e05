//! Versioned JSON coverage export.
//!
//! Schema:
//!
//! ```json
//! { "version": "3.0.1",
//!   "type": "llvm.coverage.json.export",
//!   "data": [ { "files": [ { "filename": "...",
//!                            "segments": [[line, col, count, has_count,
//!                                          is_region_entry, is_gap_region]] } ] } ] }
//! ```
//!
//! Per-file segment rendering fans out over the bounded worker pool;
//! files are sorted byte-wise by filename before serialization so output
//! is deterministic regardless of completion order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::coverage::model::CoverageModel;
use crate::coverage::report::pool_size;
use crate::coverage::segment::CoverageSegment;
use crate::result::CubrirResult;

/// The semantic version of the export schema.
const EXPORT_JSON_VERSION: &str = "3.0.1";

/// Unique type identifier for the JSON coverage export.
const EXPORT_JSON_TYPE: &str = "llvm.coverage.json.export";

/// Saturate an execution count into the signed 64-bit range.
///
/// Counts are stored unsigned; the schema carries them as signed values.
/// A naive cast would be implementation-defined for counts above
/// `i64::MAX`, so those clamp to `i64::MAX` instead.
pub(crate) fn clamp_u64_to_i64(u: u64) -> i64 {
    u.min(i64::MAX as u64) as i64
}

/// One segment row: [line, col, count, has_count, is_region_entry,
/// is_gap_region].
#[derive(Debug, Serialize)]
struct SegmentRow(u32, u32, i64, bool, bool, bool);

impl From<&CoverageSegment> for SegmentRow {
    fn from(segment: &CoverageSegment) -> Self {
        Self(
            segment.line,
            segment.col,
            clamp_u64_to_i64(segment.count),
            segment.has_count,
            segment.is_region_entry,
            segment.is_gap_region,
        )
    }
}

#[derive(Debug, Serialize)]
struct FileExport {
    filename: String,
    segments: Vec<SegmentRow>,
}

#[derive(Debug, Serialize)]
struct ExportData {
    files: Vec<FileExport>,
}

#[derive(Debug, Serialize)]
struct ExportRoot {
    version: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    data: Vec<ExportData>,
}

fn render_file(model: &CoverageModel, filename: &str) -> FileExport {
    let segments = model
        .coverage_for_file(filename)
        .iter()
        .map(SegmentRow::from)
        .collect();
    FileExport {
        filename: filename.to_string(),
        segments,
    }
}

fn render_files(model: &CoverageModel, source_files: &[String]) -> Vec<FileExport> {
    let rendered: Mutex<Vec<FileExport>> = Mutex::new(Vec::with_capacity(source_files.len()));
    let next = AtomicUsize::new(0);

    std::thread::scope(|scope| {
        for _ in 0..pool_size(source_files.len()) {
            scope.spawn(|| loop {
                let index = next.fetch_add(1, Ordering::Relaxed);
                if index >= source_files.len() {
                    break;
                }
                let file = render_file(model, &source_files[index]);
                rendered
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(file);
            });
        }
    });

    rendered.into_inner().unwrap_or_else(PoisonError::into_inner)
}

/// Render the model (or the requested subset of its files) as the
/// versioned JSON document.
pub(crate) fn render_root(
    model: &CoverageModel,
    source_files: Option<&[String]>,
) -> CubrirResult<String> {
    let source_files = match source_files {
        Some(files) => files.to_vec(),
        None => model.unique_source_files(),
    };
    let mut files = render_files(model, &source_files);
    // Sort files in order of their names.
    files.sort_by(|a, b| a.filename.cmp(&b.filename));

    let root = ExportRoot {
        version: EXPORT_JSON_VERSION,
        kind: EXPORT_JSON_TYPE,
        data: vec![ExportData { files }],
    };
    Ok(serde_json::to_string(&root)?)
}
