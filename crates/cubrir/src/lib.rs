//! Cubrir: Coverage-Mapping Aggregation and Export Engine
//!
//! Cubrir (Spanish: "to cover") computes code-coverage statistics from
//! instrumented test binaries plus an indexed execution profile, and renders
//! them as a versioned JSON document for downstream reporting.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    CUBRIR Architecture                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Profile +  │    │ Summary /  │    │ JSON       │            │
//! │   │ Mapping    │───►│ Report     │───►│ Exporter   │            │
//! │   │ Loader     │    │ Builder    │    │            │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! │         ▲                 ▲                                      │
//! │   ┌────────────┐    ┌────────────┐                               │
//! │   │ Reader     │    │ Worker     │                               │
//! │   │ Session    │    │ Pool       │                               │
//! │   └────────────┘    └────────────┘                               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The typical entry point is [`CoverageSession`], which owns the parsed
//! per-object mapping readers so that repeated queries against the same
//! binaries skip re-parsing:
//!
//! ```no_run
//! use cubrir::CoverageSession;
//!
//! let mut session = CoverageSession::new(
//!     "build/default.cprof",
//!     &["build/app.cmap".into(), "build/lib.cmap".into()],
//!     &[],
//! )?;
//! let json = session.export_json(None);
//! # Ok::<(), cubrir::CubrirError>(())
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

/// Coverage model, reader session, summaries, and exporters.
pub mod coverage;

mod diagnostics;
mod paths;
mod result;

pub use coverage::formatters::{ExportFormat, Exporter};
pub use coverage::mapping::{Counter, CounterExpression, ExprOp, MappingReader, RegionKind};
pub use coverage::model::{CountedRegion, CoverageModel, FunctionRecord, InstantiationGroup};
pub use coverage::profile::{ProfileData, ProfileRecord};
pub use coverage::report::prepare_file_reports;
pub use coverage::segment::CoverageSegment;
pub use coverage::session::{compute_coverage_json, CoverageSession};
pub use coverage::summary::{
    FileCoverageSummary, FunctionCoverageInfo, FunctionCoverageSummary, LineCoverageInfo,
    RegionCoverageInfo,
};
pub use diagnostics::{Diagnostic, DiagnosticSink, Severity};
pub use paths::resolve_source_paths;
pub use result::{CubrirError, CubrirResult};
