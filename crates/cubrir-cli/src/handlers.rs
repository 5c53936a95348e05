//! Subcommand handlers.
//!
//! Diagnostics collected by the coverage session are mirrored to `tracing`
//! by the library, so handlers never print them directly; the subscriber
//! installed in `main` routes them to stderr at the chosen verbosity.

use std::path::{Path, PathBuf};

use cubrir::{
    prepare_file_reports, resolve_source_paths, CoverageSession, DiagnosticSink, Severity,
};

use crate::commands::{ExportArgs, ReportArgs};
use crate::error::{CliError, CliResult};
use crate::output::render_report_table;

/// Validate the `--arch` list against the object list and open a session.
fn open_session(
    profile: &Path,
    objects: &[PathBuf],
    arch: &[String],
) -> CliResult<CoverageSession> {
    if !arch.is_empty() && arch.len() != objects.len() {
        return Err(CliError::config(format!(
            "--arch takes one value per object file ({} objects, {} architectures)",
            objects.len(),
            arch.len()
        )));
    }
    Ok(CoverageSession::new(profile, objects, arch)?)
}

/// Resolve `--sources` specs into canonical paths, or `None` when no
/// restriction was requested. Unresolvable specs are skipped with a warning.
fn resolve_filter(specs: &[String]) -> Option<Vec<String>> {
    if specs.is_empty() {
        return None;
    }
    let mut sink = DiagnosticSink::new();
    Some(resolve_source_paths(specs, &mut sink))
}

/// Whether `file` is selected by the resolved filter: an exact match, or
/// anything under a filter entry naming a directory.
fn matches_filter(file: &str, filter: &[String]) -> bool {
    filter
        .iter()
        .any(|entry| file == entry || file.strip_prefix(entry).is_some_and(|rest| rest.starts_with('/')))
}

/// Run the export command: render the coverage JSON document to stdout or
/// to `--output`.
pub fn execute_export(args: &ExportArgs) -> CliResult<()> {
    let mut session = open_session(&args.instr_profile, &args.objects, &args.arch)?;
    let filter = resolve_filter(&args.sources);
    let json = session.export_json(filter.as_deref());

    if json.is_empty() {
        let message = session
            .diagnostics()
            .iter()
            .rev()
            .find(|d| d.severity == Severity::Error)
            .map_or_else(
                || "export produced no output".to_string(),
                |d| d.message.clone(),
            );
        return Err(CliError::export(message));
    }

    match &args.output {
        Some(path) => {
            std::fs::write(path, json.as_bytes())?;
            tracing::info!(path = %path.display(), bytes = json.len(), "wrote coverage export");
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Run the report command: print the per-file summary table.
pub fn execute_report(args: &ReportArgs) -> CliResult<()> {
    let mut session = open_session(&args.instr_profile, &args.objects, &args.arch)?;
    let model = session.load()?;

    let mut files = model.unique_source_files();
    if let Some(filter) = resolve_filter(&args.sources) {
        files.retain(|f| matches_filter(f, &filter));
    }

    let (reports, totals) = prepare_file_reports(&model, &files);
    print!("{}", render_report_table(&reports, &totals));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_specs_mean_no_filter() {
        assert!(resolve_filter(&[]).is_none());
    }

    #[test]
    fn mismatched_arch_count_is_a_configuration_error() {
        let objects = vec![PathBuf::from("a.bin"), PathBuf::from("b.bin")];
        let arch = vec!["arm64".to_string()];
        let err = open_session(Path::new("default.cprof"), &objects, &arch).unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
        assert!(err.to_string().contains("2 objects"));
    }

    #[test]
    fn filter_matches_exact_paths_and_directory_contents() {
        let filter = vec!["/src/app".to_string(), "/src/lib.rs".to_string()];
        assert!(matches_filter("/src/lib.rs", &filter));
        assert!(matches_filter("/src/app/main.rs", &filter));
        assert!(!matches_filter("/src/apps/other.rs", &filter));
        assert!(!matches_filter("/src/main.rs", &filter));
    }
}
