//! Source-path resolution at the library edge.
//!
//! Callers hand the exporter arbitrary path specifications; the core only
//! ever sees the canonical absolute paths produced here. Failures degrade to
//! per-path warnings so one bad spec never sinks the rest of the filter.

use crate::diagnostics::DiagnosticSink;

/// Resolve path specifications to a set of canonical absolute file paths.
///
/// Each spec is canonicalized against the filesystem. A spec that cannot be
/// resolved (missing file, permission error) is skipped with a warning;
/// the remaining specs proceed. Duplicates after canonicalization collapse
/// to one entry, preserving first-seen order.
#[must_use]
pub fn resolve_source_paths(specs: &[String], sink: &mut DiagnosticSink) -> Vec<String> {
    let mut resolved = Vec::with_capacity(specs.len());
    for spec in specs {
        match std::fs::canonicalize(spec) {
            Ok(path) => {
                let path = path.to_string_lossy().into_owned();
                if !resolved.contains(&path) {
                    resolved.push(path);
                }
            }
            Err(e) => {
                sink.warning(Some(spec), format!("skipping source path: {e}"));
            }
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn unresolvable_paths_warn_and_skip() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("a.rs");
        let mut f = std::fs::File::create(&real).unwrap();
        writeln!(f, "fn main() {{}}").unwrap();

        let mut sink = DiagnosticSink::new();
        let specs = vec![
            real.display().to_string(),
            dir.path().join("missing.rs").display().to_string(),
        ];
        let resolved = resolve_source_paths(&specs, &mut sink);

        assert_eq!(resolved.len(), 1);
        assert!(resolved[0].ends_with("a.rs"));
        assert_eq!(sink.entries().len(), 1);
        assert!(!sink.has_errors());
    }

    #[test]
    fn duplicate_specs_collapse() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("b.rs");
        std::fs::File::create(&real).unwrap();

        let mut sink = DiagnosticSink::new();
        let spec = real.display().to_string();
        let resolved = resolve_source_paths(&[spec.clone(), spec], &mut sink);
        assert_eq!(resolved.len(), 1);
        assert!(sink.entries().is_empty());
    }
}
