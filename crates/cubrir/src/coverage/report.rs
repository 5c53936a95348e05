//! Parallel per-file report building.
//!
//! One independent task per file, fanned out over a bounded worker pool.
//! Tasks share nothing mutable except the completion list, guarded by a
//! single lock held only for the O(1) append. Totals are accumulated with
//! `+=` after the pool drains, so scheduling order cannot affect them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::coverage::model::CoverageModel;
use crate::coverage::summary::{FileCoverageSummary, FunctionCoverageSummary};

/// Worker count for `n` independent tasks: bounded by the machine, never
/// zero, never more than the task count.
pub(crate) fn pool_size(n: usize) -> usize {
    let available = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
    available.min(n).max(1)
}

/// Byte offsets where each path component of `path` begins. The root
/// counts as one component.
fn component_offsets(path: &str) -> Vec<usize> {
    let bytes = path.as_bytes();
    let mut offsets = Vec::new();
    let mut i = 0;
    if bytes.first() == Some(&b'/') {
        offsets.push(0);
        while i < bytes.len() && bytes[i] == b'/' {
            i += 1;
        }
    }
    while i < bytes.len() {
        offsets.push(i);
        while i < bytes.len() && bytes[i] != b'/' {
            i += 1;
        }
        while i < bytes.len() && bytes[i] == b'/' {
            i += 1;
        }
    }
    offsets
}

fn components(path: &str) -> Vec<&str> {
    let offsets = component_offsets(path);
    let mut parts = Vec::with_capacity(offsets.len());
    for (i, &start) in offsets.iter().enumerate() {
        let end = offsets.get(i + 1).copied().unwrap_or(path.len());
        parts.push(path[start..end].trim_end_matches('/'));
    }
    // Keep the root's separator so "/a" splits into "/", "a".
    if path.starts_with('/') && !parts.is_empty() {
        parts[0] = "/";
    }
    parts
}

/// Number of leading path components every path in `paths` shares.
///
/// Starts from file[0]'s full component sequence and only ever shrinks at
/// the first mismatch against each other path; it never grows, so parts of
/// already-visited paths cannot be stripped away retroactively.
fn num_redundant_path_components(paths: &[String]) -> usize {
    let first: Vec<&str> = components(&paths[0]);
    let mut redundant = first.len();
    for path in &paths[1..] {
        if redundant == 0 {
            break;
        }
        for (index, component) in components(path).into_iter().enumerate() {
            if index >= redundant {
                break;
            }
            if first[index] != component {
                redundant = index;
                break;
            }
        }
    }
    redundant
}

/// Character length of the longest redundant prefix of `paths`, in whole
/// path components. With fewer than two paths nothing is redundant.
pub(crate) fn redundant_prefix_len(paths: &[String]) -> usize {
    if paths.len() <= 1 {
        return 0;
    }
    let redundant = num_redundant_path_components(paths);
    let offsets = component_offsets(&paths[0]);
    offsets.get(redundant).copied().unwrap_or(paths[0].len())
}

fn strip_prefix(path: &str, prefix_len: usize) -> &str {
    path.get(prefix_len..).unwrap_or(path)
}

/// Build the coverage summary for a single file.
///
/// Each instantiation is summarized and counted individually; the group
/// then contributes exactly one logical function to the file, carrying the
/// merged (max) region coverage of its instantiations.
pub(crate) fn prepare_single_file_report(
    model: &CoverageModel,
    filename: &str,
    prefix_len: usize,
) -> FileCoverageSummary {
    let mut report = FileCoverageSummary::new(strip_prefix(filename, prefix_len));
    for group in model.instantiation_groups(filename) {
        let mut instantiation_summaries = Vec::with_capacity(group.instantiations().len());
        for function in group.instantiations() {
            let summary = FunctionCoverageSummary::for_function(function);
            report.add_instantiation(&summary);
            instantiation_summaries.push(summary);
        }
        if instantiation_summaries.is_empty() {
            continue;
        }
        let group_summary =
            FunctionCoverageSummary::for_instantiation_group(&group, &instantiation_summaries);
        report.add_function(&group_summary);
    }
    report
}

/// Prepare per-file summaries for `files`, plus the accumulated grand
/// total.
///
/// Synchronous to the caller: the worker pool is fully drained before the
/// call returns. Per-file summaries come back in the order of `files`
/// regardless of completion order.
#[must_use]
pub fn prepare_file_reports(
    model: &CoverageModel,
    files: &[String],
) -> (Vec<FileCoverageSummary>, FileCoverageSummary) {
    let prefix_len = redundant_prefix_len(files);
    let completed: Mutex<Vec<(usize, FileCoverageSummary)>> =
        Mutex::new(Vec::with_capacity(files.len()));
    let next = AtomicUsize::new(0);

    std::thread::scope(|scope| {
        for _ in 0..pool_size(files.len()) {
            scope.spawn(|| loop {
                let index = next.fetch_add(1, Ordering::Relaxed);
                if index >= files.len() {
                    break;
                }
                let report = prepare_single_file_report(model, &files[index], prefix_len);
                completed
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push((index, report));
            });
        }
    });

    let mut reports = completed.into_inner().unwrap_or_else(PoisonError::into_inner);
    reports.sort_by_key(|(index, _)| *index);

    let mut totals = FileCoverageSummary::new("TOTAL");
    for (_, report) in &reports {
        totals += report;
    }
    (reports.into_iter().map(|(_, r)| r).collect(), totals)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn shared_directory_prefix_is_stripped() {
        let files = paths(&["/a/b/c.cpp", "/a/b/d.cpp"]);
        let len = redundant_prefix_len(&files);
        assert_eq!(strip_prefix(&files[0], len), "c.cpp");
        assert_eq!(strip_prefix(&files[1], len), "d.cpp");
    }

    #[test]
    fn single_file_keeps_its_full_path() {
        let files = paths(&["/a/b/c.cpp"]);
        assert_eq!(redundant_prefix_len(&files), 0);
    }

    #[test]
    fn mismatch_only_shrinks_the_candidate() {
        // The third path shares more with the first than the second does;
        // the redundant count must stay at the second's mismatch point.
        let files = paths(&["/a/b/c/x.rs", "/a/q/y.rs", "/a/b/c/z.rs"]);
        let len = redundant_prefix_len(&files);
        assert_eq!(strip_prefix(&files[0], len), "b/c/x.rs");
        assert_eq!(strip_prefix(&files[1], len), "q/y.rs");
    }

    #[test]
    fn unrelated_roots_share_only_the_root() {
        let files = paths(&["/a/x.rs", "/b/y.rs"]);
        let len = redundant_prefix_len(&files);
        assert_eq!(strip_prefix(&files[0], len), "a/x.rs");
    }

    #[test]
    fn partial_component_matches_do_not_count() {
        // "ab" and "abc" agree on two leading characters but are different
        // components; nothing beyond the root is redundant.
        let files = paths(&["/ab/x.rs", "/abc/x.rs"]);
        let len = redundant_prefix_len(&files);
        assert_eq!(strip_prefix(&files[0], len), "ab/x.rs");
    }

    #[test]
    fn relative_paths_work_too() {
        let files = paths(&["src/lib.rs", "src/main.rs"]);
        let len = redundant_prefix_len(&files);
        assert_eq!(strip_prefix(&files[0], len), "lib.rs");
        assert_eq!(strip_prefix(&files[1], len), "main.rs");
    }
}
