//! In-memory coverage model: the join of profile counters with mapping
//! records, keyed by source file.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use crate::coverage::mapping::{evaluate_counter, MappingReader, RegionKind};
use crate::coverage::profile::ProfileData;
use crate::coverage::segment::{self, CoverageSegment};
use crate::result::CubrirResult;

/// A source region with its resolved execution count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountedRegion {
    /// Region kind
    pub kind: RegionKind,
    /// Index into the owning function's filename table
    pub file_id: u32,
    /// 1-based start line
    pub line_start: u32,
    /// 1-based start column
    pub col_start: u32,
    /// 1-based end line
    pub line_end: u32,
    /// 1-based end column
    pub col_end: u32,
    /// Resolved execution count
    pub execution_count: u64,
}

/// One function's resolved coverage: name, hash, and counted regions
#[derive(Debug, Clone)]
pub struct FunctionRecord {
    /// Mangled function name
    pub name: String,
    /// Structural hash embedded at instrumentation time
    pub structural_hash: u64,
    /// Filename table the regions' `file_id`s index into (shared per object)
    pub filenames: Arc<Vec<String>>,
    /// Counted regions
    pub regions: Vec<CountedRegion>,
    /// Execution count of the function entry
    pub execution_count: u64,
}

impl FunctionRecord {
    /// Filename a region maps into.
    #[must_use]
    pub fn filename_of(&self, region: &CountedRegion) -> &str {
        self.filenames
            .get(region.file_id as usize)
            .map_or("", String::as_str)
    }

    /// Regions of this function mapped into `filename`.
    pub fn regions_in<'a>(
        &'a self,
        filename: &'a str,
    ) -> impl Iterator<Item = &'a CountedRegion> + 'a {
        self.regions
            .iter()
            .filter(move |r| self.filename_of(r) == filename)
    }

    /// Whether any region of this function maps into `filename`.
    #[must_use]
    pub fn touches(&self, filename: &str) -> bool {
        self.regions.iter().any(|r| self.filename_of(r) == filename)
    }
}

/// Compiled instances sharing one source definition, reported as a single
/// logical function
#[derive(Debug)]
pub struct InstantiationGroup<'a> {
    line: u32,
    column: u32,
    instantiations: Vec<&'a FunctionRecord>,
}

impl<'a> InstantiationGroup<'a> {
    /// 1-based line of the shared definition
    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// 1-based column of the shared definition
    #[must_use]
    pub fn column(&self) -> u32 {
        self.column
    }

    /// The instantiations in the group
    #[must_use]
    pub fn instantiations(&self) -> &[&'a FunctionRecord] {
        &self.instantiations
    }

    /// Sum of all instantiation execution counts
    #[must_use]
    pub fn total_execution_count(&self) -> u64 {
        self.instantiations
            .iter()
            .fold(0u64, |acc, f| acc.saturating_add(f.execution_count))
    }

    /// The group's declared name, when every instantiation agrees on one.
    /// Anonymous groups (differing expansions) report `None` and are
    /// identified by their definition line/column instead.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        let first = self.instantiations.first()?;
        self.instantiations
            .iter()
            .all(|f| f.name == first.name)
            .then_some(first.name.as_str())
    }
}

/// The loaded coverage model for one (profile, object set) pair
#[derive(Debug, Default)]
pub struct CoverageModel {
    functions: Vec<FunctionRecord>,
    mismatched: usize,
}

impl CoverageModel {
    /// Join profile counters against the mapping readers' records.
    ///
    /// Readers are drained through their record cursors, so a warmed session
    /// must [`reset`](MappingReader::reset) them first. Records absent from
    /// the profile load with all-zero counters (never executed); records
    /// whose structural hash disagrees with the profile are retained with
    /// zero counters and counted as mismatched. Duplicate records across
    /// objects load once.
    pub(crate) fn build(
        profile: &ProfileData,
        readers: &mut [MappingReader],
    ) -> CubrirResult<Self> {
        let mut functions = Vec::new();
        let mut mismatched = 0usize;
        let mut seen: HashSet<(String, u64)> = HashSet::new();

        for reader in readers.iter_mut() {
            let filenames = Arc::new(reader.filenames().to_vec());
            while let Some(index) = reader.advance() {
                let record = reader.record(index);
                if !seen.insert((record.name.clone(), record.structural_hash)) {
                    continue;
                }

                let empty: &[u64] = &[];
                let counts = match profile.lookup(&record.name) {
                    Some(p) if p.structural_hash == record.structural_hash => {
                        p.counters.as_slice()
                    }
                    Some(_) => {
                        mismatched += 1;
                        empty
                    }
                    None => empty,
                };

                let regions: Vec<CountedRegion> = record
                    .regions
                    .iter()
                    .map(|r| CountedRegion {
                        kind: r.kind,
                        file_id: r.file_id,
                        line_start: r.line_start,
                        col_start: r.col_start,
                        line_end: r.line_end,
                        col_end: r.col_end,
                        execution_count: evaluate_counter(
                            r.counter,
                            counts,
                            &record.expressions,
                        ),
                    })
                    .collect();

                let execution_count = regions
                    .iter()
                    .find(|r| r.kind == RegionKind::Code)
                    .map_or(0, |r| r.execution_count);

                functions.push(FunctionRecord {
                    name: record.name.clone(),
                    structural_hash: record.structural_hash,
                    filenames: Arc::clone(&filenames),
                    regions,
                    execution_count,
                });
            }
        }

        tracing::debug!(
            functions = functions.len(),
            mismatched,
            "built coverage model"
        );
        Ok(Self {
            functions,
            mismatched,
        })
    }

    /// All loaded function records
    #[must_use]
    pub fn functions(&self) -> &[FunctionRecord] {
        &self.functions
    }

    /// Number of functions whose structural hash disagreed with the profile
    #[must_use]
    pub fn mismatched_count(&self) -> usize {
        self.mismatched
    }

    /// Every source file referenced by at least one region, sorted
    /// byte-wise ascending.
    #[must_use]
    pub fn unique_source_files(&self) -> Vec<String> {
        let mut files = BTreeSet::new();
        for function in &self.functions {
            for region in &function.regions {
                files.insert(function.filename_of(region).to_string());
            }
        }
        files.remove("");
        files.into_iter().collect()
    }

    /// Functions with at least one region in `filename`.
    pub fn functions_for_file<'a>(
        &'a self,
        filename: &'a str,
    ) -> impl Iterator<Item = &'a FunctionRecord> + 'a {
        self.functions.iter().filter(move |f| f.touches(filename))
    }

    /// Instantiation groups for `filename`, keyed by the definition's
    /// (line, column); deterministic ascending order.
    #[must_use]
    pub fn instantiation_groups<'a>(&'a self, filename: &'a str) -> Vec<InstantiationGroup<'a>> {
        let mut groups: BTreeMap<(u32, u32), Vec<&FunctionRecord>> = BTreeMap::new();
        for function in self.functions_for_file(filename) {
            let definition = function
                .regions_in(filename)
                .map(|r| (r.line_start, r.col_start))
                .min();
            if let Some(loc) = definition {
                groups.entry(loc).or_default().push(function);
            }
        }
        groups
            .into_iter()
            .map(|((line, column), instantiations)| InstantiationGroup {
                line,
                column,
                instantiations,
            })
            .collect()
    }

    /// Segments for `filename`: ordered breakpoints where the active
    /// execution count changes, ascending by (line, column).
    #[must_use]
    pub fn coverage_for_file(&self, filename: &str) -> Vec<CoverageSegment> {
        let regions: Vec<CountedRegion> = self
            .functions_for_file(filename)
            .flat_map(|f| f.regions_in(filename).copied())
            .collect();
        segment::build_segments(regions)
    }
}
