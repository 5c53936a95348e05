//! Coverage summary algebra.
//!
//! Two combining operators run through everything here. `+=` (accumulate)
//! sums both fields and is used across independent functions and files; it
//! is commutative and associative, which is what lets the parallel report
//! builder ignore completion order. `merge` takes the per-field maximum and
//! is used across instantiations of one logical definition: a region counts
//! as covered for the definition if any instantiation covered it.

use std::ops::AddAssign;

use crate::coverage::mapping::RegionKind;
use crate::coverage::model::{FunctionRecord, InstantiationGroup};
use crate::coverage::segment;

/// Region coverage for a function or file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionCoverageInfo {
    covered: u64,
    total: u64,
}

impl RegionCoverageInfo {
    /// Create from covered/total counts.
    #[must_use]
    pub fn new(covered: u64, total: u64) -> Self {
        debug_assert!(covered <= total, "covered regions over-counted");
        Self { covered, total }
    }

    /// Regions executed at least once
    #[must_use]
    pub fn covered(&self) -> u64 {
        self.covered
    }

    /// Total regions
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Whether every region was executed
    #[must_use]
    pub fn is_fully_covered(&self) -> bool {
        self.covered == self.total
    }

    /// Percentage covered; 0.0 when there are no regions
    #[must_use]
    pub fn percent_covered(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.covered as f64 / self.total as f64 * 100.0
    }

    /// Per-field maximum, for combining instantiations of one definition.
    pub fn merge(&mut self, other: &Self) {
        self.covered = self.covered.max(other.covered);
        self.total = self.total.max(other.total);
    }
}

impl AddAssign<&RegionCoverageInfo> for RegionCoverageInfo {
    fn add_assign(&mut self, rhs: &RegionCoverageInfo) {
        self.covered = self.covered.saturating_add(rhs.covered);
        self.total = self.total.saturating_add(rhs.total);
    }
}

/// Function coverage for a file: how many functions were executed at all
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FunctionCoverageInfo {
    executed: u64,
    total: u64,
}

impl FunctionCoverageInfo {
    /// Create from executed/total counts.
    #[must_use]
    pub fn new(executed: u64, total: u64) -> Self {
        debug_assert!(executed <= total, "executed functions over-counted");
        Self { executed, total }
    }

    /// Count one function, executed or not.
    pub fn add_function(&mut self, executed: bool) {
        if executed {
            self.executed += 1;
        }
        self.total += 1;
    }

    /// Functions executed at least once
    #[must_use]
    pub fn executed(&self) -> u64 {
        self.executed
    }

    /// Total functions
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Whether every function was executed
    #[must_use]
    pub fn is_fully_covered(&self) -> bool {
        self.executed == self.total
    }

    /// Percentage executed; 0.0 when there are no functions
    #[must_use]
    pub fn percent_covered(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.executed as f64 / self.total as f64 * 100.0
    }

    /// Per-field maximum.
    pub fn merge(&mut self, other: &Self) {
        self.executed = self.executed.max(other.executed);
        self.total = self.total.max(other.total);
    }
}

impl AddAssign<&FunctionCoverageInfo> for FunctionCoverageInfo {
    fn add_assign(&mut self, rhs: &FunctionCoverageInfo) {
        self.executed = self.executed.saturating_add(rhs.executed);
        self.total = self.total.saturating_add(rhs.total);
    }
}

/// Line coverage for a function or file.
///
/// Computed alongside region coverage and carried on summaries, but never
/// serialized into the JSON export schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineCoverageInfo {
    covered: u64,
    total: u64,
}

impl LineCoverageInfo {
    /// Create from covered/total counts.
    #[must_use]
    pub fn new(covered: u64, total: u64) -> Self {
        debug_assert!(covered <= total, "covered lines over-counted");
        Self { covered, total }
    }

    /// Lines executed at least once
    #[must_use]
    pub fn covered(&self) -> u64 {
        self.covered
    }

    /// Total mapped lines
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Percentage covered; 0.0 when no lines are mapped
    #[must_use]
    pub fn percent_covered(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.covered as f64 / self.total as f64 * 100.0
    }

    /// Per-field maximum.
    pub fn merge(&mut self, other: &Self) {
        self.covered = self.covered.max(other.covered);
        self.total = self.total.max(other.total);
    }
}

impl AddAssign<&LineCoverageInfo> for LineCoverageInfo {
    fn add_assign(&mut self, rhs: &LineCoverageInfo) {
        self.covered = self.covered.saturating_add(rhs.covered);
        self.total = self.total.saturating_add(rhs.total);
    }
}

/// A summary of one function's (or one instantiation group's) coverage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCoverageSummary {
    /// Function or group name
    pub name: String,
    /// Times the function entry executed
    pub execution_count: u64,
    /// Coverage over Code regions only
    pub region_coverage: RegionCoverageInfo,
    /// Line coverage (internal; not exported)
    pub line_coverage: LineCoverageInfo,
}

impl FunctionCoverageSummary {
    /// Summarize a single function record.
    ///
    /// A Code region counts as covered when its execution count is
    /// non-zero; Gap/Skipped/Branch regions are excluded from the region
    /// totals. Line stats come from the function's own segments.
    #[must_use]
    pub fn for_function(function: &FunctionRecord) -> Self {
        let mut covered = 0u64;
        let mut total = 0u64;
        for region in &function.regions {
            if region.kind != RegionKind::Code {
                continue;
            }
            total += 1;
            if region.execution_count > 0 {
                covered += 1;
            }
        }

        let segments = segment::build_segments(function.regions.clone());
        let (lines_covered, lines_total) = segment::line_stats(&segments);

        Self {
            name: function.name.clone(),
            execution_count: function.execution_count,
            region_coverage: RegionCoverageInfo::new(covered, total),
            line_coverage: LineCoverageInfo::new(lines_covered, lines_total),
        }
    }

    /// Summarize an instantiation group from its per-instantiation
    /// summaries.
    ///
    /// The group reports under its declared name when it has one, else a
    /// synthesized `Definition at line L, column C`. Execution count sums
    /// over instantiations; region and line coverage merge element-wise by
    /// maximum.
    #[must_use]
    pub fn for_instantiation_group(
        group: &InstantiationGroup<'_>,
        summaries: &[FunctionCoverageSummary],
    ) -> Self {
        let name = group.name().map_or_else(
            || format!("Definition at line {}, column {}", group.line(), group.column()),
            String::from,
        );
        let mut region_coverage = RegionCoverageInfo::default();
        let mut line_coverage = LineCoverageInfo::default();
        if let Some((first, rest)) = summaries.split_first() {
            region_coverage = first.region_coverage;
            line_coverage = first.line_coverage;
            for summary in rest {
                region_coverage.merge(&summary.region_coverage);
                line_coverage.merge(&summary.line_coverage);
            }
        }
        Self {
            name,
            execution_count: group.total_execution_count(),
            region_coverage,
            line_coverage,
        }
    }
}

/// A summary of one file's coverage, accumulated over its functions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileCoverageSummary {
    /// Prefix-stripped name used for display; lookups use the full path
    pub display_name: String,
    /// Region coverage accumulated across logical functions
    pub region_coverage: RegionCoverageInfo,
    /// One entry per logical definition (instantiation groups count once)
    pub function_coverage: FunctionCoverageInfo,
    /// One entry per instantiation
    pub instantiation_coverage: FunctionCoverageInfo,
    /// Line coverage (internal; not exported)
    pub line_coverage: LineCoverageInfo,
}

impl FileCoverageSummary {
    /// Create an empty summary for `display_name`.
    #[must_use]
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            ..Self::default()
        }
    }

    /// Fold in one logical function (an instantiation-group summary).
    pub fn add_function(&mut self, function: &FunctionCoverageSummary) {
        self.region_coverage += &function.region_coverage;
        self.line_coverage += &function.line_coverage;
        self.function_coverage
            .add_function(function.execution_count > 0);
    }

    /// Fold in one instantiation of a logical function.
    pub fn add_instantiation(&mut self, instantiation: &FunctionCoverageSummary) {
        self.instantiation_coverage
            .add_function(instantiation.execution_count > 0);
    }
}

impl AddAssign<&FileCoverageSummary> for FileCoverageSummary {
    fn add_assign(&mut self, rhs: &FileCoverageSummary) {
        self.region_coverage += &rhs.region_coverage;
        self.function_coverage += &rhs.function_coverage;
        self.instantiation_coverage += &rhs.instantiation_coverage;
        self.line_coverage += &rhs.line_coverage;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn percent_covered_is_zero_for_empty_totals() {
        assert_eq!(RegionCoverageInfo::default().percent_covered(), 0.0);
        assert_eq!(FunctionCoverageInfo::default().percent_covered(), 0.0);
        assert_eq!(LineCoverageInfo::default().percent_covered(), 0.0);
    }

    #[test]
    fn accumulate_sums_both_fields() {
        let mut a = RegionCoverageInfo::new(3, 4);
        a += &RegionCoverageInfo::new(1, 6);
        assert_eq!(a, RegionCoverageInfo::new(4, 10));
    }

    #[test]
    fn merge_takes_the_maximum() {
        let mut a = RegionCoverageInfo::new(3, 4);
        a.merge(&RegionCoverageInfo::new(1, 4));
        assert_eq!(a, RegionCoverageInfo::new(3, 4));
    }

    #[test]
    fn add_function_tracks_executed() {
        let mut info = FunctionCoverageInfo::default();
        info.add_function(true);
        info.add_function(false);
        info.add_function(true);
        assert_eq!(info.executed(), 2);
        assert_eq!(info.total(), 3);
        assert!(!info.is_fully_covered());
    }

    proptest! {
        #[test]
        fn invariants_survive_any_operation_sequence(
            ops in prop::collection::vec((0u8..2, 0u64..50, 0u64..50), 0..32)
        ) {
            let mut acc = RegionCoverageInfo::default();
            for (op, covered, extra) in ops {
                let rhs = RegionCoverageInfo::new(covered, covered + extra);
                if op == 0 {
                    acc += &rhs;
                } else {
                    acc.merge(&rhs);
                }
                prop_assert!(acc.covered() <= acc.total());
            }
            let percent = acc.percent_covered();
            prop_assert!(percent.is_finite());
            prop_assert!((0.0..=100.0).contains(&percent));
        }

        #[test]
        fn merge_is_commutative_and_idempotent(
            ac in 0u64..100, at in 0u64..100, bc in 0u64..100, bt in 0u64..100
        ) {
            let a = RegionCoverageInfo::new(ac.min(at), at);
            let b = RegionCoverageInfo::new(bc.min(bt), bt);

            let mut ab = a;
            ab.merge(&b);
            let mut ba = b;
            ba.merge(&a);
            prop_assert_eq!(ab, ba);
            prop_assert_eq!(ab.covered(), a.covered().max(b.covered()));

            let mut aa = a;
            aa.merge(&a);
            prop_assert_eq!(aa, a);
        }

        #[test]
        fn accumulate_is_associative(
            xs in prop::collection::vec((0u64..50, 0u64..50), 3)
        ) {
            let infos: Vec<RegionCoverageInfo> = xs
                .iter()
                .map(|(c, extra)| RegionCoverageInfo::new(*c, c + extra))
                .collect();

            // (A += B) += C
            let mut left = infos[0];
            left += &infos[1];
            left += &infos[2];

            // A += (B += C)
            let mut bc = infos[1];
            bc += &infos[2];
            let mut right = infos[0];
            right += &bc;

            prop_assert_eq!(left, right);
        }
    }
}
