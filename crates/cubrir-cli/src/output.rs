//! Text rendering of coverage report tables.

use std::fmt::Write as _;

use cubrir::FileCoverageSummary;

const NAME_HEADER: &str = "Filename";

fn percent_cell(covered: u64, total: u64) -> String {
    if total == 0 {
        "     -".to_string()
    } else {
        format!("{:5.2}%", covered as f64 / total as f64 * 100.0)
    }
}

fn summary_row(out: &mut String, name_width: usize, name: &str, report: &FileCoverageSummary) {
    let regions = report.region_coverage;
    let functions = report.function_coverage;
    let instantiations = report.instantiation_coverage;
    let lines = report.line_coverage;
    let _ = writeln!(
        out,
        "{name:<name_width$}  {:>7}  {:>7}  {}  {:>9}  {:>8}  {:>9}  {:>7}  {}",
        regions.total(),
        regions.total().saturating_sub(regions.covered()),
        percent_cell(regions.covered(), regions.total()),
        functions.total(),
        functions.total().saturating_sub(functions.executed()),
        instantiations.total(),
        lines.total(),
        percent_cell(lines.covered(), lines.total()),
    );
}

/// Render the per-file coverage table plus the accumulated totals row.
///
/// Plain text; callers decide whether to style it for a terminal.
#[must_use]
pub fn render_report_table(
    reports: &[FileCoverageSummary],
    totals: &FileCoverageSummary,
) -> String {
    let name_width = reports
        .iter()
        .map(|r| r.display_name.len())
        .chain([NAME_HEADER.len(), totals.display_name.len()])
        .max()
        .unwrap_or(NAME_HEADER.len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{NAME_HEADER:<name_width$}  {:>7}  {:>7}  {:>6}  {:>9}  {:>8}  {:>9}  {:>7}  {:>6}",
        "Regions", "Missed", "Cover", "Functions", "Missed", "Instant.", "Lines", "Cover",
    );
    let rule_width = name_width + 72;
    let _ = writeln!(out, "{}", "-".repeat(rule_width));
    for report in reports {
        summary_row(&mut out, name_width, &report.display_name, report);
    }
    let _ = writeln!(out, "{}", "-".repeat(rule_width));
    summary_row(&mut out, name_width, &totals.display_name, totals);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubrir::{
        FileCoverageSummary, FunctionCoverageSummary, LineCoverageInfo, RegionCoverageInfo,
    };

    fn file_summary(name: &str, covered: u64, total: u64) -> FileCoverageSummary {
        let mut summary = FileCoverageSummary::new(name);
        let function = FunctionCoverageSummary {
            name: "f".to_string(),
            execution_count: u64::from(covered > 0),
            region_coverage: RegionCoverageInfo::new(covered, total),
            line_coverage: LineCoverageInfo::new(covered, total),
        };
        summary.add_function(&function);
        summary.add_instantiation(&function);
        summary
    }

    #[test]
    fn table_lists_every_file_and_the_total() {
        let reports = vec![file_summary("a.rs", 3, 4), file_summary("b.rs", 0, 2)];
        let mut totals = FileCoverageSummary::new("TOTAL");
        for report in &reports {
            totals += report;
        }

        let table = render_report_table(&reports, &totals);
        assert!(table.contains("a.rs"));
        assert!(table.contains("b.rs"));
        assert!(table.contains("TOTAL"));
        assert!(table.contains("75.00%"));
        assert!(table.starts_with("Filename"));
    }

    #[test]
    fn empty_totals_render_dashes_not_division_by_zero() {
        let totals = FileCoverageSummary::new("TOTAL");
        let table = render_report_table(&[], &totals);
        assert!(table.contains('-'));
        assert!(!table.contains("NaN"));
    }
}
