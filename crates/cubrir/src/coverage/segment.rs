//! Segment construction: turning counted regions into ordered breakpoints.
//!
//! A segment marks a (line, column) position in a file where the active
//! execution count changes. The sweep keeps the active regions ordered by
//! end position, soonest-ending on top; closing a region re-exposes the
//! count of the next one still active, whether the spans nest or merely
//! overlap. Branch regions never produce segments.

use crate::coverage::mapping::RegionKind;
use crate::coverage::model::CountedRegion;

/// A breakpoint in a file's rendered coverage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageSegment {
    /// 1-based line
    pub line: u32,
    /// 1-based column
    pub col: u32,
    /// Active execution count from this point on
    pub count: u64,
    /// Whether `count` is meaningful (false past the last region, and for
    /// skipped source)
    pub has_count: bool,
    /// Whether a region starts at this point
    pub is_region_entry: bool,
    /// Whether the active region is a gap filler
    pub is_gap_region: bool,
}

fn start(region: &CountedRegion) -> (u32, u32) {
    (region.line_start, region.col_start)
}

fn end(region: &CountedRegion) -> (u32, u32) {
    (region.line_end, region.col_end)
}

/// Pre-combine regions with an identical span and kind by summing counts.
fn combine_regions(mut regions: Vec<CountedRegion>) -> Vec<CountedRegion> {
    regions.sort_by_key(|r| (start(r), end(r), r.kind as u8));
    let mut combined: Vec<CountedRegion> = Vec::with_capacity(regions.len());
    for region in regions {
        match combined.last_mut() {
            Some(last)
                if start(last) == start(&region)
                    && end(last) == end(&region)
                    && last.kind == region.kind =>
            {
                last.execution_count = last.execution_count.saturating_add(region.execution_count);
            }
            _ => combined.push(region),
        }
    }
    combined
}

/// Build the ordered segment list for one file's regions.
///
/// Input regions may come from many functions; overlapping spans with the
/// same extent are summed first. Output ascends by (line, column) with at
/// most one segment per location.
#[must_use]
pub(crate) fn build_segments(regions: Vec<CountedRegion>) -> Vec<CoverageSegment> {
    let regions: Vec<CountedRegion> = regions
        .into_iter()
        .filter(|r| r.kind != RegionKind::Branch)
        .collect();
    let mut regions = combine_regions(regions);
    // Enclosing regions first, so entry segments emit in ascending order.
    regions.sort_by(|a, b| start(a).cmp(&start(b)).then(end(b).cmp(&end(a))));

    let mut segments: Vec<CoverageSegment> = Vec::with_capacity(regions.len() * 2);
    let mut active: Vec<CountedRegion> = Vec::new();

    fn push_segment(segments: &mut Vec<CoverageSegment>, seg: CoverageSegment) {
        match segments.last_mut() {
            Some(last) if (last.line, last.col) == (seg.line, seg.col) => *last = seg,
            _ => segments.push(seg),
        }
    }

    fn close_top(segments: &mut Vec<CoverageSegment>, active: &mut Vec<CountedRegion>) {
        let Some(closed) = active.pop() else { return };
        let (line, col) = end(&closed);
        let seg = match active.last() {
            Some(parent) => CoverageSegment {
                line,
                col,
                count: parent.execution_count,
                has_count: parent.kind != RegionKind::Skipped,
                is_region_entry: false,
                is_gap_region: parent.kind == RegionKind::Gap,
            },
            None => CoverageSegment {
                line,
                col,
                count: 0,
                has_count: false,
                is_region_entry: false,
                is_gap_region: false,
            },
        };
        push_segment(segments, seg);
    }

    for region in regions {
        while active.last().is_some_and(|top| end(top) <= start(&region)) {
            close_top(&mut segments, &mut active);
        }
        let seg = CoverageSegment {
            line: region.line_start,
            col: region.col_start,
            count: region.execution_count,
            has_count: region.kind != RegionKind::Skipped,
            is_region_entry: true,
            is_gap_region: region.kind == RegionKind::Gap,
        };
        push_segment(&mut segments, seg);
        // Keep the soonest-ending region on top so closes emit in
        // ascending end order even when spans overlap without nesting.
        let slot = active.partition_point(|r| end(r) >= end(&region));
        active.insert(slot, region);
    }
    while !active.is_empty() {
        close_top(&mut segments, &mut active);
    }
    segments
}

/// Line statistics derived from a segment list: (covered, mapped).
///
/// A line is mapped when a countable segment is active on it, including
/// every interior line a multi-line region wraps; covered when the active
/// count is non-zero. Computed for summaries but never exported.
#[must_use]
pub(crate) fn line_stats(segments: &[CoverageSegment]) -> (u64, u64) {
    let mut covered = 0u64;
    let mut mapped = 0u64;
    let mut index = 0usize;
    let mut wrapped: Option<CoverageSegment> = None;
    let mut line = segments.first().map_or(0, |s| s.line);

    while index < segments.len() {
        let mut line_mapped = wrapped.is_some_and(|s| s.has_count);
        let mut line_count = wrapped.filter(|s| s.has_count).map_or(0, |s| s.count);
        while index < segments.len() && segments[index].line == line {
            let seg = segments[index];
            if seg.has_count && seg.is_region_entry {
                line_mapped = true;
                line_count = line_count.max(seg.count);
            }
            wrapped = Some(seg);
            index += 1;
        }
        if line_mapped {
            mapped += 1;
            if line_count > 0 {
                covered += 1;
            }
        }
        line += 1;
    }
    (covered, mapped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(ls: u32, cs: u32, le: u32, ce: u32, count: u64) -> CountedRegion {
        CountedRegion {
            kind: RegionKind::Code,
            file_id: 0,
            line_start: ls,
            col_start: cs,
            line_end: le,
            col_end: ce,
            execution_count: count,
        }
    }

    #[test]
    fn simple_function_opens_and_closes() {
        let segments = build_segments(vec![code(1, 1, 5, 2, 3)]);
        assert_eq!(
            segments,
            vec![
                CoverageSegment {
                    line: 1,
                    col: 1,
                    count: 3,
                    has_count: true,
                    is_region_entry: true,
                    is_gap_region: false,
                },
                CoverageSegment {
                    line: 5,
                    col: 2,
                    count: 0,
                    has_count: false,
                    is_region_entry: false,
                    is_gap_region: false,
                },
            ]
        );
    }

    #[test]
    fn nested_region_restores_parent_count() {
        let segments = build_segments(vec![code(1, 1, 10, 2, 5), code(3, 5, 4, 6, 0)]);
        let cols: Vec<(u32, u32, u64, bool)> = segments
            .iter()
            .map(|s| (s.line, s.col, s.count, s.is_region_entry))
            .collect();
        assert_eq!(
            cols,
            vec![(1, 1, 5, true), (3, 5, 0, true), (4, 6, 5, false), (10, 2, 0, false)]
        );
        assert!(!segments[3].has_count);
    }

    #[test]
    fn segments_ascend_by_line_and_column() {
        let segments = build_segments(vec![
            code(7, 1, 9, 2, 1),
            code(1, 1, 5, 2, 2),
        ]);
        let mut sorted = segments.clone();
        sorted.sort_by_key(|s| (s.line, s.col));
        assert_eq!(segments, sorted);
    }

    #[test]
    fn overlapping_spans_close_in_end_order() {
        // B starts inside A but ends after it; neither encloses the other.
        let segments = build_segments(vec![code(1, 1, 5, 2, 7), code(3, 1, 8, 2, 2)]);
        let points: Vec<(u32, u32, u64, bool)> = segments
            .iter()
            .map(|s| (s.line, s.col, s.count, s.has_count))
            .collect();
        assert_eq!(
            points,
            vec![(1, 1, 7, true), (3, 1, 2, true), (5, 2, 2, true), (8, 2, 0, false)]
        );
        let mut sorted = segments.clone();
        sorted.sort_by_key(|s| (s.line, s.col));
        assert_eq!(segments, sorted);
    }

    #[test]
    fn branch_regions_produce_no_segments() {
        let mut branch = code(2, 1, 2, 10, 4);
        branch.kind = RegionKind::Branch;
        assert!(build_segments(vec![branch]).is_empty());
    }

    #[test]
    fn gap_regions_are_flagged() {
        let mut gap = code(6, 1, 6, 40, 0);
        gap.kind = RegionKind::Gap;
        let segments = build_segments(vec![gap]);
        assert!(segments[0].is_gap_region);
        assert!(segments[0].has_count);
    }

    #[test]
    fn identical_spans_sum_counts() {
        let segments = build_segments(vec![code(1, 1, 2, 2, 3), code(1, 1, 2, 2, 4)]);
        assert_eq!(segments[0].count, 7);
    }

    #[test]
    fn line_stats_count_mapped_and_covered() {
        let segments = build_segments(vec![code(1, 1, 3, 2, 2), code(2, 5, 2, 9, 0)]);
        // Lines 1..=3 are mapped; line 2's entry max is 2 via the wrap.
        let (covered, mapped) = line_stats(&segments);
        assert_eq!(mapped, 3);
        assert_eq!(covered, 3);
    }

    #[test]
    fn line_stats_count_interior_lines_of_multiline_regions() {
        // Lines 2..=4 carry no segment of their own but sit inside the
        // region, so they are mapped and covered via the wrapped count.
        let segments = build_segments(vec![code(1, 1, 5, 2, 3)]);
        assert_eq!(line_stats(&segments), (5, 5));
    }

    #[test]
    fn line_stats_interior_lines_of_an_unexecuted_region_stay_uncovered() {
        let segments = build_segments(vec![code(1, 1, 5, 2, 0)]);
        assert_eq!(line_stats(&segments), (0, 5));
    }

    #[test]
    fn line_stats_empty_input() {
        assert_eq!(line_stats(&[]), (0, 0));
    }
}
