//! Half-open time intervals and overlap arithmetic.

use chrono::{DateTime, Utc};

/// A half-open interval `[start, end)` between two UTC instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Span {
    /// Whether two spans share any instant.
    ///
    /// Half-open rule: spans that only touch at an endpoint do not overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether `other` falls entirely within this span.
    pub fn contains(&self, other: &Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Length of the span in whole seconds.
    pub fn duration_seconds(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    fn span(start_hour: u32, end_hour: u32) -> Span {
        Span {
            start: Utc.with_ymd_and_hms(2024, 1, 10, start_hour, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 1, 10, end_hour, 0, 0).unwrap(),
        }
    }

    #[test]
    fn overlap_is_symmetric() {
        let a = span(9, 11);
        let b = span(10, 12);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn non_empty_span_overlaps_itself() {
        let a = span(9, 11);
        assert!(a.overlaps(&a));
    }

    #[test]
    fn touching_endpoints_do_not_overlap() {
        let a = span(9, 10);
        let b = span(10, 11);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn disjoint_spans_do_not_overlap() {
        let a = span(9, 10);
        let b = span(11, 12);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn nested_span_overlaps() {
        let outer = span(9, 12);
        let inner = span(10, 11);
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn contains_includes_boundaries() {
        let outer = span(9, 12);
        assert!(outer.contains(&span(9, 12)));
        assert!(outer.contains(&span(10, 12)));
        assert!(!outer.contains(&span(8, 10)));
        assert!(!outer.contains(&span(11, 13)));
    }

    #[test]
    fn duration_in_seconds() {
        assert_eq!(span(9, 11).duration_seconds(), 7200);
    }
}
