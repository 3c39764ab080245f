use crate::model::*;

// ── Interval set ─────────────────────────────────────────────────

/// Sorted-by-begin, merged, non-overlapping spans.
///
/// Spans that touch or overlap are coalesced on insertion. Zero-length spans
/// cover nothing and are dropped, except for the single degenerate member a
/// set can receive from [`IntervalSet::singleton`] or from the complement of an
/// unblocked zero-length range. Inverted spans are always dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalSet {
    spans: Vec<Span>,
}

impl IntervalSet {
    pub fn new() -> Self {
        Self { spans: Vec::new() }
    }

    /// A set holding exactly `span`, even when it is zero-length. An inverted
    /// span gives the empty set.
    pub fn singleton(span: Span) -> Self {
        if span.is_inverted() {
            return Self::new();
        }
        Self { spans: vec![span] }
    }

    pub fn from_spans(spans: impl IntoIterator<Item = Span>) -> Self {
        let mut sorted: Vec<Span> = spans.into_iter().filter(|s| !s.is_empty()).collect();
        sorted.sort_by_key(|s| s.begin);
        Self {
            spans: merge_overlapping(&sorted),
        }
    }

    /// Insert one span, coalescing with every member it touches.
    pub fn insert(mut self, span: Span) -> Self {
        self.spans.retain(|s| !s.is_empty());
        if span.is_empty() {
            return self;
        }
        // Members in [lo, hi) touch or overlap `span`.
        let lo = self.spans.partition_point(|s| s.end < span.begin);
        let hi = self.spans.partition_point(|s| s.begin <= span.end);
        let mut merged = span;
        if lo < hi {
            merged = Span::new(
                merged.begin.min(self.spans[lo].begin),
                merged.end.max(self.spans[hi - 1].end),
            );
        }
        self.spans.splice(lo..hi, std::iter::once(merged));
        self
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Span> {
        self.spans.iter()
    }

    /// Member with the smallest begin.
    pub fn first(&self) -> Option<Span> {
        self.spans.first().copied()
    }

    /// Member with the greatest duration; ties go to the smallest begin.
    pub fn longest(&self) -> Option<Span> {
        let mut best: Option<Span> = None;
        for &span in &self.spans {
            match best {
                Some(b) if span.duration_us() <= b.duration_us() => {}
                _ => best = Some(span),
            }
        }
        best
    }

    /// True if some member contains instant `t`.
    pub fn covers(&self, t: Us) -> bool {
        let idx = self.spans.partition_point(|s| s.end <= t);
        self.spans.get(idx).is_some_and(|s| s.contains_instant(t))
    }

    pub fn total_duration_us(&self) -> Us {
        self.spans.iter().map(Span::duration_us).sum()
    }

    /// Merge with `other`.
    pub fn union(&self, other: &IntervalSet) -> IntervalSet {
        union([self, other])
    }

    /// Portions of `range` not covered by this set.
    ///
    /// An empty set (or one that does not reach into `range`) yields `{range}`.
    /// A zero-length range is either the free point itself or nothing; an
    /// inverted range has no free part.
    pub fn complement(&self, range: Span) -> IntervalSet {
        if range.is_inverted() {
            return IntervalSet::new();
        }
        if range.is_degenerate() {
            return if self.covers(range.begin) {
                IntervalSet::new()
            } else {
                IntervalSet::singleton(range)
            };
        }

        // Skip everything that ends before the range opens.
        let first = self.spans.partition_point(|s| s.end <= range.begin);

        let mut result = Vec::new();
        let mut cursor = range.begin;
        let mut touched = false;

        for s in &self.spans[first..] {
            if s.is_empty() {
                continue;
            }
            if s.begin >= range.end {
                break;
            }
            touched = true;
            if s.begin > cursor {
                result.push(Span::new(cursor, s.begin));
            }
            cursor = cursor.max(s.end);
            if cursor >= range.end {
                break;
            }
        }

        if !touched {
            return IntervalSet::singleton(range);
        }
        if cursor < range.end {
            result.push(Span::new(cursor, range.end));
        }
        IntervalSet { spans: result }
    }

    /// Maximal sub-intervals present in both sets.
    pub fn intersect(&self, other: &IntervalSet) -> IntervalSet {
        let (a, b) = (&self.spans, &other.spans);
        let (mut i, mut j) = (0, 0);
        let mut result = Vec::new();

        while i < a.len() && j < b.len() {
            let (x, y) = (a[i], b[j]);
            let lo = x.begin.max(y.begin);
            let hi = x.end.min(y.end);
            if lo < hi {
                result.push(Span::new(lo, hi));
            } else if lo == hi
                && (x.is_degenerate() || y.is_degenerate())
                && covers_point(&x, lo)
                && covers_point(&y, lo)
            {
                result.push(Span::new(lo, lo));
            }

            if x.end < y.end {
                i += 1;
            } else if y.end < x.end {
                j += 1;
            } else {
                i += 1;
                j += 1;
            }
        }

        IntervalSet { spans: result }
    }
}

/// Like `contains_instant`, but a zero-length span covers its own position.
fn covers_point(span: &Span, t: Us) -> bool {
    span.contains_instant(t) || (span.is_degenerate() && span.begin == t)
}

impl FromIterator<Span> for IntervalSet {
    fn from_iter<I: IntoIterator<Item = Span>>(iter: I) -> Self {
        IntervalSet::from_spans(iter)
    }
}

impl<'a> IntoIterator for &'a IntervalSet {
    type Item = &'a Span;
    type IntoIter = std::slice::Iter<'a, Span>;

    fn into_iter(self) -> Self::IntoIter {
        self.spans.iter()
    }
}

/// Merge every input set, coalescing spans that touch or overlap.
pub fn union<'a>(sets: impl IntoIterator<Item = &'a IntervalSet>) -> IntervalSet {
    IntervalSet::from_spans(sets.into_iter().flat_map(|s| s.spans.iter().copied()))
}

/// Merge sorted overlapping/adjacent intervals into disjoint intervals.
pub fn merge_overlapping(sorted: &[Span]) -> Vec<Span> {
    let mut merged: Vec<Span> = Vec::new();
    for &span in sorted {
        if let Some(last) = merged.last_mut()
            && span.begin <= last.end
        {
            last.end = last.end.max(span.end);
            continue;
        }
        merged.push(span);
    }
    merged
}
