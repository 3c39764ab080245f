use tracing::trace;

use crate::clock::Clock;
use crate::model::*;
use crate::observability::SEARCHES_TOTAL;

use super::timeline::IntervalSet;

// ── Free-slot search ──────────────────────────────────────────────

/// Outcome of a remaining-time query that keeps the reason for an empty answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    /// Free time left in the goal, stretched to include now.
    Free(Span),
    /// This blocking span covers the current instant.
    Blocked(Span),
    /// The goal is completely blocked.
    Exhausted,
}

impl Remaining {
    pub fn slot(self) -> Option<Span> {
        match self {
            Remaining::Free(span) => Some(span),
            Remaining::Blocked(_) | Remaining::Exhausted => None,
        }
    }
}

/// `free = complement(union(blocking), range)` and `overlaps = free ∩ {goal}`.
fn free_and_overlaps(goal: &Span, range: &Span, blocking: &[Span]) -> (IntervalSet, IntervalSet) {
    let blocked = IntervalSet::from_spans(blocking.iter().copied());
    let free = blocked.complement(*range);
    let overlaps = free.intersect(&IntervalSet::singleton(*goal));
    (free, overlaps)
}

fn record(algorithm: &'static str, goal: &Span, found: Option<Span>) {
    let outcome = if found.is_some() { "found" } else { "none" };
    metrics::counter!(SEARCHES_TOTAL, "algorithm" => algorithm, "outcome" => outcome).increment(1);
    trace!("find_{algorithm}: goal={goal:?} -> {found:?}");
}

/// Earliest free time overlapping `goal`, falling back to the earliest free
/// time anywhere in `range`.
pub fn find_first(goal: &Span, range: &Span, blocking: &[Span]) -> Option<Span> {
    let (free, overlaps) = free_and_overlaps(goal, range, blocking);
    let found = overlaps.first().or_else(|| free.first());
    record("first", goal, found);
    found
}

/// Longest free time overlapping `goal`, falling back to the longest free time
/// anywhere in `range`. Equal lengths go to the earlier slot.
pub fn find_max(goal: &Span, range: &Span, blocking: &[Span]) -> Option<Span> {
    let (free, overlaps) = free_and_overlaps(goal, range, blocking);
    let found = overlaps.longest().or_else(|| free.longest());
    record("max", goal, found);
    found
}

/// `goal` itself if the whole window is free inside `range`, else nothing.
pub fn find_complete(goal: &Span, range: &Span, blocking: &[Span]) -> Option<Span> {
    let (_, overlaps) = free_and_overlaps(goal, range, blocking);
    let found = overlaps.first().filter(|first| first == goal);
    record("complete", goal, found);
    found
}

/// What is left of `goal` from now on, with the reason when nothing is.
///
/// Now is read from `clock` exactly once.
pub fn remaining(goal: &Span, blocking: &[Span], clock: &impl Clock) -> Remaining {
    let now = clock.now_us();

    if let Some(block) = blocking.iter().find(|b| b.contains_instant(now)) {
        record("remaining", goal, None);
        return Remaining::Blocked(*block);
    }

    let (_, overlaps) = free_and_overlaps(goal, goal, blocking);
    let result = match overlaps.first() {
        Some(first) => Remaining::Free(include_now_at(&first, now)),
        None => Remaining::Exhausted,
    };
    record("remaining", goal, result.slot());
    result
}

/// [`remaining`] without the reason.
pub fn find_remaining(goal: &Span, blocking: &[Span], clock: &impl Clock) -> Option<Span> {
    remaining(goal, blocking, clock).slot()
}

/// Stretch `span` until it reaches the clock's current instant.
pub fn include_now(span: &Span, clock: &impl Clock) -> Span {
    include_now_at(span, clock.now_us())
}

/// Stretch `span` until it reaches `now`.
///
/// A span after `now` starts at `now`; a span before it ends at `now` (and,
/// being half-open, still excludes it). A span holding `now` is returned as is.
/// An inverted span covers nothing and becomes the empty span at `now`.
pub fn include_now_at(span: &Span, now: Us) -> Span {
    if span.is_inverted() {
        Span::new(now, now)
    } else if span.contains_instant(now) {
        *span
    } else if span.is_after(now) {
        span.with_begin(now)
    } else {
        span.with_end(now)
    }
}
