//! Compact single-line renderings for log output.

use std::fmt;

use crate::allocation::ResourceAllocation;
use crate::clock::Clock;
use crate::model::{Span, Us};

const NULL: &str = "null";

/// `(begin - now)-(end - now)` in microseconds.
#[derive(Debug, Clone, Copy)]
pub struct ShortSpan {
    span: Option<Span>,
    now: Us,
}

impl ShortSpan {
    pub fn new(span: Option<&Span>, clock: &impl Clock) -> Self {
        Self::at(span, clock.now_us())
    }

    pub fn at(span: Option<&Span>, now: Us) -> Self {
        Self { span: span.copied(), now }
    }
}

impl fmt::Display for ShortSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.span {
            None => f.write_str(NULL),
            Some(s) => write!(
                f,
                "({})-({})",
                s.begin.saturating_sub(self.now),
                s.end.saturating_sub(self.now)
            ),
        }
    }
}

/// `[id:state,priority,policy,initiator,(b)-(e);res1,res2]`
#[derive(Debug, Clone, Copy)]
pub struct ShortAllocation<'a> {
    alloc: Option<&'a ResourceAllocation>,
    now: Us,
}

impl<'a> ShortAllocation<'a> {
    pub fn new(alloc: Option<&'a ResourceAllocation>, clock: &impl Clock) -> Self {
        Self::at(alloc, clock.now_us())
    }

    pub fn at(alloc: Option<&'a ResourceAllocation>, now: Us) -> Self {
        Self { alloc, now }
    }
}

impl fmt::Display for ShortAllocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(a) = self.alloc else {
            return f.write_str(NULL);
        };
        f.write_str("[")?;
        if let Some(id) = a.id {
            write!(f, "{id}")?;
        }
        write!(
            f,
            ":{},{},{},{},{}",
            a.state,
            a.priority,
            a.policy,
            a.initiator,
            ShortSpan::at(Some(&a.slot), self.now)
        )?;
        let mut ids = a.resource_ids().iter();
        if let Some(first) = ids.next() {
            write!(f, ";{first}")?;
            for id in ids {
                write!(f, ",{id}")?;
            }
        }
        f.write_str("]")
    }
}

/// Display text with newlines turned into spaces.
pub fn short_text<T: fmt::Display + ?Sized>(value: Option<&T>) -> String {
    match value {
        None => NULL.to_string(),
        Some(v) => v.to_string().replace('\n', " "),
    }
}
