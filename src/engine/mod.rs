//! Interval algebra and free-slot search.
//!
//! Every operation here is pure and total. "No free slot" is an ordinary
//! answer (`None` or [`Remaining`]), never an error.

mod search;
mod timeline;

pub use search::{
    find_complete, find_first, find_max, find_remaining, include_now, include_now_at, remaining,
    Remaining,
};
pub use timeline::{merge_overlapping, union, IntervalSet};
