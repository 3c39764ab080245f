//! Comma-separated allocation descriptors: `<durationUs>,<PRIORITY>,<POLICY>,<resource>[,...]`.
//!
//! Fields are recognised by shape, so their order does not matter.

use crate::allocation::{Policy, Priority, ResourceAllocation};
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::model::{Span, TimeUnit};

/// Parse a descriptor into a fresh allocation whose slot starts now.
///
/// An integer token is the duration in microseconds (the last one wins), a
/// priority or policy name sets that field, and every other non-empty token
/// is a resource id.
pub fn parse_allocation(text: &str, clock: &impl Clock) -> Result<ResourceAllocation> {
    let mut duration = None;
    let mut priority = None;
    let mut policy = None;
    let mut resources = Vec::new();

    for token in text.split(',').map(str::trim) {
        if token.is_empty() {
            continue;
        }
        if let Ok(us) = token.parse::<i64>() {
            duration = Some(us);
        } else if let Ok(p) = token.parse::<Priority>() {
            priority = Some(p);
        } else if let Ok(p) = token.parse::<Policy>() {
            policy = Some(p);
        } else {
            resources.push(token);
        }
    }

    let missing = |field: &str| Error::InvalidDescriptor(format!("missing {field} in {text:?}"));
    let duration = duration.ok_or_else(|| missing("duration"))?;
    if duration < 0 {
        return Err(Error::InvalidDescriptor(format!("negative duration {duration}")));
    }
    let priority = priority.ok_or_else(|| missing("priority"))?;
    let policy = policy.ok_or_else(|| missing("policy"))?;
    if resources.is_empty() {
        return Err(missing("resource id"));
    }

    let slot = Span::relative(0, duration, TimeUnit::Microseconds, clock);
    ResourceAllocation::new(slot, policy, priority, resources)
}

/// Inverse of [`parse_allocation`]: `duration,PRIORITY,POLICY,ids...`.
pub fn format_allocation(alloc: &ResourceAllocation) -> String {
    let mut out = format!("{},{},{}", alloc.slot.duration_us(), alloc.priority, alloc.policy);
    for id in alloc.resource_ids() {
        out.push(',');
        out.push_str(id);
    }
    out
}
