use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::{Error, Result};
use crate::model::Span;

/// Declares a wire enum with its canonical upper-case names.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::error::Error;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err($crate::error::Error::UnknownVariant { kind: $kind, value: s.to_string() }),
                }
            }
        }
    };
}

pub(crate) use wire_enum;

wire_enum! {
    /// How a handler may move or shrink the slot. Threaded through untouched.
    Policy, "policy" {
        Preserve => "PRESERVE",
        First => "FIRST",
        Maximum => "MAXIMUM",
    }
}

wire_enum! {
    /// Ordering hint between competing requests. Threaded through untouched.
    Priority, "priority" {
        No => "NO",
        Low => "LOW",
        Normal => "NORMAL",
        High => "HIGH",
        Urgent => "URGENT",
        Emergency => "EMERGENCY",
    }
}

wire_enum! {
    AllocationState, "allocation state" {
        Requested => "REQUESTED",
        Scheduled => "SCHEDULED",
        Rejected => "REJECTED",
        Allocated => "ALLOCATED",
        Aborted => "ABORTED",
        Cancelled => "CANCELLED",
        Released => "RELEASED",
    }
}

/// A reservation request for a slot on one or more resources.
///
/// Values are never edited in place; the `with_*` methods return updated copies.
/// Deserialization goes through [`ResourceAllocation::new`], so a decoded value
/// always names at least one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAllocation")]
pub struct ResourceAllocation {
    /// Assigned by the allocator; absent on freshly parsed requests.
    pub id: Option<Ulid>,
    pub slot: Span,
    pub policy: Policy,
    pub priority: Priority,
    pub state: AllocationState,
    pub initiator: String,
    resource_ids: BTreeSet<String>,
}

/// Wire shape of [`ResourceAllocation`] before validation.
#[derive(Deserialize)]
struct RawAllocation {
    #[serde(default)]
    id: Option<Ulid>,
    slot: Span,
    policy: Policy,
    priority: Priority,
    state: AllocationState,
    #[serde(default)]
    initiator: String,
    resource_ids: BTreeSet<String>,
}

impl TryFrom<RawAllocation> for ResourceAllocation {
    type Error = Error;

    fn try_from(raw: RawAllocation) -> Result<Self> {
        let alloc = Self::new(raw.slot, raw.policy, raw.priority, raw.resource_ids)?;
        Ok(Self {
            id: raw.id,
            state: raw.state,
            initiator: raw.initiator,
            ..alloc
        })
    }
}

impl ResourceAllocation {
    pub fn new(
        slot: Span,
        policy: Policy,
        priority: Priority,
        resource_ids: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self> {
        let resource_ids: BTreeSet<String> = resource_ids.into_iter().map(Into::into).collect();
        if resource_ids.is_empty() {
            return Err(Error::NoResources);
        }
        Ok(Self {
            id: None,
            slot,
            policy,
            priority,
            state: AllocationState::Requested,
            initiator: String::new(),
            resource_ids,
        })
    }

    pub fn resource_ids(&self) -> &BTreeSet<String> {
        &self.resource_ids
    }

    pub fn with_id(&self, id: Ulid) -> Self {
        Self { id: Some(id), ..self.clone() }
    }

    pub fn with_state(&self, state: AllocationState) -> Self {
        Self { state, ..self.clone() }
    }

    pub fn with_slot(&self, slot: Span) -> Self {
        Self { slot, ..self.clone() }
    }

    pub fn with_initiator(&self, initiator: impl Into<String>) -> Self {
        Self {
            initiator: initiator.into(),
            ..self.clone()
        }
    }
}
