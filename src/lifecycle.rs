use serde::{Deserialize, Serialize};

use crate::allocation::wire_enum;
use crate::error::Result;
use crate::observability::TRANSITIONS_TOTAL;
use crate::payload::{self, Payload, Schema};

wire_enum! {
    /// Lifecycle states of a submitted task.
    State, "task state" {
        Initiated => "INITIATED",
        Accepted => "ACCEPTED",
        Rejected => "REJECTED",
        Update => "UPDATE",
        Abort => "ABORT",
        Aborted => "ABORTED",
        Completed => "COMPLETED",
        Failed => "FAILED",
    }
}

wire_enum! {
    /// Party that produced a transition.
    Origin, "origin" {
        Submitter => "SUBMITTER",
        Handler => "HANDLER",
    }
}

/// Fixed `(origin, serial)` stamp per state.
///
/// Serials count transitions from 1 and are reproducible by any producer
/// without shared counters, so a consumer can spot stale or reordered
/// deliveries on an at-least-once channel.
pub struct Lifecycle;

impl Lifecycle {
    pub const fn stamp(state: State) -> (Origin, u32) {
        match state {
            State::Initiated => (Origin::Submitter, 1),
            State::Abort => (Origin::Submitter, 2),
            State::Accepted | State::Rejected | State::Aborted | State::Update => (Origin::Handler, 2),
            State::Failed => (Origin::Handler, 3),
            State::Completed => (Origin::Handler, 4),
        }
    }
}

impl State {
    pub fn origin(self) -> Origin {
        Lifecycle::stamp(self).0
    }

    pub fn serial(self) -> u32 {
        Lifecycle::stamp(self).1
    }

    pub fn is_initial(self) -> bool {
        self == State::Initiated
    }

    /// No further transition is expected after these.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            State::Completed | State::Failed | State::Rejected | State::Aborted
        )
    }
}

/// One stamped lifecycle transition. Records are append-only: advancing a task
/// builds a new record, the previous one is never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskState {
    pub state: State,
    pub origin: Origin,
    pub serial: u32,
    pub payload: Vec<u8>,
    pub wire_schema: String,
}

impl TaskState {
    /// Transition with an empty UTF-8 payload.
    pub fn build(state: State) -> Self {
        Self::build_with_payload(state, Payload::empty())
    }

    /// Transition that carries over the payload of `previous`.
    pub fn build_from(state: State, previous: &TaskState) -> Self {
        Self::build_with_payload(
            state,
            Payload {
                bytes: previous.payload.clone(),
                schema: previous.wire_schema.clone(),
            },
        )
    }

    /// Transition carrying `value`. Fails if the value cannot be serialized.
    pub fn build_with<T: Schema>(state: State, value: &T) -> Result<Self> {
        let payload = payload::serialize(value)?;
        Ok(Self::build_with_payload(state, payload))
    }

    pub fn build_with_payload(state: State, payload: Payload) -> Self {
        let (origin, serial) = Lifecycle::stamp(state);
        metrics::counter!(TRANSITIONS_TOTAL, "state" => state.as_str()).increment(1);
        Self {
            state,
            origin,
            serial,
            payload: payload.bytes,
            wire_schema: payload.schema,
        }
    }

    pub fn decode_payload<T: Schema>(&self) -> Result<T> {
        payload::deserialize(&self.payload, &self.wire_schema)
    }

    /// True if this record comes later in the lifecycle than `other`.
    pub fn supersedes(&self, other: &TaskState) -> bool {
        self.serial > other.serial
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::payload::UTF8_SCHEMA;

    impl Schema for Vec<u32> {
        const SCHEMA: &'static str = "u32-list";
    }

    #[test]
    fn stamp_table() {
        let expected = [
            (State::Initiated, Origin::Submitter, 1),
            (State::Abort, Origin::Submitter, 2),
            (State::Accepted, Origin::Handler, 2),
            (State::Rejected, Origin::Handler, 2),
            (State::Aborted, Origin::Handler, 2),
            (State::Update, Origin::Handler, 2),
            (State::Failed, Origin::Handler, 3),
            (State::Completed, Origin::Handler, 4),
        ];
        for (state, origin, serial) in expected {
            assert_eq!(Lifecycle::stamp(state), (origin, serial), "{state}");
        }
    }

    #[test]
    fn happy_path_serials_and_origins() {
        let initiated = TaskState::build(State::Initiated);
        let accepted = TaskState::build_from(State::Accepted, &initiated);
        let completed = TaskState::build_from(State::Completed, &accepted);

        assert_eq!(
            [initiated.serial, accepted.serial, completed.serial],
            [1, 2, 4]
        );
        assert_eq!(
            [initiated.origin, accepted.origin, completed.origin],
            [Origin::Submitter, Origin::Handler, Origin::Handler]
        );
        assert!(completed.supersedes(&accepted));
        assert!(accepted.supersedes(&initiated));
    }

    #[test]
    fn build_uses_empty_utf8_placeholder() {
        let t = TaskState::build(State::Initiated);
        assert!(t.payload.is_empty());
        assert_eq!(t.wire_schema, UTF8_SCHEMA);
    }

    #[test]
    fn build_from_keeps_payload() {
        let first = TaskState::build_with(State::Initiated, &"pick up cup".to_string()).unwrap();
        let next = TaskState::build_from(State::Update, &first);
        assert_eq!(next.payload, first.payload);
        assert_eq!(next.wire_schema, first.wire_schema);
        assert_eq!(next.decode_payload::<String>().unwrap(), "pick up cup");
    }

    #[test]
    fn build_from_does_not_edit_previous() {
        let first = TaskState::build(State::Initiated);
        let snapshot = first.clone();
        let _ = TaskState::build_from(State::Abort, &first);
        assert_eq!(first, snapshot);
    }

    #[test]
    fn build_with_typed_payload() {
        let t = TaskState::build_with(State::Accepted, &vec![1u32, 2, 3]).unwrap();
        assert_eq!(t.wire_schema, "u32-list");
        assert_eq!(t.decode_payload::<Vec<u32>>().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn decode_with_wrong_type_fails() {
        let t = TaskState::build_with(State::Accepted, &"text".to_string()).unwrap();
        assert!(matches!(
            t.decode_payload::<Vec<u32>>(),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn state_from_str() {
        assert_eq!("ABORT".parse::<State>().unwrap(), State::Abort);
        assert!(matches!(
            "DONE".parse::<State>(),
            Err(Error::UnknownVariant { kind: "task state", .. })
        ));
    }

    #[test]
    fn terminal_and_initial() {
        for s in State::ALL {
            let terminal = matches!(
                s,
                State::Completed | State::Failed | State::Rejected | State::Aborted
            );
            assert_eq!(s.is_terminal(), terminal, "{s}");
        }
        assert!(State::Initiated.is_initial());
        assert!(!State::Update.is_initial());
        assert!(!State::Update.is_terminal());
    }

    #[test]
    fn abort_is_submitter_second_stage() {
        assert_eq!(State::Abort.origin(), Origin::Submitter);
        assert_eq!(State::Abort.serial(), 2);
        assert_eq!(State::Aborted.origin(), Origin::Handler);
    }
}
