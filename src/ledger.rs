use dashmap::DashMap;
use tracing::debug;
use ulid::Ulid;

use crate::lifecycle::TaskState;

/// How a delivered transition relates to what the ledger already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Later than anything seen for the task; now the latest.
    Fresh,
    /// Same serial and state as the latest; a redelivery.
    Duplicate,
    /// Older than the latest, or a conflicting state at the same serial.
    Stale,
}

/// Latest accepted transition per task, for consumers of an at-least-once
/// channel. Safe to share between tasks.
#[derive(Debug, Default)]
pub struct TransitionLedger {
    latest: DashMap<Ulid, TaskState>,
}

impl TransitionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&self, task: Ulid, state: TaskState) -> Delivery {
        let delivery = match self.latest.entry(task) {
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(state);
                Delivery::Fresh
            }
            dashmap::mapref::entry::Entry::Occupied(mut slot) => {
                let current = slot.get();
                if state.supersedes(current) {
                    slot.insert(state);
                    Delivery::Fresh
                } else if state.serial == current.serial && state.state == current.state {
                    Delivery::Duplicate
                } else {
                    Delivery::Stale
                }
            }
        };
        debug!("task {task}: {delivery:?}");
        delivery
    }

    pub fn latest(&self, task: &Ulid) -> Option<TaskState> {
        self.latest.get(task).map(|entry| entry.value().clone())
    }

    /// Drop a task's record. Returns the last state if there was one.
    pub fn forget(&self, task: &Ulid) -> Option<TaskState> {
        self.latest.remove(task).map(|(_, state)| state)
    }

    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::State;
    use std::sync::Arc;

    #[test]
    fn fresh_duplicate_stale() {
        let ledger = TransitionLedger::new();
        let task = Ulid::new();
        let initiated = TaskState::build(State::Initiated);
        let accepted = TaskState::build_from(State::Accepted, &initiated);

        assert_eq!(ledger.observe(task, initiated.clone()), Delivery::Fresh);
        assert_eq!(ledger.observe(task, accepted.clone()), Delivery::Fresh);
        assert_eq!(ledger.observe(task, accepted.clone()), Delivery::Duplicate);
        assert_eq!(ledger.observe(task, initiated), Delivery::Stale);
        assert_eq!(ledger.latest(&task), Some(accepted));
    }

    #[test]
    fn same_serial_other_state_is_stale() {
        let ledger = TransitionLedger::new();
        let task = Ulid::new();
        ledger.observe(task, TaskState::build(State::Accepted));
        assert_eq!(ledger.observe(task, TaskState::build(State::Rejected)), Delivery::Stale);
        assert_eq!(ledger.latest(&task).map(|s| s.state), Some(State::Accepted));
    }

    #[test]
    fn out_of_order_completion_then_accept() {
        let ledger = TransitionLedger::new();
        let task = Ulid::new();
        ledger.observe(task, TaskState::build(State::Completed));
        assert_eq!(ledger.observe(task, TaskState::build(State::Accepted)), Delivery::Stale);
    }

    #[test]
    fn forget_removes() {
        let ledger = TransitionLedger::new();
        let task = Ulid::new();
        ledger.observe(task, TaskState::build(State::Initiated));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.forget(&task).map(|s| s.state), Some(State::Initiated));
        assert!(ledger.is_empty());
        assert_eq!(ledger.forget(&task), None);
    }

    #[tokio::test]
    async fn concurrent_observers_agree_on_latest() {
        let ledger = Arc::new(TransitionLedger::new());
        let task = Ulid::new();
        let mut handles = Vec::new();
        for state in [State::Initiated, State::Accepted, State::Failed, State::Completed] {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger.observe(task, TaskState::build(state))
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(ledger.latest(&task).map(|s| s.state), Some(State::Completed));
    }
}
