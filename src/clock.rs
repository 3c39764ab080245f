use crate::model::Us;

/// Read-only source of the current instant.
pub trait Clock: Send + Sync {
    fn now_us(&self) -> Us;
}

/// Wall clock in Unix microseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_us(&self) -> Us {
        // A clock set before 1970 reads as the epoch.
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_micros() as Us)
            .unwrap_or(0)
    }
}

/// Clock frozen at one instant. Used by tests and replay tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(Us);

impl FixedClock {
    pub fn new(now: Us) -> Self {
        Self(now)
    }
}

impl Clock for FixedClock {
    fn now_us(&self) -> Us {
        self.0
    }
}
