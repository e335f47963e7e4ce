use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Identifies one scheduled timer. Handles are never reused by the timer that
/// issued them, so a handle kept past `cancel`/`schedule` can be told apart
/// from the live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Pending {
    handle: TimerHandle,
    #[serde(with = "crate::serde_duration")]
    remaining: Duration,
}

/// A one-shot timer slot: at most one pending deadline at a time.
///
/// Scheduling replaces (and thereby invalidates) whatever was pending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundTimer {
    issued: u64,
    pending: Option<Pending>,
}

impl RoundTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, delay: Duration) -> TimerHandle {
        self.issued += 1;
        let handle = TimerHandle(self.issued);
        self.pending = Some(Pending {
            handle,
            remaining: delay,
        });
        handle
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn handle(&self) -> Option<TimerHandle> {
        self.pending.map(|p| p.handle)
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.pending.map(|p| p.remaining)
    }

    /// Count down without firing; saturates at zero.
    pub fn elapse(&mut self, dt: Duration) {
        if let Some(p) = self.pending.as_mut() {
            p.remaining = p.remaining.saturating_sub(dt);
        }
    }

    /// Consume the pending timer if `handle` is the live one.
    pub fn take(&mut self, handle: TimerHandle) -> bool {
        match self.pending {
            Some(p) if p.handle == handle => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Spend up to `budget` on the pending timer. Returns the handle if it
    /// came due plus the part of the budget left over after the deadline.
    pub fn consume(&mut self, budget: Duration) -> Option<(TimerHandle, Duration)> {
        let p = self.pending?;
        if budget < p.remaining {
            self.elapse(budget);
            return None;
        }
        Some((p.handle, budget - p.remaining))
    }
}
