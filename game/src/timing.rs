use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_REVEAL_DWELL: Duration = Duration::from_millis(1_200);
pub const DEFAULT_COVER_DWELL: Duration = Duration::from_millis(800);
pub const DEFAULT_SHUFFLE_STEPS: u32 = 12;
pub const DEFAULT_SHUFFLE_BASE: Duration = Duration::from_millis(250);
pub const DEFAULT_SHUFFLE_DECAY: Duration = Duration::from_millis(8);
pub const DEFAULT_SHUFFLE_FLOOR: Duration = Duration::from_millis(180);

/// How many swaps a round performs and how the gap between them shrinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShuffleSchedule {
    pub steps: u32,
    #[serde(with = "crate::serde_duration")]
    pub base: Duration,
    #[serde(with = "crate::serde_duration")]
    pub decay_per_step: Duration,
    #[serde(with = "crate::serde_duration")]
    pub floor: Duration,
}

impl Default for ShuffleSchedule {
    fn default() -> Self {
        Self {
            steps: DEFAULT_SHUFFLE_STEPS,
            base: DEFAULT_SHUFFLE_BASE,
            decay_per_step: DEFAULT_SHUFFLE_DECAY,
            floor: DEFAULT_SHUFFLE_FLOOR,
        }
    }
}

impl ShuffleSchedule {
    /// Gap after swap `step` (1-based): `max(floor, base - step * decay)`.
    pub fn delay_after(&self, step: u32) -> Duration {
        self.base
            .saturating_sub(self.decay_per_step.saturating_mul(step))
            .max(self.floor)
    }

    /// Wall time from the first swap until guessing opens.
    pub fn total(&self) -> Duration {
        (1..=self.steps).map(|k| self.delay_after(k)).sum()
    }

    pub fn sanitized(mut self) -> Self {
        self.steps = self.steps.clamp(1, 200);
        self.floor = self.floor.min(self.base);
        self
    }
}

/// Dwell times for every timed phase of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundTiming {
    #[serde(with = "crate::serde_duration")]
    pub reveal: Duration,
    #[serde(with = "crate::serde_duration")]
    pub cover: Duration,
    #[serde(default)]
    pub shuffle: ShuffleSchedule,
}

impl Default for RoundTiming {
    fn default() -> Self {
        Self {
            reveal: DEFAULT_REVEAL_DWELL,
            cover: DEFAULT_COVER_DWELL,
            shuffle: ShuffleSchedule::default(),
        }
    }
}

impl RoundTiming {
    pub fn sanitized(mut self) -> Self {
        self.shuffle = self.shuffle.sanitized();
        self
    }
}
