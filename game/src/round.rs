//! One round of the shell game: show the token, cover it, shuffle, take a guess.
//!
//! The controller owns the cup positions, the winning cup and a single
//! one-shot [`RoundTimer`]. Every phase change cancels whatever was pending
//! before scheduling the next deadline, so a deadline issued for an earlier
//! phase (or an earlier round) can never fire into the current one.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ids::{CUPS, ContainerId, Slot};
use crate::permutation::{PositionMap, pick_distinct_slots};
use crate::round_timer::{RoundTimer, TimerHandle};
use crate::timing::RoundTiming;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoundPhase {
    Idle,
    RevealStart,
    Covering,
    Shuffling,
    AwaitingGuess,
    Resolved,
}

impl RoundPhase {
    pub fn label(self) -> &'static str {
        match self {
            RoundPhase::Idle => "idle",
            RoundPhase::RevealStart => "reveal",
            RoundPhase::Covering => "covering",
            RoundPhase::Shuffling => "shuffling",
            RoundPhase::AwaitingGuess => "guessing",
            RoundPhase::Resolved => "resolved",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessOutcome {
    pub guessed: ContainerId,
    pub correct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoundEvent {
    PhaseChanged(RoundPhase),
    Swapped { step: u32, a: Slot, b: Slot },
    Resolved(GuessOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundController {
    timing: RoundTiming,
    phase: RoundPhase,
    positions: PositionMap,
    winner: ContainerId,
    guess: Option<ContainerId>,
    shuffle_step: u32,
    timer: RoundTimer,
}

impl RoundController {
    pub fn new(timing: RoundTiming) -> Self {
        Self {
            timing,
            phase: RoundPhase::Idle,
            positions: PositionMap::identity(),
            winner: ContainerId::ALL[0],
            guess: None,
            shuffle_step: 0,
            timer: RoundTimer::new(),
        }
    }

    pub fn timing(&self) -> &RoundTiming {
        &self.timing
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn positions(&self) -> &PositionMap {
        &self.positions
    }

    pub fn winner(&self) -> ContainerId {
        self.winner
    }

    pub fn guessed(&self) -> Option<ContainerId> {
        self.guess
    }

    pub fn shuffle_step(&self) -> u32 {
        self.shuffle_step
    }

    pub fn outcome(&self) -> Option<GuessOutcome> {
        self.guess.map(|guessed| GuessOutcome {
            guessed,
            correct: guessed == self.winner,
        })
    }

    /// Time until the pending phase deadline, if any.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timer.remaining()
    }

    pub fn pending_timer(&self) -> Option<TimerHandle> {
        self.timer.handle()
    }

    /// Begin a fresh round from any phase. Whatever the previous round had
    /// scheduled is dropped.
    pub fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<RoundEvent> {
        let winner = ContainerId::ALL[rng.gen_range(0..CUPS)];
        self.begin(winner)
    }

    fn begin(&mut self, winner: ContainerId) -> Vec<RoundEvent> {
        let mut events = Vec::new();
        self.winner = winner;
        self.positions = PositionMap::identity();
        self.guess = None;
        self.shuffle_step = 0;
        self.enter(RoundPhase::RevealStart, &mut events);
        self.timer.schedule(self.timing.reveal);
        events
    }

    /// Back to `Idle`, discarding the round and any pending deadline.
    pub fn reset(&mut self) {
        self.timer.cancel();
        self.phase = RoundPhase::Idle;
        self.positions = PositionMap::identity();
        self.guess = None;
        self.shuffle_step = 0;
    }

    /// Deliver a fired timer. Stale handles are ignored.
    pub fn fire<R: Rng + ?Sized>(&mut self, handle: TimerHandle, rng: &mut R) -> Vec<RoundEvent> {
        let mut events = Vec::new();
        self.fire_into(handle, rng, &mut events);
        events
    }

    /// Advance the clock by `dt`, firing every deadline that falls inside it in
    /// order. Time left over after a deadline counts toward the next phase.
    pub fn tick<R: Rng + ?Sized>(&mut self, dt: Duration, rng: &mut R) -> Vec<RoundEvent> {
        let mut events = Vec::new();
        let mut budget = dt;
        while let Some((handle, left)) = self.timer.consume(budget) {
            budget = left;
            self.fire_into(handle, rng, &mut events);
        }
        events
    }

    /// Take the player's pick. Only meaningful while guessing; anything else
    /// is dropped without touching state.
    pub fn guess(&mut self, container: ContainerId) -> Option<GuessOutcome> {
        if self.phase != RoundPhase::AwaitingGuess {
            tracing::trace!(phase = self.phase.label(), "guess ignored outside guessing phase");
            return None;
        }
        self.guess = Some(container);
        let mut events = Vec::new();
        self.enter(RoundPhase::Resolved, &mut events);
        let outcome = self.outcome();
        if let Some(outcome) = outcome {
            tracing::debug!(
                guessed = outcome.guessed.get(),
                winner = self.winner.get(),
                correct = outcome.correct,
                "round resolved"
            );
        }
        outcome
    }

    /// Cup lifted off the table in the current phase.
    pub fn is_raised(&self, container: ContainerId) -> bool {
        match self.phase {
            RoundPhase::RevealStart => container == self.winner,
            RoundPhase::Resolved => container == self.winner || self.guess == Some(container),
            _ => false,
        }
    }

    pub fn is_highlighted(&self, container: ContainerId) -> bool {
        self.phase == RoundPhase::Resolved && container == self.winner
    }

    /// Slot the token sits in; it travels with the winning cup.
    pub fn token_slot(&self) -> Slot {
        self.positions.slot_of(self.winner)
    }

    /// The token can be seen only while its cup is raised.
    pub fn token_visible(&self) -> bool {
        self.is_raised(self.winner)
    }

    fn fire_into<R: Rng + ?Sized>(
        &mut self,
        handle: TimerHandle,
        rng: &mut R,
        events: &mut Vec<RoundEvent>,
    ) {
        if !self.timer.take(handle) {
            tracing::trace!(?handle, "stale round timer ignored");
            return;
        }

        match self.phase {
            RoundPhase::RevealStart => {
                self.enter(RoundPhase::Covering, events);
                self.timer.schedule(self.timing.cover);
            }
            RoundPhase::Covering => {
                self.enter(RoundPhase::Shuffling, events);
                self.shuffle_once(rng, events);
            }
            RoundPhase::Shuffling => {
                if self.shuffle_step >= self.timing.shuffle.steps {
                    self.enter(RoundPhase::AwaitingGuess, events);
                } else {
                    self.shuffle_once(rng, events);
                }
            }
            RoundPhase::Idle | RoundPhase::AwaitingGuess | RoundPhase::Resolved => {}
        }
    }

    fn shuffle_once<R: Rng + ?Sized>(&mut self, rng: &mut R, events: &mut Vec<RoundEvent>) {
        self.shuffle_step += 1;
        let (a, b) = pick_distinct_slots(rng);
        self.positions = self.positions.swap_slots(a, b);
        events.push(RoundEvent::Swapped {
            step: self.shuffle_step,
            a,
            b,
        });
        self.timer
            .schedule(self.timing.shuffle.delay_after(self.shuffle_step));
    }

    fn enter(&mut self, phase: RoundPhase, events: &mut Vec<RoundEvent>) {
        self.timer.cancel();
        self.phase = phase;
        tracing::debug!(phase = phase.label(), "round phase");
        events.push(RoundEvent::PhaseChanged(phase));
    }
}
