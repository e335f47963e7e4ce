use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::commentary::CommentaryContext;
use crate::ids::ContainerId;
use crate::leaderboard::{Leaderboard, StampedBoard};
use crate::player::PlayerName;
use crate::session::{SessionController, SessionEvent};
use crate::settings::GameSettings;
use crate::sfx::{CueLog, SoundCue, play_all};
use crate::snapshot::TableSnapshot;

/// Everything one headless frame needs: the session, an in-memory
/// leaderboard, the seeded rng and a simulated clock. `events`, `cues` and
/// `commentary` describe only what the most recent input produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub session: SessionController,
    pub leaderboard: Leaderboard,
    pub player: PlayerName,
    rng: ChaCha8Rng,
    clock_ms: u64,
    epoch_ms: i64,
    /// Session events of the last step.
    pub events: Vec<SessionEvent>,
    /// Cues of the last step.
    pub cues: Vec<SoundCue>,
    /// Commentary requested by the last step, if any.
    pub commentary: Option<CommentaryContext>,
}

impl GameState {
    pub fn new(seed: u64, settings: &GameSettings, player: PlayerName, epoch_ms: i64) -> Self {
        let settings = settings.clone().sanitized();
        Self {
            session: SessionController::new(settings.session, settings.timing),
            leaderboard: Leaderboard::new(),
            player,
            rng: ChaCha8Rng::seed_from_u64(seed),
            clock_ms: 0,
            epoch_ms,
            events: Vec::new(),
            cues: Vec::new(),
            commentary: None,
        }
    }

    /// Simulated milliseconds since the state was created.
    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    pub fn now_ms(&self) -> i64 {
        self.epoch_ms
            .saturating_add(i64::try_from(self.clock_ms).unwrap_or(i64::MAX))
    }

    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot::capture(&self.session)
    }

    pub fn start(&mut self) {
        let events = self.session.start_session(self.player.clone());
        self.finish_step(events);
    }

    pub fn tick(&mut self, dt: Duration) {
        self.clock_ms = self
            .clock_ms
            .saturating_add(u64::try_from(dt.as_millis()).unwrap_or(u64::MAX));
        let events = self.session.tick(dt, &mut self.rng);
        self.finish_step(events);
    }

    /// Advance exactly to the next pending deadline. Nothing happens when
    /// no deadline is pending.
    pub fn wait(&mut self) {
        match self.session.next_deadline() {
            Some(dt) => self.tick(dt),
            None => self.finish_step(Vec::new()),
        }
    }

    pub fn guess(&mut self, container: ContainerId) {
        let events = match self.session.guess(container) {
            Some(outcome) => vec![SessionEvent::resolved(outcome)],
            None => Vec::new(),
        };
        self.finish_step(events);
    }

    pub fn next(&mut self) {
        let mut sink = StampedBoard {
            now_ms: self.now_ms(),
            board: &mut self.leaderboard,
        };
        let events = self.session.advance(&mut self.rng, &mut sink);
        self.finish_step(events);
    }

    pub fn menu(&mut self) {
        let events = self.session.abort_to_menu();
        self.finish_step(events);
    }

    /// An input that changed nothing.
    pub fn noop(&mut self) {
        self.finish_step(Vec::new());
    }

    fn finish_step(&mut self, events: Vec<SessionEvent>) {
        let mut log = CueLog::default();
        play_all(&mut log, &events);
        self.cues = log.0;
        self.commentary = events.iter().rev().find_map(CommentaryContext::for_event);
        self.events = events;
    }
}
