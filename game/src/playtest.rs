use std::time::Duration;

use engine::GameLogic;
use serde::{Deserialize, Serialize};

use crate::ids::ContainerId;
use crate::player::PlayerName;
use crate::settings::GameSettings;
use crate::state::GameState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputAction {
    Start,
    /// Jump to the next pending deadline.
    Wait,
    Tick(u64),
    /// Raw container id. Out-of-range ids are dropped here, before they reach
    /// the session.
    Guess(u8),
    Next,
    Menu,
}

#[derive(Debug, Clone)]
pub struct ShuffleLogic {
    seed: u64,
    settings: GameSettings,
    player: PlayerName,
    epoch_ms: i64,
}

impl ShuffleLogic {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            settings: GameSettings::default(),
            player: PlayerName::guest(),
            epoch_ms: 0,
        }
    }

    pub fn with_settings(mut self, settings: GameSettings) -> Self {
        self.settings = settings.sanitized();
        self
    }

    pub fn with_player(mut self, player: PlayerName) -> Self {
        self.player = player;
        self
    }

    /// Wall-clock origin for leaderboard dates.
    pub fn with_epoch_ms(mut self, epoch_ms: i64) -> Self {
        self.epoch_ms = epoch_ms;
        self
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }
}

impl GameLogic for ShuffleLogic {
    type State = GameState;
    type Input = InputAction;

    fn initial_state(&self) -> Self::State {
        GameState::new(self.seed, &self.settings, self.player.clone(), self.epoch_ms)
    }

    fn step(&self, state: &Self::State, input: Self::Input) -> Self::State {
        let mut next = state.clone();
        match input {
            InputAction::Start => next.start(),
            InputAction::Wait => next.wait(),
            InputAction::Tick(ms) => next.tick(Duration::from_millis(ms)),
            InputAction::Guess(raw) => match ContainerId::try_from(raw) {
                Ok(container) => next.guess(container),
                Err(err) => {
                    tracing::debug!(error = %err, "guess rejected");
                    next.noop();
                }
            },
            InputAction::Next => next.next(),
            InputAction::Menu => next.menu(),
        }
        next
    }
}
