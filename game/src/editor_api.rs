use engine::agent::{AgentCommand, AgentHost, AgentResponse};
use engine::editor::{
    EditorGrid, EditorManifest, EditorPaletteEntry, EditorSnapshot, EditorStat, EditorTimeline,
};
use thiserror::Error;

use crate::editor_actions::{action_from_id, available_actions, default_manifest};
use crate::playtest::ShuffleLogic;
use crate::state::GameState;

/// Grid cell values: 0 covered cup, 1 raised cup, 2 raised cup with the token,
/// 3 highlighted winner.
const CELL_COVERED: u8 = 0;
const CELL_RAISED: u8 = 1;
const CELL_TOKEN: u8 = 2;
const CELL_WINNER: u8 = 3;

#[derive(Debug, Error)]
pub enum EditorApiError {
    #[error("unknown actionId: {0}")]
    UnknownActionId(String),
}

pub struct EditorSession {
    host: AgentHost<ShuffleLogic>,
}

impl EditorSession {
    pub fn new(seed: u64) -> Self {
        Self::with_logic(ShuffleLogic::new(seed))
    }

    pub fn with_logic(game: ShuffleLogic) -> Self {
        Self {
            host: AgentHost::new(game),
        }
    }

    pub fn manifest(&self) -> EditorManifest {
        default_manifest()
    }

    pub fn timeline(&self) -> EditorTimeline {
        let runner = self.host.runner();
        let tm = runner.timemachine();
        EditorTimeline {
            frame: runner.frame(),
            history_len: runner.history().len(),
            can_rewind: tm.can_rewind(),
            can_forward: tm.can_forward(),
        }
    }

    pub fn state(&mut self) -> EditorSnapshot {
        snapshot_from_response(self.host.handle(AgentCommand::GetState))
    }

    pub fn step(&mut self, action_id: &str) -> Result<EditorSnapshot, EditorApiError> {
        let action = action_from_id(action_id)
            .ok_or_else(|| EditorApiError::UnknownActionId(action_id.to_string()))?;
        Ok(snapshot_from_response(
            self.host.handle(AgentCommand::Step(action)),
        ))
    }

    pub fn rewind(&mut self, frames: usize) -> EditorSnapshot {
        snapshot_from_response(self.host.handle(AgentCommand::Rewind { frames }))
    }

    pub fn forward(&mut self, frames: usize) -> EditorSnapshot {
        snapshot_from_response(self.host.handle(AgentCommand::Forward { frames }))
    }

    pub fn seek(&mut self, frame: usize) -> EditorSnapshot {
        snapshot_from_response(self.host.handle(AgentCommand::Seek { frame }))
    }

    pub fn reset(&mut self) -> EditorSnapshot {
        snapshot_from_response(self.host.handle(AgentCommand::Reset))
    }
}

fn snapshot_from_response(response: AgentResponse<GameState>) -> EditorSnapshot {
    match response {
        AgentResponse::State { frame, state } => snapshot_from_state(frame, &state),
        AgentResponse::History { frame, history } => match history.get(frame) {
            Some(state) => snapshot_from_state(frame, state),
            None => EditorSnapshot {
                frame,
                state: serde_json::Value::Null,
                stats: Vec::new(),
                grid: None,
                available: Vec::new(),
            },
        },
    }
}

pub fn snapshot_from_state(frame: usize, state: &GameState) -> EditorSnapshot {
    let table = state.snapshot();
    let state_json = serde_json::to_value(state).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "game state did not serialize");
        serde_json::Value::Null
    });

    let stats = vec![
        stat("session", table.session_phase.label()),
        stat("phase", table.round_phase.label()),
        stat("round", format!("{}/{}", table.round_number, table.rounds_per_session)),
        stat("clockMs", state.clock_ms()),
        stat("wins", table.stats.wins),
        stat("played", table.stats.rounds_played),
        stat("winRate", format!("{}%", table.win_rate)),
        stat("streak", table.stats.current_streak),
        stat("bestStreak", table.stats.best_streak),
        stat_opt(
            "tokenSlot",
            table.token_slot.map(|slot| slot.to_string()),
        ),
        stat_opt(
            "lastGuess",
            table.last_outcome.map(|o| {
                format!("{} ({})", o.guessed, if o.correct { "win" } else { "loss" })
            }),
        ),
        stat_opt(
            "leader",
            state
                .leaderboard
                .entries()
                .first()
                .map(|e| format!("{} {}", e.name, e.score)),
        ),
    ];

    let cells = vec![
        table
            .cups
            .iter()
            .map(|cup| {
                if cup.highlighted {
                    CELL_WINNER
                } else if table.token_slot == Some(cup.slot) {
                    CELL_TOKEN
                } else if cup.raised {
                    CELL_RAISED
                } else {
                    CELL_COVERED
                }
            })
            .collect(),
    ];

    EditorSnapshot {
        frame,
        state: state_json,
        stats,
        grid: Some(EditorGrid {
            cells,
            palette: palette(),
        }),
        available: available_actions(state),
    }
}

fn stat(label: impl Into<String>, value: impl ToString) -> EditorStat {
    EditorStat {
        label: label.into(),
        value: value.to_string(),
    }
}

fn stat_opt(label: impl Into<String>, value: Option<String>) -> EditorStat {
    EditorStat {
        label: label.into(),
        value: value.unwrap_or_else(|| "-".to_string()),
    }
}

fn palette() -> Vec<EditorPaletteEntry> {
    [
        (CELL_COVERED, "covered"),
        (CELL_RAISED, "raised"),
        (CELL_TOKEN, "token"),
        (CELL_WINNER, "winner"),
    ]
    .into_iter()
    .map(|(value, label)| EditorPaletteEntry {
        value,
        label: label.to_string(),
    })
    .collect()
}
