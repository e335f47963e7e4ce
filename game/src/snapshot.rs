//! Read-only view of the table for whatever draws it.

use serde::{Deserialize, Serialize};

use crate::ids::{ContainerId, Slot};
use crate::round::{GuessOutcome, RoundPhase};
use crate::session::{SessionController, SessionPhase, SessionSummary};
use crate::stats::SessionStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CupView {
    pub container: ContainerId,
    pub slot: Slot,
    pub raised: bool,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSnapshot {
    pub session_phase: SessionPhase,
    pub round_phase: RoundPhase,
    pub round_number: u32,
    pub rounds_per_session: u32,
    pub player: Option<String>,
    /// Left to right.
    pub cups: [CupView; 3],
    /// Only while the token's cup is raised.
    pub token_slot: Option<Slot>,
    pub accepting_guess: bool,
    pub stats: SessionStats,
    pub win_rate: u32,
    pub last_outcome: Option<GuessOutcome>,
    pub summary: Option<SessionSummary>,
}

impl TableSnapshot {
    pub fn capture(session: &SessionController) -> Self {
        let round = session.round();
        let cups = Slot::ALL.map(|slot| {
            let container = round.positions().container_at(slot);
            CupView {
                container,
                slot,
                raised: round.is_raised(container),
                highlighted: round.is_highlighted(container),
            }
        });

        Self {
            session_phase: session.phase(),
            round_phase: round.phase(),
            round_number: session.round_number(),
            rounds_per_session: session.settings().rounds_per_session,
            player: session.player().map(|p| p.as_str().to_string()),
            cups,
            token_slot: round.token_visible().then(|| round.token_slot()),
            accepting_guess: session.phase() == SessionPhase::Playing
                && round.phase() == RoundPhase::AwaitingGuess,
            stats: *session.stats(),
            win_rate: session.win_rate(),
            last_outcome: session.last_outcome(),
            summary: session.summary().cloned(),
        }
    }

    pub fn cup_in(&self, slot: Slot) -> &CupView {
        &self.cups[slot.index()]
    }
}
