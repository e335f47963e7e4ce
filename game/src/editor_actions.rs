use engine::editor::{EditorAction, EditorManifest};

use crate::playtest::InputAction;
use crate::round::RoundPhase;
use crate::session::SessionPhase;
use crate::state::GameState;

const EDITOR_TITLE: &str = "Cup Shuffle";

const ACTION_SPECS: &[(&str, &str, &str, InputAction)] = &[
    ("start", "Start Session", "session", InputAction::Start),
    ("next", "Next Round", "session", InputAction::Next),
    ("menu", "Menu", "session", InputAction::Menu),
    ("wait", "Wait", "clock", InputAction::Wait),
    ("tick100", "+100 ms", "clock", InputAction::Tick(100)),
    ("guess0", "Guess Cup 0", "guess", InputAction::Guess(0)),
    ("guess1", "Guess Cup 1", "guess", InputAction::Guess(1)),
    ("guess2", "Guess Cup 2", "guess", InputAction::Guess(2)),
];

pub fn default_manifest() -> EditorManifest {
    EditorManifest {
        title: EDITOR_TITLE.to_string(),
        actions: ACTION_SPECS
            .iter()
            .map(|(id, label, group, _)| EditorAction {
                id: (*id).to_string(),
                label: (*label).to_string(),
                group: (*group).to_string(),
            })
            .collect(),
    }
}

pub fn action_from_id(id: &str) -> Option<InputAction> {
    ACTION_SPECS
        .iter()
        .find_map(|(action_id, _, _, action)| (*action_id == id).then_some(*action))
}

fn is_meaningful(state: &GameState, action: InputAction) -> bool {
    let session = &state.session;
    match action {
        InputAction::Start => true,
        InputAction::Wait | InputAction::Tick(_) => session.next_deadline().is_some(),
        InputAction::Guess(_) => {
            session.phase() == SessionPhase::Playing
                && session.round().phase() == RoundPhase::AwaitingGuess
        }
        InputAction::Next => {
            session.phase() == SessionPhase::Playing
                && session.round().phase() == RoundPhase::Resolved
        }
        InputAction::Menu => session.phase() != SessionPhase::Menu,
    }
}

/// Manifest ids worth offering in `state`, in manifest order.
pub fn available_actions(state: &GameState) -> Vec<String> {
    ACTION_SPECS
        .iter()
        .filter(|(_, _, _, action)| is_meaningful(state, *action))
        .map(|(id, ..)| (*id).to_string())
        .collect()
}
