use engine::GameLogic;
use cup_shuffle::playtest::{InputAction, ShuffleLogic};
use cup_shuffle::round::RoundPhase;
use cup_shuffle::state::GameState;

#[test]
fn game_state_round_trip_preserves_state() {
    let game = ShuffleLogic::new(77);
    let mut state = game.initial_state();
    for input in [InputAction::Start, InputAction::Tick(500 + 2_000 + 300)] {
        state = game.step(&state, input);
    }
    assert_eq!(state.session.round().phase(), RoundPhase::Shuffling);

    let json = serde_json::to_string(&state).expect("serialize game state");
    let restored: GameState = serde_json::from_str(&json).expect("deserialize game state");
    assert_eq!(restored, state);

    // The rng travels with the state, so both continue identically.
    let a = game.step(&state, InputAction::Tick(5_000));
    let b = game.step(&restored, InputAction::Tick(5_000));
    assert_eq!(a, b);
    assert_eq!(a.session.round().phase(), RoundPhase::AwaitingGuess);
}

#[test]
fn invalid_positions_are_rejected_on_load() {
    let game = ShuffleLogic::new(5);
    let state = game.step(&game.initial_state(), InputAction::Start);
    let mut value = serde_json::to_value(&state).expect("serialize game state");

    value["session"]["round"]["positions"] = serde_json::json!([1, 1, 0]);
    assert!(serde_json::from_value::<GameState>(value).is_err());
}
