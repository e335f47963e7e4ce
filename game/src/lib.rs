pub mod commentary;
pub mod driver;
pub mod editor_actions;
pub mod editor_api;
pub mod ids;
pub mod leaderboard;
pub mod permutation;
pub mod player;
pub mod playtest;
pub mod round;
pub mod round_timer;
pub mod serde_duration;
pub mod session;
pub mod settings;
pub mod sfx;
pub mod snapshot;
pub mod state;
pub mod stats;
pub mod store;
pub mod telemetry;
pub mod terminal;
pub mod timing;
