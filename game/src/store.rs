//! Leaderboard persistence: load once at startup, write back on change.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use thiserror::Error;

use crate::leaderboard::{Leaderboard, LeaderboardEntry, ScoreSink, SubmitOutcome};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("leaderboard io failed: {0}")]
    Io(#[from] io::Error),
    #[error("leaderboard data is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

pub trait LeaderboardStore {
    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<Vec<LeaderboardEntry>>, StoreError>;
    fn save(&self, entries: &[LeaderboardEntry]) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var_os(key).map(PathBuf::from))
    }

    pub fn from_env_with<F>(mut get_env: F) -> Self
    where
        F: FnMut(&str) -> Option<PathBuf>,
    {
        if let Some(explicit) = get_env("CUP_SHUFFLE_LEADERBOARD_PATH") {
            return Self { path: explicit };
        }

        let base = get_env("XDG_DATA_HOME")
            .or_else(|| get_env("HOME").map(|home| home.join(".local").join("share")))
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            path: base.join("cup-shuffle").join("leaderboard.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LeaderboardStore for JsonFileStore {
    fn load(&self) -> Result<Option<Vec<LeaderboardEntry>>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn save(&self, entries: &[LeaderboardEntry]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

/// Keeps the serialized list in memory. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    raw: Arc<Mutex<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Arc::new(Mutex::new(Some(raw.into()))),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.raw.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl LeaderboardStore for MemoryStore {
    fn load(&self) -> Result<Option<Vec<LeaderboardEntry>>, StoreError> {
        match self.raw() {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn save(&self, entries: &[LeaderboardEntry]) -> Result<(), StoreError> {
        let text = serde_json::to_string(entries)?;
        *self.raw.lock().unwrap_or_else(|e| e.into_inner()) = Some(text);
        Ok(())
    }
}

/// The process-wide leaderboard: loaded once from its store, written back
/// wholesale after every submission that changed it.
#[derive(Debug)]
pub struct Scoreboard<S> {
    store: S,
    board: Leaderboard,
}

impl<S: LeaderboardStore> Scoreboard<S> {
    /// Unreadable or corrupt data degrades to an empty board.
    pub fn open(store: S) -> Self {
        let board = match store.load() {
            Ok(Some(entries)) => Leaderboard::from_entries(entries),
            Ok(None) => {
                tracing::debug!("no stored leaderboard; starting empty");
                Leaderboard::new()
            }
            Err(err) => {
                tracing::warn!(error = %err, "stored leaderboard unreadable; starting empty");
                Leaderboard::new()
            }
        };
        Self { store, board }
    }

    pub fn board(&self) -> &Leaderboard {
        &self.board
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        self.board.entries()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn submit(&mut self, player: &str, score: u32) -> SubmitOutcome {
        self.submit_at(player, score, chrono::Utc::now().timestamp_millis())
    }

    pub fn submit_at(&mut self, player: &str, score: u32, now_ms: i64) -> SubmitOutcome {
        let outcome = self.board.submit(player, score, now_ms);
        tracing::info!(player, score, ?outcome, "leaderboard submission");
        if outcome.changed() {
            if let Err(err) = self.store.save(self.board.entries()) {
                tracing::error!(error = %err, "failed to persist leaderboard");
            }
        }
        outcome
    }
}

impl<S: LeaderboardStore> ScoreSink for Scoreboard<S> {
    fn submit_score(&mut self, player: &str, score: u32) -> SubmitOutcome {
        self.submit(player, score)
    }
}
