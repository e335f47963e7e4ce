//! Engine-level regression testing helpers.
//!
//! These utilities help you:
//! - hash every recorded state of a `TimeMachine` (sha256 over its JSON form),
//! - save the recording to disk, replay the same inputs from scratch and
//!   assert both histories hash identically,
//! - pin a hash sequence in a golden file.
//!
//! The engine stays game-agnostic: anything `Serialize` can be hashed.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sha2::{Digest, Sha256};

use crate::{GameLogic, HeadlessRunner, TimeMachine};

/// Environment flag helper: accepts `1/true/yes/on` (case-insensitive).
pub fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// If set, regression tests may update golden files in-place.
pub fn update_goldens_enabled() -> bool {
    env_flag("CUP_SHUFFLE_UPDATE_GOLDENS")
}

pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

pub fn state_sha256_hex<S: Serialize>(state: &S) -> io::Result<String> {
    let bytes =
        serde_json::to_vec(state).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

pub fn history_hashes<S: Serialize>(tm: &TimeMachine<S>) -> io::Result<Vec<String>> {
    tm.history().iter().map(state_sha256_hex).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateHashGolden {
    pub version: u32,
    pub name: String,
    pub hash_alg: String,
    /// One hash per recorded state.
    pub hashes: Vec<String>,
}

impl StateHashGolden {
    pub fn new(name: impl Into<String>, hashes: Vec<String>) -> Self {
        Self {
            version: 1,
            name: name.into(),
            hash_alg: "sha256".to_string(),
            hashes,
        }
    }
}

pub fn load_golden_json(path: impl AsRef<Path>) -> io::Result<StateHashGolden> {
    let path = path.as_ref();
    let file = fs::File::open(path)?;
    let reader = io::BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("failed parsing golden json {}: {e}", path.display()),
        )
    })
}

pub fn save_golden_json(path: impl AsRef<Path>, golden: &StateHashGolden) -> io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = fs::File::create(path)?;
    let mut writer = io::BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, golden).map_err(io::Error::other)?;
    writer.flush()?;
    Ok(())
}

/// Compare against the golden at `path`, writing it when missing or when
/// `update` is set.
pub fn assert_or_update_golden_json(
    path: impl AsRef<Path>,
    golden: &StateHashGolden,
    update: bool,
) -> io::Result<()> {
    let path = path.as_ref();
    if update || !path.exists() {
        return save_golden_json(path, golden);
    }

    let expected = load_golden_json(path)?;
    if expected.version != golden.version || expected.hash_alg != golden.hash_alg {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "golden metadata mismatch at {}: expected v{} alg={}, got v{} alg={}\n(hint: set CUP_SHUFFLE_UPDATE_GOLDENS=1 to rewrite)",
                path.display(),
                expected.version,
                expected.hash_alg,
                golden.version,
                golden.hash_alg
            ),
        ));
    }

    if expected.hashes.len() != golden.hashes.len() {
        return Err(io::Error::other(format!(
            "golden state count mismatch at {}: expected {} hashes, got {}\n(hint: set CUP_SHUFFLE_UPDATE_GOLDENS=1 to rewrite)",
            path.display(),
            expected.hashes.len(),
            golden.hashes.len()
        )));
    }

    for (i, (a, b)) in expected.hashes.iter().zip(golden.hashes.iter()).enumerate() {
        if a != b {
            return Err(io::Error::other(format!(
                "golden mismatch at {} (state {i}):\nexpected: {a}\nactual:   {b}\n(hint: set CUP_SHUFFLE_UPDATE_GOLDENS=1 to rewrite)",
                path.display()
            )));
        }
    }

    Ok(())
}

#[derive(Debug, Clone)]
pub struct RecordReplayArtifacts {
    pub state_json: PathBuf,
    pub hashes: Vec<String>,
}

/// Run `inputs` live, save the history to `out_dir`, load it back, replay the
/// same inputs against a fresh runner and require all three histories to
/// hash identically.
pub fn record_then_replay_and_compare<G, I>(
    game: G,
    inputs: I,
    out_dir: impl AsRef<Path>,
    name: &str,
) -> io::Result<RecordReplayArtifacts>
where
    G: GameLogic + Clone,
    G::State: Serialize + DeserializeOwned,
    G::Input: Clone,
    I: IntoIterator<Item = G::Input>,
{
    let inputs: Vec<G::Input> = inputs.into_iter().collect();

    let mut live = HeadlessRunner::new(game.clone());
    live.run(inputs.iter().cloned());
    let live_hashes = history_hashes(live.timemachine())?;

    let state_json = out_dir
        .as_ref()
        .join(format!("{}.json", sanitize_filename(name)));
    live.timemachine().save_json_file(&state_json)?;
    let loaded = TimeMachine::<G::State>::load_json_file(&state_json)?;
    let loaded_hashes = history_hashes(&loaded)?;

    let mut replay = HeadlessRunner::new(game);
    replay.run(inputs);
    let replay_hashes = history_hashes(replay.timemachine())?;

    for (label, other) in [("loaded", &loaded_hashes), ("replayed", &replay_hashes)] {
        if other != &live_hashes {
            let first = live_hashes
                .iter()
                .zip(other.iter())
                .position(|(a, b)| a != b)
                .unwrap_or(live_hashes.len().min(other.len()));
            return Err(io::Error::other(format!(
                "{label} history diverges from live history at state {first} ({} vs {} states)",
                live_hashes.len(),
                other.len()
            )));
        }
    }

    Ok(RecordReplayArtifacts {
        state_json,
        hashes: live_hashes,
    })
}
