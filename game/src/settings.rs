use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::timing::RoundTiming;

pub const DEFAULT_ROUNDS_PER_SESSION: u32 = 10;
pub const MAX_ROUNDS_PER_SESSION: u32 = 100;
pub const DEFAULT_START_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_COMMENTARY_TIMEOUT: Duration = Duration::from_millis(3_000);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AudioSettings {
    pub master_volume: f32,
    pub sfx_volume: f32,
    pub mute_all: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            master_volume: 1.0,
            sfx_volume: 1.0,
            mute_all: false,
        }
    }
}

impl AudioSettings {
    pub fn clamp(mut self) -> Self {
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);
        self
    }

    pub fn effective_sfx_gain(self) -> f32 {
        if self.mute_all {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSettings {
    pub rounds_per_session: u32,
    /// Pause between pressing start and the first reveal.
    #[serde(with = "crate::serde_duration")]
    pub start_delay: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            rounds_per_session: DEFAULT_ROUNDS_PER_SESSION,
            start_delay: DEFAULT_START_DELAY,
        }
    }
}

impl SessionSettings {
    pub fn clamp(mut self) -> Self {
        self.rounds_per_session = self.rounds_per_session.clamp(1, MAX_ROUNDS_PER_SESSION);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommentarySettings {
    /// Remote commentary service; canned lines are used when unset.
    pub endpoint: Option<String>,
    #[serde(with = "crate::serde_duration")]
    pub timeout: Duration,
}

impl Default for CommentarySettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout: DEFAULT_COMMENTARY_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameSettings {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub audio: AudioSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub timing: RoundTiming,
    #[serde(default)]
    pub commentary: CommentarySettings,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            audio: AudioSettings::default(),
            session: SessionSettings::default(),
            timing: RoundTiming::default(),
            commentary: CommentarySettings::default(),
        }
    }
}

impl GameSettings {
    pub fn sanitized(mut self) -> Self {
        self.version = default_version();
        self.audio = self.audio.clamp();
        self.session = self.session.clamp();
        self.timing = self.timing.sanitized();
        if self
            .commentary
            .endpoint
            .as_deref()
            .is_some_and(|e| e.trim().is_empty())
        {
            self.commentary.endpoint = None;
        }
        self
    }
}

fn default_version() -> u32 {
    1
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
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
        if let Some(explicit) = get_env("CUP_SHUFFLE_SETTINGS_PATH") {
            return Self { path: explicit };
        }

        let base = get_env("XDG_CONFIG_HOME")
            .or_else(|| {
                get_env("HOME").map(|mut p| {
                    p.push(".config");
                    p
                })
            })
            .unwrap_or_else(|| PathBuf::from("."));

        let mut path = base;
        path.push("cup-shuffle");
        path.push("settings.json");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> GameSettings {
        let Ok(bytes) = fs::read(&self.path) else {
            return GameSettings::default();
        };
        match serde_json::from_slice::<GameSettings>(&bytes) {
            Ok(settings) => settings.sanitized(),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "invalid settings file; using defaults");
                GameSettings::default()
            }
        }
    }

    pub fn save(&self, settings: &GameSettings) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(settings)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&self.path, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_temp_path(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "cup-shuffle-{name}-{}-{nanos}.json",
            std::process::id()
        ))
    }

    #[test]
    fn audio_effective_gain_respects_mute() {
        let mut audio = AudioSettings::default();
        assert!((audio.effective_sfx_gain() - 1.0).abs() < 1e-6);

        audio.master_volume = 0.5;
        audio.sfx_volume = 0.5;
        assert!((audio.effective_sfx_gain() - 0.25).abs() < 1e-6);

        audio.mute_all = true;
        assert_eq!(audio.effective_sfx_gain(), 0.0);
    }

    #[test]
    fn game_settings_sanitized_clamps_expected_fields() {
        let mut timing = RoundTiming::default();
        timing.shuffle.steps = 0;
        timing.shuffle.floor = Duration::from_millis(900);

        let settings = GameSettings {
            version: 99,
            audio: AudioSettings {
                master_volume: 3.0,
                sfx_volume: -2.0,
                mute_all: false,
            },
            session: SessionSettings {
                rounds_per_session: 0,
                start_delay: DEFAULT_START_DELAY,
            },
            timing,
            commentary: CommentarySettings {
                endpoint: Some("   ".to_string()),
                ..CommentarySettings::default()
            },
        }
        .sanitized();

        assert_eq!(settings.version, 1);
        assert_eq!(settings.audio.master_volume, 1.0);
        assert_eq!(settings.audio.sfx_volume, 0.0);
        assert_eq!(settings.session.rounds_per_session, 1);
        assert_eq!(settings.timing.shuffle.steps, 1);
        assert_eq!(settings.timing.shuffle.floor, settings.timing.shuffle.base);
        assert_eq!(settings.commentary.endpoint, None);
    }

    #[test]
    fn serde_defaults_fill_missing_sections() {
        let parsed: GameSettings = serde_json::from_str(
            r#"{"version":1,"session":{"rounds_per_session":1,"start_delay":0}}"#,
        )
        .expect("settings JSON should parse");
        assert_eq!(parsed.session.rounds_per_session, 1);
        assert_eq!(parsed.session.start_delay, Duration::ZERO);
        assert_eq!(parsed.audio, AudioSettings::default());
        assert_eq!(parsed.timing, RoundTiming::default());
        assert_eq!(parsed.commentary, CommentarySettings::default());
    }

    #[test]
    fn store_round_trips_and_falls_back_on_garbage() {
        let path = unique_temp_path("settings");
        let store = SettingsStore::at(&path);
        assert_eq!(store.load(), GameSettings::default());

        let mut settings = GameSettings::default();
        settings.session.rounds_per_session = 3;
        settings.commentary.endpoint = Some("http://127.0.0.1:9/comment".to_string());
        store.save(&settings).expect("save settings");
        assert_eq!(store.load(), settings);

        fs::write(&path, "{ nope").expect("write garbage");
        assert_eq!(store.load(), GameSettings::default());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn path_comes_from_env_override_then_xdg() {
        let explicit = SettingsStore::from_env_with(|k| {
            (k == "CUP_SHUFFLE_SETTINGS_PATH").then(|| PathBuf::from("/tmp/s.json"))
        });
        assert_eq!(explicit.path(), Path::new("/tmp/s.json"));

        let xdg = SettingsStore::from_env_with(|k| {
            (k == "XDG_CONFIG_HOME").then(|| PathBuf::from("/cfg"))
        });
        assert_eq!(xdg.path(), Path::new("/cfg/cup-shuffle/settings.json"));
    }
}
