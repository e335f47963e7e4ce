use serde::{Deserialize, Serialize};

use crate::round::{RoundEvent, RoundPhase};
use crate::session::SessionEvent;
use crate::settings::AudioSettings;

/// Base cue volumes (0.0..=1.0), before the player's gain is applied.
pub const START_SFX_VOLUME: f32 = 0.5;
pub const REVEAL_SFX_VOLUME: f32 = 0.25;
pub const SHUFFLE_SFX_VOLUME: f32 = 0.25;
pub const CLICK_SFX_VOLUME: f32 = 0.1;
pub const WIN_SFX_VOLUME: f32 = 0.25;
pub const LOSE_SFX_VOLUME: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SoundCue {
    Start,
    Reveal,
    Shuffle,
    Click,
    Win,
    Lose,
}

impl SoundCue {
    pub const ALL: [SoundCue; 6] = [
        SoundCue::Start,
        SoundCue::Reveal,
        SoundCue::Shuffle,
        SoundCue::Click,
        SoundCue::Win,
        SoundCue::Lose,
    ];

    pub fn base_volume(self) -> f32 {
        match self {
            SoundCue::Start => START_SFX_VOLUME,
            SoundCue::Reveal => REVEAL_SFX_VOLUME,
            SoundCue::Shuffle => SHUFFLE_SFX_VOLUME,
            SoundCue::Click => CLICK_SFX_VOLUME,
            SoundCue::Win => WIN_SFX_VOLUME,
            SoundCue::Lose => LOSE_SFX_VOLUME,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SoundCue::Start => "start",
            SoundCue::Reveal => "reveal",
            SoundCue::Shuffle => "shuffle",
            SoundCue::Click => "click",
            SoundCue::Win => "win",
            SoundCue::Lose => "lose",
        }
    }
}

/// Cues a session event should trigger, in play order.
pub fn cues_for(event: &SessionEvent) -> &'static [SoundCue] {
    match event {
        SessionEvent::RoundStarted(_) => &[SoundCue::Start],
        SessionEvent::Round(RoundEvent::PhaseChanged(RoundPhase::Covering)) => &[SoundCue::Reveal],
        SessionEvent::Round(RoundEvent::Swapped { .. }) => &[SoundCue::Shuffle],
        SessionEvent::Round(RoundEvent::Resolved(outcome)) if outcome.correct => {
            &[SoundCue::Click, SoundCue::Win]
        }
        SessionEvent::Round(RoundEvent::Resolved(_)) => &[SoundCue::Click, SoundCue::Lose],
        _ => &[],
    }
}

/// Fire-and-forget playback. Implementations must not block the caller.
pub trait AudioSink {
    fn play(&mut self, cue: SoundCue);
}

/// Logs each cue with the gain it would be played at.
#[derive(Debug, Clone, Copy)]
pub struct TraceAudio {
    settings: AudioSettings,
}

impl TraceAudio {
    pub fn new(settings: AudioSettings) -> Self {
        Self {
            settings: settings.clamp(),
        }
    }

    pub fn gain_for(&self, cue: SoundCue) -> f32 {
        cue.base_volume() * self.settings.effective_sfx_gain()
    }
}

impl AudioSink for TraceAudio {
    fn play(&mut self, cue: SoundCue) {
        let gain = self.gain_for(cue);
        if gain > 0.0 {
            tracing::trace!(cue = cue.label(), gain, "sfx");
        }
    }
}

/// Keeps every cue; used by the headless runner and tests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CueLog(pub Vec<SoundCue>);

impl AudioSink for CueLog {
    fn play(&mut self, cue: SoundCue) {
        self.0.push(cue);
    }
}

pub fn play_all<A: AudioSink + ?Sized>(sink: &mut A, events: &[SessionEvent]) {
    for event in events {
        for &cue in cues_for(event) {
            sink.play(cue);
        }
    }
}
