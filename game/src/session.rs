//! A session is a fixed number of rounds played under one name. It owns the
//! round controller, the running stats and the pre-game countdown, and hands
//! the best streak to a [`ScoreSink`] once the last round is settled.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ids::ContainerId;
use crate::leaderboard::{ScoreSink, SubmitOutcome};
use crate::player::PlayerName;
use crate::round::{GuessOutcome, RoundController, RoundEvent, RoundPhase};
use crate::round_timer::RoundTimer;
use crate::settings::SessionSettings;
use crate::stats::SessionStats;
use crate::timing::RoundTiming;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    Menu,
    Starting,
    Playing,
    Summary,
}

impl SessionPhase {
    pub fn label(self) -> &'static str {
        match self {
            SessionPhase::Menu => "menu",
            SessionPhase::Starting => "starting",
            SessionPhase::Playing => "playing",
            SessionPhase::Summary => "summary",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub player: PlayerName,
    pub stats: SessionStats,
    pub win_rate: u32,
    pub submission: SubmitOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionEvent {
    SessionStarted,
    /// 1-based round number.
    RoundStarted(u32),
    Round(RoundEvent),
    Completed(SessionSummary),
    ReturnedToMenu,
}

impl SessionEvent {
    /// The event a caller reports after [`SessionController::guess`] accepted a pick.
    pub fn resolved(outcome: GuessOutcome) -> Self {
        SessionEvent::Round(RoundEvent::Resolved(outcome))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionController {
    settings: SessionSettings,
    phase: SessionPhase,
    player: Option<PlayerName>,
    stats: SessionStats,
    round: RoundController,
    round_number: u32,
    start_timer: RoundTimer,
    last_outcome: Option<GuessOutcome>,
    summary: Option<SessionSummary>,
}

impl SessionController {
    pub fn new(settings: SessionSettings, timing: RoundTiming) -> Self {
        Self {
            settings: settings.clamp(),
            phase: SessionPhase::Menu,
            player: None,
            stats: SessionStats::default(),
            round: RoundController::new(timing),
            round_number: 0,
            start_timer: RoundTimer::new(),
            last_outcome: None,
            summary: None,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn player(&self) -> Option<&PlayerName> {
        self.player.as_ref()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn round(&self) -> &RoundController {
        &self.round
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn last_outcome(&self) -> Option<GuessOutcome> {
        self.last_outcome
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    pub fn win_rate(&self) -> u32 {
        self.stats.win_rate()
    }

    /// Every round of the session has been played.
    pub fn is_final_round(&self) -> bool {
        self.stats.rounds_played >= self.settings.rounds_per_session
    }

    /// Whatever deadline is pending: the countdown while starting, the round
    /// timer while playing.
    pub fn next_deadline(&self) -> Option<Duration> {
        match self.phase {
            SessionPhase::Starting => self.start_timer.remaining(),
            SessionPhase::Playing => self.round.next_deadline(),
            SessionPhase::Menu | SessionPhase::Summary => None,
        }
    }

    /// Fresh stats and a fresh round for `player`. Allowed from any phase;
    /// a session in progress is dropped without submitting.
    pub fn start_session(&mut self, player: PlayerName) -> Vec<SessionEvent> {
        tracing::info!(player = %player, rounds = self.settings.rounds_per_session, "session started");
        self.round.reset();
        self.stats = SessionStats::default();
        self.round_number = 0;
        self.last_outcome = None;
        self.summary = None;
        self.player = Some(player);
        self.phase = SessionPhase::Starting;
        self.start_timer.schedule(self.settings.start_delay);
        vec![SessionEvent::SessionStarted]
    }

    pub fn tick<R: Rng + ?Sized>(&mut self, dt: Duration, rng: &mut R) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        let mut budget = dt;

        if self.phase == SessionPhase::Starting {
            let Some((handle, left)) = self.start_timer.consume(budget) else {
                return events;
            };
            self.start_timer.take(handle);
            budget = left;
            self.phase = SessionPhase::Playing;
            self.begin_round(rng, &mut events);
        }

        if self.phase == SessionPhase::Playing {
            events.extend(self.round.tick(budget, rng).into_iter().map(SessionEvent::Round));
        }
        events
    }

    /// Forward a pick to the round. Returns the outcome only when the round
    /// accepted it; the stats are updated before returning.
    pub fn guess(&mut self, container: ContainerId) -> Option<GuessOutcome> {
        if self.phase != SessionPhase::Playing {
            return None;
        }
        let outcome = self.round.guess(container)?;
        self.on_round_resolved(outcome);
        Some(outcome)
    }

    /// Fold a settled round into the running stats.
    pub fn on_round_resolved(&mut self, outcome: GuessOutcome) {
        self.stats.record(outcome.correct);
        self.last_outcome = Some(outcome);
        tracing::debug!(
            round = self.round_number,
            correct = outcome.correct,
            streak = self.stats.current_streak,
            best = self.stats.best_streak,
            "stats updated"
        );
    }

    /// Move past a resolved round: the next round, or the summary once the
    /// session is complete. Does nothing while a round is still running.
    pub fn advance<R, S>(&mut self, rng: &mut R, sink: &mut S) -> Vec<SessionEvent>
    where
        R: Rng + ?Sized,
        S: ScoreSink + ?Sized,
    {
        let mut events = Vec::new();
        if self.phase != SessionPhase::Playing || self.round.phase() != RoundPhase::Resolved {
            tracing::trace!(
                session = self.phase.label(),
                round = self.round.phase().label(),
                "advance ignored"
            );
            return events;
        }

        if self.is_final_round() {
            self.finish(sink, &mut events);
        } else {
            self.begin_round(rng, &mut events);
        }
        events
    }

    /// Abandon the session. Nothing is submitted.
    pub fn abort_to_menu(&mut self) -> Vec<SessionEvent> {
        if self.phase == SessionPhase::Menu {
            return Vec::new();
        }
        tracing::info!(phase = self.phase.label(), "session abandoned");
        self.start_timer.cancel();
        self.round.reset();
        self.stats = SessionStats::default();
        self.round_number = 0;
        self.last_outcome = None;
        self.summary = None;
        self.phase = SessionPhase::Menu;
        vec![SessionEvent::ReturnedToMenu]
    }

    fn begin_round<R: Rng + ?Sized>(&mut self, rng: &mut R, events: &mut Vec<SessionEvent>) {
        self.round_number += 1;
        events.push(SessionEvent::RoundStarted(self.round_number));
        events.extend(self.round.start(rng).into_iter().map(SessionEvent::Round));
    }

    fn finish<S: ScoreSink + ?Sized>(&mut self, sink: &mut S, events: &mut Vec<SessionEvent>) {
        self.phase = SessionPhase::Summary;
        let Some(player) = self.player.clone() else {
            return;
        };
        let submission = sink.submit_score(player.as_str(), self.stats.best_streak);
        let summary = SessionSummary {
            player,
            stats: self.stats,
            win_rate: self.stats.win_rate(),
            submission,
        };
        tracing::info!(
            player = %summary.player,
            wins = summary.stats.wins,
            rounds = summary.stats.rounds_played,
            best_streak = summary.stats.best_streak,
            win_rate = summary.win_rate,
            "session complete"
        );
        self.summary = Some(summary.clone());
        events.push(SessionEvent::Completed(summary));
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    const TO_GUESSING: Duration = Duration::from_millis(4_432);

    #[derive(Default)]
    struct Recorder(Vec<(String, u32)>);

    impl ScoreSink for Recorder {
        fn submit_score(&mut self, player: &str, score: u32) -> SubmitOutcome {
            self.0.push((player.to_string(), score));
            SubmitOutcome::Recorded { rank: Some(0) }
        }
    }

    fn session(rounds: u32) -> SessionController {
        SessionController::new(
            SessionSettings {
                rounds_per_session: rounds,
                ..SessionSettings::default()
            },
            RoundTiming::default(),
        )
    }

    fn name(raw: &str) -> PlayerName {
        PlayerName::parse(raw).unwrap()
    }

    /// Run the current round to guessing and pick the winner or a loser.
    fn play_round(s: &mut SessionController, rng: &mut ChaCha8Rng, win: bool) -> GuessOutcome {
        s.tick(TO_GUESSING, rng);
        assert_eq!(s.round().phase(), RoundPhase::AwaitingGuess);
        let winner = s.round().winner();
        let pick = if win {
            winner
        } else {
            *ContainerId::ALL.iter().find(|&&c| c != winner).unwrap()
        };
        s.guess(pick).expect("guess accepted")
    }

    #[test]
    fn start_waits_for_the_countdown_then_reveals() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut s = session(10);
        assert_eq!(s.start_session(name("Ann")), vec![SessionEvent::SessionStarted]);
        assert_eq!(s.phase(), SessionPhase::Starting);
        assert_eq!(s.next_deadline(), Some(Duration::from_millis(500)));

        assert!(s.tick(Duration::from_millis(499), &mut rng).is_empty());
        let events = s.tick(Duration::from_millis(1), &mut rng);
        assert_eq!(s.phase(), SessionPhase::Playing);
        assert_eq!(
            events,
            vec![
                SessionEvent::RoundStarted(1),
                SessionEvent::Round(RoundEvent::PhaseChanged(RoundPhase::RevealStart)),
            ]
        );
        assert_eq!(s.next_deadline(), Some(Duration::from_millis(1_200)));
    }

    #[test]
    fn full_session_tracks_streaks_and_submits_best() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut sink = Recorder::default();
        let mut s = session(4);
        s.start_session(name("Ann"));
        s.tick(Duration::from_millis(500), &mut rng);

        let script = [true, true, false, true];
        for (i, &win) in script.iter().enumerate() {
            assert_eq!(s.round_number(), i as u32 + 1);
            let outcome = play_round(&mut s, &mut rng, win);
            assert_eq!(outcome.correct, win);
            let events = s.advance(&mut rng, &mut sink);
            if i + 1 < script.len() {
                assert_eq!(events[0], SessionEvent::RoundStarted(i as u32 + 2));
            }
        }

        assert_eq!(s.phase(), SessionPhase::Summary);
        let stats = *s.stats();
        assert_eq!((stats.wins, stats.rounds_played), (3, 4));
        assert_eq!((stats.current_streak, stats.best_streak), (1, 2));
        assert_eq!(s.win_rate(), 75);
        assert_eq!(sink.0, vec![("Ann".to_string(), 2)]);

        let summary = s.summary().unwrap();
        assert_eq!(summary.win_rate, 75);
        assert_eq!(summary.submission, SubmitOutcome::Recorded { rank: Some(0) });
        assert_eq!(s.next_deadline(), None);
    }

    #[test]
    fn single_round_session_completes_on_first_advance() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut sink = Recorder::default();
        let mut s = session(1);
        s.start_session(name("Bo"));
        s.tick(Duration::from_millis(500), &mut rng);
        play_round(&mut s, &mut rng, false);

        let events = s.advance(&mut rng, &mut sink);
        assert!(matches!(events.as_slice(), [SessionEvent::Completed(_)]));
        assert_eq!(sink.0, vec![("Bo".to_string(), 0)]);
        assert_eq!(s.win_rate(), 0);
    }

    #[test]
    fn advance_before_resolution_is_ignored() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut sink = Recorder::default();
        let mut s = session(3);
        s.start_session(name("Cy"));
        assert!(s.advance(&mut rng, &mut sink).is_empty());

        s.tick(Duration::from_millis(2_000), &mut rng);
        let before = s.clone();
        assert!(s.advance(&mut rng, &mut sink).is_empty());
        assert_eq!(s, before);
        assert!(sink.0.is_empty());
    }

    #[test]
    fn guesses_outside_play_are_dropped() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut s = session(3);
        assert_eq!(s.guess(ContainerId::ALL[0]), None);

        s.start_session(name("Di"));
        assert_eq!(s.guess(ContainerId::ALL[0]), None);
        assert_eq!(s.stats().rounds_played, 0);

        s.tick(Duration::from_millis(900), &mut rng);
        assert_eq!(s.guess(ContainerId::ALL[0]), None);
        assert_eq!(s.stats().rounds_played, 0);
    }

    #[test]
    fn abort_discards_everything_and_never_submits() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut sink = Recorder::default();
        let mut s = session(1);
        s.start_session(name("Ed"));
        s.tick(Duration::from_millis(500), &mut rng);
        play_round(&mut s, &mut rng, true);

        assert_eq!(s.abort_to_menu(), vec![SessionEvent::ReturnedToMenu]);
        assert_eq!(s.phase(), SessionPhase::Menu);
        assert_eq!(*s.stats(), SessionStats::default());
        assert_eq!(s.round().phase(), RoundPhase::Idle);
        assert_eq!(s.next_deadline(), None);

        assert!(s.advance(&mut rng, &mut sink).is_empty());
        assert!(s.tick(Duration::from_secs(60), &mut rng).is_empty());
        assert!(sink.0.is_empty());
    }

    #[test]
    fn restarting_mid_countdown_reschedules() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut s = session(2);
        s.start_session(name("Fay"));
        s.tick(Duration::from_millis(400), &mut rng);
        s.start_session(name("Fay"));
        assert!(s.tick(Duration::from_millis(400), &mut rng).is_empty());
        assert_eq!(s.phase(), SessionPhase::Starting);
    }
}
