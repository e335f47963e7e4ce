//! Live play: wall-clock time, player commands and commentary replies
//! multiplexed onto one session.

use std::time::Duration;

use rand_chacha::ChaCha8Rng;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::commentary::{CommentaryContext, CommentaryFeed, CommentaryLine, Commentator};
use crate::ids::{ContainerId, Slot};
use crate::player::PlayerName;
use crate::session::{SessionController, SessionEvent};
use crate::settings::GameSettings;
use crate::sfx::{AudioSink, play_all};
use crate::snapshot::TableSnapshot;
use crate::store::{LeaderboardStore, Scoreboard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start(PlayerName),
    Guess(ContainerId),
    /// Guess whichever cup stands in the slot.
    Pick(Slot),
    Next,
    Menu,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    Table(TableSnapshot),
    Commentary(CommentaryLine),
}

enum Wake {
    Command(Option<Command>),
    Deadline,
    Commentary(CommentaryLine),
}

pub struct Driver<S, C, A> {
    session: SessionController,
    scores: Scoreboard<S>,
    feed: CommentaryFeed<C>,
    audio: A,
    rng: ChaCha8Rng,
}

impl<S, C, A> Driver<S, C, A>
where
    S: LeaderboardStore,
    C: Commentator,
    A: AudioSink,
{
    pub fn new(
        settings: &GameSettings,
        scores: Scoreboard<S>,
        commentator: C,
        audio: A,
        rng: ChaCha8Rng,
    ) -> Self {
        let settings = settings.clone().sanitized();
        Self {
            session: SessionController::new(settings.session, settings.timing),
            scores,
            feed: CommentaryFeed::new(commentator),
            audio,
            rng,
        }
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    pub fn scores(&self) -> &Scoreboard<S> {
        &self.scores
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    /// Run until `Quit`, until the command channel closes or until nobody
    /// listens for updates. Returns the driver so callers can inspect the
    /// final leaderboard.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        updates: mpsc::Sender<Update>,
    ) -> Self {
        let mut last = Instant::now();
        if updates.send(self.table()).await.is_err() {
            return self;
        }

        loop {
            let deadline = self.session.next_deadline();
            let wake = tokio::select! {
                command = commands.recv() => Wake::Command(command),
                _ = sleep_for(deadline) => Wake::Deadline,
                Some(line) = self.feed.recv() => Wake::Commentary(line),
            };

            let now = Instant::now();
            let mut events = self.session.tick(now - last, &mut self.rng);
            last = now;

            match wake {
                Wake::Command(None) | Wake::Command(Some(Command::Quit)) => {
                    self.feed.cancel_pending();
                    tracing::debug!("driver stopping");
                    break;
                }
                Wake::Command(Some(command)) => events.extend(self.apply(command)),
                Wake::Deadline => {}
                Wake::Commentary(line) => {
                    if updates.send(Update::Commentary(line)).await.is_err() {
                        break;
                    }
                    if events.is_empty() {
                        continue;
                    }
                }
            }

            self.react(&events);
            if updates.send(self.table()).await.is_err() {
                break;
            }
        }
        self
    }

    fn apply(&mut self, command: Command) -> Vec<SessionEvent> {
        match command {
            Command::Start(player) => {
                self.feed.cancel_pending();
                self.session.start_session(player)
            }
            Command::Guess(container) => self.guess(container),
            Command::Pick(slot) => {
                let container = self.session.round().positions().container_at(slot);
                self.guess(container)
            }
            Command::Next => self.session.advance(&mut self.rng, &mut self.scores),
            Command::Menu => {
                self.feed.cancel_pending();
                self.session.abort_to_menu()
            }
            Command::Quit => Vec::new(),
        }
    }

    fn guess(&mut self, container: ContainerId) -> Vec<SessionEvent> {
        match self.session.guess(container) {
            Some(outcome) => vec![SessionEvent::resolved(outcome)],
            None => Vec::new(),
        }
    }

    fn react(&mut self, events: &[SessionEvent]) {
        play_all(&mut self.audio, events);
        if let Some(context) = events.iter().rev().find_map(CommentaryContext::for_event) {
            let stats = self.session.stats();
            let streak = match context {
                CommentaryContext::SessionOver => stats.best_streak,
                _ => stats.current_streak,
            };
            self.feed.request(context, streak);
        }
    }

    fn table(&self) -> Update {
        Update::Table(TableSnapshot::capture(&self.session))
    }
}

async fn sleep_for(deadline: Option<Duration>) {
    match deadline {
        Some(delay) => tokio::time::sleep(delay).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::commentary::CannedCommentator;
    use crate::round::RoundPhase;
    use crate::session::SessionPhase;
    use crate::sfx::{CueLog, SoundCue};
    use crate::store::MemoryStore;

    type TestDriver = Driver<MemoryStore, CannedCommentator, CueLog>;

    fn driver(rounds: u32, store: MemoryStore) -> TestDriver {
        let mut settings = GameSettings::default();
        settings.session.rounds_per_session = rounds;
        Driver::new(
            &settings,
            Scoreboard::open(store),
            CannedCommentator,
            CueLog::default(),
            ChaCha8Rng::seed_from_u64(21),
        )
    }

    async fn next_table<F>(updates: &mut mpsc::Receiver<Update>, mut pred: F) -> TableSnapshot
    where
        F: FnMut(&TableSnapshot) -> bool,
    {
        loop {
            match updates.recv().await {
                Some(Update::Table(table)) if pred(&table) => return table,
                Some(_) => {}
                None => panic!("driver hung up"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn plays_a_timed_session_end_to_end() {
        let store = MemoryStore::new();
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (upd_tx, mut upd_rx) = mpsc::channel(256);
        let task = tokio::spawn(driver(1, store.clone()).run(cmd_rx, upd_tx));

        let menu = next_table(&mut upd_rx, |_| true).await;
        assert_eq!(menu.session_phase, SessionPhase::Menu);

        let started = Instant::now();
        cmd_tx
            .send(Command::Start(PlayerName::parse("Ann").unwrap()))
            .await
            .unwrap();

        let reveal = next_table(&mut upd_rx, |t| t.round_phase == RoundPhase::RevealStart).await;
        let token_slot = reveal.token_slot.expect("token shown during reveal");
        let winner = reveal.cup_in(token_slot).container;
        assert!(started.elapsed() >= Duration::from_millis(500));

        let guessing = next_table(&mut upd_rx, |t| t.accepting_guess).await;
        assert!(started.elapsed() >= Duration::from_millis(500 + 4_432));
        let slot = guessing
            .cups
            .iter()
            .find(|c| c.container == winner)
            .map(|c| c.slot)
            .unwrap();

        cmd_tx.send(Command::Pick(slot)).await.unwrap();
        let resolved = next_table(&mut upd_rx, |t| t.last_outcome.is_some()).await;
        assert!(resolved.last_outcome.unwrap().correct);
        assert_eq!(resolved.stats.current_streak, 1);

        cmd_tx.send(Command::Next).await.unwrap();
        let summary = next_table(&mut upd_rx, |t| t.session_phase == SessionPhase::Summary).await;
        assert_eq!(summary.summary.unwrap().stats.best_streak, 1);

        cmd_tx.send(Command::Quit).await.unwrap();
        let driver = task.await.unwrap();
        assert_eq!(driver.scores().entries()[0].name, "Ann");
        assert!(store.raw().unwrap().contains("\"score\":1"));

        let cues = &driver.audio().0;
        assert_eq!(cues.first(), Some(&SoundCue::Start));
        assert_eq!(cues.iter().filter(|&&c| c == SoundCue::Shuffle).count(), 12);
        assert!(cues.ends_with(&[SoundCue::Click, SoundCue::Win]));
    }

    #[tokio::test(start_paused = true)]
    async fn commentary_follows_the_round() {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (upd_tx, mut upd_rx) = mpsc::channel(256);
        let task = tokio::spawn(driver(3, MemoryStore::new()).run(cmd_rx, upd_tx));

        cmd_tx
            .send(Command::Start(PlayerName::parse("Bo").unwrap()))
            .await
            .unwrap();

        let line = loop {
            match upd_rx.recv().await {
                Some(Update::Commentary(line)) => break line,
                Some(Update::Table(_)) => {}
                None => panic!("driver hung up"),
            }
        };
        assert_eq!(line.context, CommentaryContext::RoundStart);
        assert!(!line.fallback);

        drop(cmd_tx);
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn menu_abandons_without_recording() {
        let store = MemoryStore::new();
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (upd_tx, mut upd_rx) = mpsc::channel(256);
        let task = tokio::spawn(driver(1, store.clone()).run(cmd_rx, upd_tx));

        cmd_tx
            .send(Command::Start(PlayerName::parse("Cy").unwrap()))
            .await
            .unwrap();
        next_table(&mut upd_rx, |t| t.round_phase == RoundPhase::Shuffling).await;

        cmd_tx.send(Command::Menu).await.unwrap();
        let menu = next_table(&mut upd_rx, |t| t.session_phase == SessionPhase::Menu).await;
        assert_eq!(menu.round_phase, RoundPhase::Idle);

        cmd_tx.send(Command::Quit).await.unwrap();
        let driver = task.await.unwrap();
        assert!(driver.scores().entries().is_empty());
        assert_eq!(store.raw(), None);
    }
}
