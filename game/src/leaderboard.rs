//! Hall of fame: best session streak per player.

use serde::{Deserialize, Serialize};

pub const LEADERBOARD_CAPACITY: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    /// Best streak reached in one session.
    pub score: u32,
    /// Epoch milliseconds of the submission that set `score`.
    pub date: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubmitOutcome {
    /// Zero score or blank name; nothing is recorded.
    Ignored,
    /// The player already holds an equal or better score.
    NotImproved { best: u32 },
    /// Inserted or raised. `rank` is the 0-based position, `None` when the
    /// score did not make the cut.
    Recorded { rank: Option<usize> },
}

impl SubmitOutcome {
    /// The stored list changed and should be written back.
    pub fn changed(self) -> bool {
        matches!(self, SubmitOutcome::Recorded { rank: Some(_) })
    }
}

/// Ranked entries, one per name, sorted by score (highest first) and capped at
/// [`LEADERBOARD_CAPACITY`]. Equal scores keep their submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from stored data, restoring the invariants the data may have
    /// lost (duplicates, ordering, blank rows, overflow).
    pub fn from_entries(entries: impl IntoIterator<Item = LeaderboardEntry>) -> Self {
        let mut board = Self::new();
        for entry in entries {
            board.submit(&entry.name, entry.score, entry.date);
        }
        board
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&LeaderboardEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn rank_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    pub fn submit(&mut self, name: &str, score: u32, now_ms: i64) -> SubmitOutcome {
        if score == 0 || name.trim().is_empty() {
            return SubmitOutcome::Ignored;
        }

        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(existing) if existing.score >= score => {
                return SubmitOutcome::NotImproved {
                    best: existing.score,
                };
            }
            Some(existing) => {
                existing.score = score;
                existing.date = now_ms;
            }
            None => self.entries.push(LeaderboardEntry {
                name: name.to_string(),
                score,
                date: now_ms,
            }),
        }

        // Stable sort: ties stay in the order they were first recorded.
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(LEADERBOARD_CAPACITY);

        SubmitOutcome::Recorded {
            rank: self.rank_of(name),
        }
    }
}

/// Where a finished session reports its best streak.
pub trait ScoreSink {
    fn submit_score(&mut self, player: &str, score: u32) -> SubmitOutcome;
}

/// An in-memory board paired with the time to stamp submissions with.
#[derive(Debug)]
pub struct StampedBoard<'a> {
    pub board: &'a mut Leaderboard,
    pub now_ms: i64,
}

impl ScoreSink for StampedBoard<'_> {
    fn submit_score(&mut self, player: &str, score: u32) -> SubmitOutcome {
        self.board.submit(player, score, self.now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn personal_best_never_downgrades() {
        let mut board = Leaderboard::new();
        assert_eq!(
            board.submit("Ann", 5, 1),
            SubmitOutcome::Recorded { rank: Some(0) }
        );
        assert_eq!(board.submit("Ann", 3, 2), SubmitOutcome::NotImproved { best: 5 });
        assert_eq!(board.get("Ann").unwrap().score, 5);

        // Ties do not overwrite and keep the original date.
        assert_eq!(board.submit("Ann", 5, 3), SubmitOutcome::NotImproved { best: 5 });
        assert_eq!(board.get("Ann").unwrap().date, 1);

        assert!(board.submit("Ann", 7, 4).changed());
        let ann = board.get("Ann").unwrap();
        assert_eq!((ann.score, ann.date), (7, 4));
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn zero_scores_and_blank_names_are_ignored() {
        let mut board = Leaderboard::new();
        assert_eq!(board.submit("Ann", 0, 1), SubmitOutcome::Ignored);
        assert_eq!(board.submit("  ", 4, 1), SubmitOutcome::Ignored);
        assert!(board.is_empty());
    }

    #[test]
    fn board_is_sorted_and_capped() {
        let mut board = Leaderboard::new();
        for i in 0..51u32 {
            board.submit(&format!("p{i}"), i + 1, i as i64);
        }
        assert_eq!(board.len(), LEADERBOARD_CAPACITY);
        assert!(board.get("p0").is_none(), "lowest score is dropped");
        assert_eq!(board.entries()[0].score, 51);
        assert!(
            board
                .entries()
                .windows(2)
                .all(|w| w[0].score >= w[1].score)
        );

        // Too low to make the cut once the board is full.
        assert_eq!(
            board.submit("late", 1, 99),
            SubmitOutcome::Recorded { rank: None }
        );
        assert!(board.get("late").is_none());
    }

    #[test]
    fn ties_keep_first_recorded_ahead() {
        let mut board = Leaderboard::new();
        board.submit("first", 4, 1);
        board.submit("second", 4, 2);
        board.submit("top", 9, 3);
        let names: Vec<_> = board.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["top", "first", "second"]);
    }

    #[test]
    fn from_entries_restores_invariants() {
        let raw = vec![
            LeaderboardEntry { name: "Bo".into(), score: 2, date: 1 },
            LeaderboardEntry { name: "Ann".into(), score: 3, date: 2 },
            LeaderboardEntry { name: "Bo".into(), score: 6, date: 3 },
            LeaderboardEntry { name: "".into(), score: 9, date: 4 },
            LeaderboardEntry { name: "Cy".into(), score: 0, date: 5 },
        ];
        let board = Leaderboard::from_entries(raw);
        let view: Vec<_> = board
            .entries()
            .iter()
            .map(|e| (e.name.as_str(), e.score))
            .collect();
        assert_eq!(view, vec![("Bo", 6), ("Ann", 3)]);
    }

    #[test]
    fn serializes_as_plain_array() {
        let mut board = Leaderboard::new();
        board.submit("Ann", 2, 1_700_000_000_000);
        assert_eq!(
            serde_json::to_string(&board).unwrap(),
            r#"[{"name":"Ann","score":2,"date":1700000000000}]"#
        );
    }
}
