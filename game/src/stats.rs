use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub wins: u32,
    pub rounds_played: u32,
    pub current_streak: u32,
    pub best_streak: u32,
}

impl SessionStats {
    pub fn record(&mut self, correct: bool) {
        self.rounds_played += 1;
        if correct {
            self.wins += 1;
            self.current_streak += 1;
        } else {
            self.current_streak = 0;
        }
        self.best_streak = self.best_streak.max(self.current_streak);
    }

    /// Whole-percent win rate, 0 before the first round.
    pub fn win_rate(&self) -> u32 {
        if self.rounds_played == 0 {
            return 0;
        }
        (100.0 * self.wins as f64 / self.rounds_played as f64).round() as u32
    }

    pub fn losses(&self) -> u32 {
        self.rounds_played - self.wins
    }
}
