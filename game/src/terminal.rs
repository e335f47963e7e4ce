//! Plain-text table for the `play` command.

use std::fmt::Write as _;

use crate::driver::Command;
use crate::ids::Slot;
use crate::leaderboard::{LeaderboardEntry, SubmitOutcome};
use crate::player::PlayerName;
use crate::round::RoundPhase;
use crate::session::SessionPhase;
use crate::snapshot::{CupView, TableSnapshot};

pub const HELP: &str = "commands: 1/2/3 pick a cup, n next round, s start again, m menu, q quit";

/// Map one line of input to a command. `player` is reused for `s`.
pub fn parse_command(line: &str, player: &PlayerName) -> Option<Command> {
    match line.trim().to_ascii_lowercase().as_str() {
        "1" | "2" | "3" => {
            let slot = line.trim().parse::<u8>().ok()?.checked_sub(1)?;
            Slot::try_from(slot).ok().map(Command::Pick)
        }
        "n" | "next" => Some(Command::Next),
        "s" | "start" => Some(Command::Start(player.clone())),
        "m" | "menu" => Some(Command::Menu),
        "q" | "quit" | "exit" => Some(Command::Quit),
        _ => None,
    }
}

/// The parts of a snapshot worth redrawing for; swaps alone are not.
pub fn redraw_key(table: &TableSnapshot) -> (SessionPhase, RoundPhase, u32, u32) {
    (
        table.session_phase,
        table.round_phase,
        table.round_number,
        table.stats.rounds_played,
    )
}

fn cup_glyph(table: &TableSnapshot, cup: &CupView) -> &'static str {
    let token = table.token_slot == Some(cup.slot);
    match (cup.raised, token, cup.highlighted) {
        (_, true, true) => "*(o)*",
        (true, true, false) => " (o) ",
        (true, false, _) => " ( ) ",
        (false, _, _) => " [#] ",
    }
}

pub fn render_table(table: &TableSnapshot) -> String {
    let mut out = String::new();
    match table.session_phase {
        SessionPhase::Menu => {
            out.push_str("Main menu. Type s to start a session or q to quit.\n");
            return out;
        }
        SessionPhase::Starting => {
            let _ = writeln!(
                out,
                "Get ready, {}! {} rounds.",
                table.player.as_deref().unwrap_or("player"),
                table.rounds_per_session
            );
            return out;
        }
        SessionPhase::Summary => {
            render_summary(table, &mut out);
            return out;
        }
        SessionPhase::Playing => {}
    }

    let _ = writeln!(
        out,
        "Round {}/{} | tries {} | win {}% | streak {} (best {})",
        table.round_number,
        table.rounds_per_session,
        table.stats.rounds_played,
        table.win_rate,
        table.stats.current_streak,
        table.stats.best_streak,
    );
    let labels: Vec<String> = table
        .cups
        .iter()
        .map(|c| format!("  {}  ", c.slot.get() + 1))
        .collect();
    let glyphs: Vec<&str> = table.cups.iter().map(|c| cup_glyph(table, c)).collect();
    let _ = writeln!(out, "  {}", labels.join("   "));
    let _ = writeln!(out, "  {}", glyphs.join("   "));

    let status = match table.round_phase {
        RoundPhase::Idle => String::new(),
        RoundPhase::RevealStart => "Watch the ball...".to_string(),
        RoundPhase::Covering => "Covering...".to_string(),
        RoundPhase::Shuffling => "Shuffling...".to_string(),
        RoundPhase::AwaitingGuess => "Where is the ball? Pick 1, 2 or 3.".to_string(),
        RoundPhase::Resolved => match (table.last_outcome, table.token_slot) {
            (Some(o), _) if o.correct => "You found it! Press n to continue.".to_string(),
            (Some(_), Some(slot)) => {
                format!("Missed! It was under cup {}. Press n to continue.", slot.get() + 1)
            }
            _ => "Press n to continue.".to_string(),
        },
    };
    if !status.is_empty() {
        let _ = writeln!(out, "{status}");
    }
    out
}

fn render_summary(table: &TableSnapshot, out: &mut String) {
    let Some(summary) = &table.summary else {
        out.push_str("Session over.\n");
        return;
    };
    let _ = writeln!(out, "Session over, {}!", summary.player);
    let _ = writeln!(
        out,
        "  wins {}/{} | win rate {}% | best streak {}",
        summary.stats.wins, summary.stats.rounds_played, summary.win_rate, summary.stats.best_streak
    );
    let placement = match summary.submission {
        SubmitOutcome::Recorded { rank: Some(rank) } => {
            format!("  New personal best, #{} on the leaderboard.", rank + 1)
        }
        SubmitOutcome::NotImproved { best } => format!("  Your best streak stays at {best}."),
        SubmitOutcome::Recorded { rank: None } => "  Not enough for the leaderboard this time.".to_string(),
        SubmitOutcome::Ignored => "  No streak to record.".to_string(),
    };
    let _ = writeln!(out, "{placement}");
    out.push_str("Type s to play again, m for the menu or q to quit.\n");
}

pub fn render_leaderboard(entries: &[LeaderboardEntry], limit: usize) -> String {
    if entries.is_empty() {
        return "No scores yet.\n".to_string();
    }
    let mut out = String::from("Hall of fame\n");
    for (rank, entry) in entries.iter().take(limit).enumerate() {
        let date = chrono::DateTime::from_timestamp_millis(entry.date)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:>3}. {:<12} {:>4}  {}",
            rank + 1,
            entry.name,
            entry.score,
            date
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::session::SessionController;
    use crate::settings::SessionSettings;
    use crate::timing::RoundTiming;

    fn ann() -> PlayerName {
        PlayerName::parse("Ann").unwrap()
    }

    #[test]
    fn commands_parse_from_slot_numbers_and_letters() {
        assert_eq!(
            parse_command(" 2 ", &ann()),
            Some(Command::Pick(Slot::try_from(1u8).unwrap()))
        );
        assert_eq!(parse_command("N", &ann()), Some(Command::Next));
        assert_eq!(parse_command("s", &ann()), Some(Command::Start(ann())));
        assert_eq!(parse_command("q", &ann()), Some(Command::Quit));
        assert_eq!(parse_command("4", &ann()), None);
        assert_eq!(parse_command("0", &ann()), None);
    }

    #[test]
    fn reveal_draws_the_ball_under_one_cup() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut session = SessionController::new(SessionSettings::default(), RoundTiming::default());
        session.start_session(ann());
        session.tick(Duration::from_millis(500), &mut rng);

        let text = render_table(&TableSnapshot::capture(&session));
        assert!(text.contains("Round 1/10"));
        assert_eq!(text.matches("(o)").count(), 1);
        assert_eq!(text.matches("[#]").count(), 2);
        assert!(text.contains("Watch the ball"));
    }

    #[test]
    fn leaderboard_lists_ranked_names() {
        let entries = vec![
            LeaderboardEntry { name: "Ann".into(), score: 7, date: 0 },
            LeaderboardEntry { name: "Bo".into(), score: 3, date: 0 },
        ];
        let text = render_leaderboard(&entries, 1);
        assert!(text.contains("1. Ann"));
        assert!(!text.contains("Bo"));
        assert!(text.contains("1970-01-01"));
        assert_eq!(render_leaderboard(&[], 5), "No scores yet.\n");
    }
}
