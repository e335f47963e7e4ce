use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use cup_shuffle::commentary::AnyCommentator;
use cup_shuffle::driver::{Command, Driver, Update};
use cup_shuffle::player::PlayerName;
use cup_shuffle::settings::{GameSettings, SettingsStore};
use cup_shuffle::sfx::TraceAudio;
use cup_shuffle::store::{JsonFileStore, Scoreboard};
use cup_shuffle::{telemetry, terminal};

#[derive(Debug, Parser)]
#[command(name = "cup-shuffle", version, about = "Three cups, one ball, keep your eyes on it")]
struct Cli {
    /// trace, debug, info, warn or error. Logs go to stderr.
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Play a session in the terminal.
    Play {
        #[arg(long)]
        name: String,
        /// Rounds in the session (1 to 100).
        #[arg(long)]
        rounds: Option<u32>,
        /// Fix the rng seed to replay a session.
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        commentary_endpoint: Option<String>,
        #[arg(long)]
        mute: bool,
    },
    /// Print the hall of fame.
    Leaderboard {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Print the effective settings and where they are read from.
    Settings,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.log_level);

    let settings_store = SettingsStore::from_env();
    match cli.command {
        Cmd::Play {
            name,
            rounds,
            seed,
            commentary_endpoint,
            mute,
        } => {
            let player = PlayerName::parse(&name).context("invalid --name")?;
            let mut settings = settings_store.load();
            if let Some(rounds) = rounds {
                settings.session.rounds_per_session = rounds;
            }
            if commentary_endpoint.is_some() {
                settings.commentary.endpoint = commentary_endpoint;
            }
            settings.audio.mute_all |= mute;
            play(player, settings.sanitized(), seed).await
        }
        Cmd::Leaderboard { limit } => {
            let scores = Scoreboard::open(JsonFileStore::from_env());
            print!("{}", terminal::render_leaderboard(scores.entries(), limit));
            Ok(())
        }
        Cmd::Settings => {
            let settings = settings_store.load();
            println!("# {}", settings_store.path().display());
            let text = serde_json::to_string_pretty(&settings).context("encode settings")?;
            println!("{text}");
            Ok(())
        }
    }
}

async fn play(player: PlayerName, settings: GameSettings, seed: Option<u64>) -> anyhow::Result<()> {
    let seed = seed.unwrap_or_else(rand::random);
    tracing::info!(seed, "starting terminal session");

    let store = JsonFileStore::from_env();
    tracing::debug!(path = %store.path().display(), "leaderboard store");
    let driver = Driver::new(
        &settings,
        Scoreboard::open(store),
        AnyCommentator::from_settings(&settings.commentary),
        TraceAudio::new(settings.audio),
        ChaCha8Rng::seed_from_u64(seed),
    );

    let (cmd_tx, cmd_rx) = mpsc::channel(16);
    let (upd_tx, mut upd_rx) = mpsc::channel(64);
    let task = tokio::spawn(driver.run(cmd_rx, upd_tx));

    println!("{}", terminal::HELP);
    cmd_tx
        .send(Command::Start(player.clone()))
        .await
        .context("driver stopped before the session started")?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut drawn = None;
    loop {
        tokio::select! {
            update = upd_rx.recv() => match update {
                Some(Update::Table(table)) => {
                    let key = terminal::redraw_key(&table);
                    if drawn != Some(key) {
                        drawn = Some(key);
                        print!("{}", terminal::render_table(&table));
                    }
                }
                Some(Update::Commentary(line)) => println!("Ace: {}", line.text),
                None => break,
            },
            line = lines.next_line() => {
                let Some(line) = line.context("read stdin")? else {
                    let _ = cmd_tx.send(Command::Quit).await;
                    break;
                };
                match terminal::parse_command(&line, &player) {
                    Some(command) => {
                        let quit = command == Command::Quit;
                        if cmd_tx.send(command).await.is_err() || quit {
                            break;
                        }
                    }
                    None => println!("{}", terminal::HELP),
                }
            }
        }
    }

    drop(cmd_tx);
    drop(upd_rx);
    let driver = task.await.context("game driver task failed")?;
    if let Some(rank) = driver.scores().board().rank_of(player.as_str()) {
        println!("{player} holds #{} on the leaderboard.", rank + 1);
    }
    Ok(())
}
