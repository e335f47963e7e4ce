use tracing::Level;

pub const LOG_LEVEL_ENV: &str = "CUP_SHUFFLE_LOG";

pub fn parse_level(raw: &str) -> Option<Level> {
    raw.trim().parse().ok()
}

/// Install the fmt subscriber on stderr so logs never interleave with the
/// table drawn on stdout. A second call is a no-op.
pub fn init(level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn init_from_env() {
    let level = std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|raw| parse_level(&raw))
        .unwrap_or(Level::INFO);
    init(level);
}
