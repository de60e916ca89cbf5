//! Tracing subscriber setup for the binary.

use tracing::Level;

/// Map a `-v` count to a maximum log level. Warnings are always shown.
pub fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the global fmt subscriber writing to stderr.
///
/// Calling this twice is harmless; the second subscriber is ignored.
pub fn init(verbosity: u8) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level_for(verbosity))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
