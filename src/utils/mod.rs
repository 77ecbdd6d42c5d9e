//! Utilities: logging setup.
//!
//! Logs go to stderr so stdout carries only command output.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Map `-q` / `-v` counts to a level filter.
pub fn derive_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install the global subscriber. `RUST_LOG`, when set, wins over `level`.
pub fn init_logging(level: LevelFilter) {
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_wins_over_verbose() {
        assert_eq!(derive_level(3, true), LevelFilter::ERROR);
    }

    #[test]
    fn verbosity_steps() {
        assert_eq!(derive_level(0, false), LevelFilter::WARN);
        assert_eq!(derive_level(1, false), LevelFilter::INFO);
        assert_eq!(derive_level(2, false), LevelFilter::DEBUG);
        assert_eq!(derive_level(9, false), LevelFilter::TRACE);
    }
}
