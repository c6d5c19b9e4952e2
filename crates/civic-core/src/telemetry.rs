//! Tracing setup for hosts embedding the wizard
use tracing::Level;

/// Install a global fmt subscriber at `level`.
///
/// Returns `false` when a subscriber was already installed.
pub fn init_tracing(level: Level) -> bool {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true)
        .try_init()
        .is_ok()
}

/// Parse a level name such as `"debug"`, defaulting to `INFO`
pub fn parse_level(name: &str) -> Level {
    name.trim().parse().unwrap_or(Level::INFO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), Level::DEBUG);
        assert_eq!(parse_level(" WARN "), Level::WARN);
        assert_eq!(parse_level("chatty"), Level::INFO);
    }

    #[test]
    fn test_second_init_is_refused() {
        init_tracing(Level::DEBUG);
        assert!(!init_tracing(Level::DEBUG));
    }
}
