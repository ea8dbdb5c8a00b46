//! Deployment settings baked into the bundle.
use kingdom_game::GameConfig;

const EMBEDDED_CONFIG: &str = include_str!("../static/config.json");

/// Parse the embedded config, falling back to defaults if it is unusable.
#[must_use]
pub fn load() -> GameConfig {
    parse_or_default(EMBEDDED_CONFIG)
}

fn parse_or_default(json: &str) -> GameConfig {
    GameConfig::from_json(json).unwrap_or_else(|err| {
        log::error!("embedded config rejected, using defaults: {err}");
        GameConfig::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_config_is_valid() {
        let config = GameConfig::from_json(EMBEDDED_CONFIG).unwrap();
        assert_eq!(config.storage_version, "v6_preload");
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.poll_timeout_ms, 15_000);
    }

    #[test]
    fn broken_config_falls_back_to_defaults() {
        assert_eq!(parse_or_default("{"), GameConfig::default());
        assert_eq!(
            parse_or_default(r#"{"historyLimit": 0}"#),
            GameConfig::default()
        );
    }
}
