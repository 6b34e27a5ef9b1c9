// Configuration loading and validation (config/tombala.toml).

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::Deserialize;
use tracing::info;

use crate::board::BOARD_SIZE;
use crate::error::ConfigError;

const CONFIG_FILE: &str = "tombala.toml";

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub game: GameConfig,
    pub server: ServerConfig,
}

/// Game rules for the session.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Numbers run from 1 to this value, for both the pool and the boards.
    pub max_number: u8,
    /// Pause between two draws.
    pub draw_interval_secs: u64,
    /// Players needed before a round can start.
    pub min_players: usize,
}

impl GameConfig {
    pub fn draw_interval(&self) -> Duration {
        Duration::from_secs(self.draw_interval_secs)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            max_number: 90,
            draw_interval_secs: 3,
            min_players: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".into(),
            port: 9001,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate a config file at an explicit path.
pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    validate(&config)?;
    Ok(config)
}

/// Load `config/tombala.toml` under `base_dir`, or the built-in defaults
/// when that file does not exist.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    if path.exists() {
        return load_config_file(&path);
    }
    Ok(Config::default())
}

/// Resolve the config from the working directory first, then the platform
/// config directory, then the defaults.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    let local = cwd.join("config").join(CONFIG_FILE);
    if local.exists() {
        info!("Loading config from {}", local.display());
        return load_config_file(&local);
    }

    if let Some(dirs) = ProjectDirs::from("", "", "tombala") {
        let user = dirs.config_dir().join(CONFIG_FILE);
        if user.exists() {
            info!("Loading config from {}", user.display());
            return load_config_file(&user);
        }
    }

    info!("No config file found, using defaults");
    Ok(Config::default())
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let game = &config.game;
    if usize::from(game.max_number) < BOARD_SIZE {
        return Err(ConfigError::ValidationError {
            field: "game.max_number".into(),
            message: format!(
                "must be at least {BOARD_SIZE} to fill a board, got {}",
                game.max_number
            ),
        });
    }

    if game.draw_interval_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "game.draw_interval_secs".into(),
            message: "must be greater than 0".into(),
        });
    }

    if game.min_players == 0 {
        return Err(ConfigError::ValidationError {
            field: "game.min_players".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.server.port == 0 {
        return Err(ConfigError::ValidationError {
            field: "server.port".into(),
            message: "must be greater than 0".into(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_config(name: &str, contents: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let config_dir = tmp.join("config");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join(CONFIG_FILE), contents).unwrap();
        tmp
    }

    #[test]
    fn defaults_match_reference_rules() {
        let config = Config::default();
        assert_eq!(config.game.max_number, 90);
        assert_eq!(config.game.draw_interval(), Duration::from_secs(3));
        assert_eq!(config.game.min_players, 2);
        assert_eq!(config.server.bind_addr(), "127.0.0.1:9001");
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let tmp = std::env::temp_dir().join("tombala_config_test_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.game.max_number, 90);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let tmp = write_config(
            "tombala_config_test_partial",
            "[game]\nmin_players = 4\n\n[server]\nport = 8080\n",
        );

        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.game.min_players, 4);
        assert_eq!(config.game.max_number, 90);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn range_smaller_than_a_board_is_rejected() {
        let tmp = write_config("tombala_config_test_range", "[game]\nmax_number = 10\n");

        match load_config_from(&tmp) {
            Err(ConfigError::ValidationError { field, .. }) => {
                assert_eq!(field, "game.max_number")
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn zero_interval_is_rejected() {
        let tmp = write_config(
            "tombala_config_test_interval",
            "[game]\ndraw_interval_secs = 0\n",
        );
        assert!(matches!(
            load_config_from(&tmp),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn malformed_toml_reports_parse_error() {
        let tmp = write_config("tombala_config_test_parse", "[game\nmax_number = 90\n");
        assert!(matches!(
            load_config_from(&tmp),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn explicit_missing_file_is_not_found() {
        let path = std::env::temp_dir().join("tombala_config_test_nowhere.toml");
        let _ = fs::remove_file(&path);
        assert!(matches!(
            load_config_file(&path),
            Err(ConfigError::FileNotFound { .. })
        ));
    }
}
