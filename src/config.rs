//! Application-level configuration loading: room capacity, game binding and table timing.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::{dto::validation::validate_room_code, state::table::TableTiming};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BLOOM_BELL_BACK_CONFIG_PATH";

const DEFAULT_MAX_PLAYERS: usize = 4;
const DEFAULT_GAME_ID: &str = "bloom-bell";
const DEFAULT_RACE_WINDOW_MS: u64 = 500;
const DEFAULT_RACE_SETTLE_MS: u64 = 800;
const DEFAULT_TURN_TIME_LIMIT_SECS: u32 = 30;
const DEFAULT_COUNTDOWN_FROM_SECS: u32 = 10;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    max_players: usize,
    game_id: String,
    room_code: Option<String>,
    race_window: Duration,
    race_settle: Duration,
    turn_time_limit_secs: u32,
    countdown_from_secs: u32,
    trust_client_clock: bool,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        max_players = app_config.max_players,
                        game_id = %app_config.game_id,
                        "loaded room settings from config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Maximum number of seated players.
    pub fn max_players(&self) -> usize {
        self.max_players
    }

    /// Game id that runs the built-in card table.
    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    /// Fixed room code, when configured.
    pub fn room_code(&self) -> Option<&str> {
        self.room_code.as_deref()
    }

    /// Timing of the card table.
    pub fn table_timing(&self) -> TableTiming {
        TableTiming {
            race_window: self.race_window,
            race_settle: self.race_settle,
            turn_time_limit_secs: self.turn_time_limit_secs,
            countdown_from_secs: self.countdown_from_secs,
            trust_client_clock: self.trust_client_clock,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    max_players: Option<usize>,
    game_id: Option<String>,
    room_code: Option<String>,
    race_window_ms: Option<u64>,
    race_settle_ms: Option<u64>,
    turn_time_limit_secs: Option<u32>,
    countdown_from_secs: Option<u32>,
    trust_client_clock: Option<bool>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let room_code = value.room_code.filter(|code| match validate_room_code(code) {
            Ok(()) => true,
            Err(err) => {
                warn!(code = %code, error = %err, "ignoring invalid room code from config");
                false
            }
        });

        Self {
            max_players: value.max_players.unwrap_or(DEFAULT_MAX_PLAYERS).max(1),
            game_id: value
                .game_id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| DEFAULT_GAME_ID.into()),
            room_code,
            race_window: Duration::from_millis(
                value.race_window_ms.unwrap_or(DEFAULT_RACE_WINDOW_MS),
            ),
            race_settle: Duration::from_millis(
                value.race_settle_ms.unwrap_or(DEFAULT_RACE_SETTLE_MS),
            ),
            turn_time_limit_secs: value
                .turn_time_limit_secs
                .unwrap_or(DEFAULT_TURN_TIME_LIMIT_SECS)
                .max(1),
            countdown_from_secs: value
                .countdown_from_secs
                .unwrap_or(DEFAULT_COUNTDOWN_FROM_SECS),
            trust_client_clock: value.trust_client_clock.unwrap_or(true),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
