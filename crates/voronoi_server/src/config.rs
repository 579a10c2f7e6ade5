//! Server configuration loaded from TOML.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};
use voronoi_game::{DEFAULT_GRID_SIZE, DEFAULT_MIN_DIST, DEFAULT_TIME_BUDGET_SECS, GameConfig};

/// Path checked when no `--config` is given.
pub const DEFAULT_CONFIG_PATH: &str = "voronoi.toml";

/// Board rules and side channels not given on the command line.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Side length of the square grid.
    #[serde(default = "default_grid_size")]
    grid_size: usize,

    /// Minimum Euclidean distance between any two stones.
    #[serde(default = "default_min_dist")]
    min_dist: f64,

    /// Thinking time per player, in seconds.
    #[serde(default = "default_time_budget_secs")]
    time_budget_secs: f64,

    /// Where the visualization feed connects when enabled.
    #[serde(default = "default_display_addr")]
    display_addr: String,
}

fn default_grid_size() -> usize {
    DEFAULT_GRID_SIZE
}

fn default_min_dist() -> f64 {
    DEFAULT_MIN_DIST
}

fn default_time_budget_secs() -> f64 {
    DEFAULT_TIME_BUDGET_SECS
}

fn default_display_addr() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            grid_size: default_grid_size(),
            min_dist: default_min_dist(),
            time_budget_secs: default_time_budget_secs(),
            display_addr: default_display_addr(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {e}")))?;

        info!(
            grid_size = config.grid_size,
            min_dist = config.min_dist,
            "Config loaded successfully"
        );
        Ok(config)
    }

    /// Resolves the `--config` flag.
    ///
    /// An explicit path must exist and parse. Without one, the default path
    /// is used when present and built-in defaults otherwise.
    #[instrument]
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::from_file(DEFAULT_CONFIG_PATH),
            None => {
                debug!("No config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Game parameters for `num_players` players placing `num_stones` each.
    pub fn game_config(&self, num_players: usize, num_stones: usize) -> GameConfig {
        GameConfig::new(num_players, num_stones)
            .with_grid_size(self.grid_size)
            .with_min_dist(self.min_dist)
            .with_time_budget_secs(self.time_budget_secs)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
