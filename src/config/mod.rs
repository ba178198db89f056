//! Configuration module - environment variable parsing and game tables

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use crate::game::units::{TowerStats, UnitCatalog};

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit logs as JSON instead of human-readable text
    pub log_json: bool,
    /// Allowed client origin for CORS (comma-separated, `*` for any)
    pub client_origin: String,

    /// Simulation and anti-cheat tuning
    pub game: Arc<GameConfig>,
    /// Queue and room housekeeping
    pub matchmaking: MatchmakingConfig,
}

/// Simulation constants shared by every session
#[derive(Clone, Debug)]
pub struct GameConfig {
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Match length in simulated milliseconds
    pub max_game_time_ms: f32,
    pub initial_elixir: f32,
    pub max_elixir: f32,
    /// Elixir gained per second
    pub elixir_regen_rate: f32,
    /// Game time after which regeneration doubles
    pub double_elixir_time_ms: f32,
    /// Depth of each team's deployment band along the x axis
    pub deployment_zone_depth: f32,
    pub map_width: f32,
    pub map_height: f32,

    /// Allowed skew between client command timestamps and server time
    pub timestamp_tolerance_ms: u64,
    /// Minimum separation between a new unit and any living unit
    pub overlap_radius: f32,
    /// Commands accepted per player per rate window
    pub command_rate_limit: usize,
    pub rate_window_ms: u64,
    /// Rate windows idle for longer than this are dropped by the sweep
    pub rate_idle_expiry_ms: u64,
    /// Maximum buffered commands per session between ticks
    pub inbox_capacity: usize,

    pub units: UnitCatalog,
    pub main_tower: TowerStats,
    pub side_tower: TowerStats,
}

/// Highest accepted tick rate; the tick period never drops below 1ms
pub const MAX_TICK_RATE: u32 = 1_000;

impl GameConfig {
    /// Fixed tick period derived from the tick rate
    pub fn tick_interval(&self) -> std::time::Duration {
        let micros = 1_000_000 / self.tick_rate.max(1) as u64;
        std::time::Duration::from_micros(micros.max(1_000))
    }

    /// Reject combinations the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 || self.tick_rate > MAX_TICK_RATE {
            return Err(ConfigError::Invalid("TICK_RATE"));
        }
        if self.initial_elixir > self.max_elixir {
            return Err(ConfigError::Invalid("INITIAL_ELIXIR"));
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_rate: 20,
            max_game_time_ms: 300_000.0,
            initial_elixir: 5.0,
            max_elixir: 10.0,
            elixir_regen_rate: 1.0,
            double_elixir_time_ms: 180_000.0,
            deployment_zone_depth: 3.0,
            map_width: 18.0,
            map_height: 32.0,
            timestamp_tolerance_ms: 5_000,
            overlap_radius: 0.5,
            command_rate_limit: 10,
            rate_window_ms: 1_000,
            rate_idle_expiry_ms: 5_000,
            inbox_capacity: 256,
            units: UnitCatalog::default(),
            main_tower: TowerStats::main(),
            side_tower: TowerStats::side(),
        }
    }
}

/// Matchmaking queue and room housekeeping settings
#[derive(Clone, Debug)]
pub struct MatchmakingConfig {
    /// Queue entries older than this are evicted instead of paired
    pub timeout_ms: u64,
    /// Period of the sweep that evicts, pairs and reaps rooms
    pub cleanup_interval_ms: u64,
    /// Pairing is deferred while this many rooms are live
    pub max_rooms: usize,
}

impl Default for MatchmakingConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            cleanup_interval_ms: 30_000,
            max_rooms: 100,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".to_string())
        };

        let defaults = GameConfig::default();
        let game = GameConfig {
            tick_rate: parse_or("TICK_RATE", defaults.tick_rate)?,
            max_game_time_ms: parse_or("MAX_GAME_TIME_MS", defaults.max_game_time_ms)?,
            initial_elixir: parse_or("INITIAL_ELIXIR", defaults.initial_elixir)?,
            max_elixir: parse_or("MAX_ELIXIR", defaults.max_elixir)?,
            elixir_regen_rate: parse_or("ELIXIR_REGEN_RATE", defaults.elixir_regen_rate)?,
            double_elixir_time_ms: parse_or(
                "DOUBLE_ELIXIR_TIME_MS",
                defaults.double_elixir_time_ms,
            )?,
            deployment_zone_depth: parse_or(
                "DEPLOYMENT_ZONE_DEPTH",
                defaults.deployment_zone_depth,
            )?,
            map_width: parse_or("MAP_WIDTH", defaults.map_width)?,
            map_height: parse_or("MAP_HEIGHT", defaults.map_height)?,
            command_rate_limit: parse_or("COMMAND_RATE_LIMIT", defaults.command_rate_limit)?,
            ..defaults
        };

        game.validate()?;

        let mm_defaults = MatchmakingConfig::default();
        let matchmaking = MatchmakingConfig {
            timeout_ms: parse_or("MATCHMAKING_TIMEOUT_MS", mm_defaults.timeout_ms)?,
            cleanup_interval_ms: parse_or(
                "ROOM_CLEANUP_INTERVAL_MS",
                mm_defaults.cleanup_interval_ms,
            )?,
            max_rooms: parse_or("MAX_ROOMS", mm_defaults.max_rooms)?,
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_json: env::var("LOG_FORMAT")
                .map(|f| f.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
            client_origin: env::var("CLIENT_ORIGIN").unwrap_or_else(|_| "*".to_string()),

            game: Arc::new(game),
            matchmaking,
        })
    }
}

/// Read an optional variable, falling back to `default` when unset
fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}
