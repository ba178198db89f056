//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::matchmaking::MatchmakingService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub matchmaking: Arc<MatchmakingService>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        // One service owns the queue, every room and the command rate table
        let matchmaking = Arc::new(MatchmakingService::new(
            config.game.clone(),
            config.matchmaking.clone(),
        ));

        Self {
            config,
            matchmaking,
        }
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        use crate::config::{GameConfig, MatchmakingConfig};

        Self::new(Config {
            server_addr: std::net::SocketAddr::from(([127, 0, 0, 1], 0)),
            log_level: "info".to_string(),
            log_json: false,
            client_origin: "*".to_string(),
            game: Arc::new(GameConfig::default()),
            matchmaking: MatchmakingConfig::default(),
        })
    }
}
