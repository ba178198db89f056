//! Map geometry and unit movement

use crate::config::GameConfig;
use crate::ws::protocol::{TeamSide, Vec2};

impl Vec2 {
    /// Euclidean distance
    pub fn distance(&self, other: &Vec2) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Physics system for movement and map geometry checks
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Step `from` straight toward `to` by `speed * delta_ms / 1000`,
    /// stopping on the target instead of overshooting.
    pub fn move_towards(from: Vec2, to: Vec2, speed: f32, delta_ms: f32) -> Vec2 {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let distance = (dx * dx + dy * dy).sqrt();

        if distance <= 0.0 {
            return from;
        }

        let step = speed * delta_ms / 1000.0;
        let ratio = (step / distance).min(1.0);

        Vec2::new(from.x + dx * ratio, from.y + dy * ratio)
    }

    /// Inside the map rectangle, edges included
    pub fn in_bounds(position: Vec2, config: &GameConfig) -> bool {
        position.x >= 0.0
            && position.x <= config.map_width
            && position.y >= 0.0
            && position.y <= config.map_height
    }

    /// Inside the strip on `team`'s own side where it may place units
    pub fn in_deployment_band(position: Vec2, team: TeamSide, config: &GameConfig) -> bool {
        let (start, end) = match team {
            TeamSide::Left => (0.0, config.deployment_zone_depth),
            TeamSide::Right => (
                config.map_width - config.deployment_zone_depth,
                config.map_width,
            ),
        };
        position.x >= start && position.x <= end
    }

    /// Within one map unit of the opposing team's baseline
    pub fn on_enemy_baseline(position: Vec2, team: TeamSide, config: &GameConfig) -> bool {
        let enemy_last_row = match team {
            TeamSide::Left => config.map_width - 1.0,
            TeamSide::Right => 0.0,
        };
        (position.x - enemy_last_row).abs() < 1.0
    }
}
