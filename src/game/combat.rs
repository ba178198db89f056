//! Combat rules - attack cooldowns, damage and target selection

use super::EntityId;

/// Combat system for attack timing and targeting
pub struct CombatSystem;

impl CombatSystem {
    /// An attacker may fire once `interval_ms` of game time has passed since
    /// its previous attack. The first attack is never delayed.
    pub fn can_attack(last_attack_time: Option<f32>, now: f32, interval_ms: f32) -> bool {
        match last_attack_time {
            None => true,
            Some(last) => now - last >= interval_ms,
        }
    }

    /// Subtract damage without clamping; death is decided by the sweep
    pub fn apply_damage(current_health: f32, damage: f32) -> f32 {
        current_health - damage
    }
}

/// Running nearest-candidate search.
///
/// Equidistant candidates resolve to the lowest entity id, independent of
/// the order they are offered in.
#[derive(Debug, Default)]
pub struct NearestTarget {
    best: Option<(f32, EntityId)>,
}

impl NearestTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offer(&mut self, id: EntityId, distance: f32) {
        let better = match self.best {
            None => true,
            Some((best_distance, best_id)) => {
                distance < best_distance || (distance == best_distance && id < best_id)
            }
        };
        if better {
            self.best = Some((distance, id));
        }
    }

    pub fn id(&self) -> Option<EntityId> {
        self.best.map(|(_, id)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_attack_is_immediate() {
        assert!(CombatSystem::can_attack(None, 0.0, 1000.0));
    }

    #[test]
    fn cooldown_gates_follow_up_attacks() {
        assert!(!CombatSystem::can_attack(Some(100.0), 900.0, 1000.0));
        assert!(CombatSystem::can_attack(Some(100.0), 1100.0, 1000.0));
    }

    #[test]
    fn damage_can_go_negative() {
        assert_eq!(CombatSystem::apply_damage(50.0, 80.0), -30.0);
    }

    #[test]
    fn nearest_prefers_distance_then_lowest_id() {
        let mut nearest = NearestTarget::new();
        nearest.offer(9, 3.0);
        nearest.offer(4, 3.0);
        nearest.offer(12, 3.0);
        assert_eq!(nearest.id(), Some(4));

        nearest.offer(20, 2.5);
        assert_eq!(nearest.id(), Some(20));
    }

    #[test]
    fn nearest_empty_has_no_target() {
        assert_eq!(NearestTarget::new().id(), None);
    }
}
