//! Hive structure: timed construction, then a high-value static target.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::target::{CombatTarget, EntityId, TargetKind, Vitals};

/// Tuning for hive construction and durability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HiveConfig {
    /// Time from founding to constructed, in milliseconds.
    pub construction_duration_ms: f64,
    /// Maximum health once standing.
    pub max_health: f32,
}

impl Default for HiveConfig {
    fn default() -> Self {
        Self {
            construction_duration_ms: 15_000.0,
            max_health: 150.0,
        }
    }
}

/// Construction lifecycle of a hive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HiveState {
    /// Being built; not yet attackable.
    UnderConstruction,
    /// Standing. Attackable, and its queen is now exposed.
    Constructed,
}

/// Structure owned by a queen's territory.
#[derive(Debug, Clone)]
pub struct Hive {
    id: EntityId,
    position: Vec3,
    /// Health pool.
    pub vitals: Vitals,
    state: HiveState,
    construction_elapsed_ms: f64,
    construction_duration_ms: f64,
    active_defenders: u32,
    destroyed: bool,
}

impl Hive {
    /// Found a new hive; construction starts immediately.
    #[must_use]
    pub fn new(id: impl Into<EntityId>, position: Vec3, config: &HiveConfig) -> Self {
        Self {
            id: id.into(),
            position,
            vitals: Vitals::new(config.max_health),
            state: HiveState::UnderConstruction,
            construction_elapsed_ms: 0.0,
            construction_duration_ms: config.construction_duration_ms,
            active_defenders: 0,
            destroyed: false,
        }
    }

    /// Advance construction. Returns true on the tick construction
    /// finishes.
    pub fn update(&mut self, dt_secs: f32) -> bool {
        if self.destroyed || self.state == HiveState::Constructed {
            return false;
        }
        self.construction_elapsed_ms += f64::from(dt_secs) * 1000.0;
        if self.construction_elapsed_ms >= self.construction_duration_ms {
            self.state = HiveState::Constructed;
            return true;
        }
        false
    }

    /// Whether construction has finished.
    #[must_use]
    pub fn is_constructed(&self) -> bool {
        self.state == HiveState::Constructed
    }

    /// Construction progress in `[0, 1]`.
    #[must_use]
    pub fn construction_progress(&self) -> f32 {
        if self.state == HiveState::Constructed {
            return 1.0;
        }
        if self.construction_duration_ms <= 0.0 {
            return 1.0;
        }
        ((self.construction_elapsed_ms / self.construction_duration_ms) as f32).clamp(0.0, 1.0)
    }

    /// Whether the hive has been destroyed.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Update the count of parasites actively defending this hive.
    pub fn set_active_defenders(&mut self, count: u32) {
        self.active_defenders = count;
    }
}

impl CombatTarget for Hive {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TargetKind {
        TargetKind::Hive
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn health(&self) -> f32 {
        self.vitals.current
    }

    fn max_health(&self) -> f32 {
        self.vitals.max
    }

    fn is_vulnerable(&self) -> bool {
        self.is_constructed() && !self.destroyed
    }

    fn take_damage(&mut self, amount: f32) -> bool {
        // Enforced at the data layer, same as the queen: an unbuilt hive
        // rejects damage outright.
        if !self.is_vulnerable() {
            return false;
        }
        self.vitals.apply_damage(amount);
        if self.vitals.is_dead() {
            self.destroyed = true;
            true
        } else {
            false
        }
    }

    fn defender_count(&self) -> u32 {
        self.active_defenders
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hive(duration_ms: f64) -> Hive {
        Hive::new(
            "hive-1",
            Vec3::ZERO,
            &HiveConfig {
                construction_duration_ms: duration_ms,
                ..HiveConfig::default()
            },
        )
    }

    #[test]
    fn test_construction_progress() {
        let mut h = hive(10_000.0);
        assert!(!h.is_constructed());
        assert_eq!(h.construction_progress(), 0.0);

        assert!(!h.update(4.0));
        assert!((h.construction_progress() - 0.4).abs() < 1e-4);

        // Completion tick reports true exactly once.
        assert!(h.update(6.0));
        assert!(h.is_constructed());
        assert_eq!(h.construction_progress(), 1.0);
        assert!(!h.update(1.0));
    }

    #[test]
    fn test_unbuilt_hive_rejects_damage() {
        let mut h = hive(10_000.0);
        let health_before = h.health();
        assert!(!h.take_damage(1_000.0));
        assert_eq!(h.health(), health_before);
        assert!(!h.is_vulnerable());
    }

    #[test]
    fn test_constructed_hive_takes_damage() {
        let mut h = hive(1_000.0);
        h.update(2.0);
        assert!(h.is_vulnerable());
        assert!(!h.take_damage(50.0));
        assert!(h.take_damage(1_000.0));
        assert!(h.is_destroyed());
        assert!(!h.is_vulnerable());
    }

    #[test]
    fn test_defender_count() {
        let mut h = hive(0.0);
        assert_eq!(h.defender_count(), 0);
        h.set_active_defenders(5);
        assert_eq!(h.defender_count(), 5);
    }
}
