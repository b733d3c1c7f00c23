//! The attackable-entity contract.
//!
//! Every entity that can be shot at — parasites, queens, hives, and (for
//! friendly-fire rejection) player units — implements [`CombatTarget`].
//! Behavior dispatch and validation go through the [`TargetKind`]
//! discriminant and the small capability queries (`is_vulnerable`,
//! `is_friendly`), never through downcasting to concrete types.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Stable unique identifier for combat entities.
///
/// Ids are strings, and their lexicographic order is load-bearing: it is
/// the deterministic tie-break for target selection.
pub type EntityId = String;

/// Discriminant for everything that can appear in a combat query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    /// Generic hostile roaming entity.
    Parasite,
    /// Energy-carrying parasite variant (higher kill priority).
    EnergyParasite,
    /// Territory-controlling hostile entity; vulnerable only while active.
    Queen,
    /// Structure owned by a queen; attackable once constructed.
    Hive,
    /// Player-owned unit. Never a valid target (friendly).
    PlayerUnit,
}

impl TargetKind {
    /// Whether this kind is one of the parasite variants.
    #[must_use]
    pub const fn is_parasite(self) -> bool {
        matches!(self, Self::Parasite | Self::EnergyParasite)
    }
}

/// Capability contract for attackable entities.
pub trait CombatTarget {
    /// Stable unique id.
    fn id(&self) -> &str;

    /// Kind discriminant for validation and priority scoring.
    fn kind(&self) -> TargetKind;

    /// Current world position.
    fn position(&self) -> Vec3;

    /// Current health.
    fn health(&self) -> f32;

    /// Maximum health.
    fn max_health(&self) -> f32;

    /// Whether damage is currently accepted at all.
    ///
    /// Queens in pre-active phases and hives under construction return
    /// false; their `take_damage` must also be a no-op, so invulnerability
    /// holds at the data layer even if a caller skips validation.
    fn is_vulnerable(&self) -> bool {
        true
    }

    /// Declared faction flag. Friendly entities are rejected as targets.
    fn is_friendly(&self) -> bool {
        matches!(self.kind(), TargetKind::PlayerUnit)
    }

    /// Apply damage. Returns true if this destroyed the target.
    fn take_damage(&mut self, amount: f32) -> bool;

    /// Hook invoked once after combat cleanup when the entity is destroyed.
    fn on_destroyed(&mut self) {}

    /// Active defenders around this target. Non-zero only for hives; feeds
    /// the territorial prioritization bonus.
    fn defender_count(&self) -> u32 {
        0
    }
}

/// Outcome of target validation.
///
/// Expected gameplay rejections are values, not errors; callers branch on
/// the variant (or `reason()` for UI feedback) and never unwind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TargetValidation {
    /// Target may be attacked. Distance and max range are returned for UI
    /// feedback.
    Valid {
        /// Current distance to the target.
        distance: f32,
        /// Maximum attack range.
        max_range: f32,
    },
    /// Target belongs to the player's own faction.
    Friendly,
    /// Dead, invulnerable, corrupt, or otherwise not a legal enemy target.
    InvalidType,
    /// The global energy pool cannot cover one shot.
    InsufficientEnergy {
        /// Energy required for a single shot.
        required: f32,
    },
    /// Target is further away than the attack range.
    OutOfRange {
        /// Current distance to the target.
        distance: f32,
        /// Maximum attack range.
        max_range: f32,
    },
}

impl TargetValidation {
    /// Whether the target passed validation.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    /// Stable reason code for rejected validations, `None` when valid.
    #[must_use]
    pub const fn reason(&self) -> Option<&'static str> {
        match self {
            Self::Valid { .. } => None,
            Self::Friendly => Some("friendly"),
            Self::InvalidType => Some("invalid_type"),
            Self::InsufficientEnergy { .. } => Some("insufficient_energy"),
            Self::OutOfRange { .. } => Some("out_of_range"),
        }
    }
}

/// Health bookkeeping shared by all destructible entities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    /// Current health points.
    pub current: f32,
    /// Maximum health points.
    pub max: f32,
}

impl Vitals {
    /// Create vitals at full health.
    #[must_use]
    pub const fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    /// Check whether health has been exhausted.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }

    /// Apply damage, clamping at zero. Returns the actual amount removed.
    pub fn apply_damage(&mut self, amount: f32) -> f32 {
        let actual = amount.min(self.current).max(0.0);
        self.current -= actual;
        actual
    }

    /// Heal, clamping at max. Returns the actual amount restored.
    pub fn heal(&mut self, amount: f32) -> f32 {
        let headroom = (self.max - self.current).max(0.0);
        let actual = amount.min(headroom).max(0.0);
        self.current += actual;
        actual
    }

    /// Remaining health as a fraction of max (0.0 when max is zero).
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            self.current / self.max
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_reason_codes() {
        assert_eq!(
            TargetValidation::Valid {
                distance: 1.0,
                max_range: 8.0
            }
            .reason(),
            None
        );
        assert_eq!(TargetValidation::Friendly.reason(), Some("friendly"));
        assert_eq!(TargetValidation::InvalidType.reason(), Some("invalid_type"));
        assert_eq!(
            TargetValidation::InsufficientEnergy { required: 5.0 }.reason(),
            Some("insufficient_energy")
        );
        assert_eq!(
            TargetValidation::OutOfRange {
                distance: 12.0,
                max_range: 8.0
            }
            .reason(),
            Some("out_of_range")
        );
    }

    #[test]
    fn test_vitals_damage_and_heal() {
        let mut vitals = Vitals::new(100.0);
        assert_eq!(vitals.apply_damage(30.0), 30.0);
        assert_eq!(vitals.current, 70.0);

        // Overkill is clamped.
        assert_eq!(vitals.apply_damage(500.0), 70.0);
        assert!(vitals.is_dead());

        // Healing is clamped at max.
        assert_eq!(vitals.heal(40.0), 40.0);
        assert_eq!(vitals.heal(1000.0), 60.0);
        assert_eq!(vitals.current, 100.0);
    }

    #[test]
    fn test_vitals_fraction() {
        let mut vitals = Vitals::new(80.0);
        vitals.apply_damage(20.0);
        assert!((vitals.fraction() - 0.75).abs() < 1e-6);
        assert_eq!(Vitals::new(0.0).fraction(), 0.0);
    }

    #[test]
    fn test_kind_queries() {
        assert!(TargetKind::Parasite.is_parasite());
        assert!(TargetKind::EnergyParasite.is_parasite());
        assert!(!TargetKind::Queen.is_parasite());
        assert!(!TargetKind::Hive.is_parasite());
    }
}
