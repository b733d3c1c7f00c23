//! Combat tuning values.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::target::TargetKind;

/// Shared tuning for one [`crate::combat::CombatSystem`] instance.
///
/// `detection_range > attack_range` is a design invariant, not an
/// accident: a unit must be able to acquire a target before it is forced
/// to close into firing range. [`CombatConfig::validate`] enforces it at
/// configuration time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatConfig {
    /// Range at which protectors notice enemies while moving.
    pub detection_range: f32,
    /// Maximum firing range.
    pub attack_range: f32,
    /// Energy drawn from the global pool per shot.
    pub attack_energy_cost: f32,
    /// Pause between firing cycles, in milliseconds.
    pub attack_cooldown_ms: f64,
    /// Energy granted for a parasite kill (only when `reward_on_kill`).
    pub parasite_reward: f32,
    /// Energy granted for a queen kill (only when `reward_on_kill`).
    pub queen_reward: f32,
    /// Energy granted for a hive kill (only when `reward_on_kill`).
    pub hive_reward: f32,
    /// Whether kills deposit energy back into the pool. Off by default.
    pub reward_on_kill: bool,
    /// Global auto-engagement toggle.
    pub auto_attack_enabled: bool,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            detection_range: 10.0,
            attack_range: 8.0,
            attack_energy_cost: 2.0,
            attack_cooldown_ms: 1000.0,
            parasite_reward: 3.0,
            queen_reward: 25.0,
            hive_reward: 15.0,
            reward_on_kill: false,
            auto_attack_enabled: true,
        }
    }
}

impl CombatConfig {
    /// Validate cross-field invariants.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("detection_range", f64::from(self.detection_range)),
            ("attack_range", f64::from(self.attack_range)),
            ("attack_energy_cost", f64::from(self.attack_energy_cost)),
            ("attack_cooldown_ms", self.attack_cooldown_ms),
        ] {
            if !value.is_finite() {
                return Err(GameError::NonFiniteConfig { field });
            }
            if value <= 0.0 {
                return Err(GameError::NonPositiveConfig { field, value });
            }
        }
        if self.detection_range <= self.attack_range {
            return Err(GameError::DetectionRangeNotGreater {
                detection: self.detection_range,
                attack: self.attack_range,
            });
        }
        Ok(())
    }

    /// Energy reward for destroying a target of the given kind.
    ///
    /// Returns zero for kinds that never carry a bounty. The caller is
    /// responsible for checking `reward_on_kill` before depositing.
    #[must_use]
    pub fn energy_reward(&self, kind: TargetKind) -> f32 {
        match kind {
            TargetKind::Parasite | TargetKind::EnergyParasite => self.parasite_reward,
            TargetKind::Queen => self.queen_reward,
            TargetKind::Hive => self.hive_reward,
            TargetKind::PlayerUnit => 0.0,
        }
    }
}
