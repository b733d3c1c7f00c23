//! Collaborator traits and the per-tick combat context.
//!
//! The combat system reaches its collaborators only through this narrow
//! surface, injected into every `update` call. There are no globals and no
//! service locators; a test can stand up the whole system from a handful
//! of doubles.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::target::CombatTarget;

/// A protector's own movement/combat activity, as reported by its stats.
///
/// Auto-engagement only triggers while a protector is already traveling
/// toward an order — not while idle, and not while mid-fight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProtectorCombatState {
    /// No orders.
    #[default]
    Idle,
    /// Traveling toward an ordered destination.
    Moving,
    /// Engaged with a target.
    Fighting,
}

/// Snapshot of the combat-relevant stats of a protector unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProtectorStats {
    /// Base damage per shot.
    pub attack_damage: f32,
    /// Accumulated combat experience; every 10 points adds +1 damage.
    pub combat_experience: u32,
    /// Timestamp (ms) of the protector's last action, for UI/idle logic.
    pub last_action_ms: f64,
    /// Current movement/combat activity.
    pub combat_state: ProtectorCombatState,
    /// Per-unit auto-attack opt-in.
    pub auto_attack_enabled: bool,
}

impl Default for ProtectorStats {
    fn default() -> Self {
        Self {
            attack_damage: 10.0,
            combat_experience: 0,
            last_action_ms: 0.0,
            combat_state: ProtectorCombatState::Idle,
            auto_attack_enabled: true,
        }
    }
}

/// Accessor surface of a player combat unit.
///
/// The combat system issues movement and facing orders through this trait
/// and never mutates unit internals directly.
pub trait Protector {
    /// Stable unique id.
    fn id(&self) -> &str;

    /// Current world position.
    fn position(&self) -> Vec3;

    /// Combat-relevant stats snapshot.
    fn stats(&self) -> ProtectorStats;

    /// Order the unit to move to a destination.
    fn move_to(&mut self, destination: Vec3);

    /// Cancel any movement order.
    fn stop_movement(&mut self);

    /// Keep the unit turned toward a world point (tracks moving targets).
    fn face_toward(&mut self, point: Vec3);

    /// Release the facing lock.
    fn clear_facing(&mut self);

    /// Destination the unit was traveling to before combat interrupted it.
    fn original_destination(&self) -> Option<Vec3>;
}

/// Supply of live protector units, queried fresh each tick.
pub trait ProtectorSupply {
    /// All live protectors.
    fn protectors(&mut self) -> Vec<&mut dyn Protector>;

    /// Look up one protector by id.
    fn protector(&mut self, id: &str) -> Option<&mut dyn Protector> {
        self.protectors().into_iter().find(|p| p.id() == id)
    }

    /// Whether a protector with this id currently exists.
    fn contains(&mut self, id: &str) -> bool {
        self.protector(id).is_some()
    }
}

/// Supply of currently attackable entities: parasites, vulnerable queens,
/// constructed hives. The combat system never owns this data; it queries
/// it per tick.
pub trait TargetSupply {
    /// All currently attackable entities.
    fn targets(&mut self) -> Vec<&mut dyn CombatTarget>;

    /// Look up one target by id.
    fn target(&mut self, id: &str) -> Option<&mut dyn CombatTarget> {
        self.targets().into_iter().find(|t| t.id() == id)
    }
}

/// Shared global energy pool that attack costs are drawn from.
pub trait EnergyPool {
    /// Whether `amount` can currently be drawn on behalf of `owner`.
    fn can_consume(&self, owner: &str, amount: f32) -> bool;

    /// Draw `amount` on behalf of `owner`. Returns false (and consumes
    /// nothing) if the pool cannot cover it. `reason` tags the ledger.
    fn consume(&mut self, owner: &str, amount: f32, reason: &str) -> bool;

    /// Return energy to the pool (kill rewards, refunds).
    fn deposit(&mut self, amount: f32, reason: &str);

    /// Total energy currently available.
    fn total(&self) -> f32;
}

/// Everything the combat system needs for one tick, bundled.
///
/// The three collaborators are separate objects so the borrow checker can
/// hand them out independently within a tick.
pub struct CombatContext<'a> {
    /// Live protector units.
    pub protectors: &'a mut dyn ProtectorSupply,
    /// Currently attackable entities.
    pub targets: &'a mut dyn TargetSupply,
    /// Global energy pool.
    pub energy: &'a mut dyn EnergyPool,
}
