//! Test fixtures and helpers.
//!
//! Hand-steerable implementations of the combat collaborator traits,
//! plus a driver that steps the combat system on a simulated clock.

use glam::Vec3;

use hivefall_core::combat::{CombatEvent, CombatSystem};
use hivefall_core::context::{
    CombatContext, EnergyPool, Protector, ProtectorCombatState, ProtectorStats, ProtectorSupply,
    TargetSupply,
};
use hivefall_core::target::{CombatTarget, TargetKind, Vitals};

/// Scriptable protector double that records every order it receives.
#[derive(Debug, Clone)]
pub struct TestProtector {
    /// Unit id.
    pub id: String,
    /// Current position.
    pub position: Vec3,
    /// Base damage per shot.
    pub attack_damage: f32,
    /// Accumulated combat experience.
    pub combat_experience: u32,
    /// Reported movement/combat activity.
    pub combat_state: ProtectorCombatState,
    /// Per-unit auto-attack opt-in.
    pub auto_attack_enabled: bool,
    /// Pre-combat destination, reported through `original_destination`.
    pub original_destination: Option<Vec3>,
    /// Point the unit is currently locked onto, if any.
    pub facing: Option<Vec3>,
    /// Every `move_to` order received, in order.
    pub move_orders: Vec<Vec3>,
    /// How many times movement was stopped.
    pub stop_count: u32,
}

impl TestProtector {
    /// Create an idle protector at a position.
    #[must_use]
    pub fn new(id: impl Into<String>, position: Vec3) -> Self {
        Self {
            id: id.into(),
            position,
            attack_damage: 10.0,
            combat_experience: 0,
            combat_state: ProtectorCombatState::Idle,
            auto_attack_enabled: true,
            original_destination: None,
            facing: None,
            move_orders: Vec::new(),
            stop_count: 0,
        }
    }

    /// Builder: set base attack damage.
    #[must_use]
    pub fn with_damage(mut self, damage: f32) -> Self {
        self.attack_damage = damage;
        self
    }

    /// Builder: set combat experience.
    #[must_use]
    pub fn with_experience(mut self, experience: u32) -> Self {
        self.combat_experience = experience;
        self
    }

    /// Builder: report the unit as traveling toward `destination`.
    #[must_use]
    pub fn moving_toward(mut self, destination: Vec3) -> Self {
        self.combat_state = ProtectorCombatState::Moving;
        self.original_destination = Some(destination);
        self
    }

    /// Builder: disable per-unit auto-attack.
    #[must_use]
    pub fn with_auto_attack_disabled(mut self) -> Self {
        self.auto_attack_enabled = false;
        self
    }
}

impl Protector for TestProtector {
    fn id(&self) -> &str {
        &self.id
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn stats(&self) -> ProtectorStats {
        ProtectorStats {
            attack_damage: self.attack_damage,
            combat_experience: self.combat_experience,
            last_action_ms: 0.0,
            combat_state: self.combat_state,
            auto_attack_enabled: self.auto_attack_enabled,
        }
    }

    fn move_to(&mut self, destination: Vec3) {
        self.move_orders.push(destination);
    }

    fn stop_movement(&mut self) {
        self.stop_count += 1;
    }

    fn face_toward(&mut self, point: Vec3) {
        self.facing = Some(point);
    }

    fn clear_facing(&mut self) {
        self.facing = None;
    }

    fn original_destination(&self) -> Option<Vec3> {
        self.original_destination
    }
}

/// Configurable combat-target double that logs damage applications.
#[derive(Debug, Clone)]
pub struct TestTarget {
    /// Target id.
    pub id: String,
    /// Reported kind.
    pub kind: TargetKind,
    /// Current position.
    pub position: Vec3,
    /// Health pool.
    pub vitals: Vitals,
    /// Reported vulnerability; damage is rejected while false.
    pub vulnerable: bool,
    /// Active defender count (hive prioritization).
    pub defenders: u32,
    /// Every damage application, in order.
    pub damage_log: Vec<f32>,
    /// How many times the destruction hook ran.
    pub destroyed_hooks: u32,
}

impl TestTarget {
    /// Create a healthy, vulnerable target.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: TargetKind, position: Vec3) -> Self {
        Self {
            id: id.into(),
            kind,
            position,
            vitals: Vitals::new(50.0),
            vulnerable: true,
            defenders: 0,
            damage_log: Vec::new(),
            destroyed_hooks: 0,
        }
    }

    /// Builder: set current and max health.
    #[must_use]
    pub fn with_health(mut self, health: f32) -> Self {
        self.vitals = Vitals::new(health);
        self
    }

    /// Builder: mark invulnerable.
    #[must_use]
    pub fn invulnerable(mut self) -> Self {
        self.vulnerable = false;
        self
    }
}

impl CombatTarget for TestTarget {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TargetKind {
        self.kind
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
        self.vulnerable && !self.vitals.is_dead()
    }

    fn take_damage(&mut self, amount: f32) -> bool {
        if !self.is_vulnerable() {
            return false;
        }
        self.damage_log.push(amount);
        self.vitals.apply_damage(amount);
        self.vitals.is_dead()
    }

    fn on_destroyed(&mut self) {
        self.destroyed_hooks += 1;
    }

    fn defender_count(&self) -> u32 {
        self.defenders
    }
}

/// Protector supply over a plain vector.
#[derive(Debug, Default)]
pub struct Roster(pub Vec<TestProtector>);

impl Roster {
    /// Convenience lookup by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&TestProtector> {
        self.0.iter().find(|p| p.id == id)
    }
}

impl ProtectorSupply for Roster {
    fn protectors(&mut self) -> Vec<&mut dyn Protector> {
        self.0.iter_mut().map(|p| p as &mut dyn Protector).collect()
    }
}

/// Target supply over a plain vector.
#[derive(Debug, Default)]
pub struct Board(pub Vec<TestTarget>);

impl Board {
    /// Convenience lookup by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&TestTarget> {
        self.0.iter().find(|t| t.id == id)
    }
}

impl TargetSupply for Board {
    fn targets(&mut self) -> Vec<&mut dyn CombatTarget> {
        self.0
            .iter_mut()
            .map(|t| t as &mut dyn CombatTarget)
            .collect()
    }
}

/// Global energy pool with a ledger of every draw.
#[derive(Debug, Clone, Default)]
pub struct TestEnergyPool {
    /// Energy currently available.
    pub available: f32,
    /// Every successful draw: (owner, amount, reason).
    pub consumed: Vec<(String, f32, String)>,
    /// Every deposit: (amount, reason).
    pub deposits: Vec<(f32, String)>,
}

impl TestEnergyPool {
    /// Create a pool with the given budget.
    #[must_use]
    pub fn with_budget(available: f32) -> Self {
        Self {
            available,
            ..Self::default()
        }
    }
}

impl EnergyPool for TestEnergyPool {
    fn can_consume(&self, _owner: &str, amount: f32) -> bool {
        self.available >= amount
    }

    fn consume(&mut self, owner: &str, amount: f32, reason: &str) -> bool {
        if self.available < amount {
            return false;
        }
        self.available -= amount;
        self.consumed
            .push((owner.to_string(), amount, reason.to_string()));
        true
    }

    fn deposit(&mut self, amount: f32, reason: &str) {
        self.available += amount;
        self.deposits.push((amount, reason.to_string()));
    }

    fn total(&self) -> f32 {
        self.available
    }
}

/// Step the combat system in `step_ms` increments for `total_ms` of
/// simulated time, collecting every emitted event.
pub fn drive(
    system: &mut CombatSystem,
    roster: &mut Roster,
    board: &mut Board,
    pool: &mut TestEnergyPool,
    total_ms: f64,
    step_ms: f64,
) -> Vec<CombatEvent> {
    let mut events = Vec::new();
    let mut elapsed = 0.0;
    while elapsed < total_ms {
        let mut ctx = CombatContext {
            protectors: roster,
            targets: board,
            energy: pool,
        };
        events.extend(system.update((step_ms / 1000.0) as f32, &mut ctx));
        elapsed += step_ms;
    }
    events
}
