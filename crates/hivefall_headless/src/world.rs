//! World state and the per-frame game loop.
//!
//! The world owns everything the combat core treats as external:
//! protector units, free parasites, territories (which own queens and
//! hives), the shared energy pool, and the terrain. Each tick it advances
//! movement and lifecycles, then hands the combat system a context over
//! its own state and reacts to the emitted events.

use glam::Vec3;
use serde::Serialize;

use hivefall_core::combat::{CombatEvent, CombatSystem};
use hivefall_core::context::{
    CombatContext, EnergyPool, Protector, ProtectorCombatState, ProtectorStats, ProtectorSupply,
    TargetSupply,
};
use hivefall_core::math::move_toward;
use hivefall_core::parasite::{Parasite, ParasiteKind};
use hivefall_core::queen::QueenEvent;
use hivefall_core::target::{CombatTarget, TargetKind};
use hivefall_core::terrain::TerrainSampler;
use hivefall_core::territory::{Territory, TerritoryEvent};

use crate::scenario::{ScenarioConfig, ScenarioError};

/// Distance below which a travel order counts as completed.
const ARRIVAL_THRESHOLD: f32 = 0.3;

/// Protector movement speed in units per second.
const PROTECTOR_SPEED: f32 = 4.0;

/// A player combat unit with simple point-to-point movement.
#[derive(Debug, Clone)]
pub struct ProtectorUnit {
    id: String,
    position: Vec3,
    attack_damage: f32,
    combat_experience: u32,
    auto_attack_enabled: bool,
    destination: Option<Vec3>,
    original_destination: Option<Vec3>,
    facing: Option<Vec3>,
    fighting: bool,
}

impl ProtectorUnit {
    /// Create a stationary unit.
    #[must_use]
    pub fn new(id: impl Into<String>, position: Vec3) -> Self {
        Self {
            id: id.into(),
            position,
            attack_damage: 10.0,
            combat_experience: 0,
            auto_attack_enabled: true,
            destination: None,
            original_destination: None,
            facing: None,
            fighting: false,
        }
    }

    /// Player-issued travel order. Remembered as the original destination
    /// so combat can hand movement back after a fight.
    pub fn order_move(&mut self, destination: Vec3) {
        self.destination = Some(destination);
        self.original_destination = Some(destination);
    }

    /// Integrate movement for one tick.
    fn advance(&mut self, dt_secs: f32) {
        if let Some(destination) = self.destination {
            self.position = move_toward(self.position, destination, PROTECTOR_SPEED * dt_secs);
            if self.position.distance(destination) <= ARRIVAL_THRESHOLD {
                self.destination = None;
                if self.original_destination == Some(destination) {
                    self.original_destination = None;
                }
            }
        }
    }
}

impl Protector for ProtectorUnit {
    fn id(&self) -> &str {
        &self.id
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn stats(&self) -> ProtectorStats {
        let combat_state = if self.fighting {
            ProtectorCombatState::Fighting
        } else if self.destination.is_some() {
            ProtectorCombatState::Moving
        } else {
            ProtectorCombatState::Idle
        };
        ProtectorStats {
            attack_damage: self.attack_damage,
            combat_experience: self.combat_experience,
            last_action_ms: 0.0,
            combat_state,
            auto_attack_enabled: self.auto_attack_enabled,
        }
    }

    fn move_to(&mut self, destination: Vec3) {
        // Combat-issued movement; the original order is left untouched.
        self.destination = Some(destination);
    }

    fn stop_movement(&mut self) {
        self.destination = None;
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

/// Shared global energy pool.
#[derive(Debug, Clone, Default)]
pub struct SharedEnergyPool {
    available: f32,
    spent: f32,
}

impl SharedEnergyPool {
    /// Create a pool with a starting budget.
    #[must_use]
    pub fn new(budget: f32) -> Self {
        Self {
            available: budget,
            spent: 0.0,
        }
    }

    /// Total energy spent so far.
    #[must_use]
    pub fn spent(&self) -> f32 {
        self.spent
    }
}

impl EnergyPool for SharedEnergyPool {
    fn can_consume(&self, _owner: &str, amount: f32) -> bool {
        self.available >= amount
    }

    fn consume(&mut self, owner: &str, amount: f32, reason: &str) -> bool {
        if self.available < amount {
            return false;
        }
        self.available -= amount;
        self.spent += amount;
        tracing::trace!(owner, amount, reason, "energy consumed");
        true
    }

    fn deposit(&mut self, amount: f32, reason: &str) {
        self.available += amount;
        tracing::trace!(amount, reason, "energy deposited");
    }

    fn total(&self) -> f32 {
        self.available
    }
}

/// Gently rolling terrain; enough relief to exercise slope-following.
#[derive(Debug, Clone, Copy)]
pub struct RollingTerrain {
    amplitude: f32,
    frequency: f32,
}

impl Default for RollingTerrain {
    fn default() -> Self {
        Self {
            amplitude: 1.5,
            frequency: 0.08,
        }
    }
}

impl TerrainSampler for RollingTerrain {
    fn height_at(&self, x: f32, z: f32) -> f32 {
        self.amplitude * 0.5 * ((x * self.frequency).sin() + (z * self.frequency).cos())
    }
}

/// Aggregate counters for one run, printed as JSON at the end.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Scenario name.
    pub scenario: String,
    /// Seed the run used.
    pub seed: u64,
    /// Ticks simulated.
    pub ticks: u64,
    /// Simulated seconds.
    pub sim_seconds: f64,
    /// Shots fired by protectors.
    pub shots_fired: u64,
    /// Engagements opened.
    pub engagements_started: u64,
    /// Engagements closed (any reason).
    pub engagements_completed: u64,
    /// Parasites destroyed by protectors.
    pub parasites_destroyed: u64,
    /// Queens destroyed.
    pub queens_destroyed: u64,
    /// Hives destroyed.
    pub hives_destroyed: u64,
    /// Territories liberated.
    pub territories_liberated: u64,
    /// Parasites spawned by queens.
    pub parasites_spawned: u64,
    /// Shots skipped for lack of energy.
    pub insufficient_energy: u64,
    /// Energy spent from the pool.
    pub energy_spent: f32,
    /// Energy left in the pool.
    pub energy_remaining: f32,
}

/// Everything a running scenario owns.
pub struct World {
    units: Vec<ProtectorUnit>,
    parasites: Vec<Parasite>,
    territories: Vec<Territory>,
    energy: SharedEnergyPool,
    combat: CombatSystem,
    terrain: RollingTerrain,
    scenario: ScenarioConfig,
    summary: RunSummary,
    parasite_seq: u64,
}

/// Protector supply over the world's unit list.
struct UnitRoster<'a>(&'a mut Vec<ProtectorUnit>);

impl ProtectorSupply for UnitRoster<'_> {
    fn protectors(&mut self) -> Vec<&mut dyn Protector> {
        self.0.iter_mut().map(|u| u as &mut dyn Protector).collect()
    }
}

/// Target supply over free parasites plus whatever the territories
/// currently expose (vulnerable queens, constructed hives).
struct HostileBoard<'a> {
    parasites: &'a mut Vec<Parasite>,
    territories: &'a mut Vec<Territory>,
}

impl TargetSupply for HostileBoard<'_> {
    fn targets(&mut self) -> Vec<&mut dyn CombatTarget> {
        let mut targets: Vec<&mut dyn CombatTarget> = self
            .parasites
            .iter_mut()
            .filter(|p| !p.is_destroyed())
            .map(|p| p as &mut dyn CombatTarget)
            .collect();
        for territory in self.territories.iter_mut() {
            targets.extend(territory.attackable_targets());
        }
        targets
    }
}

impl World {
    /// Build a world from a validated scenario.
    pub fn from_scenario(scenario: ScenarioConfig) -> Result<Self, ScenarioError> {
        scenario.validate()?;
        let terrain = RollingTerrain::default();

        let mut units = Vec::new();
        for spawn in &scenario.protectors {
            let mut unit = ProtectorUnit::new(&spawn.id, Vec3::from_array(spawn.position));
            unit.attack_damage = spawn.attack_damage;
            unit.combat_experience = spawn.combat_experience;
            unit.auto_attack_enabled = spawn.auto_attack;
            if let Some(destination) = spawn.destination {
                unit.order_move(Vec3::from_array(destination));
            }
            units.push(unit);
        }

        let mut territories = Vec::new();
        for (index, spawn) in scenario.territories.iter().enumerate() {
            let mut territory =
                Territory::new(index, Vec3::from_array(spawn.center), spawn.radius);
            territory.infest(
                format!("queen-{index}"),
                &scenario.queen,
                1,
                scenario.seed.wrapping_add(index as u64),
                &terrain,
            );
            territories.push(territory);
        }

        let combat = CombatSystem::new(scenario.combat.clone())?;
        let energy = SharedEnergyPool::new(scenario.energy_budget);
        let summary = RunSummary {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            ..RunSummary::default()
        };

        Ok(Self {
            units,
            parasites: Vec::new(),
            territories,
            energy,
            combat,
            terrain,
            scenario,
            summary,
            parasite_seq: 0,
        })
    }

    /// Advance the whole world by one tick.
    pub fn tick(&mut self, dt_secs: f32) {
        // Unit movement first; combat reads fresh positions.
        for unit in &mut self.units {
            unit.advance(dt_secs);
        }

        // Hostile lifecycles.
        let mut territory_events = Vec::new();
        for territory in &mut self.territories {
            territory_events.extend(territory.update(dt_secs, &self.terrain));
        }
        for event in territory_events {
            self.handle_territory_event(event);
        }

        for parasite in &mut self.parasites {
            parasite.update(dt_secs, &self.terrain);
        }

        // Combat over a context borrowing the world's own state.
        let combat_events = {
            let mut roster = UnitRoster(&mut self.units);
            let mut board = HostileBoard {
                parasites: &mut self.parasites,
                territories: &mut self.territories,
            };
            let mut ctx = CombatContext {
                protectors: &mut roster,
                targets: &mut board,
                energy: &mut self.energy,
            };
            self.combat.update(dt_secs, &mut ctx)
        };
        for event in combat_events {
            self.handle_combat_event(event);
        }

        // Drop destroyed parasites and sync unit combat flags.
        self.parasites.retain(|p| !p.is_destroyed());
        for unit in &mut self.units {
            unit.fighting = self.combat.has_engagement_for(&unit.id);
        }

        self.summary.ticks += 1;
        self.summary.sim_seconds += f64::from(dt_secs);
        self.summary.energy_spent = self.energy.spent();
        self.summary.energy_remaining = self.energy.total();
    }

    fn handle_territory_event(&mut self, event: TerritoryEvent) {
        match event {
            TerritoryEvent::Queen(QueenEvent::SpawnRequested { queen, position }) => {
                self.spawn_parasite(&queen, position);
            }
            TerritoryEvent::Queen(QueenEvent::PhaseChanged { queen, phase }) => {
                tracing::info!(queen = %queen, ?phase, "queen phase changed");
            }
            TerritoryEvent::Queen(QueenEvent::HiveFounded { queen, .. }) => {
                tracing::info!(queen = %queen, "hive founded");
            }
            TerritoryEvent::Liberated { territory } => {
                tracing::info!(territory, "territory liberated");
                self.summary.territories_liberated += 1;
            }
        }
    }

    fn spawn_parasite(&mut self, queen_id: &str, position: Vec3) {
        if self.parasites.len() >= self.scenario.max_parasites {
            return;
        }
        self.parasite_seq += 1;
        let id = format!("parasite-{:04}", self.parasite_seq);
        // Every third spawn carries energy, making it a priority target.
        let kind = if self.parasite_seq % 3 == 0 {
            ParasiteKind::Energy
        } else {
            ParasiteKind::Combat
        };
        let territory = self
            .territories
            .iter()
            .find(|t| t.queen().is_some_and(|q| q.id() == queen_id));
        let (center, radius) = territory.map_or((position, 10.0), |t| (t.center(), t.radius()));

        let mut parasite = Parasite::new(
            &id,
            kind,
            center,
            radius,
            &self.scenario.parasite,
            self.scenario.seed.wrapping_add(self.parasite_seq),
        );
        parasite.set_position(position);
        self.parasites.push(parasite);
        self.summary.parasites_spawned += 1;

        if let Some(queen) = self
            .territories
            .iter_mut()
            .filter_map(Territory::queen_mut)
            .find(|q| q.id() == queen_id)
        {
            queen.adopt_parasite(id.as_str());
        }
        tracing::debug!(id = %id, queen = queen_id, "parasite spawned");
    }

    fn handle_combat_event(&mut self, event: CombatEvent) {
        match event {
            CombatEvent::EngagementStarted { protector, target, auto } => {
                tracing::debug!(protector = %protector, target = %target, auto, "engagement started");
                self.summary.engagements_started += 1;
            }
            CombatEvent::AttackFired { .. } => {
                self.summary.shots_fired += 1;
            }
            CombatEvent::BeamRequested { .. } => {
                // Would be forwarded to the renderer; nothing to do here.
            }
            CombatEvent::InsufficientEnergy { protector, required } => {
                tracing::debug!(protector = %protector, required, "shot skipped, energy low");
                self.summary.insufficient_energy += 1;
            }
            CombatEvent::TargetDamaged { .. } => {}
            CombatEvent::TargetDestroyed { target, kind, .. } => {
                tracing::info!(target = %target, ?kind, "target destroyed");
                match kind {
                    TargetKind::Parasite | TargetKind::EnergyParasite => {
                        self.summary.parasites_destroyed += 1;
                        for queen in self.territories.iter_mut().filter_map(Territory::queen_mut)
                        {
                            queen.release_parasite(&target);
                        }
                    }
                    TargetKind::Queen => self.summary.queens_destroyed += 1,
                    TargetKind::Hive => self.summary.hives_destroyed += 1,
                    TargetKind::PlayerUnit => {}
                }
            }
            CombatEvent::KillReward { amount, .. } => {
                tracing::debug!(amount, "kill reward granted");
            }
            CombatEvent::EngagementCompleted { protector, target, reason } => {
                tracing::debug!(protector = %protector, target = %target, ?reason, "engagement completed");
                self.summary.engagements_completed += 1;
            }
        }
    }

    /// Current aggregate counters.
    #[must_use]
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Live protector units.
    #[must_use]
    pub fn units(&self) -> &[ProtectorUnit] {
        &self.units
    }

    /// Live free parasites.
    #[must_use]
    pub fn parasites(&self) -> &[Parasite] {
        &self.parasites
    }

    /// Territories, infested or liberated.
    #[must_use]
    pub fn territories(&self) -> &[Territory] {
        &self.territories
    }
}
