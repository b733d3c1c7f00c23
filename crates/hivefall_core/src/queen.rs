//! Queen lifecycle: underground growth, hive construction, active control.
//!
//! Phases only ever move forward. A queen is attackable exactly while in
//! active control; in every other phase `take_damage` rejects the hit at
//! the data layer, not just in validation.

use std::collections::BTreeSet;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::hive::{Hive, HiveConfig};
use crate::parasite::{Parasite, ParasiteConfig, ParasiteKind};
use crate::target::{CombatTarget, EntityId, TargetKind};
use crate::terrain::TerrainSampler;

/// Upper bound on parasites a queen can control at once.
pub const MAX_CONTROLLED_PARASITES: usize = 100;

/// Promotion fallback when construction is pending but no hive exists.
pub const CONSTRUCTION_FALLBACK_MS: f64 = 12_500.0;

/// How far below terrain a growing queen hides.
pub const UNDERGROUND_DEPTH: f32 = 3.0;

/// Lifecycle phase. Strictly forward; there is no regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueenPhase {
    /// Growing below terrain, hidden and untouchable.
    UndergroundGrowth,
    /// Founding and waiting on the hive.
    HiveConstruction,
    /// Surfaced, patrolling, spawning, and finally vulnerable.
    ActiveControl,
}

/// Tuning for queen lifecycle and economy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueenConfig {
    /// Growth phase length in milliseconds. `<= 0` skips growth entirely.
    pub growth_duration_ms: f64,
    /// Maximum health; clamped into `[40, 100]`.
    pub max_health: f32,
    /// Energy capacity for spawn gating.
    pub energy_max: f32,
    /// Energy regained per second while in active control.
    pub energy_regen_per_sec: f32,
    /// Energy cost of spawning one parasite.
    pub spawn_cost: f32,
    /// Minimum interval between spawn requests, in milliseconds.
    pub spawn_interval_ms: f64,
    /// Inner radius of the queen's patrol annulus around the hive.
    pub patrol_min_radius: f32,
    /// Movement/regen tuning of the queen's body.
    pub body: ParasiteConfig,
    /// Hive tuning, used when the queen founds its hive.
    pub hive: HiveConfig,
}

impl Default for QueenConfig {
    fn default() -> Self {
        Self {
            growth_duration_ms: 20_000.0,
            max_health: 80.0,
            energy_max: 50.0,
            energy_regen_per_sec: 2.0,
            spawn_cost: 10.0,
            spawn_interval_ms: 4_000.0,
            patrol_min_radius: 4.0,
            body: ParasiteConfig {
                speed: 1.5,
                regen_per_sec: 1.0,
                ..ParasiteConfig::default()
            },
            hive: HiveConfig::default(),
        }
    }
}

/// Queen-side energy accounting for spawn-cost gating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyState {
    /// Current energy.
    pub current: f32,
    /// Capacity.
    pub max: f32,
    /// Regain per second.
    pub regen_per_sec: f32,
}

impl EnergyState {
    /// Create at zero energy.
    #[must_use]
    pub const fn new(max: f32, regen_per_sec: f32) -> Self {
        Self {
            current: 0.0,
            max,
            regen_per_sec,
        }
    }

    /// Whether `cost` is covered.
    #[must_use]
    pub fn can_afford(&self, cost: f32) -> bool {
        self.current >= cost
    }

    /// Spend `cost` if covered. Returns whether the spend happened.
    pub fn spend(&mut self, cost: f32) -> bool {
        if self.can_afford(cost) {
            self.current -= cost;
            true
        } else {
            false
        }
    }

    /// Regain energy for `dt_secs`, clamped at capacity.
    pub fn regen(&mut self, dt_secs: f32) {
        self.current = (self.current + self.regen_per_sec * dt_secs).min(self.max);
    }
}

/// Externally observable queen lifecycle events.
#[derive(Debug, Clone, PartialEq)]
pub enum QueenEvent {
    /// The queen advanced to a new phase.
    PhaseChanged {
        /// Queen id.
        queen: EntityId,
        /// Phase just entered.
        phase: QueenPhase,
    },
    /// The queen founded its hive.
    HiveFounded {
        /// Queen id.
        queen: EntityId,
        /// Hive placement.
        position: Vec3,
    },
    /// The queen wants a parasite spawned. The world creates it and hands
    /// the id back through [`Queen::adopt_parasite`].
    SpawnRequested {
        /// Queen id.
        queen: EntityId,
        /// Suggested spawn position.
        position: Vec3,
    },
}

/// Territory-controlling hostile entity.
#[derive(Debug, Clone)]
pub struct Queen {
    body: Parasite,
    territory: usize,
    phase: QueenPhase,
    generation: u32,
    growth_duration_ms: f64,
    phase_elapsed_ms: f64,
    growth_progress: f32,
    controlled: BTreeSet<EntityId>,
    energy: EnergyState,
    spawn_cost: f32,
    spawn_interval_ms: f64,
    spawn_cooldown_ms: f64,
    patrol_min_radius: f32,
    territory_radius: f32,
    hive_config: HiveConfig,
    hive_founded: bool,
}

impl Queen {
    /// Create a queen in underground growth at the territory center.
    #[must_use]
    pub fn new(
        id: impl Into<EntityId>,
        territory: usize,
        center: Vec3,
        territory_radius: f32,
        config: &QueenConfig,
        generation: u32,
        seed: u64,
        terrain: &dyn TerrainSampler,
    ) -> Self {
        let body_config = ParasiteConfig {
            max_health: config.max_health.clamp(40.0, 100.0),
            ..config.body.clone()
        };
        let mut body = Parasite::new(id, ParasiteKind::Combat, center, territory_radius, &body_config, seed)
            .with_patrol_min_radius(config.patrol_min_radius);
        // Hidden below terrain until active control.
        body.set_position(Vec3::new(
            center.x,
            terrain.height_at(center.x, center.z) - UNDERGROUND_DEPTH,
            center.z,
        ));
        Self {
            body,
            territory,
            phase: QueenPhase::UndergroundGrowth,
            generation,
            growth_duration_ms: config.growth_duration_ms,
            phase_elapsed_ms: 0.0,
            growth_progress: 0.0,
            controlled: BTreeSet::new(),
            energy: EnergyState::new(config.energy_max, config.energy_regen_per_sec),
            spawn_cost: config.spawn_cost,
            spawn_interval_ms: config.spawn_interval_ms,
            spawn_cooldown_ms: 0.0,
            patrol_min_radius: config.patrol_min_radius,
            territory_radius,
            hive_config: config.hive.clone(),
            hive_founded: false,
        }
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn current_phase(&self) -> QueenPhase {
        self.phase
    }

    /// Growth completion in `[0, 1]`.
    #[must_use]
    pub fn growth_progress(&self) -> f32 {
        self.growth_progress
    }

    /// Which respawn generation this queen belongs to.
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Index of the owning territory (non-owning back-reference).
    #[must_use]
    pub fn territory(&self) -> usize {
        self.territory
    }

    /// Whether the queen has been destroyed.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.body.is_destroyed()
    }

    /// Kill the queen outside the damage path (hive-loss cascade).
    pub fn force_destroy(&mut self) {
        self.body.force_destroy();
        self.controlled.clear();
    }

    /// Ids of parasites currently under control.
    #[must_use]
    pub fn controlled_parasites(&self) -> &BTreeSet<EntityId> {
        &self.controlled
    }

    /// Spawn-gating energy state.
    #[must_use]
    pub fn energy(&self) -> EnergyState {
        self.energy
    }

    /// Take control of a spawned parasite. Refused outside active control
    /// and beyond the control cap.
    pub fn adopt_parasite(&mut self, id: impl Into<EntityId>) -> bool {
        if self.phase != QueenPhase::ActiveControl
            || self.controlled.len() >= MAX_CONTROLLED_PARASITES
        {
            return false;
        }
        self.controlled.insert(id.into())
    }

    /// Drop a parasite from the controlled set (it died or was freed).
    pub fn release_parasite(&mut self, id: &str) -> bool {
        self.controlled.remove(id)
    }

    /// Advance the lifecycle by `dt_secs`.
    ///
    /// `hive` is the owning territory's hive slot; the queen founds into
    /// it during construction and watches it for completion.
    pub fn update(
        &mut self,
        dt_secs: f32,
        hive: &mut Option<Hive>,
        terrain: &dyn TerrainSampler,
    ) -> Vec<QueenEvent> {
        let mut events = Vec::new();
        if self.is_destroyed() {
            return events;
        }
        self.phase_elapsed_ms += f64::from(dt_secs) * 1000.0;

        match self.phase {
            QueenPhase::UndergroundGrowth => self.update_growth(&mut events),
            QueenPhase::HiveConstruction => {
                self.update_construction(dt_secs, hive, terrain, &mut events);
            }
            QueenPhase::ActiveControl => self.update_active(dt_secs, hive, terrain, &mut events),
        }
        events
    }

    fn update_growth(&mut self, events: &mut Vec<QueenEvent>) {
        if self.growth_duration_ms <= 0.0 {
            self.growth_progress = 1.0;
            self.advance_phase(QueenPhase::HiveConstruction, events);
            return;
        }
        self.growth_progress =
            ((self.phase_elapsed_ms / self.growth_duration_ms) as f32).clamp(0.0, 1.0);
        if self.growth_progress >= 1.0 {
            self.advance_phase(QueenPhase::HiveConstruction, events);
        }
    }

    fn update_construction(
        &mut self,
        dt_secs: f32,
        hive: &mut Option<Hive>,
        terrain: &dyn TerrainSampler,
        events: &mut Vec<QueenEvent>,
    ) {
        // Exactly one founding per queen, lazily on entering construction.
        if hive.is_none() && !self.hive_founded {
            let center = self.territory_center();
            let position = Vec3::new(
                center.x,
                terrain.height_at(center.x, center.z),
                center.z,
            );
            *hive = Some(Hive::new(
                format!("{}-hive", self.body.id()),
                position,
                &self.hive_config,
            ));
            self.hive_founded = true;
            events.push(QueenEvent::HiveFounded {
                queen: self.body.id().to_string(),
                position,
            });
        }

        match hive {
            Some(h) => {
                h.update(dt_secs);
                if h.is_constructed() {
                    let anchor = h.position();
                    self.surface_at(anchor, terrain);
                    self.advance_phase(QueenPhase::ActiveControl, events);
                }
            }
            // Safety net: if the hive slot stays empty (placement failed,
            // something else disposed it), promote anyway after the
            // fallback window instead of stalling the lifecycle.
            None => {
                if self.phase_elapsed_ms >= CONSTRUCTION_FALLBACK_MS {
                    let anchor = self.territory_center();
                    self.surface_at(anchor, terrain);
                    self.advance_phase(QueenPhase::ActiveControl, events);
                }
            }
        }
    }

    fn update_active(
        &mut self,
        dt_secs: f32,
        hive: &mut Option<Hive>,
        terrain: &dyn TerrainSampler,
        events: &mut Vec<QueenEvent>,
    ) {
        self.body.update(dt_secs, terrain);
        self.energy.regen(dt_secs);

        self.spawn_cooldown_ms -= f64::from(dt_secs) * 1000.0;
        if self.spawn_cooldown_ms <= 0.0
            && self.controlled.len() < MAX_CONTROLLED_PARASITES
            && self.energy.spend(self.spawn_cost)
        {
            self.spawn_cooldown_ms = self.spawn_interval_ms;
            let anchor = hive
                .as_ref()
                .map_or(self.territory_center(), |h| h.position());
            let position =
                self.body
                    .pick_point_in_annulus(anchor, self.patrol_min_radius * 0.5, self.patrol_min_radius);
            events.push(QueenEvent::SpawnRequested {
                queen: self.body.id().to_string(),
                position,
            });
        }
    }

    fn advance_phase(&mut self, phase: QueenPhase, events: &mut Vec<QueenEvent>) {
        tracing::debug!(queen = self.body.id(), ?phase, "queen phase advanced");
        self.phase = phase;
        self.phase_elapsed_ms = 0.0;
        events.push(QueenEvent::PhaseChanged {
            queen: self.body.id().to_string(),
            phase,
        });
    }

    /// Reposition onto the terrain surface and re-anchor the patrol
    /// annulus around `anchor`, keeping the territory radius.
    fn surface_at(&mut self, anchor: Vec3, terrain: &dyn TerrainSampler) {
        let position = Vec3::new(
            anchor.x,
            terrain.height_at(anchor.x, anchor.z),
            anchor.z,
        );
        self.body.set_position(position);
        self.body.set_territory(position, self.territory_radius);
    }

    fn territory_center(&self) -> Vec3 {
        self.body.position()
    }
}

impl CombatTarget for Queen {
    fn id(&self) -> &str {
        self.body.id()
    }

    fn kind(&self) -> TargetKind {
        TargetKind::Queen
    }

    fn position(&self) -> Vec3 {
        self.body.position()
    }

    fn health(&self) -> f32 {
        self.body.vitals.current
    }

    fn max_health(&self) -> f32 {
        self.body.vitals.max
    }

    fn is_vulnerable(&self) -> bool {
        self.phase == QueenPhase::ActiveControl && !self.is_destroyed()
    }

    fn take_damage(&mut self, amount: f32) -> bool {
        // Invulnerability is a data-layer rule: outside active control the
        // hit is rejected entirely, not reduced.
        if !self.is_vulnerable() {
            return false;
        }
        self.body.vitals.apply_damage(amount);
        if self.body.vitals.is_dead() {
            self.body.force_destroy();
            true
        } else {
            false
        }
    }

    fn on_destroyed(&mut self) {
        self.controlled.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::FlatTerrain;

    fn queen(config: &QueenConfig) -> Queen {
        Queen::new(
            "queen-1",
            0,
            Vec3::ZERO,
            20.0,
            config,
            1,
            99,
            &FlatTerrain::default(),
        )
    }

    #[test]
    fn test_zero_growth_duration_skips_growth_on_first_update() {
        let config = QueenConfig {
            growth_duration_ms: 0.0,
            ..QueenConfig::default()
        };
        let mut q = queen(&config);
        assert_eq!(q.current_phase(), QueenPhase::UndergroundGrowth);

        let mut hive = None;
        q.update(0.016, &mut hive, &FlatTerrain::default());
        assert_eq!(q.current_phase(), QueenPhase::HiveConstruction);
        assert_eq!(q.growth_progress(), 1.0);
    }

    #[test]
    fn test_growth_progress_and_promotion() {
        let config = QueenConfig {
            growth_duration_ms: 10_000.0,
            ..QueenConfig::default()
        };
        let mut q = queen(&config);
        let mut hive = None;

        q.update(4.0, &mut hive, &FlatTerrain::default());
        assert_eq!(q.current_phase(), QueenPhase::UndergroundGrowth);
        assert!((q.growth_progress() - 0.4).abs() < 1e-4);

        q.update(6.0, &mut hive, &FlatTerrain::default());
        assert_eq!(q.current_phase(), QueenPhase::HiveConstruction);
    }

    #[test]
    fn test_hidden_below_terrain_while_growing() {
        let terrain = FlatTerrain::new(5.0);
        let q = Queen::new("q", 0, Vec3::ZERO, 20.0, &QueenConfig::default(), 1, 1, &terrain);
        assert!(q.position().y < terrain.height);
    }

    #[test]
    fn test_construction_founds_exactly_one_hive_and_promotes() {
        let config = QueenConfig {
            growth_duration_ms: 0.0,
            hive: HiveConfig {
                construction_duration_ms: 1_000.0,
                ..HiveConfig::default()
            },
            ..QueenConfig::default()
        };
        let mut q = queen(&config);
        let mut hive = None;

        // First update: growth skip.
        q.update(0.1, &mut hive, &FlatTerrain::default());
        // Second update: hive founded.
        let events = q.update(0.1, &mut hive, &FlatTerrain::default());
        assert!(hive.is_some());
        assert!(events
            .iter()
            .any(|e| matches!(e, QueenEvent::HiveFounded { .. })));

        // Run construction out; queen promotes when hive reports built.
        let mut promoted = false;
        for _ in 0..200 {
            let events = q.update(0.5, &mut hive, &FlatTerrain::default());
            if events.iter().any(|e| {
                matches!(
                    e,
                    QueenEvent::PhaseChanged {
                        phase: QueenPhase::ActiveControl,
                        ..
                    }
                )
            }) {
                promoted = true;
                break;
            }
        }
        assert!(promoted);
        assert!(hive.as_ref().is_some_and(Hive::is_constructed));
    }

    #[test]
    fn test_construction_fallback_without_hive() {
        let config = QueenConfig {
            growth_duration_ms: 0.0,
            ..QueenConfig::default()
        };
        let mut q = queen(&config);
        let mut hive = None;

        q.update(0.1, &mut hive, &FlatTerrain::default());
        q.update(0.1, &mut hive, &FlatTerrain::default());
        assert!(hive.is_some());

        // Something disposes the hive. Founding happens exactly once, so
        // the slot stays empty; after the fallback window the queen
        // promotes anyway instead of stalling in construction forever.
        hive = None;
        let mut elapsed = 0.0;
        while elapsed < CONSTRUCTION_FALLBACK_MS + 1_000.0 {
            q.update(0.5, &mut hive, &FlatTerrain::default());
            elapsed += 500.0;
        }
        assert!(hive.is_none());
        assert_eq!(q.current_phase(), QueenPhase::ActiveControl);
    }

    #[test]
    fn test_invulnerable_outside_active_control() {
        let mut q = queen(&QueenConfig::default());
        let health = q.health();
        assert!(!q.is_vulnerable());
        assert!(!q.take_damage(1_000_000.0));
        assert_eq!(q.health(), health);
    }

    #[test]
    fn test_vulnerable_and_killable_in_active_control() {
        let config = QueenConfig {
            growth_duration_ms: 0.0,
            hive: HiveConfig {
                construction_duration_ms: 0.0,
                ..HiveConfig::default()
            },
            ..QueenConfig::default()
        };
        let mut q = queen(&config);
        let mut hive = None;
        for _ in 0..4 {
            q.update(0.1, &mut hive, &FlatTerrain::default());
        }
        assert_eq!(q.current_phase(), QueenPhase::ActiveControl);
        assert!(q.is_vulnerable());

        assert!(!q.take_damage(10.0));
        assert!(q.take_damage(10_000.0));
        assert!(q.is_destroyed());
        assert!(!q.is_vulnerable());
    }

    #[test]
    fn test_health_clamped_into_band() {
        let config = QueenConfig {
            max_health: 500.0,
            ..QueenConfig::default()
        };
        assert_eq!(queen(&config).max_health(), 100.0);

        let config = QueenConfig {
            max_health: 10.0,
            ..QueenConfig::default()
        };
        assert_eq!(queen(&config).max_health(), 40.0);
    }

    #[test]
    fn test_adopt_cap_and_phase_gate() {
        let mut q = queen(&QueenConfig::default());
        // Not in active control yet.
        assert!(!q.adopt_parasite("p-0"));

        q.phase = QueenPhase::ActiveControl;
        for i in 0..MAX_CONTROLLED_PARASITES {
            assert!(q.adopt_parasite(format!("p-{i}")));
        }
        assert_eq!(q.controlled_parasites().len(), MAX_CONTROLLED_PARASITES);
        assert!(!q.adopt_parasite("p-overflow"));

        assert!(q.release_parasite("p-0"));
        assert!(q.adopt_parasite("p-again"));
    }

    #[test]
    fn test_spawn_requests_are_energy_gated() {
        let config = QueenConfig {
            growth_duration_ms: 0.0,
            energy_regen_per_sec: 0.0,
            spawn_cost: 10.0,
            hive: HiveConfig {
                construction_duration_ms: 0.0,
                ..HiveConfig::default()
            },
            ..QueenConfig::default()
        };
        let mut q = queen(&config);
        let mut hive = None;
        for _ in 0..4 {
            q.update(0.1, &mut hive, &FlatTerrain::default());
        }
        assert_eq!(q.current_phase(), QueenPhase::ActiveControl);

        // Zero regen and zero starting energy: no spawn requests ever.
        for _ in 0..50 {
            let events = q.update(0.5, &mut hive, &FlatTerrain::default());
            assert!(!events
                .iter()
                .any(|e| matches!(e, QueenEvent::SpawnRequested { .. })));
        }

        // Grant energy; the next update may spawn.
        q.energy.current = 20.0;
        let mut spawned = false;
        for _ in 0..4 {
            let events = q.update(0.5, &mut hive, &FlatTerrain::default());
            if events
                .iter()
                .any(|e| matches!(e, QueenEvent::SpawnRequested { .. }))
            {
                spawned = true;
            }
        }
        assert!(spawned);
        assert!(q.energy().current < 20.0);
    }

    #[test]
    fn test_destruction_clears_controlled_set() {
        let mut q = queen(&QueenConfig::default());
        q.phase = QueenPhase::ActiveControl;
        q.adopt_parasite("p-1");
        q.adopt_parasite("p-2");

        q.take_damage(10_000.0);
        q.on_destroyed();
        assert!(q.controlled_parasites().is_empty());
    }
}
