//! Territory: the sole owner of a queen/hive pair.
//!
//! Queens and hives hold only non-owning back-references (the territory
//! index); the territory owns both by value, so destruction cascades have
//! a single place to run and there are no ownership cycles.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::context::TargetSupply;
use crate::hive::Hive;
use crate::queen::{Queen, QueenConfig, QueenEvent};
use crate::target::CombatTarget;
use crate::terrain::TerrainSampler;

/// Occupation status of a territory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerritoryStatus {
    /// Held by a queen (in any lifecycle phase).
    Infested,
    /// Queen destroyed; the territory is free.
    Liberated,
}

/// Events emitted while advancing a territory.
#[derive(Debug, Clone, PartialEq)]
pub enum TerritoryEvent {
    /// Forwarded queen lifecycle event.
    Queen(QueenEvent),
    /// The queen fell and the territory was liberated.
    Liberated {
        /// Index of the liberated territory.
        territory: usize,
    },
}

/// Spatial ownership region associated with one queen/hive pair.
#[derive(Debug)]
pub struct Territory {
    index: usize,
    center: Vec3,
    radius: f32,
    status: TerritoryStatus,
    queen: Option<Queen>,
    hive: Option<Hive>,
}

impl Territory {
    /// Create an empty, liberated territory.
    #[must_use]
    pub fn new(index: usize, center: Vec3, radius: f32) -> Self {
        Self {
            index,
            center,
            radius,
            status: TerritoryStatus::Liberated,
            queen: None,
            hive: None,
        }
    }

    /// Territory index (the back-reference queens carry).
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Territory center.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Territory radius.
    #[must_use]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Current occupation status.
    #[must_use]
    pub fn status(&self) -> TerritoryStatus {
        self.status
    }

    /// The resident queen, if any.
    #[must_use]
    pub fn queen(&self) -> Option<&Queen> {
        self.queen.as_ref()
    }

    /// Mutable access to the resident queen.
    pub fn queen_mut(&mut self) -> Option<&mut Queen> {
        self.queen.as_mut()
    }

    /// The hive, if founded.
    #[must_use]
    pub fn hive(&self) -> Option<&Hive> {
        self.hive.as_ref()
    }

    /// Mutable access to the hive.
    pub fn hive_mut(&mut self) -> Option<&mut Hive> {
        self.hive.as_mut()
    }

    /// Seed a new queen generation into this territory.
    pub fn infest(
        &mut self,
        queen_id: impl Into<crate::target::EntityId>,
        config: &QueenConfig,
        generation: u32,
        seed: u64,
        terrain: &dyn TerrainSampler,
    ) {
        self.queen = Some(Queen::new(
            queen_id,
            self.index,
            self.center,
            self.radius,
            config,
            generation,
            seed,
            terrain,
        ));
        self.hive = None;
        self.status = TerritoryStatus::Infested;
    }

    /// Advance the resident queen and hive, and run destruction cascades.
    pub fn update(&mut self, dt_secs: f32, terrain: &dyn TerrainSampler) -> Vec<TerritoryEvent> {
        let mut events = Vec::new();

        if let Some(queen) = self.queen.as_mut() {
            for event in queen.update(dt_secs, &mut self.hive, terrain) {
                events.push(TerritoryEvent::Queen(event));
            }
        }

        // Losing the hive kills the queen: the colony cannot survive
        // without it.
        if self.hive.as_ref().is_some_and(Hive::is_destroyed) {
            if let Some(queen) = self.queen.as_mut() {
                if !queen.is_destroyed() {
                    queen.force_destroy();
                }
            }
        }

        if self.queen.as_ref().is_some_and(Queen::is_destroyed) {
            self.liberate();
            events.push(TerritoryEvent::Liberated {
                territory: self.index,
            });
        }

        events
    }

    /// Clear the queen/hive references and mark the territory free.
    pub fn liberate(&mut self) {
        tracing::debug!(territory = self.index, "territory liberated");
        self.queen = None;
        self.hive = None;
        self.status = TerritoryStatus::Liberated;
    }

    /// Combat-target views of whatever is currently attackable here:
    /// the queen while vulnerable, the hive once constructed.
    pub fn attackable_targets(&mut self) -> Vec<&mut dyn CombatTarget> {
        let mut targets: Vec<&mut dyn CombatTarget> = Vec::new();
        if let Some(queen) = self.queen.as_mut() {
            if queen.is_vulnerable() {
                targets.push(queen);
            }
        }
        if let Some(hive) = self.hive.as_mut() {
            if hive.is_vulnerable() {
                targets.push(hive);
            }
        }
        targets
    }
}

impl TargetSupply for Territory {
    fn targets(&mut self) -> Vec<&mut dyn CombatTarget> {
        self.attackable_targets()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hive::HiveConfig;
    use crate::queen::QueenPhase;
    use crate::terrain::FlatTerrain;

    fn instant_queen_config() -> QueenConfig {
        QueenConfig {
            growth_duration_ms: 0.0,
            hive: HiveConfig {
                construction_duration_ms: 0.0,
                ..HiveConfig::default()
            },
            ..QueenConfig::default()
        }
    }

    fn active_territory() -> Territory {
        let terrain = FlatTerrain::default();
        let mut territory = Territory::new(0, Vec3::ZERO, 25.0);
        territory.infest("queen-0", &instant_queen_config(), 1, 7, &terrain);
        for _ in 0..4 {
            territory.update(0.1, &terrain);
        }
        territory
    }

    #[test]
    fn test_infest_and_full_lifecycle() {
        let territory = active_territory();
        assert_eq!(territory.status(), TerritoryStatus::Infested);
        let queen = territory.queen().expect("queen present");
        assert_eq!(queen.current_phase(), QueenPhase::ActiveControl);
        assert!(territory.hive().is_some_and(Hive::is_constructed));
    }

    #[test]
    fn test_attackable_targets_gated_by_state() {
        let terrain = FlatTerrain::default();
        let mut territory = Territory::new(0, Vec3::ZERO, 25.0);
        territory.infest("queen-0", &QueenConfig::default(), 1, 7, &terrain);

        // Growing queen, no hive: nothing attackable.
        assert!(territory.attackable_targets().is_empty());

        let mut territory = active_territory();
        let ids: Vec<String> = territory
            .attackable_targets()
            .iter()
            .map(|t| t.id().to_string())
            .collect();
        assert!(ids.contains(&"queen-0".to_string()));
        assert!(ids.contains(&"queen-0-hive".to_string()));
    }

    #[test]
    fn test_queen_death_liberates() {
        let terrain = FlatTerrain::default();
        let mut territory = active_territory();

        let queen = territory.queen_mut().expect("queen present");
        assert!(queen.take_damage(10_000.0));

        let events = territory.update(0.1, &terrain);
        assert!(events
            .iter()
            .any(|e| matches!(e, TerritoryEvent::Liberated { territory: 0 })));
        assert_eq!(territory.status(), TerritoryStatus::Liberated);
        assert!(territory.queen().is_none());
        assert!(territory.hive().is_none());
    }

    #[test]
    fn test_hive_death_cascades_to_queen() {
        let terrain = FlatTerrain::default();
        let mut territory = active_territory();

        let hive = territory.hive_mut().expect("hive present");
        assert!(hive.take_damage(100_000.0));

        let events = territory.update(0.1, &terrain);
        assert!(events
            .iter()
            .any(|e| matches!(e, TerritoryEvent::Liberated { .. })));
        assert_eq!(territory.status(), TerritoryStatus::Liberated);
        assert!(territory.queen().is_none());
    }
}
