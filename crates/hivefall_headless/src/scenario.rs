//! Scenario definitions loaded from RON files.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use hivefall_core::config::CombatConfig;
use hivefall_core::parasite::ParasiteConfig;
use hivefall_core::queen::QueenConfig;

/// Errors from loading or validating a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// Scenario file could not be read.
    #[error("Failed to read scenario file: {0}")]
    Io(#[from] std::io::Error),

    /// Scenario file could not be parsed as RON.
    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Scenario carried an invalid simulation config.
    #[error(transparent)]
    Game(#[from] hivefall_core::error::GameError),

    /// Scenario has no content to run.
    #[error("Scenario '{0}' has no protectors or territories")]
    Empty(String),
}

/// One protector unit placed into the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectorSpawn {
    /// Unit id.
    pub id: String,
    /// Spawn position.
    pub position: [f32; 3],
    /// Initial travel order, if any (enables auto-engagement en route).
    pub destination: Option<[f32; 3]>,
    /// Base damage per shot.
    pub attack_damage: f32,
    /// Accumulated combat experience.
    pub combat_experience: u32,
    /// Per-unit auto-attack opt-in.
    pub auto_attack: bool,
}

/// One infested territory placed into the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerritorySpawn {
    /// Territory center.
    pub center: [f32; 3],
    /// Territory radius.
    pub radius: f32,
}

/// A complete headless run description.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Scenario name, echoed in the summary.
    pub name: String,
    /// Seed for all per-entity PRNGs.
    pub seed: u64,
    /// Simulated run length in seconds.
    pub duration_secs: f32,
    /// Fixed tick length in milliseconds.
    pub tick_ms: f64,
    /// Starting global energy budget.
    pub energy_budget: f32,
    /// Cap on simultaneously live parasites.
    pub max_parasites: usize,
    /// Combat tuning.
    pub combat: CombatConfig,
    /// Queen tuning for every territory.
    pub queen: QueenConfig,
    /// Tuning for queen-spawned parasites.
    pub parasite: ParasiteConfig,
    /// Protector units.
    pub protectors: Vec<ProtectorSpawn>,
    /// Infested territories.
    pub territories: Vec<TerritorySpawn>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            name: "skirmish".to_string(),
            seed: 7,
            duration_secs: 120.0,
            tick_ms: 50.0,
            energy_budget: 500.0,
            max_parasites: 40,
            combat: CombatConfig::default(),
            queen: QueenConfig {
                growth_duration_ms: 5_000.0,
                ..QueenConfig::default()
            },
            parasite: ParasiteConfig::default(),
            protectors: vec![
                ProtectorSpawn {
                    id: "protector-1".to_string(),
                    position: [-20.0, 0.0, 0.0],
                    destination: Some([30.0, 0.0, 0.0]),
                    attack_damage: 12.0,
                    combat_experience: 0,
                    auto_attack: true,
                },
                ProtectorSpawn {
                    id: "protector-2".to_string(),
                    position: [-20.0, 0.0, 5.0],
                    destination: Some([30.0, 0.0, 5.0]),
                    attack_damage: 12.0,
                    combat_experience: 20,
                    auto_attack: true,
                },
            ],
            territories: vec![TerritorySpawn {
                center: [25.0, 0.0, 0.0],
                radius: 20.0,
            }],
        }
    }
}

impl ScenarioConfig {
    /// Parse a scenario from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, ScenarioError> {
        let scenario: Self = ron::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Load and validate a scenario file.
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    /// Check the scenario can actually run.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        self.combat.validate()?;
        if self.protectors.is_empty() && self.territories.is_empty() {
            return Err(ScenarioError::Empty(self.name.clone()));
        }
        Ok(())
    }
}
