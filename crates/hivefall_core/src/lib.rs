//! # Hivefall Core
//!
//! Deterministic combat and lifecycle simulation core for Hivefall.
//!
//! This crate contains **only** tick-driven simulation logic:
//! - No rendering
//! - No IO
//! - No system randomness (patrol behavior uses per-entity seeded PRNGs)
//! - No threads; one external `update(dt)` call drives everything
//!
//! Determinism is ordering-based: engagements are processed in sorted key
//! order, target ties are broken by ascending lexicographic id, and all
//! shared state is touched from a single update cycle.
//!
//! ## Crate Structure
//!
//! - [`combat`] - engagement lifecycle, validation, damage resolution
//! - [`action`] - per-engagement phase state machine
//! - [`priority`] - target scoring with deterministic tie-breaking
//! - [`queen`] / [`hive`] / [`territory`] - hostile lifecycle machines
//! - [`parasite`] - shared roaming/regeneration base
//! - [`context`] - collaborator traits injected into each tick

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod action;
pub mod combat;
pub mod config;
pub mod context;
pub mod error;
pub mod hive;
pub mod math;
pub mod metrics;
pub mod parasite;
pub mod priority;
pub mod queen;
pub mod target;
pub mod terrain;
pub mod territory;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::action::{CombatAction, EngagementState};
    pub use crate::combat::{
        CombatEvent, CombatSystem, CompletionReason, InterruptReason, PendingHit,
    };
    pub use crate::config::CombatConfig;
    pub use crate::context::{
        CombatContext, EnergyPool, Protector, ProtectorCombatState, ProtectorStats,
        ProtectorSupply, TargetSupply,
    };
    pub use crate::error::{GameError, Result};
    pub use crate::hive::{Hive, HiveConfig};
    pub use crate::parasite::{Parasite, ParasiteConfig, ParasiteKind};
    pub use crate::queen::{Queen, QueenConfig, QueenEvent, QueenPhase};
    pub use crate::target::{CombatTarget, EntityId, TargetKind, TargetValidation, Vitals};
    pub use crate::terrain::{FlatTerrain, TerrainSampler};
    pub use crate::territory::{Territory, TerritoryEvent, TerritoryStatus};
}
