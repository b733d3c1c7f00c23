//! Headless Hivefall runner.
//!
//! Owns the world state the combat core treats as external — protector
//! units, free parasites, territories, the energy pool — and drives the
//! per-frame `update(dt)` calls. Used for CI smoke runs and balance
//! experiments without a renderer.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod scenario;
pub mod world;

pub use scenario::{ProtectorSpawn, ScenarioConfig, ScenarioError, TerritorySpawn};
pub use world::{RunSummary, World};
