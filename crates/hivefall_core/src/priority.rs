//! Target priority scoring and deterministic selection.
//!
//! Scores are plain f32 sums; determinism comes from the tie-break rule:
//! scores within [`PRIORITY_EPSILON`] of each other are treated as equal,
//! and equal scores are ordered by ascending lexicographic id. This keeps
//! target selection reproducible across runs and replays.

use glam::Vec3;

use crate::target::{CombatTarget, EntityId, TargetKind};

/// Score difference below which two targets are considered tied.
pub const PRIORITY_EPSILON: f32 = 0.001;

/// Base score every valid target starts from.
const BASE_SCORE: f32 = 100.0;

/// Maximum proximity bonus (closest possible target).
const PROXIMITY_WEIGHT: f32 = 50.0;

/// Maximum low-health bonus (finish off weak targets).
const LOW_HEALTH_WEIGHT: f32 = 20.0;

/// A target id with its computed priority score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTarget {
    /// Target id.
    pub id: EntityId,
    /// Priority score; higher is more urgent.
    pub score: f32,
}

/// Standard priority score for one target.
///
/// `100 + proximity (≤50) + low-health (≤20) + kind bonus`. Vulnerability
/// is not re-checked here; callers validate before scoring.
#[must_use]
pub fn priority_score(protector_pos: Vec3, target: &dyn CombatTarget, detection_range: f32) -> f32 {
    BASE_SCORE
        + proximity_bonus(protector_pos, target, detection_range)
        + low_health_bonus(target)
        + kind_bonus(target.kind())
}

/// Territory-assault variant: queens and hives weigh heavier, and a
/// defended hive gains up to +30 with its active defender count.
#[must_use]
pub fn territorial_priority_score(
    protector_pos: Vec3,
    target: &dyn CombatTarget,
    detection_range: f32,
) -> f32 {
    let defense_bonus = match target.kind() {
        TargetKind::Hive => (target.defender_count() as f32 * 5.0).min(30.0),
        _ => 0.0,
    };
    BASE_SCORE
        + proximity_bonus(protector_pos, target, detection_range)
        + low_health_bonus(target)
        + territorial_kind_bonus(target.kind())
        + defense_bonus
}

fn proximity_bonus(protector_pos: Vec3, target: &dyn CombatTarget, detection_range: f32) -> f32 {
    if detection_range <= 0.0 {
        return 0.0;
    }
    let distance = protector_pos.distance(target.position());
    PROXIMITY_WEIGHT * (1.0 - distance / detection_range).clamp(0.0, 1.0)
}

fn low_health_bonus(target: &dyn CombatTarget) -> f32 {
    LOW_HEALTH_WEIGHT * (1.0 - target.health() / target.max_health()).clamp(0.0, 1.0)
}

fn kind_bonus(kind: TargetKind) -> f32 {
    match kind {
        TargetKind::EnergyParasite => 30.0,
        TargetKind::Queen => 100.0,
        TargetKind::Hive => 80.0,
        TargetKind::Parasite | TargetKind::PlayerUnit => 0.0,
    }
}

fn territorial_kind_bonus(kind: TargetKind) -> f32 {
    match kind {
        TargetKind::EnergyParasite => 30.0,
        TargetKind::Queen => 150.0,
        TargetKind::Hive => 120.0,
        TargetKind::Parasite | TargetKind::PlayerUnit => 0.0,
    }
}

/// Score and sort candidates, highest priority first.
///
/// Ties (scores within [`PRIORITY_EPSILON`]) are ordered by ascending id.
#[must_use]
pub fn prioritize_targets(
    protector_pos: Vec3,
    candidates: &[&dyn CombatTarget],
    detection_range: f32,
    territorial: bool,
) -> Vec<ScoredTarget> {
    let mut scored: Vec<ScoredTarget> = candidates
        .iter()
        .map(|target| {
            let score = if territorial {
                territorial_priority_score(protector_pos, *target, detection_range)
            } else {
                priority_score(protector_pos, *target, detection_range)
            };
            ScoredTarget {
                id: target.id().to_string(),
                score,
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        if (a.score - b.score).abs() < PRIORITY_EPSILON {
            a.id.cmp(&b.id)
        } else {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        }
    });
    scored
}

/// Single deterministic choice among scored candidates.
///
/// Picks the maximum score; among candidates within [`PRIORITY_EPSILON`]
/// of the maximum, the lexicographically smallest id wins.
#[must_use]
pub fn select_target_consistently(scored: &[ScoredTarget]) -> Option<EntityId> {
    let best_score = scored
        .iter()
        .map(|s| s.score)
        .fold(f32::NEG_INFINITY, f32::max);
    scored
        .iter()
        .filter(|s| (best_score - s.score) < PRIORITY_EPSILON)
        .map(|s| s.id.clone())
        .min()
}

