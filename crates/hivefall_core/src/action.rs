//! Per-engagement state.
//!
//! A [`CombatAction`] is the stateful record of one protector's ongoing
//! fight with one target. The combat system advances its phase machine
//! every tick; the action itself only does timer bookkeeping.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::target::EntityId;

/// Time spent turning toward the target before a shot, in milliseconds.
pub const TURN_DURATION_MS: f64 = 300.0;

/// Duration of the firing phase (and of the beam effect), in milliseconds.
pub const FIRE_DURATION_MS: f64 = 250.0;

/// Hard wall-clock cap on any engagement. Whatever phase an action is in,
/// it is forced to complete this long after it started, so stuck
/// engagements cannot leak state forever.
pub const ENGAGEMENT_TIMEOUT_MS: f64 = 30_000.0;

/// Phase of an engagement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngagementState {
    /// Traveling under orders, watching for enemies.
    Moving,
    /// Target acquired; transitions onward immediately.
    Detecting,
    /// Turning toward the target before firing.
    Turning,
    /// Shot in flight; the damage was applied on entry to this phase.
    Firing,
    /// Waiting out the attack cooldown.
    Cooldown,
    /// Closing distance to get back into attack range.
    Engaging,
    /// Handing movement back to the interrupted order.
    ResumingMovement,
    /// Terminal; the action is removed.
    Completed,
}

impl EngagementState {
    /// States in which the action counts as actively attacking its target
    /// (used for multi-attacker coordination).
    #[must_use]
    pub const fn is_attacking(self) -> bool {
        matches!(
            self,
            Self::Detecting | Self::Turning | Self::Firing | Self::Cooldown
        )
    }
}

/// One active protector-target engagement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatAction {
    /// Attacking protector.
    pub protector_id: EntityId,
    /// Target under attack.
    pub target_id: EntityId,
    /// Current phase.
    pub state: EngagementState,
    /// Clock time (ms) the engagement was created.
    pub started_at_ms: f64,
    /// Clock time (ms) the current phase was entered.
    pub phase_started_at_ms: f64,
    /// Clock time (ms) of the most recent shot, 0 before the first.
    pub last_attack_ms: f64,
    /// Where the protector was headed before combat interrupted it, if
    /// anywhere; restored when the engagement ends.
    pub original_destination: Option<Vec3>,
    /// True when the engagement came from auto-detection rather than an
    /// explicit attack order.
    pub detection_triggered: bool,
}

impl CombatAction {
    /// Create a fresh action in the given initial state.
    #[must_use]
    pub fn new(
        protector_id: impl Into<EntityId>,
        target_id: impl Into<EntityId>,
        state: EngagementState,
        now_ms: f64,
    ) -> Self {
        Self {
            protector_id: protector_id.into(),
            target_id: target_id.into(),
            state,
            started_at_ms: now_ms,
            phase_started_at_ms: now_ms,
            last_attack_ms: 0.0,
            original_destination: None,
            detection_triggered: false,
        }
    }

    /// Deterministic composite key for an engagement pair. Re-engaging the
    /// same pair resumes the same slot.
    #[must_use]
    pub fn engagement_key(protector_id: &str, target_id: &str) -> String {
        format!("{protector_id}|{target_id}")
    }

    /// Key of this action's engagement slot.
    #[must_use]
    pub fn key(&self) -> String {
        Self::engagement_key(&self.protector_id, &self.target_id)
    }

    /// Move to a new phase, restarting the phase timer.
    pub fn enter(&mut self, state: EngagementState, now_ms: f64) {
        self.state = state;
        self.phase_started_at_ms = now_ms;
    }

    /// Milliseconds spent in the current phase.
    #[must_use]
    pub fn phase_elapsed_ms(&self, now_ms: f64) -> f64 {
        now_ms - self.phase_started_at_ms
    }

    /// Milliseconds since the engagement started.
    #[must_use]
    pub fn age_ms(&self, now_ms: f64) -> f64 {
        now_ms - self.started_at_ms
    }

    /// Whether the hard engagement timeout has elapsed.
    #[must_use]
    pub fn is_expired(&self, now_ms: f64) -> bool {
        self.age_ms(now_ms) >= ENGAGEMENT_TIMEOUT_MS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engagement_key_is_deterministic_composite() {
        let action = CombatAction::new("p-1", "t-9", EngagementState::Detecting, 0.0);
        assert_eq!(action.key(), "p-1|t-9");
        assert_eq!(CombatAction::engagement_key("p-1", "t-9"), action.key());
    }

    #[test]
    fn test_enter_restarts_phase_timer() {
        let mut action = CombatAction::new("p", "t", EngagementState::Detecting, 100.0);
        assert_eq!(action.phase_elapsed_ms(400.0), 300.0);

        action.enter(EngagementState::Turning, 400.0);
        assert_eq!(action.state, EngagementState::Turning);
        assert_eq!(action.phase_elapsed_ms(400.0), 0.0);
        // Engagement age is unaffected by phase changes.
        assert_eq!(action.age_ms(400.0), 300.0);
    }

    #[test]
    fn test_expiry() {
        let action = CombatAction::new("p", "t", EngagementState::Cooldown, 1000.0);
        assert!(!action.is_expired(1000.0 + ENGAGEMENT_TIMEOUT_MS - 1.0));
        assert!(action.is_expired(1000.0 + ENGAGEMENT_TIMEOUT_MS));
    }

    #[test]
    fn test_attacking_states() {
        assert!(EngagementState::Detecting.is_attacking());
        assert!(EngagementState::Turning.is_attacking());
        assert!(EngagementState::Firing.is_attacking());
        assert!(EngagementState::Cooldown.is_attacking());
        assert!(!EngagementState::Engaging.is_attacking());
        assert!(!EngagementState::Moving.is_attacking());
        assert!(!EngagementState::Completed.is_attacking());
    }
}
