//! Combat orchestration: detection, validation, prioritization, damage
//! resolution, and engagement lifecycle across all protector units.
//!
//! The system is driven by one external per-frame `update(dt)` call and is
//! strictly single-threaded. Engagements live in a `BTreeMap`, so per-tick
//! processing order is the sorted engagement key order — deterministic by
//! construction. Removals are deferred: every live engagement is processed
//! before any is dropped.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec3;

use crate::action::{
    CombatAction, EngagementState, FIRE_DURATION_MS, TURN_DURATION_MS,
};
use crate::config::CombatConfig;
use crate::context::{
    CombatContext, EnergyPool, Protector, ProtectorCombatState, ProtectorStats, ProtectorSupply,
};
use crate::error::{GameError, Result};
use crate::math::approach_point;
use crate::metrics::CombatMetrics;
use crate::priority::{prioritize_targets, select_target_consistently};
use crate::target::{CombatTarget, EntityId, TargetKind, TargetValidation};

/// How often the stale-engagement safety sweep runs.
pub const STALE_SWEEP_INTERVAL_MS: f64 = 5_000.0;

/// Damage multiplier when exactly one protector assaults a hive.
pub const HIVE_SOLO_PENALTY: f32 = 0.6;

/// Coordination bonus per extra attacker on a hive.
pub const HIVE_COORDINATION_PER_ATTACKER: f32 = 0.15;

/// Cap on the hive coordination bonus.
pub const HIVE_COORDINATION_CAP: f32 = 0.5;

/// Why an engagement was interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptReason {
    /// Target drifted beyond attack range and pursuit was abandoned.
    OutOfRange,
    /// The energy pool ran dry.
    EnergyDepleted,
    /// The target stopped being a legal target.
    TargetInvalidated,
    /// The attacking protector was destroyed.
    ProtectorDestroyed,
    /// The target was destroyed.
    TargetDestroyed,
}

impl InterruptReason {
    /// Whether the protector's interrupted movement should resume.
    #[must_use]
    pub const fn resumes_movement(self) -> bool {
        matches!(
            self,
            Self::OutOfRange | Self::EnergyDepleted | Self::TargetInvalidated
        )
    }
}

/// Why an engagement ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    /// The target was destroyed.
    TargetDestroyed,
    /// The protector was destroyed or vanished.
    ProtectorDestroyed,
    /// The target vanished and no replacement was available.
    TargetLost,
    /// The 30-second engagement timeout fired.
    TimedOut,
    /// A newer engagement or an explicit cancel replaced this one.
    Cancelled,
    /// An explicit interruption was requested.
    Interrupted(InterruptReason),
}

/// Externally observable combat effects.
///
/// Everything here is fire-and-forget: rendering, audio-free effects, and
/// UI notices consume these without the core waiting on them.
#[derive(Debug, Clone, PartialEq)]
pub enum CombatEvent {
    /// A protector entered an engagement.
    EngagementStarted {
        /// Attacking protector.
        protector: EntityId,
        /// Target under attack.
        target: EntityId,
        /// True when auto-detected rather than ordered.
        auto: bool,
    },
    /// A shot was fired (damage lands in the same tick's resolution pass).
    AttackFired {
        /// Attacking protector.
        protector: EntityId,
        /// Target under attack.
        target: EntityId,
        /// Damage of this shot before multi-attacker modifiers.
        damage: f32,
    },
    /// Request for a beam effect between two points.
    BeamRequested {
        /// Beam origin.
        from: Vec3,
        /// Beam endpoint.
        to: Vec3,
        /// Suggested effect duration in milliseconds.
        duration_ms: f32,
    },
    /// A shot was skipped because the pool could not cover it. Transient
    /// UI notice only; the engagement retries on its next cycle.
    InsufficientEnergy {
        /// Protector whose shot was skipped.
        protector: EntityId,
        /// Energy one shot would have cost.
        required: f32,
    },
    /// Damage landed on a target.
    TargetDamaged {
        /// Damaged target.
        target: EntityId,
        /// Total damage applied in this resolution pass.
        amount: f32,
        /// How many protectors contributed.
        attackers: u32,
    },
    /// A target was destroyed.
    TargetDestroyed {
        /// Destroyed target.
        target: EntityId,
        /// Kind of the destroyed target.
        kind: TargetKind,
        /// Where it died (for explosion effects).
        position: Vec3,
        /// Protectors whose shots contributed to the killing pass.
        destroyed_by: Vec<EntityId>,
    },
    /// Energy was granted for a kill (`reward_on_kill` only).
    KillReward {
        /// Destroyed target.
        target: EntityId,
        /// Kind of the destroyed target.
        kind: TargetKind,
        /// Energy deposited back into the pool.
        amount: f32,
    },
    /// An engagement ended.
    EngagementCompleted {
        /// Attacking protector.
        protector: EntityId,
        /// Target that was under attack.
        target: EntityId,
        /// Why it ended.
        reason: CompletionReason,
    },
}

/// One shot waiting for the tick's pooled damage-resolution pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingHit {
    /// Protector that fired.
    pub protector_id: EntityId,
    /// Target the shot is aimed at.
    pub target_id: EntityId,
    /// Damage of this shot.
    pub damage: f32,
}

/// Result of one pooled damage application.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageOutcome {
    /// Total damage applied after coordination modifiers.
    pub applied: f32,
    /// Whether the target was destroyed by this application.
    pub destroyed: bool,
}

/// What to do with an action after processing it this tick.
enum ActionOutcome {
    Keep,
    Remove,
    Retarget(EntityId),
}

/// Single authority for target validation, engagement lifecycle, damage
/// resolution, and prioritization across all protector units.
pub struct CombatSystem {
    config: CombatConfig,
    /// Active engagements keyed by `protector:target`. Public so the
    /// relocated integration tests can seed a specific engagement state.
    pub actions: BTreeMap<String, CombatAction>,
    registered: BTreeSet<EntityId>,
    clock_ms: f64,
    last_sweep_ms: f64,
    metrics: CombatMetrics,
    events: Vec<CombatEvent>,
}

impl CombatSystem {
    /// Create a combat system. Rejects invalid configuration up front.
    pub fn new(config: CombatConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            actions: BTreeMap::new(),
            registered: BTreeSet::new(),
            clock_ms: 0.0,
            last_sweep_ms: 0.0,
            metrics: CombatMetrics::default(),
            events: Vec::new(),
        })
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Accumulated simulation clock in milliseconds.
    #[must_use]
    pub fn now_ms(&self) -> f64 {
        self.clock_ms
    }

    /// Number of live engagements.
    #[must_use]
    pub fn engagement_count(&self) -> usize {
        self.actions.len()
    }

    /// The live engagement of a protector, if any.
    #[must_use]
    pub fn engagement_for(&self, protector_id: &str) -> Option<&CombatAction> {
        self.actions
            .values()
            .find(|a| a.protector_id == protector_id)
    }

    /// Whether a protector currently has a live engagement.
    #[must_use]
    pub fn has_engagement_for(&self, protector_id: &str) -> bool {
        self.engagement_for(protector_id).is_some()
    }

    /// Iterate over live engagements in deterministic key order.
    pub fn engagements(&self) -> impl Iterator<Item = &CombatAction> {
        self.actions.values()
    }

    /// Throughput counters (informational only).
    #[must_use]
    pub fn metrics(&self) -> &CombatMetrics {
        &self.metrics
    }

    /// Track a protector for destruction cleanup.
    pub fn register_protector(&mut self, id: impl Into<EntityId>) {
        self.registered.insert(id.into());
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Full validation of an attack order.
    ///
    /// Checks run in a fixed order: corrupt position, friendliness, legal
    /// enemy state, energy affordability, range. The first failure wins.
    pub fn validate_target(
        &mut self,
        protector: &dyn Protector,
        target: &dyn CombatTarget,
        energy: &dyn EnergyPool,
    ) -> TargetValidation {
        self.metrics.record_validation(self.clock_ms);

        if let Some(rejection) = Self::basic_rejection(target) {
            return rejection;
        }
        let cost = self.config.attack_energy_cost;
        if !energy.can_consume(protector.id(), cost) {
            return TargetValidation::InsufficientEnergy { required: cost };
        }
        let distance = protector.position().distance(target.position());
        let max_range = self.config.attack_range;
        if distance > max_range {
            return TargetValidation::OutOfRange {
                distance,
                max_range,
            };
        }
        TargetValidation::Valid {
            distance,
            max_range,
        }
    }

    /// Cheap validation for bulk scanning.
    ///
    /// Skips the energy check — energy changes faster than type/health
    /// validity, and it is re-checked per shot anyway — and additionally
    /// rejects targets with non-finite or zero max health.
    pub fn validate_for_auto_detection(
        &mut self,
        protector: &dyn Protector,
        target: &dyn CombatTarget,
    ) -> TargetValidation {
        self.metrics.record_validation(self.clock_ms);

        if let Some(rejection) = Self::basic_rejection(target) {
            return rejection;
        }
        if !target.max_health().is_finite() || target.max_health() <= 0.0 {
            return TargetValidation::InvalidType;
        }
        TargetValidation::Valid {
            distance: protector.position().distance(target.position()),
            max_range: self.config.attack_range,
        }
    }

    /// Checks shared by both validators: corrupt position, friendliness,
    /// dead or invulnerable targets.
    fn basic_rejection(target: &dyn CombatTarget) -> Option<TargetValidation> {
        if !target.position().is_finite() {
            return Some(TargetValidation::InvalidType);
        }
        if target.is_friendly() {
            return Some(TargetValidation::Friendly);
        }
        if target.health() <= 0.0 || !target.is_vulnerable() {
            return Some(TargetValidation::InvalidType);
        }
        None
    }

    // ========================================================================
    // Detection and prioritization
    // ========================================================================

    /// Ids of attackable enemies within `range` of the protector, in scan
    /// order.
    pub fn detect_nearby_enemies(
        &mut self,
        protector: &dyn Protector,
        range: f32,
        targets: &[&dyn CombatTarget],
    ) -> Vec<EntityId> {
        let origin = protector.position();
        let mut found = Vec::new();
        for target in targets {
            if origin.distance(target.position()) > range {
                continue;
            }
            if self
                .validate_for_auto_detection(protector, *target)
                .is_valid()
            {
                found.push(target.id().to_string());
            }
        }
        found
    }

    /// Deterministically choose the best target among those in detection
    /// range of the protector. `territorial` switches to the
    /// territory-assault scoring variant.
    pub fn select_target(
        &mut self,
        protector: &dyn Protector,
        targets: &[&dyn CombatTarget],
        territorial: bool,
    ) -> Option<EntityId> {
        let range = self.config.detection_range;
        let in_range = self.detect_nearby_enemies(protector, range, targets);
        if in_range.is_empty() {
            return None;
        }
        let candidates: Vec<&dyn CombatTarget> = targets
            .iter()
            .copied()
            .filter(|t| in_range.iter().any(|id| id == t.id()))
            .collect();
        let scored = prioritize_targets(protector.position(), &candidates, range, territorial);
        select_target_consistently(&scored)
    }

    // ========================================================================
    // Engagement initiation
    // ========================================================================

    /// Explicit attack order.
    ///
    /// Unknown ids are caller bugs and fail loudly with an error. Gameplay
    /// rejections come back as the validation value; `Friendly` and
    /// `InvalidType` refuse the engagement, while out-of-range targets are
    /// engaged by closing distance first and low energy is retried at fire
    /// time.
    pub fn initiate_attack(
        &mut self,
        protector_id: &str,
        target_id: &str,
        ctx: &mut CombatContext<'_>,
    ) -> Result<TargetValidation> {
        self.start_engagement(protector_id, target_id, false, ctx)
    }

    /// Engagement triggered by auto-detection during movement.
    pub fn initiate_auto_attack(
        &mut self,
        protector_id: &str,
        target_id: &str,
        ctx: &mut CombatContext<'_>,
    ) -> Result<TargetValidation> {
        self.start_engagement(protector_id, target_id, true, ctx)
    }

    fn start_engagement(
        &mut self,
        protector_id: &str,
        target_id: &str,
        auto: bool,
        ctx: &mut CombatContext<'_>,
    ) -> Result<TargetValidation> {
        let (validation, in_range, protector_pos, target_pos, original_destination) = {
            let protector = ctx
                .protectors
                .protector(protector_id)
                .ok_or_else(|| GameError::ProtectorNotFound(protector_id.to_string()))?;
            let target = ctx
                .targets
                .target(target_id)
                .ok_or_else(|| GameError::TargetNotFound(target_id.to_string()))?;
            let validation = self.validate_target(&*protector, &*target, &*ctx.energy);
            let distance = protector.position().distance(target.position());
            (
                validation,
                distance <= self.config.attack_range,
                protector.position(),
                target.position(),
                protector.original_destination(),
            )
        };

        if matches!(
            validation,
            TargetValidation::Friendly | TargetValidation::InvalidType
        ) {
            return Ok(validation);
        }

        // At most one engagement per protector: a new order replaces the
        // old engagement unconditionally.
        self.cancel_combat(protector_id);
        self.register_protector(protector_id);

        let now = self.clock_ms;
        let mut action = CombatAction::new(protector_id, target_id, EngagementState::Detecting, now);
        action.detection_triggered = auto;
        if auto {
            action.original_destination = original_destination;
        }
        if !in_range {
            action.enter(EngagementState::Engaging, now);
            if let Some(protector) = ctx.protectors.protector(protector_id) {
                protector.move_to(approach_point(
                    protector_pos,
                    target_pos,
                    self.config.attack_range,
                ));
            }
        }
        tracing::debug!(
            protector = protector_id,
            target = target_id,
            auto,
            "engagement started"
        );
        self.events.push(CombatEvent::EngagementStarted {
            protector: protector_id.to_string(),
            target: target_id.to_string(),
            auto,
        });
        self.actions.insert(action.key(), action);
        Ok(validation)
    }

    /// Drop a protector's engagement, if any, without resuming movement.
    pub fn cancel_combat(&mut self, protector_id: &str) {
        let keys: Vec<String> = self
            .actions
            .iter()
            .filter(|(_, a)| a.protector_id == protector_id)
            .map(|(k, _)| k.clone())
            .collect();
        for key in keys {
            if let Some(action) = self.actions.remove(&key) {
                self.events.push(CombatEvent::EngagementCompleted {
                    protector: action.protector_id,
                    target: action.target_id,
                    reason: CompletionReason::Cancelled,
                });
            }
        }
    }

    // ========================================================================
    // Tick processing
    // ========================================================================

    /// Advance combat by `dt_secs`. Returns the tick's emitted events.
    pub fn update(&mut self, dt_secs: f32, ctx: &mut CombatContext<'_>) -> Vec<CombatEvent> {
        self.clock_ms += f64::from(dt_secs) * 1000.0;

        if self.config.auto_attack_enabled {
            self.auto_detection_pass(ctx);
        }

        let mut pending: Vec<PendingHit> = Vec::new();
        self.process_actions(ctx, &mut pending);
        self.apply_pending_damage(pending, ctx);

        if self.clock_ms - self.last_sweep_ms >= STALE_SWEEP_INTERVAL_MS {
            self.last_sweep_ms = self.clock_ms;
            self.sweep_stale(ctx);
        }

        std::mem::take(&mut self.events)
    }

    /// Scan for enemies near protectors that are traveling with
    /// auto-attack enabled and no current engagement.
    fn auto_detection_pass(&mut self, ctx: &mut CombatContext<'_>) {
        let mut eligible: Vec<EntityId> = Vec::new();
        {
            let mut protectors = ctx.protectors.protectors();
            protectors.sort_by(|a, b| a.id().cmp(b.id()));
            for protector in &protectors {
                let stats = protector.stats();
                if !stats.auto_attack_enabled
                    || stats.combat_state != ProtectorCombatState::Moving
                {
                    continue;
                }
                if self.has_engagement_for(protector.id()) {
                    continue;
                }
                eligible.push(protector.id().to_string());
            }
        }

        for protector_id in eligible {
            let selected = {
                let targets = ctx.targets.targets();
                let views: Vec<&dyn CombatTarget> = targets.iter().map(|t| &**t).collect();
                let Some(protector) = ctx.protectors.protector(&protector_id) else {
                    continue;
                };
                self.select_target(&*protector, &views, false)
            };
            if let Some(target_id) = selected {
                // Unknown-id errors cannot happen here; both sides were
                // just resolved from the same supplies.
                let _ = self.start_engagement(&protector_id, &target_id, true, ctx);
            }
        }
    }

    fn process_actions(&mut self, ctx: &mut CombatContext<'_>, pending: &mut Vec<PendingHit>) {
        let keys: Vec<String> = self.actions.keys().cloned().collect();
        for key in keys {
            let Some(mut action) = self.actions.remove(&key) else {
                continue;
            };
            match self.process_action(&mut action, ctx, pending) {
                ActionOutcome::Keep => {
                    self.actions.insert(key, action);
                }
                ActionOutcome::Remove => {}
                ActionOutcome::Retarget(new_target) => {
                    let protector_id = action.protector_id.clone();
                    let carried_destination = action.original_destination;
                    let auto = action.detection_triggered;
                    if self
                        .start_engagement(&protector_id, &new_target, auto, ctx)
                        .is_ok()
                    {
                        let new_key = CombatAction::engagement_key(&protector_id, &new_target);
                        if let Some(replacement) = self.actions.get_mut(&new_key) {
                            if replacement.original_destination.is_none() {
                                replacement.original_destination = carried_destination;
                            }
                        }
                    }
                }
            }
        }
    }

    fn process_action(
        &mut self,
        action: &mut CombatAction,
        ctx: &mut CombatContext<'_>,
        pending: &mut Vec<PendingHit>,
    ) -> ActionOutcome {
        let now = self.clock_ms;

        let Some((protector_pos, stats)) = ctx
            .protectors
            .protector(&action.protector_id)
            .map(|p| (p.position(), p.stats()))
        else {
            self.events.push(CombatEvent::EngagementCompleted {
                protector: action.protector_id.clone(),
                target: action.target_id.clone(),
                reason: CompletionReason::ProtectorDestroyed,
            });
            return ActionOutcome::Remove;
        };

        match action.state {
            EngagementState::Completed => return ActionOutcome::Remove,
            EngagementState::ResumingMovement => {
                // Completion event fired when this state was entered; the
                // slot just drains now.
                return ActionOutcome::Remove;
            }
            _ => {}
        }

        // Hard timeout: whatever phase the action is in, it ends now.
        if action.is_expired(now) {
            self.finish_action(action, ctx.protectors, CompletionReason::TimedOut, true);
            return ActionOutcome::Remove;
        }

        // Resolve the live target; anything dead, missing, or invalid
        // counts as lost.
        let target_pos: Option<Vec3> = ctx.targets.target(&action.target_id).and_then(|t| {
            if Self::basic_rejection(&*t).is_none() {
                Some(t.position())
            } else {
                None
            }
        });

        let Some(target_pos) = target_pos else {
            // Target lost: re-target if anything valid is nearby,
            // otherwise wind the engagement down.
            if let Some(replacement) = self.find_replacement_target(&action.protector_id, ctx) {
                return ActionOutcome::Retarget(replacement);
            }
            self.finish_action(action, ctx.protectors, CompletionReason::TargetLost, true);
            action.enter(EngagementState::ResumingMovement, now);
            return ActionOutcome::Keep;
        };

        // Track the live target position every tick.
        if let Some(protector) = ctx.protectors.protector(&action.protector_id) {
            protector.face_toward(target_pos);
        }

        let distance = protector_pos.distance(target_pos);
        let attack_range = self.config.attack_range;

        match action.state {
            EngagementState::Moving => {
                if distance <= self.config.detection_range {
                    action.enter(EngagementState::Detecting, now);
                }
            }
            EngagementState::Engaging => {
                if distance <= attack_range {
                    if let Some(protector) = ctx.protectors.protector(&action.protector_id) {
                        protector.stop_movement();
                    }
                    action.enter(EngagementState::Detecting, now);
                }
            }
            state if state.is_attacking() && distance > attack_range => {
                // Target slipped out of range mid-fight: close back in.
                action.enter(EngagementState::Engaging, now);
                if let Some(protector) = ctx.protectors.protector(&action.protector_id) {
                    protector.move_to(approach_point(protector_pos, target_pos, attack_range));
                }
            }
            EngagementState::Detecting => {
                action.enter(EngagementState::Turning, now);
            }
            EngagementState::Turning => {
                if action.phase_elapsed_ms(now) >= TURN_DURATION_MS {
                    self.try_fire(action, &stats, protector_pos, target_pos, ctx.energy, pending);
                }
            }
            EngagementState::Firing => {
                if action.phase_elapsed_ms(now) >= FIRE_DURATION_MS {
                    action.enter(EngagementState::Cooldown, now);
                }
            }
            EngagementState::Cooldown => {
                if action.phase_elapsed_ms(now) >= self.config.attack_cooldown_ms {
                    action.enter(EngagementState::Detecting, now);
                }
            }
            EngagementState::ResumingMovement | EngagementState::Completed => {}
        }

        ActionOutcome::Keep
    }

    /// Fire one shot on the turning-to-firing transition.
    ///
    /// Energy affordability is re-checked here — it may have been spent
    /// elsewhere since detection. An unaffordable shot is skipped without
    /// resetting the cooldown; the turn restarts and retries.
    fn try_fire(
        &mut self,
        action: &mut CombatAction,
        stats: &ProtectorStats,
        protector_pos: Vec3,
        target_pos: Vec3,
        energy: &mut dyn EnergyPool,
        pending: &mut Vec<PendingHit>,
    ) {
        let now = self.clock_ms;
        let cost = self.config.attack_energy_cost;
        if !energy.consume(&action.protector_id, cost, "attack") {
            self.events.push(CombatEvent::InsufficientEnergy {
                protector: action.protector_id.clone(),
                required: cost,
            });
            action.enter(EngagementState::Turning, now);
            return;
        }

        let damage = stats.attack_damage + (stats.combat_experience / 10) as f32;
        pending.push(PendingHit {
            protector_id: action.protector_id.clone(),
            target_id: action.target_id.clone(),
            damage,
        });
        action.last_attack_ms = now;
        self.metrics.record_attack(now);
        self.events.push(CombatEvent::AttackFired {
            protector: action.protector_id.clone(),
            target: action.target_id.clone(),
            damage,
        });
        self.events.push(CombatEvent::BeamRequested {
            from: protector_pos,
            to: target_pos,
            duration_ms: FIRE_DURATION_MS as f32,
        });
        action.enter(EngagementState::Firing, now);
    }

    /// Find a replacement target in detection range after target loss.
    fn find_replacement_target(
        &mut self,
        protector_id: &str,
        ctx: &mut CombatContext<'_>,
    ) -> Option<EntityId> {
        let targets = ctx.targets.targets();
        let views: Vec<&dyn CombatTarget> = targets.iter().map(|t| &**t).collect();
        let protector = ctx.protectors.protector(protector_id)?;
        self.select_target(&*protector, &views, false)
    }

    /// Emit the completion event, clear the facing lock, and optionally
    /// resume the interrupted movement.
    fn finish_action(
        &mut self,
        action: &CombatAction,
        protectors: &mut dyn ProtectorSupply,
        reason: CompletionReason,
        resume: bool,
    ) {
        if let Some(protector) = protectors.protector(&action.protector_id) {
            protector.clear_facing();
            if resume {
                if let Some(destination) = action.original_destination {
                    protector.move_to(destination);
                }
            }
        }
        self.events.push(CombatEvent::EngagementCompleted {
            protector: action.protector_id.clone(),
            target: action.target_id.clone(),
            reason,
        });
    }

    // ========================================================================
    // Damage resolution
    // ========================================================================

    /// Sum all shots landing on one target this pass and apply them in a
    /// single `take_damage` call, so hits that are individually
    /// sub-lethal but collectively lethal still destroy the target.
    ///
    /// Hive assaults are shaped further: a lone attacker is penalized
    /// (hives resist single-unit sieges) and coordinated groups gain up to
    /// +50%.
    pub fn coordinate_multi_protector_damage(
        target: &mut dyn CombatTarget,
        hits: &[PendingHit],
    ) -> DamageOutcome {
        if hits.is_empty() {
            return DamageOutcome {
                applied: 0.0,
                destroyed: false,
            };
        }
        let raw: f32 = hits.iter().map(|h| h.damage).sum();
        let total = if target.kind() == TargetKind::Hive {
            let attackers = hits.len();
            if attackers == 1 {
                raw * HIVE_SOLO_PENALTY
            } else {
                let bonus = ((attackers - 1) as f32 * HIVE_COORDINATION_PER_ATTACKER)
                    .min(HIVE_COORDINATION_CAP);
                raw * (1.0 + bonus)
            }
        } else {
            raw
        };
        let destroyed = target.take_damage(total);
        DamageOutcome {
            applied: total,
            destroyed,
        }
    }

    fn apply_pending_damage(&mut self, pending: Vec<PendingHit>, ctx: &mut CombatContext<'_>) {
        let mut by_target: BTreeMap<EntityId, Vec<PendingHit>> = BTreeMap::new();
        for hit in pending {
            by_target.entry(hit.target_id.clone()).or_default().push(hit);
        }

        for (target_id, hits) in by_target {
            let Some(target) = ctx.targets.target(&target_id) else {
                continue;
            };
            let outcome = Self::coordinate_multi_protector_damage(&mut *target, &hits);
            self.events.push(CombatEvent::TargetDamaged {
                target: target_id.clone(),
                amount: outcome.applied,
                attackers: hits.len() as u32,
            });
            if !outcome.destroyed {
                continue;
            }

            let kind = target.kind();
            let position = target.position();
            let killers: Vec<EntityId> = hits.iter().map(|h| h.protector_id.clone()).collect();

            if self.config.reward_on_kill {
                let reward = self.config.energy_reward(kind);
                if reward > 0.0 {
                    ctx.energy.deposit(reward, "kill_reward");
                    self.events.push(CombatEvent::KillReward {
                        target: target_id.clone(),
                        kind,
                        amount: reward,
                    });
                }
            }

            // Engagement cleanup runs before the target's own destruction
            // hook.
            self.handle_target_destruction(&target_id, ctx.protectors);
            target.on_destroyed();
            self.events.push(CombatEvent::TargetDestroyed {
                target: target_id,
                kind,
                position,
                destroyed_by: killers,
            });
        }
    }

    // ========================================================================
    // Destruction and interruption cleanup
    // ========================================================================

    /// Cancel every engagement referencing a destroyed target, clearing
    /// facing locks and resuming interrupted movement.
    pub fn handle_target_destruction(
        &mut self,
        target_id: &str,
        protectors: &mut dyn ProtectorSupply,
    ) {
        let keys: Vec<String> = self
            .actions
            .iter()
            .filter(|(_, a)| a.target_id == target_id)
            .map(|(k, _)| k.clone())
            .collect();
        for key in keys {
            if let Some(action) = self.actions.remove(&key) {
                self.finish_action(
                    &action,
                    protectors,
                    CompletionReason::TargetDestroyed,
                    true,
                );
            }
        }
    }

    /// Cancel all engagements involving a destroyed protector and
    /// deregister it.
    pub fn handle_protector_destruction(&mut self, protector_id: &str) {
        let keys: Vec<String> = self
            .actions
            .iter()
            .filter(|(_, a)| a.protector_id == protector_id)
            .map(|(k, _)| k.clone())
            .collect();
        for key in keys {
            if let Some(action) = self.actions.remove(&key) {
                self.events.push(CombatEvent::EngagementCompleted {
                    protector: action.protector_id,
                    target: action.target_id,
                    reason: CompletionReason::ProtectorDestroyed,
                });
            }
        }
        self.registered.remove(protector_id);
    }

    /// Generic escape hatch for ending an engagement early.
    ///
    /// Movement resumes for reasons where the protector is still alive
    /// and able (out of range, energy depleted, target invalidated).
    pub fn handle_combat_interruption(
        &mut self,
        protector_id: &str,
        target_id: &str,
        reason: InterruptReason,
        protectors: &mut dyn ProtectorSupply,
    ) {
        let key = CombatAction::engagement_key(protector_id, target_id);
        if let Some(action) = self.actions.remove(&key) {
            self.finish_action(
                &action,
                protectors,
                CompletionReason::Interrupted(reason),
                reason.resumes_movement(),
            );
        }
    }

    /// Safety net independent of per-tick cleanup: drop engagements past
    /// the hard timeout or referencing vanished protectors.
    fn sweep_stale(&mut self, ctx: &mut CombatContext<'_>) {
        let now = self.clock_ms;
        let stale: Vec<(String, CompletionReason)> = self
            .actions
            .iter()
            .filter_map(|(key, action)| {
                if action.is_expired(now) {
                    Some((key.clone(), CompletionReason::TimedOut))
                } else if !ctx.protectors.contains(&action.protector_id) {
                    Some((key.clone(), CompletionReason::ProtectorDestroyed))
                } else {
                    None
                }
            })
            .collect();

        if !stale.is_empty() {
            tracing::debug!(count = stale.len(), "swept stale engagements");
        }
        for (key, reason) in stale {
            if let Some(action) = self.actions.remove(&key) {
                self.events.push(CombatEvent::EngagementCompleted {
                    protector: action.protector_id,
                    target: action.target_id,
                    reason,
                });
            }
        }
        let registered = std::mem::take(&mut self.registered);
        self.registered = registered
            .into_iter()
            .filter(|id| ctx.protectors.contains(id))
            .collect();
    }
}

