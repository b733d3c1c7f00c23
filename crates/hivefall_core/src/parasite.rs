//! Shared roaming behavior for parasite-like entities.
//!
//! Queens and generic parasites move the same way: pick a random patrol
//! point inside their territory, travel to it following terrain height and
//! slope, pause, repeat. Health regenerates passively while paused. The
//! base exists so every parasite-like entity stays behaviorally consistent
//! without duplicating the terrain-following math.
//!
//! Randomness is confined to patrol-point selection and always comes from
//! a per-entity seeded PRNG, never from system entropy.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::math::{approach_angle, clamp_angle, horizontal_distance, move_toward, yaw_toward};
use crate::target::{CombatTarget, EntityId, TargetKind, Vitals};
use crate::terrain::TerrainSampler;

/// XZ distance below which a patrol target counts as reached.
const ARRIVAL_THRESHOLD: f32 = 0.2;

/// Pitch/roll never exceeds this while following terrain slope.
const SLOPE_LIMIT_RAD: f32 = std::f32::consts::PI / 6.0; // 30 degrees

/// Parasite variant. Determines the combat-target kind and little else;
/// stats differences come from [`ParasiteConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ParasiteKind {
    /// Standard hostile spawn.
    #[default]
    Combat,
    /// Energy-carrying variant; protectors prioritize these.
    Energy,
}

impl ParasiteKind {
    /// Combat-target kind for this variant.
    #[must_use]
    pub const fn target_kind(self) -> TargetKind {
        match self {
            Self::Combat => TargetKind::Parasite,
            Self::Energy => TargetKind::EnergyParasite,
        }
    }
}

/// Tuning for a parasite variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParasiteConfig {
    /// Movement speed in units per second.
    pub speed: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Passive healing per second while paused. 0 disables regen.
    pub regen_per_sec: f32,
    /// Height offset above sampled terrain.
    pub roam_height: f32,
    /// Minimum pause between patrol legs, in milliseconds.
    pub pause_min_ms: f64,
    /// Maximum pause between patrol legs, in milliseconds.
    pub pause_max_ms: f64,
    /// Sampling offset used to estimate terrain slope.
    pub slope_sample_distance: f32,
    /// How fast pitch/roll chase the terrain gradient, radians per second.
    pub tilt_rate_rad_per_sec: f32,
}

impl Default for ParasiteConfig {
    fn default() -> Self {
        Self {
            speed: 2.5,
            max_health: 30.0,
            regen_per_sec: 0.0,
            roam_height: 0.5,
            pause_min_ms: 1_500.0,
            pause_max_ms: 4_000.0,
            slope_sample_distance: 0.5,
            tilt_rate_rad_per_sec: std::f32::consts::PI / 2.0,
        }
    }
}

/// Patrol cycle state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoamState {
    /// Resting; regen applies. Counts down to the next patrol leg.
    Paused {
        /// Milliseconds until the next leg starts.
        remaining_ms: f64,
    },
    /// Walking toward a patrol point.
    Traveling {
        /// Current patrol destination.
        target: Vec3,
    },
}

/// A roaming hostile entity; also the movement body of a queen.
#[derive(Debug, Clone)]
pub struct Parasite {
    id: EntityId,
    kind: ParasiteKind,
    position: Vec3,
    /// Health pool; public so owners (queen) can share it.
    pub vitals: Vitals,
    speed: f32,
    territory_center: Vec3,
    territory_radius: f32,
    patrol_min_radius: f32,
    roam: RoamState,
    regen_per_sec: f32,
    roam_height: f32,
    pause_min_ms: f64,
    pause_max_ms: f64,
    slope_sample_distance: f32,
    tilt_rate_rad_per_sec: f32,
    yaw: f32,
    pitch: f32,
    roll: f32,
    rng: ChaCha8Rng,
    destroyed: bool,
}

impl Parasite {
    /// Create a parasite at its territory center.
    #[must_use]
    pub fn new(
        id: impl Into<EntityId>,
        kind: ParasiteKind,
        territory_center: Vec3,
        territory_radius: f32,
        config: &ParasiteConfig,
        seed: u64,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            position: territory_center,
            vitals: Vitals::new(config.max_health),
            speed: config.speed,
            territory_center,
            territory_radius,
            patrol_min_radius: 0.0,
            roam: RoamState::Paused {
                remaining_ms: config.pause_min_ms,
            },
            regen_per_sec: config.regen_per_sec,
            roam_height: config.roam_height,
            pause_min_ms: config.pause_min_ms,
            pause_max_ms: config.pause_max_ms,
            slope_sample_distance: config.slope_sample_distance,
            tilt_rate_rad_per_sec: config.tilt_rate_rad_per_sec,
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
            rng: ChaCha8Rng::seed_from_u64(seed),
            destroyed: false,
        }
    }

    /// Builder: keep patrol points at least this far from the center
    /// (queens roam an annulus around their hive).
    #[must_use]
    pub fn with_patrol_min_radius(mut self, radius: f32) -> Self {
        self.patrol_min_radius = radius;
        self
    }

    /// Stable id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Variant of this parasite.
    #[must_use]
    pub fn kind(&self) -> ParasiteKind {
        self.kind
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Overwrite the position (spawn placement, queen phase changes).
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Move the roaming anchor (queen adopts its hive as patrol center).
    pub fn set_territory(&mut self, center: Vec3, radius: f32) {
        self.territory_center = center;
        self.territory_radius = radius;
    }

    /// Whether the entity has been destroyed.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Mark destroyed without going through damage (cascade kills).
    pub fn force_destroy(&mut self) {
        self.destroyed = true;
        self.vitals.current = 0.0;
    }

    /// Whether the entity is currently paused (and therefore regenerating).
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self.roam, RoamState::Paused { .. })
    }

    /// Current yaw in radians.
    #[must_use]
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Current pitch in radians (terrain slope follow).
    #[must_use]
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Current roll in radians (terrain slope follow).
    #[must_use]
    pub fn roll(&self) -> f32 {
        self.roll
    }

    /// Advance the patrol cycle by `dt_secs`.
    pub fn update(&mut self, dt_secs: f32, terrain: &dyn TerrainSampler) {
        if self.destroyed {
            return;
        }
        match self.roam {
            RoamState::Paused { remaining_ms } => {
                if self.regen_per_sec > 0.0 {
                    self.vitals.heal(self.regen_per_sec * dt_secs);
                }
                let remaining_ms = remaining_ms - f64::from(dt_secs) * 1000.0;
                if remaining_ms <= 0.0 {
                    let target = self.pick_point_in_annulus(
                        self.territory_center,
                        self.patrol_min_radius,
                        self.territory_radius,
                    );
                    self.roam = RoamState::Traveling { target };
                } else {
                    self.roam = RoamState::Paused { remaining_ms };
                }
            }
            RoamState::Traveling { target } => {
                let step = self.speed * dt_secs;
                let flat_target = Vec3::new(target.x, self.position.y, target.z);
                self.position = move_toward(self.position, flat_target, step);
                self.yaw = yaw_toward(self.position, flat_target);
                if horizontal_distance(self.position, target) <= ARRIVAL_THRESHOLD {
                    let pause = self.roll_pause_ms();
                    self.roam = RoamState::Paused {
                        remaining_ms: pause,
                    };
                }
            }
        }
        self.follow_terrain(dt_secs, terrain);
    }

    /// Pick a deterministic pseudo-random point in the annulus between
    /// `min_radius` and `max_radius` around `center`. Y is left at the
    /// center's height; terrain following corrects it on the way.
    pub fn pick_point_in_annulus(&mut self, center: Vec3, min_radius: f32, max_radius: f32) -> Vec3 {
        let max_radius = max_radius.max(min_radius);
        let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
        let radius = if max_radius > min_radius {
            self.rng.gen_range(min_radius..max_radius)
        } else {
            min_radius
        };
        Vec3::new(
            center.x + angle.cos() * radius,
            center.y,
            center.z + angle.sin() * radius,
        )
    }

    fn roll_pause_ms(&mut self) -> f64 {
        if self.pause_max_ms > self.pause_min_ms {
            self.rng.gen_range(self.pause_min_ms..self.pause_max_ms)
        } else {
            self.pause_min_ms
        }
    }

    /// Snap height to the terrain and ease pitch/roll toward the sampled
    /// gradient, clamped to ±30°.
    fn follow_terrain(&mut self, dt_secs: f32, terrain: &dyn TerrainSampler) {
        let (x, z) = (self.position.x, self.position.z);
        self.position.y = terrain.height_at(x, z) + self.roam_height;

        let d = self.slope_sample_distance;
        let height_east = terrain.height_at(x + d, z);
        let height_west = terrain.height_at(x - d, z);
        let height_north = terrain.height_at(x, z + d);
        let height_south = terrain.height_at(x, z - d);

        let gradient_x = (height_east - height_west) / (2.0 * d);
        let gradient_z = (height_north - height_south) / (2.0 * d);

        let target_pitch = clamp_angle(gradient_z.atan(), SLOPE_LIMIT_RAD);
        let target_roll = clamp_angle(-gradient_x.atan(), SLOPE_LIMIT_RAD);

        let max_delta = self.tilt_rate_rad_per_sec * dt_secs;
        self.pitch = approach_angle(self.pitch, target_pitch, max_delta);
        self.roll = approach_angle(self.roll, target_roll, max_delta);
    }
}

impl CombatTarget for Parasite {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TargetKind {
        self.kind.target_kind()
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
        !self.destroyed
    }

    fn take_damage(&mut self, amount: f32) -> bool {
        if self.destroyed {
            return false;
        }
        self.vitals.apply_damage(amount);
        if self.vitals.is_dead() {
            self.destroyed = true;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::FlatTerrain;

    fn parasite(config: &ParasiteConfig) -> Parasite {
        Parasite::new("para-1", ParasiteKind::Combat, Vec3::ZERO, 10.0, config, 7)
    }

    /// Terrain sloping up along +X at a fixed grade.
    struct Ramp {
        grade: f32,
    }

    impl TerrainSampler for Ramp {
        fn height_at(&self, x: f32, _z: f32) -> f32 {
            x * self.grade
        }
    }

    #[test]
    fn test_pause_then_travel_cycle() {
        let config = ParasiteConfig {
            pause_min_ms: 500.0,
            pause_max_ms: 500.0,
            ..ParasiteConfig::default()
        };
        let mut p = parasite(&config).with_patrol_min_radius(2.0);
        assert!(p.is_idle());

        // Sit through the pause.
        p.update(0.6, &FlatTerrain::default());
        assert!(!p.is_idle());

        // Walk until arrival; generous upper bound on iterations.
        for _ in 0..200 {
            p.update(0.1, &FlatTerrain::default());
            if p.is_idle() {
                break;
            }
        }
        assert!(p.is_idle(), "should eventually arrive and pause again");
    }

    #[test]
    fn test_patrol_points_stay_in_annulus() {
        let config = ParasiteConfig::default();
        let mut p = parasite(&config).with_patrol_min_radius(3.0);
        for _ in 0..100 {
            let point = p.pick_point_in_annulus(Vec3::ZERO, 3.0, 10.0);
            let r = horizontal_distance(point, Vec3::ZERO);
            assert!(r >= 3.0 - 1e-4 && r <= 10.0 + 1e-4, "radius {r} out of bounds");
        }
    }

    #[test]
    fn test_regen_only_while_paused() {
        let config = ParasiteConfig {
            regen_per_sec: 5.0,
            pause_min_ms: 10_000.0,
            pause_max_ms: 10_000.0,
            ..ParasiteConfig::default()
        };
        let mut p = parasite(&config);
        p.vitals.current = 10.0;

        p.update(1.0, &FlatTerrain::default());
        assert!((p.vitals.current - 15.0).abs() < 1e-4);

        // Force travel; regen must stop.
        p.roam = RoamState::Traveling {
            target: Vec3::new(8.0, 0.0, 0.0),
        };
        let before = p.vitals.current;
        p.update(0.5, &FlatTerrain::default());
        assert!((p.vitals.current - before).abs() < 1e-4);
    }

    #[test]
    fn test_terrain_follow_sets_height() {
        let config = ParasiteConfig::default();
        let mut p = parasite(&config);
        p.update(0.1, &FlatTerrain::new(4.0));
        assert!((p.position().y - (4.0 + config.roam_height)).abs() < 1e-4);
    }

    #[test]
    fn test_slope_follow_clamped_to_30_degrees() {
        let config = ParasiteConfig {
            tilt_rate_rad_per_sec: 100.0,
            ..ParasiteConfig::default()
        };
        let mut p = parasite(&config);
        // Absurdly steep ramp; roll must stop at the clamp.
        let ramp = Ramp { grade: 50.0 };
        for _ in 0..20 {
            p.update(0.1, &ramp);
        }
        assert!((p.roll().abs() - SLOPE_LIMIT_RAD).abs() < 1e-3);
        assert!(p.roll().abs() <= SLOPE_LIMIT_RAD + 1e-4);
    }

    #[test]
    fn test_take_damage_and_destruction() {
        let config = ParasiteConfig::default();
        let mut p = parasite(&config);
        assert!(!p.take_damage(10.0));
        assert!(p.take_damage(1000.0));
        assert!(p.is_destroyed());
        // Further damage on a destroyed parasite is a no-op.
        assert!(!p.take_damage(10.0));
    }

    #[test]
    fn test_same_seed_same_patrol() {
        let config = ParasiteConfig::default();
        let mut a = Parasite::new("x", ParasiteKind::Combat, Vec3::ZERO, 10.0, &config, 42);
        let mut b = Parasite::new("x", ParasiteKind::Combat, Vec3::ZERO, 10.0, &config, 42);
        for _ in 0..10 {
            assert_eq!(
                a.pick_point_in_annulus(Vec3::ZERO, 0.0, 10.0),
                b.pick_point_in_annulus(Vec3::ZERO, 0.0, 10.0)
            );
        }
    }
}
