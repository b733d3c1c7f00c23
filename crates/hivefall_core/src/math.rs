//! Small geometry helpers shared by combat and movement code.
//!
//! All of these operate on [`glam::Vec3`]. Determinism in this engine is
//! ordering-based (single thread, sorted iteration, lexicographic
//! tie-breaks), so plain IEEE floats are fine here.

use glam::Vec3;

/// Distance between two points projected onto the XZ plane.
///
/// Used for patrol arrival checks, where terrain-following constantly
/// rewrites the Y component.
#[must_use]
pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    (dx * dx + dz * dz).sqrt()
}

/// Point a unit should move to in order to engage a target.
///
/// Returns the point at 80% of `attack_range` from the target, along the
/// line from the target back toward the attacker. If the attacker is
/// already at least that close, its own position is returned unchanged.
#[must_use]
pub fn approach_point(attacker: Vec3, target: Vec3, attack_range: f32) -> Vec3 {
    let standoff = attack_range * 0.8;
    let offset = attacker - target;
    let distance = offset.length();
    if distance <= standoff || distance <= f32::EPSILON {
        return attacker;
    }
    target + offset / distance * standoff
}

/// Step from `from` toward `to` by at most `max_step`, without overshooting.
#[must_use]
pub fn move_toward(from: Vec3, to: Vec3, max_step: f32) -> Vec3 {
    let offset = to - from;
    let distance = offset.length();
    if distance <= max_step || distance <= f32::EPSILON {
        return to;
    }
    from + offset / distance * max_step
}

/// Yaw angle (radians, about the Y axis) facing from `from` toward `to`.
#[must_use]
pub fn yaw_toward(from: Vec3, to: Vec3) -> f32 {
    let dx = to.x - from.x;
    let dz = to.z - from.z;
    dx.atan2(dz)
}

/// Move `current` toward `target` by at most `max_delta`, in radians.
#[must_use]
pub fn approach_angle(current: f32, target: f32, max_delta: f32) -> f32 {
    let diff = target - current;
    if diff.abs() <= max_delta {
        target
    } else {
        current + max_delta.copysign(diff)
    }
}

/// Clamp an angle (radians) to `±limit` radians.
#[must_use]
pub fn clamp_angle(angle: f32, limit: f32) -> f32 {
    angle.clamp(-limit, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_distance_ignores_y() {
        let a = Vec3::new(0.0, 100.0, 0.0);
        let b = Vec3::new(3.0, -50.0, 4.0);
        assert!((horizontal_distance(a, b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_approach_point_standoff() {
        let attacker = Vec3::new(20.0, 0.0, 0.0);
        let target = Vec3::ZERO;
        let point = approach_point(attacker, target, 8.0);

        // 80% of attack range 8 = 6.4 units from the target.
        assert!((point.distance(target) - 6.4).abs() < 1e-4);
        // On the line between attacker and target.
        assert!((point.y).abs() < 1e-6);
        assert!((point.z).abs() < 1e-6);
        assert!(point.x > 0.0);
    }

    #[test]
    fn test_approach_point_already_close() {
        let attacker = Vec3::new(3.0, 0.0, 0.0);
        let point = approach_point(attacker, Vec3::ZERO, 8.0);
        assert_eq!(point, attacker);
    }

    #[test]
    fn test_move_toward_no_overshoot() {
        let from = Vec3::ZERO;
        let to = Vec3::new(1.0, 0.0, 0.0);
        assert_eq!(move_toward(from, to, 5.0), to);

        let partial = move_toward(from, Vec3::new(10.0, 0.0, 0.0), 1.0);
        assert!((partial.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_approach_angle() {
        let stepped = approach_angle(0.0, 1.0, 0.25);
        assert!((stepped - 0.25).abs() < 1e-6);
        // Snaps when within range.
        assert!((approach_angle(0.9, 1.0, 0.25) - 1.0).abs() < 1e-6);
        // Works in the negative direction.
        assert!((approach_angle(0.0, -1.0, 0.25) + 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_clamp_angle() {
        let limit = 30f32.to_radians();
        assert_eq!(clamp_angle(1.0, limit), limit);
        assert_eq!(clamp_angle(-1.0, limit), -limit);
        assert_eq!(clamp_angle(0.1, limit), 0.1);
    }
}
