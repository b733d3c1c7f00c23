//! Property tests for the invariants replay consistency depends on.

use glam::Vec3;
use proptest::prelude::*;

use hivefall_core::priority::{prioritize_targets, select_target_consistently};
use hivefall_core::queen::{QueenConfig, QueenPhase};
use hivefall_core::target::{CombatTarget, TargetKind};
use hivefall_core::terrain::FlatTerrain;
use hivefall_core::territory::Territory;
use hivefall_test_utils::TestTarget;

proptest! {
    /// A queen outside active control rejects damage of any magnitude:
    /// `take_damage` returns false and health is unchanged.
    #[test]
    fn queen_invulnerable_outside_active_control(
        damage in 0.0f32..1e9,
        growth_ms in 1_000.0f64..60_000.0,
    ) {
        let terrain = FlatTerrain::default();
        let mut territory = Territory::new(0, Vec3::ZERO, 20.0);
        territory.infest(
            "queen-p",
            &QueenConfig { growth_duration_ms: growth_ms, ..QueenConfig::default() },
            1,
            9,
            &terrain,
        );
        let queen = territory.queen_mut().expect("queen present");
        prop_assert_ne!(queen.current_phase(), QueenPhase::ActiveControl);

        let health_before = queen.health();
        prop_assert!(!queen.take_damage(damage));
        prop_assert_eq!(queen.health(), health_before);
    }

    /// Target selection is independent of candidate ordering: any
    /// permutation of the same candidate set yields the same choice.
    #[test]
    fn selection_is_order_independent(
        xs in proptest::collection::vec(0.0f32..9.0, 2..8),
        rotation in 0usize..8,
    ) {
        let targets: Vec<TestTarget> = xs
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                TestTarget::new(
                    format!("t-{i}"),
                    TargetKind::Parasite,
                    Vec3::new(x, 0.0, 0.0),
                )
            })
            .collect();

        let views: Vec<&dyn CombatTarget> =
            targets.iter().map(|t| t as &dyn CombatTarget).collect();
        let baseline = select_target_consistently(&prioritize_targets(
            Vec3::ZERO,
            &views,
            10.0,
            false,
        ));

        let mut rotated = views.clone();
        let rotated_len = rotated.len();
        rotated.rotate_left(rotation % rotated_len);
        let permuted = select_target_consistently(&prioritize_targets(
            Vec3::ZERO,
            &rotated,
            10.0,
            false,
        ));

        prop_assert_eq!(baseline, permuted);
    }

    /// Exact score ties always resolve to the lexicographically smallest
    /// id, however many candidates share the tie.
    #[test]
    fn ties_resolve_to_smallest_id(count in 2usize..10) {
        let targets: Vec<TestTarget> = (0..count)
            .map(|i| {
                TestTarget::new(
                    format!("tied-{i:02}"),
                    TargetKind::Parasite,
                    Vec3::new(4.0, 0.0, 0.0),
                )
            })
            .collect();
        let views: Vec<&dyn CombatTarget> =
            targets.iter().map(|t| t as &dyn CombatTarget).collect();

        let chosen = select_target_consistently(&prioritize_targets(
            Vec3::ZERO,
            &views,
            10.0,
            false,
        ));
        prop_assert_eq!(chosen, Some("tied-00".to_string()));
    }
}
