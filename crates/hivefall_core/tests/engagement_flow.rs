//! End-to-end engagement scenarios against a simulated clock.

use glam::Vec3;

use hivefall_core::combat::{CombatEvent, CombatSystem};
use hivefall_core::config::CombatConfig;
use hivefall_core::context::CombatContext;
use hivefall_core::hive::HiveConfig;
use hivefall_core::queen::{QueenConfig, QueenPhase};
use hivefall_core::target::{TargetKind, TargetValidation};
use hivefall_core::terrain::FlatTerrain;
use hivefall_core::territory::{Territory, TerritoryStatus};
use hivefall_test_utils::{drive, Board, Roster, TestEnergyPool, TestProtector, TestTarget};

/// Protector at distance 5 with attack range 8 attacking a 10-health
/// target with 25 damage per shot: validation passes, exactly one
/// damage application of 25 lands, the target dies, and the engagement
/// is removed.
#[test]
fn test_single_shot_kill_scenario() {
    let mut sys = CombatSystem::new(CombatConfig::default()).expect("valid config");
    let mut roster = Roster(vec![
        TestProtector::new("p-1", Vec3::ZERO).with_damage(25.0)
    ]);
    let mut board = Board(vec![TestTarget::new(
        "t-1",
        TargetKind::Parasite,
        Vec3::new(5.0, 0.0, 0.0),
    )
    .with_health(10.0)]);
    let mut pool = TestEnergyPool::with_budget(100.0);

    {
        let mut ctx = CombatContext {
            protectors: &mut roster,
            targets: &mut board,
            energy: &mut pool,
        };
        let validation = sys.initiate_attack("p-1", "t-1", &mut ctx).expect("known ids");
        assert!(validation.is_valid());
    }

    let events = drive(&mut sys, &mut roster, &mut board, &mut pool, 2_000.0, 50.0);

    let target = board.get("t-1").expect("target");
    assert_eq!(target.damage_log, vec![25.0]);
    assert!(target.vitals.is_dead());
    assert_eq!(target.destroyed_hooks, 1);
    assert_eq!(sys.engagement_count(), 0);
    assert!(events
        .iter()
        .any(|e| matches!(e, CombatEvent::TargetDestroyed { .. })));
}

/// Protector with no energy available: validation rejects with the
/// required amount attached.
#[test]
fn test_zero_energy_validation() {
    let mut sys = CombatSystem::new(CombatConfig::default()).expect("valid config");
    let protector = TestProtector::new("p-1", Vec3::ZERO);
    let target = TestTarget::new("t-1", TargetKind::Parasite, Vec3::new(5.0, 0.0, 0.0));
    let pool = TestEnergyPool::with_budget(0.0);

    let validation = sys.validate_target(&protector, &target, &pool);
    assert_eq!(
        validation,
        TargetValidation::InsufficientEnergy {
            required: sys.config().attack_energy_cost
        }
    );
    assert_eq!(validation.reason(), Some("insufficient_energy"));
}

/// Two sub-lethal attackers destroy a target in one pooled application.
#[test]
fn test_two_attackers_pool_lethal_damage() {
    let mut sys = CombatSystem::new(CombatConfig::default()).expect("valid config");
    let mut roster = Roster(vec![
        TestProtector::new("p-1", Vec3::new(-3.0, 0.0, 0.0)).with_damage(20.0),
        TestProtector::new("p-2", Vec3::new(3.0, 0.0, 0.0)).with_damage(20.0),
    ]);
    let mut board = Board(vec![TestTarget::new(
        "t-1",
        TargetKind::Parasite,
        Vec3::ZERO,
    )
    .with_health(30.0)]);
    let mut pool = TestEnergyPool::with_budget(100.0);

    {
        let mut ctx = CombatContext {
            protectors: &mut roster,
            targets: &mut board,
            energy: &mut pool,
        };
        sys.initiate_attack("p-1", "t-1", &mut ctx).expect("known ids");
        sys.initiate_attack("p-2", "t-1", &mut ctx).expect("known ids");
    }

    drive(&mut sys, &mut roster, &mut board, &mut pool, 1_000.0, 50.0);

    let target = board.get("t-1").expect("target");
    // Both shots land in the same resolution pass: one application of 40,
    // even though each 20-damage shot alone would have left the target at
    // 10 health.
    assert_eq!(target.damage_log, vec![40.0]);
    assert!(target.vitals.is_dead());
    assert_eq!(sys.engagement_count(), 0);
}

/// Full hostile lifecycle against a territory: the queen grows, founds a
/// hive, surfaces, and is then killed, liberating the territory.
#[test]
fn test_queen_assault_liberates_territory() {
    let terrain = FlatTerrain::default();
    let mut territory = Territory::new(0, Vec3::new(5.0, 0.0, 0.0), 25.0);
    territory.infest(
        "queen-0",
        &QueenConfig {
            growth_duration_ms: 0.0,
            hive: HiveConfig {
                construction_duration_ms: 100.0,
                ..HiveConfig::default()
            },
            ..QueenConfig::default()
        },
        1,
        7,
        &terrain,
    );

    // Let the queen reach active control.
    for _ in 0..10 {
        territory.update(0.1, &terrain);
    }
    assert_eq!(
        territory.queen().expect("queen").current_phase(),
        QueenPhase::ActiveControl
    );

    let mut sys = CombatSystem::new(CombatConfig::default()).expect("valid config");
    // One-shot damage so the kill lands before the queen patrols away.
    let mut roster = Roster(vec![
        TestProtector::new("p-1", Vec3::ZERO).with_damage(150.0)
    ]);
    let mut pool = TestEnergyPool::with_budget(10_000.0);

    // Attack the queen until she falls. The territory supplies targets
    // through its attackable view and is advanced between combat ticks.
    {
        let mut ctx = CombatContext {
            protectors: &mut roster,
            targets: &mut territory,
            energy: &mut pool,
        };
        sys.initiate_attack("p-1", "queen-0", &mut ctx)
            .expect("known ids");
    }

    let mut destroyed = false;
    for _ in 0..400 {
        {
            let mut ctx = CombatContext {
                protectors: &mut roster,
                targets: &mut territory,
                energy: &mut pool,
            };
            let events = sys.update(0.05, &mut ctx);
            if events
                .iter()
                .any(|e| matches!(e, CombatEvent::TargetDestroyed { kind: TargetKind::Queen, .. }))
            {
                destroyed = true;
            }
        }
        territory.update(0.05, &terrain);
        if destroyed {
            break;
        }
    }

    assert!(destroyed, "queen should fall under sustained fire");
    territory.update(0.05, &terrain);
    assert_eq!(territory.status(), TerritoryStatus::Liberated);
    assert!(territory.queen().is_none());
    assert!(territory.hive().is_none());
}
