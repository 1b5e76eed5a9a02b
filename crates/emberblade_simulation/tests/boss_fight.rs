//! Boss fight integration test
//!
//! Phase controller behavior under real damage flow:
//! - One phase step per qualifying health update, even on huge hits
//! - Transition invincibility actually blocks the follow-up hit
//! - Minion spawner honors the concurrent cap and refills after deaths

use bevy::prelude::*;
use emberblade_simulation::ai::{BossPhases, MinionSpawner};
use emberblade_simulation::combat::StatusStacks;
use emberblade_simulation::spawn::{spawn_boss, spawn_enemy, spawn_player, EnemyArchetype};
use emberblade_simulation::*;

fn create_boss_app(seed: u64) -> (App, Entity, Entity) {
    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);

    let mut commands = app.world_mut().commands();
    // Player parked outside detection range so the boss stays passive
    let player = spawn_player(&mut commands, Vec3::new(40.0, 0.0, 0.0));
    let boss = spawn_boss(&mut commands, Vec3::ZERO);
    app.world_mut().flush();

    (app, player, boss)
}

fn hit_boss(app: &mut App, attacker: Entity, boss: Entity, damage: u32) {
    app.world_mut().send_event(HitLanded {
        attacker,
        target: boss,
        damage,
        direction: Vec3::X,
    });
}

fn boss_phase(app: &App, boss: Entity) -> usize {
    app.world().get::<BossPhases>(boss).map(|p| p.current).unwrap_or(usize::MAX)
}

/// Test: a hit crossing two thresholds advances exactly one phase
#[test]
fn test_huge_hit_advances_single_phase() {
    let (mut app, player, boss) = create_boss_app(1);

    // 20 → 2 hearts: fraction 0.1 crosses both the 0.5 and 0.2 thresholds
    hit_boss(&mut app, player, boss, 18);
    for _ in 0..3 {
        app.update();
    }

    assert_eq!(boss_phase(&app, boss), 1, "phase skipped a step");
}

/// Test: transition invincibility blocks the immediate follow-up hit
#[test]
fn test_transition_invincibility_blocks_followup() {
    let (mut app, player, boss) = create_boss_app(2);

    hit_boss(&mut app, player, boss, 10); // → 10 hearts, phase 1
    for _ in 0..3 {
        app.update();
    }
    assert_eq!(boss_phase(&app, boss), 1);

    let health_after_transition = app.world().get::<Health>(boss).map(|h| h.current);

    // Inside the 1s transition window: this hit must be ignored
    hit_boss(&mut app, player, boss, 5);
    for _ in 0..3 {
        app.update();
    }
    assert_eq!(
        app.world().get::<Health>(boss).map(|h| h.current),
        health_after_transition,
        "hit landed through transition invincibility"
    );

    // Wait the window out, then the same hit connects and tips phase 2
    for _ in 0..70 {
        app.update();
    }
    hit_boss(&mut app, player, boss, 7); // 10 → 3 hearts, fraction 0.15
    for _ in 0..3 {
        app.update();
    }
    assert_eq!(boss_phase(&app, boss), 2);
}

/// Test: the boss cannot be detonated past its phase fight
///
/// Status stacking is a capability component; regular enemies carry it, the
/// boss does not, so stacked shots can never one-shot it from full health.
#[test]
fn test_boss_carries_no_status_stacks() {
    let mut app = create_headless_app(4);
    app.add_plugins(SimulationPlugin);

    let mut commands = app.world_mut().commands();
    let boss = spawn_boss(&mut commands, Vec3::ZERO);
    let grunt = spawn_enemy(&mut commands, EnemyArchetype::Grunt, Vec3::new(30.0, 0.0, 0.0));
    app.world_mut().flush();

    assert!(
        app.world().get::<StatusStacks>(boss).is_none(),
        "boss must not be a status-stack carrier"
    );
    assert!(
        app.world().get::<StatusStacks>(grunt).is_some(),
        "regular enemies still stack status"
    );

    // No carrier means the detonation system never touches the boss
    for _ in 0..10 {
        app.update();
    }
    let health = app.world().get::<Health>(boss).expect("boss health");
    assert_eq!(health.current, health.max);
}

/// Test: minion cap holds, and deaths free up slots
#[test]
fn test_minion_cap_and_refill() {
    let (mut app, player, boss) = create_boss_app(3);

    // Jump straight to the summoning phase
    app.world_mut()
        .get_mut::<BossPhases>(boss)
        .expect("boss has phases")
        .current = 2;

    // 30 seconds: spawner fires at 8s/16s/24s, then hits the cap
    for tick in 0..1800 {
        app.update();

        let spawner = app.world().get::<MinionSpawner>(boss).expect("spawner");
        assert!(
            spawner.live.len() <= spawner.max_concurrent,
            "tick {}: {} minions exceed cap {}",
            tick,
            spawner.live.len(),
            spawner.max_concurrent
        );
    }

    let spawner = app.world().get::<MinionSpawner>(boss).expect("spawner");
    assert_eq!(spawner.live.len(), spawner.max_concurrent);
    let victim = spawner.live[0];

    // Kill one minion (1 heart): the slot frees up and refills within the
    // next spawner cooldown
    hit_boss(&mut app, player, victim, 1);
    for _ in 0..5 {
        app.update();
    }
    let spawner = app.world().get::<MinionSpawner>(boss).expect("spawner");
    assert_eq!(
        spawner.live.len(),
        spawner.max_concurrent - 1,
        "dead minion still counted against the cap"
    );

    for _ in 0..500 {
        app.update();
    }
    let spawner = app.world().get::<MinionSpawner>(boss).expect("spawner");
    assert_eq!(spawner.live.len(), spawner.max_concurrent);
}
