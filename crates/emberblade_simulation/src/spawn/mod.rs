//! Actor spawning: archetype bundles + timed wave spawners
//!
//! All bundles are assembled here so integration tests and the demo binary
//! spawn actors through the same code path. Wave spawners place enemies on a
//! ring around the arena center using the shared deterministic RNG, and stop
//! the moment the session is over.

use std::f32::consts::TAU;

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ai::{BossPhases, Enemy, EnemyState, EnemyStats, MinionSpawner, RangedAttacker, SpecialAttack};
use crate::combat::{EntityDied, HitReaction, MoveSet, StatusStacks};
use crate::components::{Actor, CameraOrientation, Health, Mana, Player};
use crate::physics::{KinematicController, MovementInput, PhysicsBody};
use crate::presentation::AnimationState;
use crate::session::GameSession;
use crate::skills::{SkillRuntime, SkillSet};
use crate::{DeterministicRng, SimulationSet};

pub const PLAYER_FACTION: u64 = 0;
pub const ENEMY_FACTION: u64 = 1;

/// Enemy archetypes the wave spawner knows how to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyArchetype {
    /// Melee chaser
    Grunt,
    /// Ranged attacker, keeps its distance via a larger attack range
    Archer,
    /// Weak melee add summoned by bosses
    Minion,
}

impl EnemyArchetype {
    pub fn stats(&self) -> EnemyStats {
        match self {
            EnemyArchetype::Grunt => EnemyStats::default(),
            EnemyArchetype::Archer => EnemyStats {
                move_speed: 2.5,
                detection_range: 14.0,
                attack_range: 8.0,
                attack_cooldown: 2.0,
                attack_damage: 1,
            },
            EnemyArchetype::Minion => EnemyStats {
                move_speed: 4.0,
                detection_range: 12.0,
                attack_range: 1.5,
                attack_cooldown: 1.0,
                attack_damage: 1,
            },
        }
    }

    pub fn hearts(&self) -> u32 {
        match self {
            EnemyArchetype::Grunt => 3,
            EnemyArchetype::Archer => 2,
            EnemyArchetype::Minion => 1,
        }
    }

    pub fn score(&self) -> u32 {
        match self {
            EnemyArchetype::Grunt => 100,
            EnemyArchetype::Archer => 150,
            EnemyArchetype::Minion => 25,
        }
    }
}

/// Points awarded to the session score when this entity dies
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct ScoreValue {
    pub points: u32,
}

/// Spawns the player with the full skill loadout. Players take hit-stop
/// through invincibility frames instead of knockback, so no HitReaction.
pub fn spawn_player(commands: &mut Commands, position: Vec3) -> Entity {
    commands
        .spawn((
            Player,
            Actor {
                faction_id: PLAYER_FACTION,
            },
            Health::with_invincibility(3, 1.0),
            Mana::default(),
            MoveSet::basic_sword(),
            SkillSet::default(),
            SkillRuntime::default(),
            CameraOrientation::default(),
            PhysicsBody::default(),
            KinematicController::default(),
            MovementInput::default(),
            AnimationState::default(),
            Transform::from_translation(position),
            GlobalTransform::default(),
        ))
        .id()
}

/// Spawns one enemy of the given archetype.
pub fn spawn_enemy(commands: &mut Commands, archetype: EnemyArchetype, position: Vec3) -> Entity {
    let stats = archetype.stats();

    let mut entity = commands.spawn((
        Actor {
            faction_id: ENEMY_FACTION,
        },
        Health::new(archetype.hearts()),
        EnemyState::default(),
        stats,
        Enemy::default(),
        PhysicsBody::default(),
        KinematicController {
            move_speed: stats.move_speed,
            ..Default::default()
        },
        MovementInput::default(),
        HitReaction::default(),
        StatusStacks::default(),
        ScoreValue {
            points: archetype.score(),
        },
        AnimationState::default(),
        Transform::from_translation(position),
        GlobalTransform::default(),
    ));

    if archetype == EnemyArchetype::Archer {
        entity.insert(RangedAttacker::default());
    }

    entity.id()
}

/// Minions inherit the summoner's faction so friendly fire stays impossible.
pub fn spawn_minion(commands: &mut Commands, faction_id: u64, position: Vec3) -> Entity {
    let archetype = EnemyArchetype::Minion;
    let stats = archetype.stats();

    commands
        .spawn((
            Actor { faction_id },
            Health::new(archetype.hearts()),
            EnemyState::default(),
            stats,
            Enemy::default(),
            PhysicsBody::default(),
            KinematicController {
                move_speed: stats.move_speed,
                ..Default::default()
            },
            MovementInput::default(),
            HitReaction::default(),
            StatusStacks::default(),
            ScoreValue {
                points: archetype.score(),
            },
            AnimationState::default(),
            Transform::from_translation(position),
            GlobalTransform::default(),
        ))
        .id()
}

/// Spawns the boss: a tanky enemy plus phase controller, special-attack
/// timer and minion spawner. No status-stack carrier: a detonation would
/// sidestep the whole phase fight.
pub fn spawn_boss(commands: &mut Commands, position: Vec3) -> Entity {
    let phases = BossPhases::standard();
    let stats = phases.current_phase().stats;

    commands
        .spawn((
            Actor {
                faction_id: ENEMY_FACTION,
            },
            Health::new(20),
            EnemyState::default(),
            stats,
            Enemy::default(),
            (phases, SpecialAttack::default(), MinionSpawner::default()),
            PhysicsBody::default(),
            KinematicController {
                move_speed: stats.move_speed,
                ..Default::default()
            },
            MovementInput::default(),
            HitReaction {
                // Bosses barely budge
                force: 2.0,
                duration: 0.15,
            },
            ScoreValue { points: 1000 },
            AnimationState::default(),
            Transform::from_translation(position),
            GlobalTransform::default(),
        ))
        .id()
}

/// One timed spawn stream within the wave spawner
#[derive(Debug, Clone)]
pub struct WaveState {
    pub archetype: EnemyArchetype,
    /// Seconds between spawn attempts
    pub interval: f32,
    pub timer: f32,
    pub max_concurrent: usize,
    pub live: Vec<Entity>,
}

impl WaveState {
    pub fn new(archetype: EnemyArchetype, interval: f32, max_concurrent: usize) -> Self {
        Self {
            archetype,
            interval,
            timer: interval,
            max_concurrent,
            live: Vec::new(),
        }
    }
}

/// Arena-wide enemy spawner
#[derive(Resource, Debug, Clone)]
pub struct WaveSpawner {
    pub arena_center: Vec3,
    pub spawn_radius: f32,
    pub waves: Vec<WaveState>,
}

impl Default for WaveSpawner {
    fn default() -> Self {
        Self {
            arena_center: Vec3::ZERO,
            spawn_radius: 12.0,
            waves: vec![
                WaveState::new(EnemyArchetype::Grunt, 6.0, 4),
                WaveState::new(EnemyArchetype::Archer, 10.0, 2),
            ],
        }
    }
}

/// System: timed wave spawning on a ring around the arena center
pub fn tick_wave_spawners(
    mut commands: Commands,
    spawner: Option<ResMut<WaveSpawner>>,
    session: Res<GameSession>,
    time: Res<Time<Fixed>>,
    mut rng: ResMut<DeterministicRng>,
) {
    // The spawner resource is optional: boss-only arenas run without one
    let Some(mut spawner) = spawner else {
        return;
    };
    if session.game_over {
        return;
    }

    let delta = time.delta_secs();
    let center = spawner.arena_center;
    let radius = spawner.spawn_radius;

    for wave in spawner.waves.iter_mut() {
        wave.timer -= delta;
        if wave.timer > 0.0 {
            continue;
        }
        wave.timer = wave.interval;

        if wave.live.len() >= wave.max_concurrent {
            continue;
        }

        let angle = rng.rng.gen_range(0.0..TAU);
        let position = center + Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius);

        let entity = spawn_enemy(&mut commands, wave.archetype, position);
        wave.live.push(entity);

        crate::logger::log(&format!(
            "Wave spawned {:?} {:?} ({}/{})",
            wave.archetype,
            entity,
            wave.live.len(),
            wave.max_concurrent
        ));
    }
}

/// System: deaths free up wave slots
pub fn prune_wave_deaths(
    mut death_events: EventReader<EntityDied>,
    spawner: Option<ResMut<WaveSpawner>>,
) {
    let Some(mut spawner) = spawner else {
        return;
    };
    for event in death_events.read() {
        for wave in spawner.waves.iter_mut() {
            wave.live.retain(|e| *e != event.entity);
        }
    }
}

/// Spawn plugin
pub struct SpawnPlugin;

impl Plugin for SpawnPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (tick_wave_spawners, prune_wave_deaths)
                .chain()
                .in_set(SimulationSet::Spawning),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archetype_stats_are_distinct() {
        assert!(EnemyArchetype::Archer.stats().attack_range > EnemyArchetype::Grunt.stats().attack_range);
        assert!(EnemyArchetype::Minion.hearts() < EnemyArchetype::Grunt.hearts());
    }

    #[test]
    fn test_wave_timer_respects_interval() {
        let mut wave = WaveState::new(EnemyArchetype::Grunt, 6.0, 4);
        assert!(wave.timer > 0.0);
        wave.timer -= 6.0;
        assert!(wave.timer <= 0.0);
    }
}
