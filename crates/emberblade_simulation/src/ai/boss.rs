//! Boss phase controller
//!
//! A boss is a regular enemy FSM plus an ordered phase list. Every health
//! change checks ONLY the next phase's threshold fraction and advances at
//! most one phase per qualifying update — a drop crossing two thresholds in
//! one hit still advances a single phase (known limitation of the original
//! tuning, preserved on purpose). The phase index never regresses.
//!
//! Each phase carries a full stat snapshot applied wholesale, ability flags
//! and a special-attack pattern. Special attacks and minion spawning run on
//! independent timers, both inert once the boss is dead.

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combat::{EntityDied, HealthChanged, HitLanded, Projectile};
use crate::components::{Actor, Health};
use crate::physics::{DashState, KinematicController, Knockback};
use crate::presentation::AnimationCue;
use crate::DeterministicRng;

use super::enemy::{find_nearest_target, EnemyStats};

/// Special-attack dispatch selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect, Serialize, Deserialize)]
pub enum AttackPattern {
    /// One projectile per configured spawn offset, aimed at the target
    ProjectileVolley,
    /// Double base damage to every valid target in a widened radius
    AreaOfEffect,
    /// Locomotion-owned rush toward the target
    Charge,
    /// Immediate minion wave (respects the concurrent cap)
    Summon,
}

/// One boss phase: entry threshold + stat snapshot + abilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossPhase {
    /// Phase entered once current/max hearts drops to this fraction or below
    pub health_threshold_fraction: f32,
    pub stats: EnemyStats,
    pub can_special: bool,
    pub can_summon: bool,
    pub pattern: AttackPattern,
}

/// Ordered phase list with the monotone current index
#[derive(Component, Debug, Clone)]
pub struct BossPhases {
    pub phases: Vec<BossPhase>,
    pub current: usize,
    /// Invincibility window granted on each transition (seconds)
    pub transition_invincibility: f32,
}

impl BossPhases {
    /// Stock three-phase fight: melee opener, volley phase, frenzy with adds
    pub fn standard() -> Self {
        let base = EnemyStats {
            move_speed: 2.5,
            detection_range: 15.0,
            attack_range: 2.5,
            attack_cooldown: 2.0,
            attack_damage: 1,
        };

        Self {
            phases: vec![
                BossPhase {
                    health_threshold_fraction: 1.0,
                    stats: base,
                    can_special: false,
                    can_summon: false,
                    pattern: AttackPattern::ProjectileVolley,
                },
                BossPhase {
                    health_threshold_fraction: 0.5,
                    stats: EnemyStats {
                        move_speed: 3.5,
                        attack_cooldown: 1.5,
                        ..base
                    },
                    can_special: true,
                    can_summon: false,
                    pattern: AttackPattern::ProjectileVolley,
                },
                BossPhase {
                    health_threshold_fraction: 0.2,
                    stats: EnemyStats {
                        move_speed: 4.5,
                        attack_cooldown: 1.0,
                        attack_damage: 2,
                        ..base
                    },
                    can_special: true,
                    can_summon: true,
                    pattern: AttackPattern::AreaOfEffect,
                },
            ],
            current: 0,
            transition_invincibility: 1.0,
        }
    }

    pub fn current_phase(&self) -> &BossPhase {
        &self.phases[self.current]
    }

    /// Checks the NEXT threshold only; returns the new index if it advanced.
    pub fn check_advance(&mut self, health_fraction: f32) -> Option<usize> {
        let next = self.current + 1;
        if next >= self.phases.len() {
            return None;
        }
        if health_fraction <= self.phases[next].health_threshold_fraction {
            self.current = next;
            return Some(next);
        }
        None
    }
}

/// Special-attack timer + projectile spawn offsets for volleys
#[derive(Component, Debug, Clone)]
pub struct SpecialAttack {
    pub cooldown: f32,
    pub timer: f32,
    pub spawn_offsets: Vec<Vec3>,
}

impl Default for SpecialAttack {
    fn default() -> Self {
        Self {
            cooldown: 5.0,
            timer: 5.0,
            spawn_offsets: vec![
                Vec3::new(-1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.5, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
            ],
        }
    }
}

const CHARGE_SPEED_FACTOR: f32 = 3.0;
const CHARGE_DURATION: f32 = 0.4;
const VOLLEY_PROJECTILE_SPEED: f32 = 12.0;

/// Minion spawning: concurrent cap, decremented by minion deaths
#[derive(Component, Debug, Clone)]
pub struct MinionSpawner {
    pub max_concurrent: usize,
    pub cooldown: f32,
    pub timer: f32,
    pub spawn_offsets: Vec<Vec3>,
    pub live: Vec<Entity>,
}

impl Default for MinionSpawner {
    fn default() -> Self {
        Self {
            max_concurrent: 3,
            cooldown: 8.0,
            timer: 8.0,
            spawn_offsets: vec![
                Vec3::new(2.0, 0.0, 2.0),
                Vec3::new(-2.0, 0.0, 2.0),
                Vec3::new(0.0, 0.0, -2.5),
            ],
            live: Vec::new(),
        }
    }
}

/// System: phase advance on health change
///
/// Runs after damage application so the post-mutation value from the same
/// frame is seen. The phase stat snapshot is applied wholesale and the boss
/// gets its transition invincibility window.
pub fn advance_boss_phase(
    mut health_events: EventReader<HealthChanged>,
    mut bosses: Query<(
        &mut BossPhases,
        &mut EnemyStats,
        &mut KinematicController,
        &mut Health,
    )>,
    mut animations: EventWriter<AnimationCue>,
) {
    for event in health_events.read() {
        let Ok((mut phases, mut stats, mut controller, mut health)) = bosses.get_mut(event.entity)
        else {
            continue;
        };
        if health.is_dead {
            continue;
        }

        let fraction = if event.max == 0 {
            0.0
        } else {
            event.current as f32 / event.max as f32
        };

        if let Some(new_index) = phases.check_advance(fraction) {
            let phase = phases.current_phase().clone();
            *stats = phase.stats;
            controller.move_speed = phase.stats.move_speed;
            health.invincibility_timer = phases.transition_invincibility;

            crate::logger::log_info(&format!(
                "👿 Boss {:?} entered phase {} (health {:.0}%)",
                event.entity,
                new_index,
                fraction * 100.0
            ));
            animations.write(AnimationCue {
                entity: event.entity,
                name: "phase_transition".to_string(),
            });
        }
    }
}

/// System: special attacks
///
/// Gated by the current phase's ability flag; dispatched by its pattern.
pub fn boss_special_attacks(
    mut commands: Commands,
    mut bosses: Query<
        (
            Entity,
            &Actor,
            &Transform,
            &BossPhases,
            &EnemyStats,
            &Health,
            &mut SpecialAttack,
            Option<&mut MinionSpawner>,
        ),
        Without<Knockback>,
    >,
    targets: Query<(Entity, &Actor, &Transform, &Health)>,
    time: Res<Time<Fixed>>,
    mut hits: EventWriter<HitLanded>,
    mut animations: EventWriter<AnimationCue>,
) {
    let delta = time.delta_secs();

    for (entity, actor, transform, phases, stats, health, mut special, spawner) in
        bosses.iter_mut()
    {
        if health.is_dead {
            continue;
        }

        let phase = phases.current_phase();
        if !phase.can_special {
            continue;
        }

        special.timer -= delta;
        if special.timer > 0.0 {
            continue;
        }

        // Specials need someone to aim at
        let Some(target) = find_nearest_target(
            entity,
            actor.faction_id,
            transform,
            &targets,
            stats.detection_range,
        ) else {
            continue;
        };
        let Ok((_, _, target_transform, _)) = targets.get(target) else {
            continue;
        };

        special.timer = special.cooldown;
        animations.write(AnimationCue {
            entity,
            name: "special_attack".to_string(),
        });

        match phase.pattern {
            AttackPattern::ProjectileVolley => {
                for offset in &special.spawn_offsets {
                    let origin = transform.translation + transform.rotation * *offset;
                    let direction =
                        (target_transform.translation - origin).normalize_or_zero();
                    commands.spawn((
                        Projectile::new(
                            entity,
                            actor.faction_id,
                            direction * VOLLEY_PROJECTILE_SPEED,
                            stats.attack_damage,
                        ),
                        Transform::from_translation(origin),
                        GlobalTransform::default(),
                    ));
                }
            }

            AttackPattern::AreaOfEffect => {
                let radius = stats.attack_range * 2.0;
                let damage = stats.attack_damage * 2;

                for (other, other_actor, other_transform, other_health) in targets.iter() {
                    if other == entity || other_actor.faction_id == actor.faction_id {
                        continue;
                    }
                    if !other_health.is_alive() {
                        continue;
                    }
                    let offset = other_transform.translation - transform.translation;
                    if offset.length() > radius {
                        continue;
                    }
                    hits.write(HitLanded {
                        attacker: entity,
                        target: other,
                        damage,
                        direction: offset.normalize_or_zero(),
                    });
                }
            }

            AttackPattern::Charge => {
                let to_target = target_transform.translation - transform.translation;
                let direction = Vec3::new(to_target.x, 0.0, to_target.z).normalize_or_zero();
                let speed = stats.move_speed * CHARGE_SPEED_FACTOR;
                commands.entity(entity).insert(DashState::new(
                    direction,
                    speed * CHARGE_DURATION,
                    CHARGE_DURATION,
                ));
            }

            AttackPattern::Summon => match spawner {
                // Force the minion timer; the spawning system does the rest
                Some(mut spawner) => spawner.timer = 0.0,
                None => {
                    crate::logger::log(&format!(
                        "Boss {:?} summon pattern with no minion spawner, skipping",
                        entity
                    ));
                }
            },
        }
    }
}

/// System: minion spawning under the concurrent cap
pub fn boss_minion_spawning(
    mut commands: Commands,
    mut bosses: Query<(Entity, &Actor, &Transform, &BossPhases, &Health, &mut MinionSpawner)>,
    time: Res<Time<Fixed>>,
    mut rng: ResMut<DeterministicRng>,
) {
    let delta = time.delta_secs();

    for (entity, actor, transform, phases, health, mut spawner) in bosses.iter_mut() {
        if health.is_dead || !phases.current_phase().can_summon {
            continue;
        }

        spawner.timer -= delta;
        if spawner.timer > 0.0 {
            continue;
        }
        spawner.timer = spawner.cooldown;

        if spawner.live.len() >= spawner.max_concurrent {
            continue;
        }

        let offset_index = rng.rng.gen_range(0..spawner.spawn_offsets.len());
        let position = transform.translation + spawner.spawn_offsets[offset_index];

        let minion = crate::spawn::spawn_minion(&mut commands, actor.faction_id, position);
        spawner.live.push(minion);

        crate::logger::log(&format!(
            "Boss {:?} summoned minion {:?} ({}/{})",
            entity,
            minion,
            spawner.live.len(),
            spawner.max_concurrent
        ));
    }
}

/// System: minion deaths free up cap slots
pub fn track_minion_deaths(
    mut death_events: EventReader<EntityDied>,
    mut spawners: Query<&mut MinionSpawner>,
) {
    for event in death_events.read() {
        for mut spawner in spawners.iter_mut() {
            spawner.live.retain(|e| *e != event.entity);
        }
    }
}
