//! Enemy finite-state machine
//!
//! Idle → Chasing → Attacking, all transitions driven by straight-line
//! distance to the nearest other-faction target:
//! - Idle → Chasing when distance ≤ detection_range
//! - Chasing → Attacking when distance ≤ attack_range, → Idle past detection
//! - Attacking → Chasing when distance > attack_range
//!
//! Hurt (knockback) pre-empts the whole FSM: no transitions, no attacks, no
//! animation updates while a Knockback component is present. Dead is terminal.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combat::{HitLanded, Projectile};
use crate::components::{Actor, Health};
use crate::physics::{Knockback, MovementInput};
use crate::presentation::AnimationCue;

/// Enemy FSM states
#[derive(Component, Debug, Clone, PartialEq, Default, Reflect)]
#[reflect(Component)]
pub enum EnemyState {
    #[default]
    Idle,
    Chasing {
        target: Entity,
    },
    Attacking {
        target: Entity,
    },
    /// Knocked back; restored to Idle once the knockback component is gone
    Hurt,
    Dead,
}

/// Enemy stat block (boss phases swap these wholesale)
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct EnemyStats {
    pub move_speed: f32,
    pub detection_range: f32,
    pub attack_range: f32,
    /// Minimum interval between attacks (seconds)
    pub attack_cooldown: f32,
    pub attack_damage: u32,
}

impl Default for EnemyStats {
    fn default() -> Self {
        Self {
            move_speed: 3.0,
            detection_range: 10.0,
            attack_range: 1.8,
            attack_cooldown: 1.5,
            attack_damage: 1,
        }
    }
}

/// Per-enemy attack timer
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Enemy {
    pub attack_timer: f32,
}

impl Enemy {
    pub fn can_attack(&self) -> bool {
        self.attack_timer <= 0.0
    }

    pub fn start_attack(&mut self, cooldown: f32) {
        self.attack_timer = cooldown;
    }

    pub fn tick(&mut self, delta: f32) {
        if self.attack_timer > 0.0 {
            self.attack_timer -= delta;
        }
    }
}

/// Ranged variant: fires a projectile at the target instead of a melee swing
#[derive(Component, Debug, Clone, Copy, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct RangedAttacker {
    pub projectile_speed: f32,
    pub projectile_damage: u32,
}

impl Default for RangedAttacker {
    fn default() -> Self {
        Self {
            projectile_speed: 10.0,
            projectile_damage: 1,
        }
    }
}

/// System: FSM transitions
///
/// Knockback pre-empts transitions via the Without filter; a Hurt enemy whose
/// knockback ended resumes from Idle and re-decides next tick.
pub fn enemy_fsm_transitions(
    mut enemies: Query<
        (Entity, &Actor, &Transform, &mut EnemyState, &EnemyStats),
        Without<Knockback>,
    >,
    targets: Query<(Entity, &Actor, &Transform, &Health)>,
) {
    for (entity, actor, transform, mut state, stats) in enemies.iter_mut() {
        let new_state = match state.as_ref() {
            EnemyState::Dead => continue,

            EnemyState::Hurt => EnemyState::Idle,

            EnemyState::Idle => {
                if let Some(target) = find_nearest_target(
                    entity,
                    actor.faction_id,
                    transform,
                    &targets,
                    stats.detection_range,
                ) {
                    EnemyState::Chasing { target }
                } else {
                    EnemyState::Idle
                }
            }

            EnemyState::Chasing { target } => {
                if let Ok((_, _, target_transform, target_health)) = targets.get(*target) {
                    if !target_health.is_alive() {
                        EnemyState::Idle
                    } else {
                        let distance =
                            transform.translation.distance(target_transform.translation);
                        if distance <= stats.attack_range {
                            EnemyState::Attacking { target: *target }
                        } else if distance > stats.detection_range {
                            EnemyState::Idle
                        } else {
                            EnemyState::Chasing { target: *target }
                        }
                    }
                } else {
                    EnemyState::Idle
                }
            }

            EnemyState::Attacking { target } => {
                if let Ok((_, _, target_transform, target_health)) = targets.get(*target) {
                    if !target_health.is_alive() {
                        EnemyState::Idle
                    } else {
                        let distance =
                            transform.translation.distance(target_transform.translation);
                        if distance > stats.attack_range {
                            EnemyState::Chasing { target: *target }
                        } else {
                            EnemyState::Attacking { target: *target }
                        }
                    }
                } else {
                    EnemyState::Idle
                }
            }
        };

        *state = new_state;
    }
}

/// System: movement intent from FSM state
///
/// Chasing walks toward the target; Attacking stands still but keeps facing
/// it so strikes and projectiles aim correctly.
pub fn enemy_movement_from_state(
    mut enemies: Query<
        (&mut Transform, &EnemyState, &mut MovementInput),
        Without<Knockback>,
    >,
    targets: Query<&Transform, (With<Actor>, Without<EnemyState>)>,
) {
    const MIN_DISTANCE: f32 = 0.6;

    for (mut transform, state, mut movement) in enemies.iter_mut() {
        match state {
            EnemyState::Chasing { target } => {
                if let Ok(target_transform) = targets.get(*target) {
                    let to_target = target_transform.translation - transform.translation;
                    let flat = Vec3::new(to_target.x, 0.0, to_target.z);

                    if flat.length() > MIN_DISTANCE {
                        movement.direction = flat.normalize_or_zero();
                    } else {
                        movement.direction = Vec3::ZERO;
                    }

                    face_toward(&mut transform, flat);
                } else {
                    movement.direction = Vec3::ZERO;
                }
            }

            EnemyState::Attacking { target } => {
                movement.direction = Vec3::ZERO;
                if let Ok(target_transform) = targets.get(*target) {
                    let to_target = target_transform.translation - transform.translation;
                    face_toward(&mut transform, Vec3::new(to_target.x, 0.0, to_target.z));
                }
            }

            EnemyState::Idle | EnemyState::Hurt | EnemyState::Dead => {
                movement.direction = Vec3::ZERO;
            }
        }
    }
}

/// System: attack execution
///
/// Range is re-checked at activation: a target that stepped out between the
/// transition and the swing is simply missed. Deflect handling happens
/// downstream in apply_damage.
pub fn enemy_attack_execution(
    mut commands: Commands,
    mut enemies: Query<
        (
            Entity,
            &Actor,
            &Transform,
            &EnemyState,
            &EnemyStats,
            &mut Enemy,
            Option<&RangedAttacker>,
        ),
        Without<Knockback>,
    >,
    targets: Query<(&Transform, &Health)>,
    time: Res<Time<Fixed>>,
    mut hits: EventWriter<HitLanded>,
    mut animations: EventWriter<AnimationCue>,
) {
    let delta = time.delta_secs();

    for (entity, actor, transform, state, stats, mut enemy, ranged) in enemies.iter_mut() {
        enemy.tick(delta);

        let EnemyState::Attacking { target } = state else {
            continue;
        };
        if !enemy.can_attack() {
            continue;
        }

        let Ok((target_transform, target_health)) = targets.get(*target) else {
            continue;
        };
        if !target_health.is_alive() {
            continue;
        }

        enemy.start_attack(stats.attack_cooldown);
        animations.write(AnimationCue {
            entity,
            name: "attack".to_string(),
        });

        let to_target = target_transform.translation - transform.translation;

        match ranged {
            Some(ranged) => {
                // Aim at the target's current position
                let direction = to_target.normalize_or_zero();
                commands.spawn((
                    Projectile::new(
                        entity,
                        actor.faction_id,
                        direction * ranged.projectile_speed,
                        ranged.projectile_damage,
                    ),
                    Transform::from_translation(transform.translation + direction * 0.5),
                    GlobalTransform::default(),
                ));
            }
            None => {
                // Melee connects only if the target is still in range
                if to_target.length() <= stats.attack_range {
                    hits.write(HitLanded {
                        attacker: entity,
                        target: *target,
                        damage: stats.attack_damage,
                        direction: to_target.normalize_or_zero(),
                    });
                }
            }
        }
    }
}

/// Helper: nearest living actor of another faction within range
pub(crate) fn find_nearest_target(
    self_entity: Entity,
    self_faction: u64,
    self_transform: &Transform,
    targets: &Query<(Entity, &Actor, &Transform, &Health)>,
    max_range: f32,
) -> Option<Entity> {
    let mut nearest: Option<(Entity, f32)> = None;

    for (target_entity, target_actor, target_transform, target_health) in targets.iter() {
        if target_entity == self_entity {
            continue;
        }
        if target_actor.faction_id == self_faction {
            continue;
        }
        if !target_health.is_alive() {
            continue;
        }

        let distance = self_transform.translation.distance(target_transform.translation);
        if distance <= max_range {
            match nearest {
                Some((_, best)) if distance >= best => {}
                _ => nearest = Some((target_entity, distance)),
            }
        }
    }

    nearest.map(|(entity, _)| entity)
}

/// Turns the transform toward a flat direction (yaw only).
fn face_toward(transform: &mut Transform, flat_direction: Vec3) {
    if flat_direction.length_squared() > 0.0001 {
        let yaw = f32::atan2(-flat_direction.x, -flat_direction.z);
        transform.rotation = Quat::from_rotation_y(yaw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enemy_state_default() {
        assert!(matches!(EnemyState::default(), EnemyState::Idle));
    }

    #[test]
    fn test_attack_timer() {
        let mut enemy = Enemy::default();
        assert!(enemy.can_attack());

        enemy.start_attack(1.5);
        assert!(!enemy.can_attack());

        enemy.tick(1.0);
        assert!(!enemy.can_attack());

        enemy.tick(0.5);
        assert!(enemy.can_attack());
    }

    #[test]
    fn test_distance_threshold_logic() {
        let stats = EnemyStats::default();
        let self_pos = Vec3::ZERO;

        let far = Vec3::new(12.0, 0.0, 0.0); // beyond detection
        let seen = Vec3::new(8.0, 0.0, 0.0); // inside detection, outside attack
        let close = Vec3::new(1.0, 0.0, 0.0); // inside attack range

        assert!(self_pos.distance(far) > stats.detection_range);
        assert!(self_pos.distance(seen) <= stats.detection_range);
        assert!(self_pos.distance(seen) > stats.attack_range);
        assert!(self_pos.distance(close) <= stats.attack_range);
    }

    #[test]
    fn test_face_toward_points_forward_at_direction() {
        let mut transform = Transform::default();
        face_toward(&mut transform, Vec3::new(1.0, 0.0, 0.0));

        let forward = transform.rotation * Vec3::NEG_Z;
        assert!((forward - Vec3::X).length() < 1e-4, "forward = {forward:?}");
    }
}
