//! Central damage application
//!
//! Every damage source (melee strikes, projectiles, deflect counters, status
//! detonations) lands here as a HitLanded event. This system applies the
//! deflect/dead/invincibility gates through the Health API and fans out the
//! notifications, so death can only ever fire once per entity:
//! HitLanded → apply_damage → HealthChanged / DamageTaken / AttackDeflected / EntityDied

use bevy::prelude::*;

use crate::ai::EnemyState;
use crate::components::{DamageOutcome, Health, Player};
use crate::physics::{DashState, Knockback, MovementInput, PhysicsBody};
use crate::presentation::EffectCue;
use crate::skills::SkillSet;

/// Event: a hit connected with a target (damage not yet applied)
#[derive(Event, Debug, Clone)]
pub struct HitLanded {
    pub attacker: Entity,
    pub target: Entity,
    pub damage: u32,
    /// normalize(target - attacker), used for knockback on the target
    pub direction: Vec3,
}

/// Event: health value changed (post-mutation value)
#[derive(Event, Debug, Clone)]
pub struct HealthChanged {
    pub entity: Entity,
    pub current: u32,
    pub max: u32,
}

/// Event: damage actually subtracted from a pool
#[derive(Event, Debug, Clone)]
pub struct DamageTaken {
    pub entity: Entity,
    pub amount: u32,
    pub direction: Vec3,
}

/// Event: heal applied (post-mutation value)
#[derive(Event, Debug, Clone)]
pub struct Healed {
    pub entity: Entity,
    pub current: u32,
}

/// Event: entity died (health emptied this frame)
#[derive(Event, Debug, Clone)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

/// Event: a hit bounced off an active deflect
#[derive(Event, Debug, Clone)]
pub struct AttackDeflected {
    pub attacker: Entity,
    pub defender: Entity,
}

/// Event: request to heal an entity (pickups, scripted encounters)
#[derive(Event, Debug, Clone)]
pub struct HealRequested {
    pub entity: Entity,
    pub amount: u32,
}

/// Marker: entity is dead
///
/// Corpses linger for the despawn delay so the death effect can play out.
#[derive(Component, Debug)]
pub struct Dead;

/// Despawn delay after death (seconds)
#[derive(Component, Debug, Clone, Copy)]
pub struct DespawnAfter {
    pub remaining: f32,
}

/// Hit-reaction capability: entities carrying this get knocked back on hit
///
/// The player deliberately does not carry it.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct HitReaction {
    pub force: f32,
    pub duration: f32,
}

impl Default for HitReaction {
    fn default() -> Self {
        Self {
            force: 8.0,
            duration: 0.3,
        }
    }
}

/// System: tick invincibility windows
pub fn tick_health_timers(mut query: Query<&mut Health>, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();
    for mut health in query.iter_mut() {
        health.tick(delta);
    }
}

/// System: apply damage from HitLanded events
pub fn apply_damage(
    mut hits: EventReader<HitLanded>,
    mut health_changed: EventWriter<HealthChanged>,
    mut damage_taken: EventWriter<DamageTaken>,
    mut deflected: EventWriter<AttackDeflected>,
    mut died: EventWriter<EntityDied>,
    mut targets: Query<&mut Health>,
) {
    for hit in hits.read() {
        // Health is an optional capability — no Health, no damage
        let Ok(mut health) = targets.get_mut(hit.target) else {
            crate::logger::log_warning(&format!(
                "HitLanded: target {:?} has no Health component, skipping",
                hit.target
            ));
            continue;
        };

        match health.take_damage(hit.damage) {
            DamageOutcome::Deflected => {
                deflected.write(AttackDeflected {
                    attacker: hit.attacker,
                    defender: hit.target,
                });
            }
            DamageOutcome::Ignored => {}
            DamageOutcome::Applied { remaining } => {
                health_changed.write(HealthChanged {
                    entity: hit.target,
                    current: remaining,
                    max: health.max,
                });
                damage_taken.write(DamageTaken {
                    entity: hit.target,
                    amount: hit.damage,
                    direction: hit.direction,
                });
            }
            DamageOutcome::Fatal => {
                health_changed.write(HealthChanged {
                    entity: hit.target,
                    current: 0,
                    max: health.max,
                });
                damage_taken.write(DamageTaken {
                    entity: hit.target,
                    amount: hit.damage,
                    direction: hit.direction,
                });
                died.write(EntityDied {
                    entity: hit.target,
                    killer: Some(hit.attacker),
                });
                crate::logger::log_info(&format!(
                    "Entity {:?} killed by {:?}",
                    hit.target, hit.attacker
                ));
            }
        }
    }
}

/// System: reflect deflected hits back at the attacker
///
/// Counter damage comes from the defender's deflect skill config, default 1
/// when the defender has no skill set. The attacker is also knocked away
/// from the defender.
pub fn handle_deflections(
    mut deflections: EventReader<AttackDeflected>,
    defenders: Query<(&Transform, Option<&SkillSet>)>,
    mut attackers: Query<(&mut Health, &Transform)>,
    mut health_changed: EventWriter<HealthChanged>,
    mut damage_taken: EventWriter<DamageTaken>,
    mut died: EventWriter<EntityDied>,
) {
    for deflection in deflections.read() {
        let Ok((defender_transform, skill_set)) = defenders.get(deflection.defender) else {
            continue;
        };
        let Ok((mut attacker_health, attacker_transform)) = attackers.get_mut(deflection.attacker)
        else {
            continue;
        };

        let counter_damage = skill_set.map(|s| s.deflect.counter_damage).unwrap_or(1);
        let direction = (attacker_transform.translation - defender_transform.translation)
            .normalize_or_zero();

        crate::logger::log(&format!(
            "🛡 {:?} deflected {:?}, countering for {}",
            deflection.defender, deflection.attacker, counter_damage
        ));

        match attacker_health.take_damage(counter_damage) {
            DamageOutcome::Applied { remaining } => {
                health_changed.write(HealthChanged {
                    entity: deflection.attacker,
                    current: remaining,
                    max: attacker_health.max,
                });
                damage_taken.write(DamageTaken {
                    entity: deflection.attacker,
                    amount: counter_damage,
                    direction,
                });
            }
            DamageOutcome::Fatal => {
                health_changed.write(HealthChanged {
                    entity: deflection.attacker,
                    current: 0,
                    max: attacker_health.max,
                });
                damage_taken.write(DamageTaken {
                    entity: deflection.attacker,
                    amount: counter_damage,
                    direction,
                });
                died.write(EntityDied {
                    entity: deflection.attacker,
                    killer: Some(deflection.defender),
                });
            }
            DamageOutcome::Deflected | DamageOutcome::Ignored => {}
        }
    }
}

/// System: heal requests → Health API → notifications
pub fn handle_heal_requests(
    mut requests: EventReader<HealRequested>,
    mut targets: Query<&mut Health>,
    mut health_changed: EventWriter<HealthChanged>,
    mut healed: EventWriter<Healed>,
) {
    for request in requests.read() {
        let Ok(mut health) = targets.get_mut(request.entity) else {
            continue;
        };

        // Dead entities can't be healed, only revived
        if let Some(current) = health.heal(request.amount) {
            health_changed.write(HealthChanged {
                entity: request.entity,
                current,
                max: health.max,
            });
            healed.write(Healed {
                entity: request.entity,
                current,
            });
        }
    }
}

/// System: knockback on damaged entities with the hit-reaction capability
///
/// Runs after damage application so a deflected hit never knocks the
/// defender back. Enemies enter Hurt and stay there until knockback ends.
pub fn apply_hit_reactions(
    mut commands: Commands,
    mut damage_events: EventReader<DamageTaken>,
    mut reactions: Query<(&HitReaction, Option<&mut EnemyState>)>,
) {
    for event in damage_events.read() {
        let Ok((reaction, enemy_state)) = reactions.get_mut(event.entity) else {
            continue;
        };

        if let Ok(mut entity_commands) = commands.get_entity(event.entity) {
            entity_commands.insert(Knockback::new(
                event.direction,
                reaction.force,
                reaction.duration,
            ));
        }

        if let Some(mut state) = enemy_state {
            if !matches!(*state, EnemyState::Dead) {
                *state = EnemyState::Hurt;
            }
        }
    }
}

/// System: shut down dead entities
///
/// Zeroes velocity, strips movement and any in-flight action, marks the
/// corpse and schedules the despawn. The death effect cue fires here.
/// Only enemy corpses get the delayed despawn — the dead player entity
/// persists so it can still be revived.
pub fn handle_deaths(
    mut commands: Commands,
    mut death_events: EventReader<EntityDied>,
    mut bodies: Query<(&mut PhysicsBody, &Transform, Option<&mut EnemyState>)>,
    players: Query<(), With<Player>>,
    mut effects: EventWriter<EffectCue>,
) {
    for event in death_events.read() {
        if let Ok((mut body, transform, enemy_state)) = bodies.get_mut(event.entity) {
            body.velocity = Vec3::ZERO;

            if let Some(mut state) = enemy_state {
                *state = EnemyState::Dead;
            }

            effects.write(EffectCue {
                effect: "death_burst".to_string(),
                position: transform.translation,
            });
        }

        if let Ok(mut entity_commands) = commands.get_entity(event.entity) {
            entity_commands.remove::<MovementInput>();
            entity_commands.remove::<crate::combat::combo::ComboState>();
            entity_commands.remove::<DashState>();
            entity_commands.insert(Dead);
            if players.get(event.entity).is_err() {
                entity_commands.insert(DespawnAfter { remaining: 2.0 });
            }

            crate::logger::log_info(&format!("Disabled simulation for dead entity {:?}", event.entity));
        }
    }
}

/// System: remove corpses after their delay
pub fn despawn_after_timeout(
    mut commands: Commands,
    mut query: Query<(Entity, &mut DespawnAfter)>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, mut despawn) in query.iter_mut() {
        despawn.remaining -= delta;
        if despawn.remaining <= 0.0 {
            commands.entity(entity).despawn();
        }
    }
}
