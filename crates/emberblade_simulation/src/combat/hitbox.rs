//! Melee hit volumes
//!
//! Architecture:
//! - StrikeStarted spawns a sphere hitbox at attacker position + facing(offset)
//! - Overlap check is a plain sphere-distance scan over living actors
//! - Each hitbox lives 1 frame: detect overlaps → despawn

use bevy::prelude::*;

use crate::components::{Actor, Health};

use super::health::HitLanded;

/// Attack hitbox (temporary, lives 1 frame)
#[derive(Component, Debug, Clone)]
pub struct AttackHitbox {
    /// Sphere radius (meters)
    pub radius: f32,
    /// Damage before target-side gates
    pub damage: u32,
    /// Who is attacking (friendly-fire filter + knockback origin)
    pub attacker: Entity,
}

/// Event: a strike activated (combo step, boss swipe)
#[derive(Event, Debug, Clone)]
pub struct StrikeStarted {
    pub attacker: Entity,
    pub damage: u32,
    pub radius: f32,
    /// Local offset from the attacker, rotated by its facing
    pub offset: Vec3,
}

/// System: spawn hitboxes from StrikeStarted events
pub fn spawn_attack_hitboxes(
    mut commands: Commands,
    mut events: EventReader<StrikeStarted>,
    attackers: Query<&Transform>,
) {
    for event in events.read() {
        let Ok(attacker_transform) = attackers.get(event.attacker) else {
            crate::logger::log_warning(&format!(
                "StrikeStarted: attacker entity {:?} not found",
                event.attacker
            ));
            continue;
        };

        let hitbox_position =
            attacker_transform.translation + attacker_transform.rotation * event.offset;

        commands.spawn((
            AttackHitbox {
                radius: event.radius,
                damage: event.damage,
                attacker: event.attacker,
            },
            Transform::from_translation(hitbox_position),
            GlobalTransform::default(),
        ));
    }
}

/// System: detect hitbox overlaps
///
/// Scans living actors of other factions, emits HitLanded with the knockback
/// direction normalize(target - attacker), then despawns the hitbox.
pub fn detect_hitbox_overlaps(
    mut commands: Commands,
    hitboxes: Query<(Entity, &AttackHitbox, &Transform)>,
    attackers: Query<(&Actor, &Transform)>,
    targets: Query<(Entity, &Actor, &Transform, &Health)>,
    mut hits: EventWriter<HitLanded>,
) {
    for (hitbox_entity, hitbox, hitbox_transform) in hitboxes.iter() {
        let hitbox_pos = hitbox_transform.translation;

        // The attacker may have died between strike and detection
        if let Ok((attacker_actor, attacker_transform)) = attackers.get(hitbox.attacker) {
            for (target_entity, target_actor, target_transform, target_health) in targets.iter() {
                if target_entity == hitbox.attacker {
                    continue;
                }
                if target_actor.faction_id == attacker_actor.faction_id {
                    continue;
                }
                if !target_health.is_alive() {
                    continue;
                }

                let target_pos = target_transform.translation;
                if hitbox_pos.distance(target_pos) < hitbox.radius {
                    let direction =
                        (target_pos - attacker_transform.translation).normalize_or_zero();
                    hits.write(HitLanded {
                        attacker: hitbox.attacker,
                        target: target_entity,
                        damage: hitbox.damage,
                        direction,
                    });
                }
            }
        }

        // Hitboxes live exactly one frame
        commands.entity(hitbox_entity).despawn();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_distance_logic() {
        let hitbox_pos = Vec3::ZERO;
        let radius = 1.5;

        let near = Vec3::new(1.0, 0.0, 0.0);
        let far = Vec3::new(2.0, 0.0, 0.0);

        assert!(hitbox_pos.distance(near) < radius);
        assert!(hitbox_pos.distance(far) > radius);
    }

    #[test]
    fn test_strike_offset_rotates_with_facing() {
        // Yaw +90° turns the -Z forward onto -X
        let transform = Transform::from_translation(Vec3::ZERO)
            .with_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));

        let offset = Vec3::NEG_Z; // 1m forward in local space
        let world = transform.translation + transform.rotation * offset;

        assert!((world - Vec3::NEG_X).length() < 1e-4, "world = {world:?}");
    }
}
