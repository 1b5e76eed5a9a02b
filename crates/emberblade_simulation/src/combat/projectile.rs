//! Projectiles (player aimed shots, ranged enemies, boss volleys)
//!
//! Straight-line flight, sphere-distance hit check against living actors of
//! other factions, despawn on first hit or lifetime end.

use bevy::prelude::*;

use crate::components::{Actor, Health};

use super::health::HitLanded;
use super::status::StatusStacks;

#[derive(Component, Debug, Clone)]
pub struct Projectile {
    pub velocity: Vec3,
    pub damage: u32,
    /// Credited as the attacker on hit
    pub shooter: Entity,
    /// Faction of the shooter at fire time (the shooter may die in flight)
    pub faction_id: u64,
    /// Remaining flight time (seconds)
    pub lifetime: f32,
    /// Hit radius (meters)
    pub hit_radius: f32,
    /// Player shots stack status on their victims
    pub applies_status: bool,
}

impl Projectile {
    pub fn new(shooter: Entity, faction_id: u64, velocity: Vec3, damage: u32) -> Self {
        Self {
            velocity,
            damage,
            shooter,
            faction_id,
            lifetime: 3.0,
            hit_radius: 0.6,
            applies_status: false,
        }
    }

    pub fn with_status(mut self) -> Self {
        self.applies_status = true;
        self
    }
}

/// System: move projectiles and expire them
pub fn move_projectiles(
    mut commands: Commands,
    mut projectiles: Query<(Entity, &mut Projectile, &mut Transform)>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, mut projectile, mut transform) in projectiles.iter_mut() {
        transform.translation += projectile.velocity * delta;

        projectile.lifetime -= delta;
        if projectile.lifetime <= 0.0 {
            commands.entity(entity).despawn();
        }
    }
}

/// System: projectile collision
///
/// First living other-faction actor within the hit radius takes the damage;
/// the projectile despawns on impact.
pub fn collide_projectiles(
    mut commands: Commands,
    projectiles: Query<(Entity, &Projectile, &Transform)>,
    mut targets: Query<(Entity, &Actor, &Transform, &Health, Option<&mut StatusStacks>)>,
    mut hits: EventWriter<HitLanded>,
) {
    for (projectile_entity, projectile, projectile_transform) in projectiles.iter() {
        let position = projectile_transform.translation;

        for (target_entity, target_actor, target_transform, target_health, status) in
            targets.iter_mut()
        {
            if target_entity == projectile.shooter {
                continue;
            }
            if target_actor.faction_id == projectile.faction_id {
                continue;
            }
            if !target_health.is_alive() {
                continue;
            }
            if position.distance(target_transform.translation) >= projectile.hit_radius {
                continue;
            }

            let direction = Vec3::new(projectile.velocity.x, 0.0, projectile.velocity.z)
                .normalize_or_zero();
            hits.write(HitLanded {
                attacker: projectile.shooter,
                target: target_entity,
                damage: projectile.damage,
                direction,
            });

            // Status stacking is an optional capability on the target
            if projectile.applies_status {
                if let Some(mut stacks) = status {
                    stacks.count = stacks.count.saturating_add(1);
                }
            }

            commands.entity(projectile_entity).despawn();
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projectile_flight_math() {
        let mut translation = Vec3::ZERO;
        let velocity = Vec3::new(15.0, 0.0, 0.0);
        let delta = 1.0 / 60.0;

        translation += velocity * delta;
        assert!((translation.x - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_projectile_defaults() {
        let projectile = Projectile::new(Entity::PLACEHOLDER, 1, Vec3::Z * 15.0, 1);
        assert!(!projectile.applies_status);
        assert!(projectile.with_status().applies_status);
    }
}
