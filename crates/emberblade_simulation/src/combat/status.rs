//! Status stacks applied by player shots
//!
//! Each aimed shot adds one stack; at the threshold the carrier detonates —
//! area damage to its own faction (chain-clearing tool) and certain death for
//! the carrier itself.

use bevy::prelude::*;

use crate::components::{Actor, Health};
use crate::presentation::EffectCue;

use super::health::HitLanded;

pub const STACKS_TO_DETONATE: u8 = 3;
pub const DETONATION_RADIUS: f32 = 3.0;
pub const DETONATION_DAMAGE: u32 = 2;

/// Stack counter capability (enemies carry it, the player does not)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct StatusStacks {
    pub count: u8,
}

impl StatusStacks {
    pub fn primed(&self) -> bool {
        self.count >= STACKS_TO_DETONATE
    }
}

/// System: detonate entities that reached the stack threshold
pub fn detonate_status_overload(
    mut carriers: Query<(Entity, &Actor, &Transform, &Health, &mut StatusStacks)>,
    neighbors: Query<(Entity, &Actor, &Transform, &Health)>,
    mut hits: EventWriter<HitLanded>,
    mut effects: EventWriter<EffectCue>,
) {
    let mut detonations: Vec<(Entity, u64, Vec3, u32)> = Vec::new();

    for (entity, actor, transform, health, mut stacks) in carriers.iter_mut() {
        if !stacks.primed() || !health.is_alive() {
            continue;
        }
        stacks.count = 0;
        detonations.push((entity, actor.faction_id, transform.translation, health.max));
    }

    for (carrier, faction_id, position, carrier_max_hearts) in detonations {
        crate::logger::log(&format!("💥 Status overload: {:?} detonates", carrier));

        effects.write(EffectCue {
            effect: "status_detonation".to_string(),
            position,
        });

        // Splash hits the carrier's own faction around it
        for (neighbor, neighbor_actor, neighbor_transform, neighbor_health) in neighbors.iter() {
            if neighbor == carrier {
                continue;
            }
            if neighbor_actor.faction_id != faction_id {
                continue;
            }
            if !neighbor_health.is_alive() {
                continue;
            }
            let offset = neighbor_transform.translation - position;
            if offset.length() >= DETONATION_RADIUS {
                continue;
            }

            hits.write(HitLanded {
                attacker: carrier,
                target: neighbor,
                damage: DETONATION_DAMAGE,
                direction: offset.normalize_or_zero(),
            });
        }

        // The carrier never survives its own detonation
        hits.write(HitLanded {
            attacker: carrier,
            target: carrier,
            damage: carrier_max_hearts,
            direction: Vec3::ZERO,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stacks_prime_at_threshold() {
        let mut stacks = StatusStacks::default();
        assert!(!stacks.primed());

        stacks.count = STACKS_TO_DETONATE - 1;
        assert!(!stacks.primed());

        stacks.count += 1;
        assert!(stacks.primed());
    }
}
