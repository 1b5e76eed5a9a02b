//! Combat module
//!
//! ECS responsibilities:
//! - Game state: Health pools, combo state, status stacks
//! - Combat rules: deflect/invincibility gates, knockback, detonations
//! - Events: HitLanded, HealthChanged, DamageTaken, EntityDied, AttackDeflected
//!
//! Execution order (within the frame chain from lib.rs):
//! 1. Strikes: attack input → combo advance → hitboxes → projectiles → detonations
//! 2. Damage: invincibility tick → apply_damage → deflect counters → heals
//! 3. Reaction: hit reactions (knockback) → death handling → corpse cleanup

use bevy::prelude::*;

pub mod combo;
pub mod health;
pub mod hitbox;
pub mod projectile;
pub mod status;

// Re-export core types
pub use combo::{AttackInput, AttackStep, ComboState, MoveSet};
pub use health::{
    AttackDeflected, DamageTaken, Dead, DespawnAfter, EntityDied, HealRequested, Healed,
    HealthChanged, HitLanded, HitReaction,
};
pub use hitbox::{AttackHitbox, StrikeStarted};
pub use projectile::Projectile;
pub use status::StatusStacks;

use crate::SimulationSet;

/// Combat plugin
///
/// Registers combat systems on FixedUpdate (60Hz) in their fixed order.
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<AttackInput>()
            .add_event::<StrikeStarted>()
            .add_event::<HitLanded>()
            .add_event::<HealthChanged>()
            .add_event::<DamageTaken>()
            .add_event::<Healed>()
            .add_event::<EntityDied>()
            .add_event::<AttackDeflected>()
            .add_event::<HealRequested>();

        app.add_systems(
            FixedUpdate,
            (
                combo::handle_attack_input,
                combo::update_combos,
                hitbox::spawn_attack_hitboxes,
                hitbox::detect_hitbox_overlaps,
                projectile::move_projectiles,
                projectile::collide_projectiles,
                status::detonate_status_overload,
            )
                .chain()
                .in_set(SimulationSet::Strikes),
        );

        app.add_systems(
            FixedUpdate,
            (
                health::tick_health_timers,
                health::apply_damage,
                health::handle_deflections,
                health::handle_heal_requests,
            )
                .chain()
                .in_set(SimulationSet::Damage),
        );

        app.add_systems(
            FixedUpdate,
            (
                health::apply_hit_reactions,
                health::handle_deaths,
                health::despawn_after_timeout,
            )
                .chain()
                .in_set(SimulationSet::Reaction),
        );
    }
}
