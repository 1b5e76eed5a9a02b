//! Presentation bridge: animation and effect cues for a client layer
//!
//! The simulation never renders. Instead it emits cue events a client can
//! map onto animation players and particle systems. Continuous flags
//! (moving, attacking) are cached per entity and emitted only on change so
//! the client is not flooded with identical updates.

use bevy::prelude::*;

use crate::combat::ComboState;
use crate::components::Health;
use crate::physics::{Knockback, PhysicsBody};
use crate::SimulationSet;

/// One-shot animation trigger ("attack", "dash", "phase_transition", ...)
#[derive(Event, Debug, Clone)]
pub struct AnimationCue {
    pub entity: Entity,
    pub name: String,
}

/// Boolean animator parameter change ("IsMoving", "IsAiming", ...)
#[derive(Event, Debug, Clone)]
pub struct AnimationFlag {
    pub entity: Entity,
    pub name: &'static str,
    pub value: bool,
}

/// Visual effect at a world position ("death_burst", "status_detonation", ...)
#[derive(Event, Debug, Clone)]
pub struct EffectCue {
    pub effect: String,
    pub position: Vec3,
}

/// Last flag values sent, so only changes are emitted
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct AnimationState {
    pub is_moving: bool,
    pub is_attacking: bool,
}

const MOVING_SPEED_THRESHOLD: f32 = 0.1;

/// System: derive IsMoving / IsAttacking flags from simulation state
///
/// Knocked-back entities are frozen mid-reaction: no flag updates until the
/// knockback component is gone.
pub fn sync_animation_flags(
    mut actors: Query<
        (
            Entity,
            &mut AnimationState,
            &PhysicsBody,
            &Health,
            Option<&ComboState>,
        ),
        Without<Knockback>,
    >,
    mut flags: EventWriter<AnimationFlag>,
) {
    for (entity, mut state, body, health, combo) in actors.iter_mut() {
        if health.is_dead {
            continue;
        }

        let horizontal = Vec3::new(body.velocity.x, 0.0, body.velocity.z);
        let is_moving = horizontal.length() > MOVING_SPEED_THRESHOLD;
        if is_moving != state.is_moving {
            state.is_moving = is_moving;
            flags.write(AnimationFlag {
                entity,
                name: "IsMoving",
                value: is_moving,
            });
        }

        let is_attacking = combo.is_some();
        if is_attacking != state.is_attacking {
            state.is_attacking = is_attacking;
            flags.write(AnimationFlag {
                entity,
                name: "IsAttacking",
                value: is_attacking,
            });
        }
    }
}

/// System: drain cues to the debug log (a client would consume them instead)
pub fn log_presentation_cues(
    mut cues: EventReader<AnimationCue>,
    mut flags: EventReader<AnimationFlag>,
    mut effects: EventReader<EffectCue>,
) {
    for cue in cues.read() {
        crate::logger::log(&format!("anim {:?} ▶ {}", cue.entity, cue.name));
    }
    for flag in flags.read() {
        crate::logger::log(&format!(
            "flag {:?} {} = {}",
            flag.entity, flag.name, flag.value
        ));
    }
    for effect in effects.read() {
        crate::logger::log(&format!("fx {} @ {:?}", effect.effect, effect.position));
    }
}

/// Presentation plugin
pub struct PresentationPlugin;

impl Plugin for PresentationPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<AnimationCue>()
            .add_event::<AnimationFlag>()
            .add_event::<EffectCue>();

        app.add_systems(
            FixedUpdate,
            (sync_animation_flags, log_presentation_cues)
                .chain()
                .in_set(SimulationSet::Presentation),
        );
    }
}
