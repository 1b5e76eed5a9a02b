//! Player skill controller: deflect, aimed shot, dash
//!
//! Mutual exclusion: at most one of {deflecting, aiming, dashing, locomotion}
//! is active. Start requests while busy are rejected with a log line, never
//! queued. Cooldowns and the mana pool tick every frame; a cast is rejected
//! when its cost exceeds current mana or its cooldown has not expired.
//!
//! Multi-frame sequences (deflect window, aim hold, dash displacement) are
//! state + elapsed-time fields re-entered each tick — locomotion owns the
//! dash itself (DashState lives in physics).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::{CameraOrientation, Health, Mana};
use crate::physics::{DashState, MovementInput};
use crate::presentation::{AnimationCue, AnimationFlag};
use crate::combat::{ComboState, Projectile};

/// Deflect config: fixed-duration window that bounces hits back
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeflectSkill {
    pub duration: f32,
    /// Damage reflected to the attacker on a deflected hit
    pub counter_damage: u32,
    pub cooldown: f32,
    pub mana_cost: f32,
}

impl Default for DeflectSkill {
    fn default() -> Self {
        Self {
            duration: 1.5,
            counter_damage: 1,
            cooldown: 3.0,
            mana_cost: 1.0,
        }
    }
}

/// Aimed shot config: press-to-aim, release-to-fire
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AimedShotSkill {
    pub cooldown: f32,
    pub mana_cost: f32,
    pub projectile_speed: f32,
    pub projectile_damage: u32,
}

impl Default for AimedShotSkill {
    fn default() -> Self {
        Self {
            cooldown: 1.0,
            mana_cost: 1.0,
            projectile_speed: 15.0,
            projectile_damage: 1,
        }
    }
}

/// Dash config: fixed distance over a fixed duration, own cooldown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DashSkill {
    pub distance: f32,
    pub duration: f32,
    pub cooldown: f32,
    pub mana_cost: f32,
}

impl Default for DashSkill {
    fn default() -> Self {
        Self {
            distance: 5.0,
            duration: 0.25,
            cooldown: 2.0,
            mana_cost: 0.0,
        }
    }
}

/// Immutable skill loadout
#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillSet {
    pub deflect: DeflectSkill,
    pub aimed_shot: AimedShotSkill,
    pub dash: DashSkill,
}

/// Currently running skill sequence
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub enum ActiveSkill {
    #[default]
    None,
    Deflecting {
        remaining: f32,
    },
    Aiming {
        direction: Vec3,
    },
}

/// Per-entity skill runtime: cooldown timers + active sequence
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct SkillRuntime {
    pub deflect_cooldown: f32,
    pub aim_cooldown: f32,
    pub dash_cooldown: f32,
    pub active: ActiveSkill,
}

impl SkillRuntime {
    /// True while a blocking skill sequence runs (movement and other skill
    /// starts are rejected). Dash blocks through DashState, not through here.
    pub fn is_busy(&self) -> bool {
        !matches!(self.active, ActiveSkill::None)
    }

    pub fn tick(&mut self, delta: f32) {
        self.deflect_cooldown = (self.deflect_cooldown - delta).max(0.0);
        self.aim_cooldown = (self.aim_cooldown - delta).max(0.0);
        self.dash_cooldown = (self.dash_cooldown - delta).max(0.0);
    }
}

/// Where an aim direction comes from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AimSource {
    /// Gamepad stick vector (camera-relative)
    Stick(Vec2),
    /// Ground-plane point under the pointer
    GroundPoint(Vec3),
}

/// Event: deflect button pressed
#[derive(Event, Debug, Clone)]
pub struct DeflectInput {
    pub entity: Entity,
}

/// Event: aim button pressed or released
#[derive(Event, Debug, Clone)]
pub struct AimInput {
    pub entity: Entity,
    pub pressed: bool,
}

/// Event: fresh aim direction data while holding the aim
#[derive(Event, Debug, Clone)]
pub struct AimDirection {
    pub entity: Entity,
    pub source: AimSource,
}

/// Event: dash button pressed
#[derive(Event, Debug, Clone)]
pub struct DashInput {
    pub entity: Entity,
}

/// Checks the shared busy gate for a new skill start.
fn rejected_as_busy(
    entity: Entity,
    skill: &str,
    runtime: &SkillRuntime,
    dashing: bool,
    attacking: bool,
) -> bool {
    if runtime.is_busy() || dashing || attacking {
        crate::logger::log(&format!("{} input from {:?} rejected: busy", skill, entity));
        return true;
    }
    false
}

/// Checks cooldown + mana for a cast; consumes mana on success.
fn try_pay_cast(
    entity: Entity,
    skill: &str,
    cooldown_remaining: f32,
    cost: f32,
    mana: &mut Mana,
) -> bool {
    if cooldown_remaining > 0.0 {
        crate::logger::log(&format!(
            "{} input from {:?} rejected: cooldown {:.2}s left",
            skill, entity, cooldown_remaining
        ));
        return false;
    }
    if !mana.consume(cost) {
        crate::logger::log(&format!(
            "{} input from {:?} rejected: needs {} mana, has {:.1}",
            skill, entity, cost, mana.current
        ));
        return false;
    }
    true
}

/// System: tick skill cooldowns and regenerate mana
pub fn tick_skills(
    mut query: Query<(&mut SkillRuntime, Option<&mut Mana>)>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (mut runtime, mana) in query.iter_mut() {
        runtime.tick(delta);
        if let Some(mut mana) = mana {
            mana.regenerate(delta);
        }
    }
}

/// System: start deflect windows
pub fn start_deflects(
    mut inputs: EventReader<DeflectInput>,
    mut casters: Query<(
        &SkillSet,
        &mut SkillRuntime,
        &mut Mana,
        &mut Health,
        Option<&DashState>,
        Option<&ComboState>,
    )>,
    mut animations: EventWriter<AnimationCue>,
) {
    for input in inputs.read() {
        let Ok((skills, mut runtime, mut mana, mut health, dash, combo)) =
            casters.get_mut(input.entity)
        else {
            continue;
        };

        if health.is_dead {
            continue;
        }
        if rejected_as_busy(input.entity, "Deflect", &runtime, dash.is_some(), combo.is_some()) {
            continue;
        }
        if !try_pay_cast(
            input.entity,
            "Deflect",
            runtime.deflect_cooldown,
            skills.deflect.mana_cost,
            &mut mana,
        ) {
            continue;
        }

        runtime.active = ActiveSkill::Deflecting {
            remaining: skills.deflect.duration,
        };
        runtime.deflect_cooldown = skills.deflect.cooldown;
        health.is_deflecting = true;

        animations.write(AnimationCue {
            entity: input.entity,
            name: "deflect".to_string(),
        });
    }
}

/// System: aim press / release
///
/// Press enters the aim hold (initial direction = current facing); release
/// fires a status-stacking projectile along the held direction.
pub fn handle_aim_input(
    mut commands: Commands,
    mut inputs: EventReader<AimInput>,
    mut casters: Query<(
        &SkillSet,
        &mut SkillRuntime,
        &mut Mana,
        &Health,
        &Transform,
        &crate::components::Actor,
        Option<&DashState>,
        Option<&ComboState>,
    )>,
    mut animations: EventWriter<AnimationCue>,
    mut flags: EventWriter<AnimationFlag>,
) {
    for input in inputs.read() {
        let Ok((skills, mut runtime, mut mana, health, transform, actor, dash, combo)) =
            casters.get_mut(input.entity)
        else {
            continue;
        };

        if health.is_dead {
            continue;
        }

        if input.pressed {
            if rejected_as_busy(input.entity, "Aim", &runtime, dash.is_some(), combo.is_some()) {
                continue;
            }
            if runtime.aim_cooldown > 0.0 || !mana.can_afford(skills.aimed_shot.mana_cost) {
                crate::logger::log(&format!(
                    "Aim input from {:?} rejected: cooldown/mana gate",
                    input.entity
                ));
                continue;
            }

            runtime.active = ActiveSkill::Aiming {
                direction: (transform.rotation * Vec3::NEG_Z).normalize_or_zero(),
            };
            flags.write(AnimationFlag {
                entity: input.entity,
                name: "IsAiming",
                value: true,
            });
        } else {
            // Release fires only if we were actually aiming
            let ActiveSkill::Aiming { direction } = runtime.active else {
                continue;
            };

            runtime.active = ActiveSkill::None;
            flags.write(AnimationFlag {
                entity: input.entity,
                name: "IsAiming",
                value: false,
            });

            if !try_pay_cast(
                input.entity,
                "AimedShot",
                runtime.aim_cooldown,
                skills.aimed_shot.mana_cost,
                &mut mana,
            ) {
                continue;
            }
            runtime.aim_cooldown = skills.aimed_shot.cooldown;

            let velocity = direction * skills.aimed_shot.projectile_speed;
            commands.spawn((
                Projectile::new(
                    input.entity,
                    actor.faction_id,
                    velocity,
                    skills.aimed_shot.projectile_damage,
                )
                .with_status(),
                Transform::from_translation(transform.translation + direction * 0.5),
                GlobalTransform::default(),
            ));

            animations.write(AnimationCue {
                entity: input.entity,
                name: "aimed_shot".to_string(),
            });
        }
    }
}

/// System: keep the held aim direction fresh
///
/// Stick input is camera-relative; a ground point aims from the caster's
/// feet toward the point. Useless data (zero vectors) keeps the old aim.
pub fn update_aim_direction(
    mut directions: EventReader<AimDirection>,
    mut casters: Query<(&mut SkillRuntime, &Transform, Option<&CameraOrientation>)>,
) {
    for event in directions.read() {
        let Ok((mut runtime, transform, camera)) = casters.get_mut(event.entity) else {
            continue;
        };
        let ActiveSkill::Aiming { direction } = &mut runtime.active else {
            continue;
        };

        let fresh = match event.source {
            AimSource::Stick(stick) => camera
                .copied()
                .unwrap_or_default()
                .world_direction(stick),
            AimSource::GroundPoint(point) => {
                let to_point = point - transform.translation;
                Vec3::new(to_point.x, 0.0, to_point.z).normalize_or_zero()
            }
        };

        if fresh.length_squared() > 0.01 {
            *direction = fresh;
        }
    }
}

/// System: dash starts
///
/// Direction = current movement input (already world-space, camera-resolved
/// by the input layer) or facing when standing still. The displacement itself
/// is locomotion-owned via DashState.
pub fn handle_dash_input(
    mut commands: Commands,
    mut inputs: EventReader<DashInput>,
    mut casters: Query<(
        &SkillSet,
        &mut SkillRuntime,
        &mut Mana,
        &Health,
        &Transform,
        Option<&MovementInput>,
        Option<&DashState>,
        Option<&ComboState>,
    )>,
    mut animations: EventWriter<AnimationCue>,
) {
    for input in inputs.read() {
        let Ok((skills, mut runtime, mut mana, health, transform, movement, dash, combo)) =
            casters.get_mut(input.entity)
        else {
            continue;
        };

        if health.is_dead {
            continue;
        }
        if rejected_as_busy(input.entity, "Dash", &runtime, dash.is_some(), combo.is_some()) {
            continue;
        }
        if !try_pay_cast(
            input.entity,
            "Dash",
            runtime.dash_cooldown,
            skills.dash.mana_cost,
            &mut mana,
        ) {
            continue;
        }
        runtime.dash_cooldown = skills.dash.cooldown;

        let input_direction = movement.map(|m| m.direction).unwrap_or(Vec3::ZERO);
        let direction = if input_direction.length_squared() > 0.01 {
            input_direction.normalize()
        } else {
            (transform.rotation * Vec3::NEG_Z).normalize_or_zero()
        };

        commands.entity(input.entity).insert(DashState::new(
            direction,
            skills.dash.distance,
            skills.dash.duration,
        ));

        animations.write(AnimationCue {
            entity: input.entity,
            name: "dash".to_string(),
        });
    }
}

/// System: advance running skill sequences
///
/// The deflect window counts down and clears the shared flag on expiry.
pub fn update_active_skills(mut casters: Query<(&mut SkillRuntime, &mut Health)>, time: Res<Time<Fixed>>) {
    let delta = time.delta_secs();

    for (mut runtime, mut health) in casters.iter_mut() {
        if let ActiveSkill::Deflecting { remaining } = &mut runtime.active {
            *remaining -= delta;
            if *remaining <= 0.0 {
                runtime.active = ActiveSkill::None;
                health.is_deflecting = false;
            }
        }
    }
}
