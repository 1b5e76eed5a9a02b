//! Combo attack state machine
//!
//! A move-set is a fixed ordered list of attack steps. ComboState exists only
//! while an attack is running (component presence == "is attacking", which is
//! what locomotion reads to suppress movement).
//!
//! Chain rules:
//! - input while idle → step 0 executes immediately
//! - input inside the step's combo window → next step executes immediately,
//!   wrapping to step 0 after the final step
//! - input outside the window while still attacking → buffered; the buffer is
//!   consumed on the first tick that evaluates inside the window, never before
//! - step runs out with no chain → back to idle, all flags cleared

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::Health;
use crate::presentation::{AnimationCue, EffectCue};
use crate::skills::SkillRuntime;

use super::hitbox::StrikeStarted;

/// One step of a combo (immutable config, shared across a move-set)
#[derive(Debug, Clone, PartialEq)]
pub struct AttackStep {
    /// Animation identifier sent to the presentation sink
    pub animation: String,
    /// Total step duration (seconds)
    pub duration: f32,
    /// Chain window [start, end] within the step
    pub combo_window: (f32, f32),
    pub damage: u32,
    /// Hit volume radius (meters)
    pub range: f32,
    /// Local offset of the hit volume, transformed by the attacker's facing
    pub origin_offset: Vec3,
    /// Optional effect cue fired at activation
    pub effect: Option<String>,
}

/// Ordered move-set driving the combo
#[derive(Component, Debug, Clone)]
pub struct MoveSet {
    pub steps: Vec<AttackStep>,
}

impl MoveSet {
    /// Default three-hit sword string
    pub fn basic_sword() -> Self {
        let step = |animation: &str, damage: u32| AttackStep {
            animation: animation.to_string(),
            duration: 0.5,
            combo_window: (0.2, 0.4),
            damage,
            range: 1.5,
            origin_offset: Vec3::NEG_Z, // 1m in front of the attacker
            effect: Some("slash_arc".to_string()),
        };

        Self {
            steps: vec![step("attack_1", 1), step("attack_2", 1), step("attack_3", 2)],
        }
    }
}

/// Result of advancing the combo by one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComboTick {
    /// A buffered input fired this step at the window opening
    pub fired: Option<usize>,
    /// The step ran out with no chain — combo over
    pub finished: bool,
}

/// Transient combo state, present only while attacking
#[derive(Component, Debug, Clone)]
pub struct ComboState {
    pub step: usize,
    pub elapsed: f32,
    pub can_chain: bool,
    pub buffered_input: bool,
}

impl ComboState {
    /// Fresh combo at step 0 (the caller executes step 0 immediately)
    pub fn start() -> Self {
        Self {
            step: 0,
            elapsed: 0.0,
            can_chain: false,
            buffered_input: false,
        }
    }

    /// Next step index: wraps to 0 only off the final step
    fn next_step(&self, step_count: usize) -> usize {
        if self.step + 1 >= step_count {
            0
        } else {
            self.step + 1
        }
    }

    fn advance(&mut self, step_count: usize) -> usize {
        self.step = self.next_step(step_count);
        self.elapsed = 0.0;
        self.can_chain = false;
        self.buffered_input = false;
        self.step
    }

    /// An attack input arrived mid-combo. Inside the window the chain fires
    /// immediately (returns the new step to execute); outside it the input
    /// is buffered for the next window opening.
    pub fn register_input(&mut self, steps: &[AttackStep]) -> Option<usize> {
        if self.can_chain {
            Some(self.advance(steps.len()))
        } else {
            self.buffered_input = true;
            None
        }
    }

    /// Advances time within the current step.
    pub fn tick(&mut self, steps: &[AttackStep], delta: f32) -> ComboTick {
        self.elapsed += delta;

        let (window_start, window_end) = steps[self.step].combo_window;
        self.can_chain = self.elapsed >= window_start && self.elapsed <= window_end;

        // Buffered input fires the instant a tick lands inside the window
        if self.can_chain && self.buffered_input {
            return ComboTick {
                fired: Some(self.advance(steps.len())),
                finished: false,
            };
        }

        ComboTick {
            fired: None,
            finished: self.elapsed >= steps[self.step].duration,
        }
    }
}

/// Event: attack button pressed
#[derive(Event, Debug, Clone)]
pub struct AttackInput {
    pub entity: Entity,
}

/// Fires the presentation cues and the strike for one step.
fn execute_step(
    entity: Entity,
    step: &AttackStep,
    animations: &mut EventWriter<AnimationCue>,
    effects: &mut EventWriter<EffectCue>,
    strikes: &mut EventWriter<StrikeStarted>,
    position: Vec3,
) {
    animations.write(AnimationCue {
        entity,
        name: step.animation.clone(),
    });

    if let Some(effect) = &step.effect {
        effects.write(EffectCue {
            effect: effect.clone(),
            position,
        });
    }

    // Damage is applied at activation, not on an animation callback
    strikes.write(StrikeStarted {
        attacker: entity,
        damage: step.damage,
        radius: step.range,
        offset: step.origin_offset,
    });
}

/// System: attack inputs start or chain combos
pub fn handle_attack_input(
    mut commands: Commands,
    mut inputs: EventReader<AttackInput>,
    mut attackers: Query<(
        &MoveSet,
        &Transform,
        &Health,
        Option<&mut ComboState>,
        Option<&SkillRuntime>,
    )>,
    mut animations: EventWriter<AnimationCue>,
    mut effects: EventWriter<EffectCue>,
    mut strikes: EventWriter<StrikeStarted>,
) {
    for input in inputs.read() {
        let Ok((move_set, transform, health, combo, skills)) = attackers.get_mut(input.entity)
        else {
            continue;
        };

        if health.is_dead {
            continue;
        }

        // Deflect/aim block attacks the same way they block movement
        if skills.map(|s| s.is_busy()).unwrap_or(false) {
            crate::logger::log(&format!(
                "Attack input from {:?} rejected: skill active",
                input.entity
            ));
            continue;
        }

        match combo {
            Some(mut state) => {
                if let Some(next) = state.register_input(&move_set.steps) {
                    execute_step(
                        input.entity,
                        &move_set.steps[next],
                        &mut animations,
                        &mut effects,
                        &mut strikes,
                        transform.translation,
                    );
                }
            }
            None => {
                let state = ComboState::start();
                execute_step(
                    input.entity,
                    &move_set.steps[0],
                    &mut animations,
                    &mut effects,
                    &mut strikes,
                    transform.translation,
                );
                commands.entity(input.entity).insert(state);
            }
        }
    }
}

/// System: advance running combos
pub fn update_combos(
    mut commands: Commands,
    mut attackers: Query<(Entity, &MoveSet, &Transform, &mut ComboState)>,
    time: Res<Time<Fixed>>,
    mut animations: EventWriter<AnimationCue>,
    mut effects: EventWriter<EffectCue>,
    mut strikes: EventWriter<StrikeStarted>,
) {
    let delta = time.delta_secs();

    for (entity, move_set, transform, mut state) in attackers.iter_mut() {
        let result = state.tick(&move_set.steps, delta);

        if let Some(step) = result.fired {
            execute_step(
                entity,
                &move_set.steps[step],
                &mut animations,
                &mut effects,
                &mut strikes,
                transform.translation,
            );
        } else if result.finished {
            commands.entity(entity).remove::<ComboState>();
        }
    }
}

/// Serializable description of a move-set for loadout export
///
/// AttackStep itself holds a Vec3 offset, so the wire form flattens it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackStepConfig {
    pub animation: String,
    pub duration: f32,
    pub combo_window: (f32, f32),
    pub damage: u32,
    pub range: f32,
    pub origin_offset: [f32; 3],
    pub effect: Option<String>,
}

impl From<&AttackStep> for AttackStepConfig {
    fn from(step: &AttackStep) -> Self {
        Self {
            animation: step.animation.clone(),
            duration: step.duration,
            combo_window: step.combo_window,
            damage: step.damage,
            range: step.range,
            origin_offset: step.origin_offset.to_array(),
            effect: step.effect.clone(),
        }
    }
}

impl From<AttackStepConfig> for AttackStep {
    fn from(config: AttackStepConfig) -> Self {
        Self {
            animation: config.animation,
            duration: config.duration,
            combo_window: config.combo_window,
            damage: config.damage,
            range: config.range,
            origin_offset: Vec3::from_array(config.origin_offset),
            effect: config.effect,
        }
    }
}
