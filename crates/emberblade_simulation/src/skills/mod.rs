//! Skill module (deflect / aimed shot / dash)

use bevy::prelude::*;

pub mod controller;

// Re-export core types
pub use controller::{
    ActiveSkill, AimDirection, AimInput, AimSource, AimedShotSkill, DashInput, DashSkill,
    DeflectInput, DeflectSkill, SkillRuntime, SkillSet,
};

use crate::SimulationSet;

/// Skill plugin
///
/// Input events are handled before active sequences tick so a fresh deflect
/// keeps its full window on the frame it starts.
pub struct SkillsPlugin;

impl Plugin for SkillsPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<DeflectInput>()
            .add_event::<AimInput>()
            .add_event::<AimDirection>()
            .add_event::<DashInput>();

        app.add_systems(
            FixedUpdate,
            (
                controller::tick_skills,
                controller::start_deflects,
                controller::handle_aim_input,
                controller::update_aim_direction,
                controller::handle_dash_input,
                controller::update_active_skills,
            )
                .chain()
                .in_set(SimulationSet::Skills),
        );
    }
}
