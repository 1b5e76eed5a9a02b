//! AI module (enemy FSM + boss phase controller)

use bevy::prelude::*;

pub mod boss;
pub mod enemy;

// Re-export core types
pub use boss::{AttackPattern, BossPhase, BossPhases, MinionSpawner, SpecialAttack};
pub use enemy::{Enemy, EnemyState, EnemyStats, RangedAttacker};

use crate::SimulationSet;

/// AI plugin
///
/// Decision systems (FSM, movement intent) run in the Ai set before
/// locomotion-driven positions are consumed by strikes; offensive systems
/// (attack execution, boss specials, minion spawning) run in Offense.
/// Phase advancement reads HealthChanged after damage lands, in Reaction.
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (enemy::enemy_fsm_transitions, enemy::enemy_movement_from_state)
                .chain()
                .in_set(SimulationSet::Ai),
        );

        app.add_systems(
            FixedUpdate,
            (
                enemy::enemy_attack_execution,
                boss::boss_special_attacks,
                boss::boss_minion_spawning,
            )
                .chain()
                .in_set(SimulationSet::Offense),
        );

        app.add_systems(
            FixedUpdate,
            (boss::advance_boss_phase, boss::track_minion_deaths)
                .chain()
                .in_set(SimulationSet::Reaction)
                .after(crate::combat::health::handle_deaths),
        );
    }
}
