//! EMBERBLADE Simulation Core
//!
//! Headless ECS simulation of an arena action game (strategic layer):
//! - Game state: health/mana pools, combos, enemy FSMs, boss phases
//! - Combat rules: deflect and invincibility gates, knockback, detonations
//! - Session: wave spawning, score, run timer
//!
//! A client (rendering, real input, audio) sits on top and consumes the
//! presentation cue events. The simulation itself runs at a fixed 60Hz and
//! is deterministic for a given seed.

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Public modules
pub mod ai;
pub mod combat;
pub mod components;
pub mod logger;
pub mod physics;
pub mod presentation;
pub mod session;
pub mod skills;
pub mod spawn;

// Re-export core types for convenience
pub use ai::{AIPlugin, AttackPattern, BossPhases, Enemy, EnemyState, EnemyStats};
pub use combat::{
    AttackDeflected, AttackInput, CombatPlugin, ComboState, EntityDied, HealthChanged, HitLanded,
    MoveSet,
};
pub use components::*;
pub use logger::{init_logger, log, log_error, log_info, log_warning};
pub use physics::KinematicControllerPlugin;
pub use presentation::{AnimationCue, AnimationFlag, EffectCue, PresentationPlugin};
pub use session::{GameSession, SessionPlugin};
pub use skills::{AimInput, DashInput, DeflectInput, SkillsPlugin};
pub use spawn::{spawn_boss, spawn_enemy, spawn_player, EnemyArchetype, SpawnPlugin, WaveSpawner};

/// Frame phases on FixedUpdate, chained in declaration order.
///
/// The granularity is deliberate: any two systems that write the same event
/// stream live in ordered sets (or one chain), so the multi-threaded
/// executor cannot reorder them between runs.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Gravity, knockback, dash, velocity integration
    Locomotion,
    /// Enemy FSM transitions and movement intent
    Ai,
    /// Enemy attacks, boss specials, minion spawning
    Offense,
    /// Player skills (deflect / aimed shot / dash)
    Skills,
    /// Combos, hitboxes, projectiles, detonations
    Strikes,
    /// Damage application, deflect counters, heals
    Damage,
    /// Hit reactions, deaths, boss phase advancement
    Reaction,
    /// Run timer, score
    Session,
    /// Wave spawners
    Spawning,
    /// Animation flags, cue draining
    Presentation,
}

/// Main simulation plugin (bundles all subsystems)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            FixedUpdate,
            (
                SimulationSet::Locomotion,
                SimulationSet::Ai,
                SimulationSet::Offense,
                SimulationSet::Skills,
                SimulationSet::Strikes,
                SimulationSet::Damage,
                SimulationSet::Reaction,
                SimulationSet::Session,
                SimulationSet::Spawning,
                SimulationSet::Presentation,
            )
                .chain(),
        );

        // Fixed timestep 60Hz for the simulation tick
        app.insert_resource(Time::<Fixed>::from_hz(60.0));

        // Deterministic RNG: keep a caller-provided seed if one exists
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }

        app.add_plugins((
            KinematicControllerPlugin,
            AIPlugin,
            SkillsPlugin,
            CombatPlugin,
            SessionPlugin,
            SpawnPlugin,
            PresentationPlugin,
        ));
    }
}

/// Deterministic RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Creates a minimal Bevy App for headless simulation.
///
/// Time advances by exactly one fixed tick per `app.update()` call, so tests
/// can step the world deterministically regardless of wall-clock time.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
            1.0 / 60.0,
        )))
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0)); // 60Hz FixedUpdate

    app
}

/// World snapshot for determinism comparison
/// (simplified: Debug-formatted bytes, sorted by entity index)
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Sort by entity index for determinism
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
