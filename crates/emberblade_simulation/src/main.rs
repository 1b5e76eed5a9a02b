//! Headless EMBERBLADE arena run
//!
//! Runs the Bevy App without a renderer: one player with a scripted attack
//! spam, a boss and timed enemy waves. Useful for eyeballing the combat log
//! and checking determinism by hand.

use bevy::prelude::*;
use emberblade_simulation::{
    create_headless_app, spawn_boss, spawn_player, AttackInput, GameSession, SimulationPlugin,
    WaveSpawner,
};

fn main() {
    let seed = 42;
    println!("Starting EMBERBLADE headless arena (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);
    app.insert_resource(WaveSpawner::default());

    let mut commands = app.world_mut().commands();
    let player = spawn_player(&mut commands, Vec3::ZERO);
    spawn_boss(&mut commands, Vec3::new(0.0, 0.0, -10.0));
    app.world_mut().flush();

    // 60 seconds of simulation, swinging twice a second
    for tick in 0..3600 {
        if tick % 30 == 0 {
            app.world_mut()
                .send_event(AttackInput { entity: player });
        }

        app.update();

        if tick % 600 == 0 {
            let entity_count = app.world().entities().len();
            let session = app.world().resource::<GameSession>();
            println!(
                "Tick {}: {} entities, score {}, {:.0}s left",
                tick, entity_count, session.score, session.time_remaining
            );
        }
    }

    let session = app.world().resource::<GameSession>();
    println!(
        "Arena run complete! Score {} (best {})",
        session.score, session.best_score
    );
}
