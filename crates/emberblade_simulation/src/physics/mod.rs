//! Locomotion module
//!
//! Kinematic controller, gravity, knockback and dash displacement.
//! No physics engine: velocity is integrated directly into Transforms and
//! hit detection elsewhere uses plain sphere-distance checks.

pub mod movement;

// Re-export core types
pub use movement::{
    apply_movement_input, DashState, KinematicController, KinematicControllerPlugin, Knockback,
    MovementInput, PhysicsBody,
};
