//! ECS components for game entities
//!
//! Organized by domain:
//! - actor: base stats (faction, health, mana)
//! - player: player control marker, camera frame of reference

pub mod actor;
pub mod player;

// Re-exports for convenient imports
pub use actor::*;
pub use player::*;
