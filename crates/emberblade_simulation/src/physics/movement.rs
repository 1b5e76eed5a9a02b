//! Kinematic locomotion for player and enemies
//!
//! Architecture:
//! - Custom velocity integration, no physics engine (headless simulation)
//! - Gravity + ground check + movement input, all on FixedUpdate (60Hz)
//! - Knockback and dash are locomotion-owned multi-frame sequences: while
//!   either component is present it owns the horizontal velocity and normal
//!   movement input is suppressed
//!
//! Per-frame order inside the locomotion set:
//! ground check → gravity → knockback decay → dash → movement input → integrate

use bevy::prelude::*;

use crate::combat::combo::ComboState;
use crate::skills::SkillRuntime;
use crate::SimulationSet;

/// Knockback velocity lerp factor (per second)
const KNOCKBACK_DECAY: f32 = 5.0;

/// Velocity owned by the simulation (m/s)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct PhysicsBody {
    pub velocity: Vec3,
}

/// Kinematic controller component
///
/// Drives character movement (input + gravity). Velocity is integrated
/// directly into the Transform.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct KinematicController {
    /// Movement speed (m/s)
    pub move_speed: f32,
    /// Gravity (m/s²)
    pub gravity: f32,
    /// Whether the character is on the ground
    pub grounded: bool,
}

impl Default for KinematicController {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            gravity: -9.81,
            grounded: false,
        }
    }
}

/// Movement intent (normalized world-space direction)
///
/// For headless tests — mock input through this component.
/// For enemies — written by the AI movement system.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct MovementInput {
    pub direction: Vec3,
}

/// Active knockback: pre-empts AI and movement input while present
///
/// Velocity lerps toward zero each tick; the component is removed after a
/// fixed duration and the FSM resumes on the next frame.
#[derive(Component, Debug, Clone, Copy)]
pub struct Knockback {
    pub velocity: Vec3,
    pub remaining: f32,
}

impl Knockback {
    /// Knockback along `direction` with the vertical component zeroed.
    pub fn new(direction: Vec3, force: f32, duration: f32) -> Self {
        let flat = Vec3::new(direction.x, 0.0, direction.z).normalize_or_zero();
        Self {
            velocity: flat * force,
            remaining: duration,
        }
    }
}

/// Active dash: fixed-distance, fixed-duration linear displacement
///
/// Inserted by the skill controller (or a boss charge), executed here.
#[derive(Component, Debug, Clone, Copy)]
pub struct DashState {
    pub direction: Vec3,
    pub speed: f32,
    pub remaining: f32,
}

impl DashState {
    pub fn new(direction: Vec3, distance: f32, duration: f32) -> Self {
        Self {
            direction: direction.normalize_or_zero(),
            speed: distance / duration,
            remaining: duration,
        }
    }
}

/// System: ground detection via a simple Y check
///
/// The arena floor sits at y=0; characters are capsules with their origin
/// at the feet. Grounded if y <= 0.5 (margin for numerical error).
pub fn ground_detection(mut query: Query<(&Transform, &mut KinematicController)>) {
    for (transform, mut controller) in query.iter_mut() {
        controller.grounded = transform.translation.y <= 0.5;
    }
}

/// System: apply gravity to velocity
pub fn apply_gravity(
    mut query: Query<(&KinematicController, &mut PhysicsBody)>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (controller, mut body) in query.iter_mut() {
        if controller.grounded {
            // Kill the accumulated fall velocity so we stick to the floor
            if body.velocity.y < 0.0 {
                body.velocity.y = 0.0;
            }
        } else {
            body.velocity.y += controller.gravity * delta;
        }
    }
}

/// System: knockback decay
///
/// Owns horizontal velocity while active; velocity lerps toward zero each
/// tick, the component is removed once the duration elapses.
pub fn update_knockback(
    mut commands: Commands,
    mut query: Query<(Entity, &mut Knockback, &mut PhysicsBody)>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, mut knockback, mut body) in query.iter_mut() {
        body.velocity.x = knockback.velocity.x;
        body.velocity.z = knockback.velocity.z;

        let t = (KNOCKBACK_DECAY * delta).min(1.0);
        knockback.velocity = knockback.velocity.lerp(Vec3::ZERO, t);

        knockback.remaining -= delta;
        if knockback.remaining <= 0.0 {
            body.velocity.x = 0.0;
            body.velocity.z = 0.0;
            if let Ok(mut entity_commands) = commands.get_entity(entity) {
                entity_commands.remove::<Knockback>();
            }
        }
    }
}

/// System: dash displacement
pub fn update_dash(
    mut commands: Commands,
    mut query: Query<(Entity, &mut DashState, &mut PhysicsBody)>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (entity, mut dash, mut body) in query.iter_mut() {
        body.velocity.x = dash.direction.x * dash.speed;
        body.velocity.z = dash.direction.z * dash.speed;

        dash.remaining -= delta;
        if dash.remaining <= 0.0 {
            body.velocity.x = 0.0;
            body.velocity.z = 0.0;
            if let Ok(mut entity_commands) = commands.get_entity(entity) {
                entity_commands.remove::<DashState>();
            }
        }
    }
}

/// System: apply movement input to velocity
///
/// Movement is suppressed (velocity zeroed) while the entity is attacking
/// or running a blocking skill; knockback and dash own the velocity outright
/// and are excluded by filter.
pub fn apply_movement_input(
    mut query: Query<
        (
            &KinematicController,
            &MovementInput,
            &mut PhysicsBody,
            Option<&ComboState>,
            Option<&SkillRuntime>,
        ),
        (Without<Knockback>, Without<DashState>),
    >,
) {
    for (controller, input, mut body, combo, skills) in query.iter_mut() {
        let attacking = combo.is_some();
        let skill_busy = skills.map(|s| s.is_busy()).unwrap_or(false);

        if !attacking && !skill_busy && input.direction.length_squared() > 0.01 {
            let direction = input.direction.normalize();
            // Horizontal velocity only; Y is gravity's business
            body.velocity.x = direction.x * controller.move_speed;
            body.velocity.z = direction.z * controller.move_speed;
        } else {
            body.velocity.x = 0.0;
            body.velocity.z = 0.0;
        }
    }
}

/// System: integrate velocity → Transform
pub fn integrate_velocity_to_transform(
    mut query: Query<(&PhysicsBody, &mut Transform), With<KinematicController>>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (body, mut transform) in query.iter_mut() {
        transform.translation += body.velocity * delta;
        if transform.translation.y < 0.0 {
            transform.translation.y = 0.0;
        }
    }
}

/// Plugin: registers locomotion systems in their fixed order
pub struct KinematicControllerPlugin;

impl Plugin for KinematicControllerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (
                ground_detection,
                apply_gravity,
                update_knockback,
                update_dash,
                apply_movement_input,
                integrate_velocity_to_transform,
            )
                .chain()
                .in_set(SimulationSet::Locomotion),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gravity_logic() {
        // Gravity math without the App schedule
        let controller = KinematicController {
            grounded: false,
            ..default()
        };
        let mut body = PhysicsBody::default();

        let delta = 1.0 / 60.0;

        if !controller.grounded {
            body.velocity.y += controller.gravity * delta;
        }

        // After one tick: velocity.y = -9.81 / 60 ≈ -0.1635
        assert!(body.velocity.y < -0.16);
        assert!(body.velocity.y > -0.17);
    }

    #[test]
    fn test_knockback_flattens_direction_and_decays() {
        let mut knockback = Knockback::new(Vec3::new(1.0, 3.0, 0.0), 8.0, 0.3);

        // Vertical component zeroed before scaling by force
        assert_eq!(knockback.velocity, Vec3::new(8.0, 0.0, 0.0));

        let delta = 1.0 / 60.0;
        let t = (KNOCKBACK_DECAY * delta).min(1.0);
        let before = knockback.velocity.length();
        knockback.velocity = knockback.velocity.lerp(Vec3::ZERO, t);

        assert!(knockback.velocity.length() < before);
        assert!(knockback.velocity.x > 0.0); // still pointing the same way
    }

    #[test]
    fn test_dash_speed_from_distance_and_duration() {
        let dash = DashState::new(Vec3::Z, 5.0, 0.25);
        assert!((dash.speed - 20.0).abs() < 1e-5);
        assert_eq!(dash.direction, Vec3::Z);
        assert_eq!(dash.remaining, 0.25);
    }

    #[test]
    fn test_grounded_stops_gravity_logic() {
        let controller = KinematicController {
            grounded: true,
            ..default()
        };
        let mut body = PhysicsBody {
            velocity: Vec3::new(0.0, -2.0, 0.0),
        };

        if controller.grounded {
            if body.velocity.y < 0.0 {
                body.velocity.y = 0.0;
            }
        } else {
            body.velocity.y += controller.gravity * (1.0 / 60.0);
        }

        assert_eq!(body.velocity.y, 0.0);
    }
}
