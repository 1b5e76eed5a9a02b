//! Player-side components: control marker, camera frame of reference

use bevy::prelude::*;

/// Player control marker
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Player;

/// Yaw of the follow camera, used to turn raw stick input into world space
///
/// The input layer is external; the simulation only needs the camera yaw to
/// resolve camera-relative directions (dash, aim stick).
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct CameraOrientation {
    /// Rotation around Y (radians), 0 = camera looking down -Z
    pub yaw: f32,
}

impl CameraOrientation {
    /// Transforms a 2D input vector (x = strafe, y = forward) into a world
    /// direction on the ground plane.
    pub fn world_direction(&self, input: Vec2) -> Vec3 {
        let local = Vec3::new(input.x, 0.0, -input.y);
        (Quat::from_rotation_y(self.yaw) * local).normalize_or_zero()
    }
}
