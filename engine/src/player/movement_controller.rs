//! Player Movement Controller
//!
//! Force-based movement for a rigid-body player. Movement direction is
//! relative to the look pivot, flattened onto the horizontal plane.
//!
//! # Physics Model
//!
//! - Soft speed cap: the driving force tapers as `speed * (1 - v / max_speed)`
//!   and is zero at or above `max_speed`. Velocity is never truncated, so
//!   overshoot from outside forces decays through the body's own drag.
//! - Ground check: a downward ray of `ground_ray_distance` against the ground
//!   layers.
//! - Jump: a single upward impulse of `jump_strength`, only while grounded.
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut movement = MovementController::new(MovementTuning::default());
//!
//! // Each fixed step:
//! movement.check_ground(&world, player, position);
//! movement.apply_movement(&mut world, player, forward, right, input);
//! ```

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::physics::{EntityId, ForceMode, LayerMask, PhysicsWorld, Ray};

/// Driving force scale
pub const DEFAULT_SPEED: f32 = 20.0;

/// Speed at which the driving force reaches zero, m/s
pub const DEFAULT_MAX_SPEED: f32 = 5.0;

/// Jump impulse
pub const DEFAULT_JUMP_STRENGTH: f32 = 5.0;

/// Ground ray length measured from the body center
pub const DEFAULT_GROUND_RAY_DISTANCE: f32 = 1.1;

/// Live-tunable movement parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementTuning {
    pub speed: f32,
    pub max_speed: f32,
    pub jump_strength: f32,
    /// Ground checks (and therefore jumping) only run when enabled
    pub can_jump: bool,
    pub ground_ray_distance: f32,
    pub ground_mask: LayerMask,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
            max_speed: DEFAULT_MAX_SPEED,
            jump_strength: DEFAULT_JUMP_STRENGTH,
            can_jump: true,
            ground_ray_distance: DEFAULT_GROUND_RAY_DISTANCE,
            ground_mask: LayerMask::layer(0),
        }
    }
}

/// Project `v` onto the horizontal plane, keeping its length.
///
/// A purely vertical vector has no horizontal heading and flattens to zero.
pub fn flatten(v: Vec3) -> Vec3 {
    let xz = (v.x * v.x + v.z * v.z).sqrt();
    if xz == 0.0 {
        return Vec3::ZERO;
    }
    let scale = v.length() / xz;
    Vec3::new(v.x * scale, 0.0, v.z * scale)
}

/// World-space move direction from pivot axes and a 2D input (x = strafe,
/// y = forward). Pitch is ignored.
pub fn camera_relative_direction(forward: Vec3, right: Vec3, input: Vec2) -> Vec3 {
    let forward = flatten(forward).normalize_or_zero();
    let right = flatten(right).normalize_or_zero();
    forward * input.y + right * input.x
}

/// Soft-capped driving force for the current speed.
///
/// Zero when `current_speed >= max_speed`; otherwise scales linearly from the
/// full `speed` at rest down toward zero at the cap.
pub fn soft_cap_force(direction: Vec3, speed: f32, max_speed: f32, current_speed: f32) -> Vec3 {
    if max_speed <= 0.0 || current_speed >= max_speed {
        return Vec3::ZERO;
    }
    direction * speed * (1.0 - current_speed / max_speed)
}

/// Grounded state and the last applied move direction for one body.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementController {
    pub tuning: MovementTuning,
    grounded: bool,
    world_direction: Vec3,
}

impl Default for MovementController {
    fn default() -> Self {
        Self::new(MovementTuning::default())
    }
}

impl MovementController {
    pub fn new(tuning: MovementTuning) -> Self {
        Self {
            tuning,
            grounded: false,
            world_direction: Vec3::ZERO,
        }
    }

    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    /// World-space direction the last movement step pushed toward.
    #[inline]
    pub fn world_direction(&self) -> Vec3 {
        self.world_direction
    }

    /// Cast straight down from `position`. No-op when jumping is disabled.
    pub fn check_ground(&mut self, world: &dyn PhysicsWorld, position: Vec3) -> bool {
        if self.tuning.can_jump {
            let ray = Ray::new(position, Vec3::NEG_Y);
            self.grounded = world
                .raycast(ray, self.tuning.ground_ray_distance, self.tuning.ground_mask)
                .is_some();
        }
        self.grounded
    }

    /// Push `body` toward the camera-relative input direction.
    ///
    /// Returns the force that was applied (zero at or above the speed cap).
    pub fn apply_movement(
        &mut self,
        world: &mut dyn PhysicsWorld,
        body: EntityId,
        forward: Vec3,
        right: Vec3,
        input: Vec2,
    ) -> Vec3 {
        self.world_direction = camera_relative_direction(forward, right, input);
        let current_speed = world.velocity(body).map_or(0.0, |v| v.length());
        let force = soft_cap_force(
            self.world_direction,
            self.tuning.speed,
            self.tuning.max_speed,
            current_speed,
        );
        if force != Vec3::ZERO {
            world.add_force(body, force, ForceMode::Force);
        }
        force
    }

    /// Forget the last move direction (no move input this step).
    pub fn clear_direction(&mut self) {
        self.world_direction = Vec3::ZERO;
    }

    /// Apply the jump impulse if grounded. Returns whether it jumped.
    pub fn try_jump(&mut self, world: &mut dyn PhysicsWorld, body: EntityId) -> bool {
        if !self.grounded {
            return false;
        }
        world.add_force(body, Vec3::Y * self.tuning.jump_strength, ForceMode::Impulse);
        true
    }
}
