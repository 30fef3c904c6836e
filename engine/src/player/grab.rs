//! Grab State
//!
//! Placement bookkeeping for one held object. Placement is kept in the look
//! pivot's local space, so the object is re-aimed for free whenever the
//! player looks around.
//!
//! Two vectors are tracked:
//!
//! - the *original* desired placement, the nominal offset the player asked
//!   for (its length is the object distance, its direction the object
//!   rotation)
//! - the *current* placement, the original possibly pulled in so the object
//!   does not sink into the ground
//!
//! Ground correction is not sticky: once nothing occludes the nominal offset
//! the current placement snaps back to the original.

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::movement_controller::flatten;
use crate::physics::{EntityId, LayerMask, PhysicsWorld, Ray, Transform};

/// Lengths below this are treated as zero.
const EPSILON: f32 = 1e-5;

/// Default reach for grabbing and holding, in meters
pub const DEFAULT_MAX_OBJECT_DISTANCE: f32 = 4.0;
/// Default held-object translation rate, m/s per unit input
pub const DEFAULT_MOVE_OBJECT_SPEED: f32 = 2.0;
/// Default held-object rotation rate, degrees/s per unit input
pub const DEFAULT_ROTATE_OBJECT_SPEED: f32 = 90.0;
/// Initial downward pitch of a fresh placement, degrees
pub const DEFAULT_GRAB_PITCH_BIAS: f32 = 30.0;
/// Per-tick slerp factor of the facing model
pub const DEFAULT_FACING_LERP: f32 = 0.25;

/// Live-tunable grab parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrabTuning {
    pub interactable_mask: LayerMask,
    pub max_object_distance: f32,
    pub move_object_speed: f32,
    pub rotate_object_speed: f32,
    pub grab_pitch_bias: f32,
    pub facing_lerp: f32,
}

impl Default for GrabTuning {
    fn default() -> Self {
        Self {
            interactable_mask: LayerMask::layer(1),
            max_object_distance: DEFAULT_MAX_OBJECT_DISTANCE,
            move_object_speed: DEFAULT_MOVE_OBJECT_SPEED,
            rotate_object_speed: DEFAULT_ROTATE_OBJECT_SPEED,
            grab_pitch_bias: DEFAULT_GRAB_PITCH_BIAS,
            facing_lerp: DEFAULT_FACING_LERP,
        }
    }
}

/// What the ground check did to the placement this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlacementCorrection {
    Unchanged,
    /// Pulled in to the given distance from the pivot
    PulledIn(f32),
    /// Returned to the original, uncorrected placement
    Restored,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrabState {
    held: EntityId,
    original_placement: Vec3,
    placement: Vec3,
    placement_rotation: Quat,
    facing: Quat,
}

impl GrabState {
    /// Start holding `held` at `distance` (clamped to `max_distance`),
    /// pitched `pitch_bias` degrees below the pivot's forward axis.
    pub fn new(
        held: EntityId,
        distance: f32,
        max_distance: f32,
        pitch_bias: f32,
        object_rotation: Quat,
    ) -> Self {
        let distance = distance.clamp(0.0, max_distance.max(0.0));
        let direction = Quat::from_rotation_x(-pitch_bias.to_radians()) * Vec3::NEG_Z;
        let original = direction * distance;
        Self {
            held,
            original_placement: original,
            placement: original,
            placement_rotation: object_rotation,
            facing: Quat::IDENTITY,
        }
    }

    #[inline]
    pub fn held(&self) -> EntityId {
        self.held
    }

    /// Nominal placement in pivot space.
    #[inline]
    pub fn original_placement(&self) -> Vec3 {
        self.original_placement
    }

    /// Placement after ground correction, in pivot space.
    #[inline]
    pub fn placement(&self) -> Vec3 {
        self.placement
    }

    #[inline]
    pub fn placement_rotation(&self) -> Quat {
        self.placement_rotation
    }

    /// Orientation of the visual facing model.
    #[inline]
    pub fn facing(&self) -> Quat {
        self.facing
    }

    /// Length of the original placement.
    #[inline]
    pub fn object_distance(&self) -> f32 {
        self.original_placement.length()
    }

    /// Rescale the original placement to `distance`, keeping its direction.
    ///
    /// A zero-length placement has no direction to keep, so this is a no-op.
    pub fn set_object_distance(&mut self, distance: f32) {
        let current = self.object_distance();
        if current <= EPSILON {
            return;
        }
        self.original_placement *= distance.max(0.0) / current;
    }

    /// Direction of the original placement as an orientation of -Z.
    pub fn object_rotation(&self) -> Quat {
        match self.original_placement.try_normalize() {
            Some(dir) => Quat::from_rotation_arc(Vec3::NEG_Z, dir),
            None => Quat::IDENTITY,
        }
    }

    /// Keep the object distance within `max_distance`.
    pub fn clamp_distance(&mut self, max_distance: f32) {
        if self.object_distance() > max_distance {
            self.set_object_distance(max_distance);
        }
    }

    /// World pose the held object should follow.
    pub fn placement_world(&self, pivot: &Transform) -> Transform {
        Transform::new(pivot.transform_point(self.placement), self.placement_rotation)
    }

    /// Pull the placement in front of any ground between the pivot and it,
    /// or restore the original once nothing is in the way.
    pub fn correct_for_ground(
        &mut self,
        world: &dyn PhysicsWorld,
        pivot: &Transform,
        ground_mask: LayerMask,
    ) -> PlacementCorrection {
        let Some(original_dir) = self.original_placement.try_normalize() else {
            return PlacementCorrection::Unchanged;
        };
        let to_place = pivot.rotation * self.placement;
        let length = to_place.length();
        let direction = if length > EPSILON {
            to_place / length
        } else {
            pivot.rotation * original_dir
        };

        if length > EPSILON {
            if let Some(hit) = world.raycast(Ray::new(pivot.position, direction), length, ground_mask) {
                self.placement = original_dir * hit.distance;
                return PlacementCorrection::PulledIn(hit.distance);
            }
        }

        let nominal = self.object_distance();
        if length < nominal - EPSILON {
            match world.raycast(Ray::new(pivot.position, direction), nominal, ground_mask) {
                Some(hit) => {
                    self.placement = original_dir * hit.distance;
                    return PlacementCorrection::PulledIn(hit.distance);
                }
                None => {
                    self.placement = self.original_placement;
                    return PlacementCorrection::Restored;
                }
            }
        }
        PlacementCorrection::Unchanged
    }

    /// Turn the facing model toward the object's horizontal bearing.
    pub fn update_facing(&mut self, pivot: &Transform, lerp: f32) -> Quat {
        let bearing = flatten(pivot.rotation * self.placement);
        if let Some(dir) = bearing.try_normalize() {
            let target = Quat::from_rotation_arc(Vec3::NEG_Z, dir);
            self.facing = self.facing.slerp(target, lerp.clamp(0.0, 1.0)).normalize();
        }
        self.facing
    }

    /// Translate the nominal placement along pivot axes (x right, y up,
    /// z forward), then re-clamp to `max_distance`.
    pub fn translate(&mut self, input: Vec3, speed: f32, dt: f32, max_distance: f32) {
        let delta = Vec3::new(input.x, input.y, -input.z) * speed * dt;
        self.original_placement += delta;
        self.clamp_distance(max_distance);
        self.placement = self.original_placement;
    }

    /// Rotate the held object's target orientation. Input is degrees/s per
    /// axis (x pitch, y yaw, z roll) scaled by `speed * dt`.
    pub fn rotate(&mut self, input: Vec3, speed: f32, dt: f32) {
        let angles = input * speed * dt;
        let delta = Quat::from_euler(
            EulerRot::YXZ,
            angles.y.to_radians(),
            angles.x.to_radians(),
            angles.z.to_radians(),
        );
        self.placement_rotation = (delta * self.placement_rotation).normalize();
    }
}
