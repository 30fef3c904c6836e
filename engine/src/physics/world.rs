//! Physics world seam
//!
//! The controller never owns a physics engine. Everything it needs from one
//! (ray and box casts, forces, collision-pair filtering and the interactable
//! lookup) goes through [`PhysicsWorld`], so the host engine or a test double
//! can stand behind it.

use glam::{Quat, Vec3};

use super::interactable::InteractableObject;
use super::types::{EntityId, LayerMask};

/// A half-line used for queries. `direction` is expected to be normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    #[inline]
    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

/// Result of a ray or box cast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Entity owning the hit collider. `None` for static geometry like terrain.
    pub entity: Option<EntityId>,
    /// World-space hit point
    pub point: Vec3,
    /// Distance along the cast direction
    pub distance: f32,
}

/// How a force is applied to a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceMode {
    /// Continuous force, integrated over the physics step
    Force,
    /// Instantaneous change in momentum
    Impulse,
}

/// Query and mutation surface the controller consumes from the host physics.
pub trait PhysicsWorld {
    /// Nearest hit along `ray` within `max_distance` on the layers in `mask`.
    fn raycast(&self, ray: Ray, max_distance: f32, mask: LayerMask) -> Option<RayHit>;

    /// All hits of a box of `half_extents` swept from `center` along `direction`.
    fn box_cast_all(
        &self,
        center: Vec3,
        half_extents: Vec3,
        direction: Vec3,
        orientation: Quat,
        max_distance: f32,
        mask: LayerMask,
    ) -> Vec<RayHit>;

    fn position(&self, entity: EntityId) -> Option<Vec3>;

    fn rotation(&self, entity: EntityId) -> Option<Quat>;

    /// Orient a body. The controller only ever sets yaw on its own body.
    fn set_rotation(&mut self, entity: EntityId, rotation: Quat);

    fn velocity(&self, entity: EntityId) -> Option<Vec3>;

    fn add_force(&mut self, entity: EntityId, force: Vec3, mode: ForceMode);

    /// Enable or disable contact resolution between two colliders.
    fn set_collision_ignored(&mut self, a: EntityId, b: EntityId, ignored: bool);

    fn interactable(&self, entity: EntityId) -> Option<&InteractableObject>;

    fn interactable_mut(&mut self, entity: EntityId) -> Option<&mut InteractableObject>;
}
