//! Physics seam
//!
//! The controller layers gameplay logic on top of a host physics engine. This
//! module holds the pieces of that boundary:
//!
//! - [`types`] - Math re-exports from glam plus entity and layer handles
//! - [`world`] - The [`PhysicsWorld`] trait the controller queries and drives
//! - [`interactable`] - The grabbable object model (gravity/drag toggling)
//! - [`collision`] - Analytic ray queries used by the sandbox world
//!
//! # Unit System
//!
//! **1 unit = 1 meter**, angles exposed to configuration are in degrees.

pub mod collision;
pub mod interactable;
pub mod types;
pub mod world;

pub use collision::{Aabb, box_cast_aabb, oriented_half_extents, ray_aabb_intersect, ray_plane_intersect};
pub use interactable::InteractableObject;
pub use types::{EntityId, LayerMask, Quat, Transform, Vec2, Vec3};
pub use world::{ForceMode, PhysicsWorld, Ray, RayHit};
