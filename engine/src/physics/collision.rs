//! Collision primitives
//!
//! Analytic ray queries used by the sandbox world: the slab method for
//! ray-AABB intersection, a horizontal ground plane, and a Minkowski-expanded
//! AABB test that stands in for a swept box cast.
//!
//! # Example
//!
//! ```ignore
//! use grab_controller::physics::collision::{ray_aabb_intersect, Aabb};
//! use glam::Vec3;
//!
//! let origin = Vec3::new(0.0, 0.0, -5.0);
//! let direction = Vec3::new(0.0, 0.0, 1.0);
//! let aabb = Aabb::from_center(Vec3::ZERO, Vec3::ONE);
//!
//! if let Some(t) = ray_aabb_intersect(origin, direction, aabb.min, aabb.max) {
//!     println!("Hit at distance {}", t);
//! }
//! ```

use glam::{Mat3, Quat, Vec3};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        let half = half_extents.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Grow by `amount` on every side.
    pub fn expanded(&self, amount: Vec3) -> Self {
        let amount = amount.abs();
        Self {
            min: self.min - amount,
            max: self.max + amount,
        }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Ray hit distance against this box (see [`ray_aabb_intersect`]).
    pub fn ray_distance(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        ray_aabb_intersect(origin, direction, self.min, self.max)
    }
}

/// Performs ray-AABB intersection using the slab method.
///
/// The ray enters and exits each pair of axis-aligned planes; if the latest
/// entry happens before the earliest exit and the exit is in front of the
/// origin, the ray hits the box.
///
/// # Returns
///
/// * `Some(t)` - Distance along the ray to the intersection point (t >= 0)
/// * `None` - No intersection or intersection is behind the ray origin
pub fn ray_aabb_intersect(
    ray_origin: Vec3,
    ray_dir: Vec3,
    aabb_min: Vec3,
    aabb_max: Vec3,
) -> Option<f32> {
    // Near-zero components get a huge inverse so their slab never limits the hit
    let inv_dir = Vec3::new(
        if ray_dir.x.abs() > 1e-10 { 1.0 / ray_dir.x } else { f32::MAX * ray_dir.x.signum() },
        if ray_dir.y.abs() > 1e-10 { 1.0 / ray_dir.y } else { f32::MAX * ray_dir.y.signum() },
        if ray_dir.z.abs() > 1e-10 { 1.0 / ray_dir.z } else { f32::MAX * ray_dir.z.signum() },
    );

    let t1 = (aabb_min - ray_origin) * inv_dir;
    let t2 = (aabb_max - ray_origin) * inv_dir;

    let t_min = t1.min(t2).max_element();
    let t_max = t1.max(t2).min_element();

    if t_max >= t_min && t_max >= 0.0 {
        if t_min >= 0.0 {
            Some(t_min)
        } else {
            // Ray starts inside the AABB
            Some(t_max)
        }
    } else {
        None
    }
}

/// Distance along the ray to the horizontal plane `y = height`.
///
/// Returns `None` when the ray is parallel to the plane or points away from it.
pub fn ray_plane_intersect(ray_origin: Vec3, ray_dir: Vec3, height: f32) -> Option<f32> {
    if ray_dir.y.abs() < 1e-6 {
        return None;
    }
    let t = (height - ray_origin.y) / ray_dir.y;
    if t < 0.0 { None } else { Some(t) }
}

/// World-axis half extents of an oriented box.
///
/// Used to approximate a swept oriented box as a ray against the target AABB
/// grown by the box's axis-aligned footprint.
pub fn oriented_half_extents(half_extents: Vec3, orientation: Quat) -> Vec3 {
    let m = Mat3::from_quat(orientation);
    let abs = Mat3::from_cols(m.x_axis.abs(), m.y_axis.abs(), m.z_axis.abs());
    abs * half_extents.abs()
}

/// Distance at which a box of `half_extents` swept along the ray first
/// touches `target`.
pub fn box_cast_aabb(
    origin: Vec3,
    direction: Vec3,
    half_extents: Vec3,
    orientation: Quat,
    target: &Aabb,
) -> Option<f32> {
    let grown = target.expanded(oriented_half_extents(half_extents, orientation));
    grown.ray_distance(origin, direction)
}
