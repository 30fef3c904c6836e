//! Sandbox World
//!
//! A small reference physics world behind the [`PhysicsWorld`] seam: an
//! optional infinite ground plane plus axis-aligned boxes. Good enough to
//! drive the controller headless and in tests.
//!
//! Integration per [`SandboxWorld::step`]:
//!
//! - held interactables follow their desired place
//! - free dynamic bodies get gravity (when enabled), accumulated forces and
//!   drag, then integrate position
//! - bodies are pushed back above the ground plane
//!
//! Only ground contact is resolved. Ignored collision pairs are recorded so a
//! host can query them, but bodies never collide with each other here.

use std::collections::{BTreeMap, BTreeSet};

use glam::{Quat, Vec3};

use crate::physics::{
    Aabb, EntityId, ForceMode, InteractableObject, LayerMask, PhysicsWorld, Ray, RayHit, Transform,
    box_cast_aabb, ray_plane_intersect,
};

pub const GROUND_LAYER: u32 = 0;
pub const INTERACTABLE_LAYER: u32 = 1;
pub const PLAYER_LAYER: u32 = 2;

/// Gravity acceleration in meters per second squared
pub const GRAVITY: f32 = 9.81;

/// Player collider half extents (0.8 x 2.0 x 0.8 m box)
pub const PLAYER_HALF_EXTENTS: Vec3 = Vec3::new(0.4, 1.0, 0.4);

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub transform: Transform,
    pub velocity: Vec3,
    pub mass: f32,
    pub half_extents: Vec3,
    pub layer: u32,
    /// Linear drag of bodies without an interactable (interactables own theirs)
    pub drag: f32,
    /// Static bodies never move
    pub dynamic: bool,
    pub interactable: Option<InteractableObject>,
    force: Vec3,
}

impl Body {
    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.transform.position, self.half_extents)
    }

    fn effective_drag(&self) -> f32 {
        self.interactable.as_ref().map_or(self.drag, InteractableObject::drag)
    }

    fn gravity_enabled(&self) -> bool {
        self.interactable
            .as_ref()
            .is_none_or(InteractableObject::gravity_enabled)
    }
}

#[derive(Debug, Clone)]
pub struct SandboxWorld {
    bodies: BTreeMap<EntityId, Body>,
    next_id: u32,
    ground: Option<f32>,
    ignored: BTreeSet<(EntityId, EntityId)>,
    pub gravity: Vec3,
}

impl Default for SandboxWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SandboxWorld {
    /// An empty world with no ground.
    pub fn new() -> Self {
        Self {
            bodies: BTreeMap::new(),
            next_id: 1,
            ground: None,
            ignored: BTreeSet::new(),
            gravity: Vec3::new(0.0, -GRAVITY, 0.0),
        }
    }

    pub fn with_ground(mut self, height: f32) -> Self {
        self.ground = Some(height);
        self
    }

    pub fn set_ground(&mut self, height: Option<f32>) {
        self.ground = height;
    }

    #[inline]
    pub fn ground(&self) -> Option<f32> {
        self.ground
    }

    fn insert(&mut self, body: Body) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.bodies.insert(id, body);
        id
    }

    /// Spawn a unit-mass player body centered at `position`.
    pub fn spawn_player(&mut self, position: Vec3) -> EntityId {
        self.insert(Body {
            transform: Transform::from_position(position),
            velocity: Vec3::ZERO,
            mass: 1.0,
            half_extents: PLAYER_HALF_EXTENTS,
            layer: PLAYER_LAYER,
            drag: 1.0,
            dynamic: true,
            interactable: None,
            force: Vec3::ZERO,
        })
    }

    /// Spawn immovable scenery on the ground layer (walls, ledges, floors).
    pub fn spawn_static(&mut self, center: Vec3, half_extents: Vec3) -> EntityId {
        self.insert(Body {
            transform: Transform::from_position(center),
            velocity: Vec3::ZERO,
            mass: 0.0,
            half_extents,
            layer: GROUND_LAYER,
            drag: 0.0,
            dynamic: false,
            interactable: None,
            force: Vec3::ZERO,
        })
    }

    /// Spawn a grabbable unit-mass box.
    pub fn spawn_interactable(&mut self, position: Vec3, half_extents: Vec3, drag: f32) -> EntityId {
        self.insert(Body {
            transform: Transform::from_position(position),
            velocity: Vec3::ZERO,
            mass: 1.0,
            half_extents,
            layer: INTERACTABLE_LAYER,
            drag,
            dynamic: true,
            interactable: Some(InteractableObject::new(drag)),
            force: Vec3::ZERO,
        })
    }

    pub fn despawn(&mut self, entity: EntityId) -> Option<Body> {
        self.ignored.retain(|&(a, b)| a != entity && b != entity);
        self.bodies.remove(&entity)
    }

    pub fn body(&self, entity: EntityId) -> Option<&Body> {
        self.bodies.get(&entity)
    }

    pub fn body_mut(&mut self, entity: EntityId) -> Option<&mut Body> {
        self.bodies.get_mut(&entity)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn is_collision_ignored(&self, a: EntityId, b: EntityId) -> bool {
        self.ignored.contains(&pair(a, b))
    }

    /// Advance the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        let gravity = self.gravity;
        let ground = self.ground;
        for body in self.bodies.values_mut().filter(|b| b.dynamic) {
            let held_target = body.interactable.as_ref().filter(|i| i.desired_place().is_some());
            if let Some(object) = held_target {
                let previous = body.transform.position;
                body.transform = object.follow(body.transform, dt);
                body.velocity = (body.transform.position - previous) / dt;
            } else {
                if body.gravity_enabled() {
                    body.velocity += gravity * dt;
                }
                if body.mass > 0.0 {
                    body.velocity += body.force / body.mass * dt;
                }
                body.velocity /= 1.0 + body.effective_drag() * dt;
                body.transform.position += body.velocity * dt;
            }
            body.force = Vec3::ZERO;

            if let Some(height) = ground {
                let bottom = body.transform.position.y - body.half_extents.y;
                if bottom < height {
                    body.transform.position.y = height + body.half_extents.y;
                    body.velocity.y = body.velocity.y.max(0.0);
                }
            }
        }
    }
}

fn pair(a: EntityId, b: EntityId) -> (EntityId, EntityId) {
    if a <= b { (a, b) } else { (b, a) }
}

impl PhysicsWorld for SandboxWorld {
    fn raycast(&self, ray: Ray, max_distance: f32, mask: LayerMask) -> Option<RayHit> {
        let mut best: Option<RayHit> = None;
        let mut consider = |hit: RayHit| {
            if hit.distance <= max_distance && best.is_none_or(|b| hit.distance < b.distance) {
                best = Some(hit);
            }
        };

        if let Some(height) = self.ground.filter(|_| mask.contains_layer(GROUND_LAYER)) {
            if let Some(t) = ray_plane_intersect(ray.origin, ray.direction, height) {
                consider(RayHit {
                    entity: None,
                    point: ray.at(t),
                    distance: t,
                });
            }
        }

        for (&id, body) in &self.bodies {
            if !mask.contains_layer(body.layer) {
                continue;
            }
            if let Some(t) = body.aabb().ray_distance(ray.origin, ray.direction) {
                consider(RayHit {
                    entity: Some(id),
                    point: ray.at(t),
                    distance: t,
                });
            }
        }
        best
    }

    /// Sweeps against bodies only; the ground plane is not part of box casts.
    fn box_cast_all(
        &self,
        center: Vec3,
        half_extents: Vec3,
        direction: Vec3,
        orientation: Quat,
        max_distance: f32,
        mask: LayerMask,
    ) -> Vec<RayHit> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO {
            return Vec::new();
        }
        self.bodies
            .iter()
            .filter(|(_, body)| mask.contains_layer(body.layer))
            .filter_map(|(&id, body)| {
                let t = box_cast_aabb(center, direction, half_extents, orientation, &body.aabb())?;
                (t <= max_distance).then(|| RayHit {
                    entity: Some(id),
                    point: center + direction * t,
                    distance: t,
                })
            })
            .collect()
    }

    fn position(&self, entity: EntityId) -> Option<Vec3> {
        self.bodies.get(&entity).map(|b| b.transform.position)
    }

    fn rotation(&self, entity: EntityId) -> Option<Quat> {
        self.bodies.get(&entity).map(|b| b.transform.rotation)
    }

    fn set_rotation(&mut self, entity: EntityId, rotation: Quat) {
        if let Some(body) = self.bodies.get_mut(&entity) {
            body.transform.rotation = rotation;
        }
    }

    fn velocity(&self, entity: EntityId) -> Option<Vec3> {
        self.bodies.get(&entity).map(|b| b.velocity)
    }

    fn add_force(&mut self, entity: EntityId, force: Vec3, mode: ForceMode) {
        let Some(body) = self.bodies.get_mut(&entity).filter(|b| b.dynamic && b.mass > 0.0) else {
            return;
        };
        match mode {
            ForceMode::Force => body.force += force,
            ForceMode::Impulse => body.velocity += force / body.mass,
        }
    }

    fn set_collision_ignored(&mut self, a: EntityId, b: EntityId, ignored: bool) {
        if ignored {
            self.ignored.insert(pair(a, b));
        } else {
            self.ignored.remove(&pair(a, b));
        }
    }

    fn interactable(&self, entity: EntityId) -> Option<&InteractableObject> {
        self.bodies.get(&entity)?.interactable.as_ref()
    }

    fn interactable_mut(&mut self, entity: EntityId) -> Option<&mut InteractableObject> {
        self.bodies.get_mut(&entity)?.interactable.as_mut()
    }
}
