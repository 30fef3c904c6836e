//! Interactable object model
//!
//! A physical object that a controller can pick up. While held it follows a
//! desired placement pose and floats: gravity is off and drag is raised so it
//! settles instead of swinging. Releasing restores the pre-grab values.

use glam::Vec3;

use super::types::{EntityId, Transform};

/// Drag applied while an object is being held.
pub const HELD_DRAG: f32 = 1.0;

/// Default easing rate toward the desired place, per second.
pub const DEFAULT_FOLLOW_SPEED: f32 = 5.0;

/// Default slerp factor toward the desired rotation, per frame.
pub const DEFAULT_ROTATION_LERP: f32 = 0.2;

#[derive(Debug, Clone, PartialEq)]
pub struct InteractableObject {
    desired_place: Option<Transform>,
    holder: Option<EntityId>,
    gravity_enabled: bool,
    drag: f32,
    original_drag: f32,
    held_drag: f32,
    /// How quickly the object closes the gap to its desired place (1/s)
    pub follow_speed: f32,
    /// Fraction of the remaining rotation covered each frame, 0..=1
    pub rotation_lerp: f32,
}

impl Default for InteractableObject {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl InteractableObject {
    /// A free (not held) interactable with its resting drag.
    pub fn new(drag: f32) -> Self {
        Self {
            desired_place: None,
            holder: None,
            gravity_enabled: true,
            drag,
            original_drag: drag,
            held_drag: HELD_DRAG,
            follow_speed: DEFAULT_FOLLOW_SPEED,
            rotation_lerp: DEFAULT_ROTATION_LERP,
        }
    }

    pub fn with_follow(mut self, follow_speed: f32, rotation_lerp: f32) -> Self {
        self.follow_speed = follow_speed.max(0.0);
        self.rotation_lerp = rotation_lerp.clamp(0.0, 1.0);
        self
    }

    pub fn with_held_drag(mut self, held_drag: f32) -> Self {
        self.held_drag = held_drag.max(0.0);
        self
    }

    #[inline]
    pub fn desired_place(&self) -> Option<Transform> {
        self.desired_place
    }

    #[inline]
    pub fn holder(&self) -> Option<EntityId> {
        self.holder
    }

    #[inline]
    pub fn is_held(&self) -> bool {
        self.holder.is_some()
    }

    #[inline]
    pub fn gravity_enabled(&self) -> bool {
        self.gravity_enabled
    }

    #[inline]
    pub fn drag(&self) -> f32 {
        self.drag
    }

    /// Take the object for `holder` and start following `place`.
    ///
    /// Returns false when someone else already holds it.
    pub fn grab(&mut self, holder: EntityId, place: Transform) -> bool {
        match self.holder {
            Some(current) if current != holder => false,
            _ => {
                self.holder = Some(holder);
                self.set_desired_place(Some(place));
                true
            }
        }
    }

    /// Move the placement target of a held object. Ignored when not held.
    pub fn update_desired_place(&mut self, place: Transform) {
        if self.holder.is_some() {
            self.desired_place = Some(place);
        }
    }

    /// Let go of the object. Returns false if `holder` was not holding it.
    pub fn release(&mut self, holder: EntityId) -> bool {
        if self.holder != Some(holder) {
            return false;
        }
        self.holder = None;
        self.set_desired_place(None);
        true
    }

    fn set_desired_place(&mut self, place: Option<Transform>) {
        if place.is_some() && self.desired_place.is_none() {
            self.original_drag = self.drag;
        }
        self.desired_place = place;
        if place.is_some() {
            self.gravity_enabled = false;
            self.drag = self.held_drag;
        } else {
            self.gravity_enabled = true;
            self.drag = self.original_drag;
        }
    }

    /// Next pose when following the desired place for one frame of `dt`.
    ///
    /// Position closes `follow_speed * dt` of the gap (never overshooting);
    /// rotation slerps by `rotation_lerp`. A free object keeps `current`.
    pub fn follow(&self, current: Transform, dt: f32) -> Transform {
        let Some(target) = self.desired_place else {
            return current;
        };
        let t = (dt * self.follow_speed).clamp(0.0, 1.0);
        let delta: Vec3 = target.position - current.position;
        Transform {
            position: current.position + delta * t,
            rotation: current
                .rotation
                .slerp(target.rotation, self.rotation_lerp)
                .normalize(),
        }
    }
}
