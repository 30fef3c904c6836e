//! Look Rig Module
//!
//! First-person look control split across two pivots: the body yaws around
//! world up, and the look pivot (the camera mount) pitches around its local
//! right axis. Pitch is clamped to `[-max_look_down, +max_look_up]` degrees.
//!
//! Key features:
//! - Direct delta → rotation, scaled by `look_strength` (degrees per unit)
//! - No smoothing, instant response
//! - Pitch clamp that cannot drift past its bounds, whatever the input history
//! - Wraparound-aware clamp for pitch given as a 0–360° euler angle

use glam::{EulerRot, Quat, Vec2, Vec3};

use crate::physics::Transform;

/// Default look strength in degrees per input unit
pub const DEFAULT_LOOK_STRENGTH: f32 = 0.1;
/// Default upward pitch limit in degrees
pub const DEFAULT_MAX_LOOK_UP: f32 = 80.0;
/// Default downward pitch limit in degrees
pub const DEFAULT_MAX_LOOK_DOWN: f32 = 80.0;

/// Normalize an angle in degrees into `[0, 360)`.
pub fn normalize_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negatives
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Clamp a pitch given in the 0–360° euler representation.
///
/// Values in the upper half (`< 180`) are looking up and are limited to
/// `max_up`; values in the lower half are looking down and are limited to
/// `360 - max_down`. Returns the clamped angle, still normalized.
pub fn clamp_normalized_pitch(angle: f32, max_up: f32, max_down: f32) -> f32 {
    let angle = normalize_degrees(angle);
    if angle < 180.0 {
        angle.min(max_up)
    } else {
        let floor = 360.0 - max_down;
        if angle < floor { floor } else { angle }
    }
}

/// Signed pitch in `(-180, 180]` for a normalized angle.
#[inline]
pub fn signed_pitch(normalized: f32) -> f32 {
    if normalized > 180.0 { normalized - 360.0 } else { normalized }
}

/// Yaw/pitch look state for a first-person body and its look pivot.
///
/// ## Usage
/// ```rust,ignore
/// let mut look = LookRig::new(0.1, 80.0, 60.0);
/// look.apply_look(Vec2::new(dx, dy));
/// let body_rotation = look.body_rotation();
/// let camera_rotation = look.pivot_rotation();
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct LookRig {
    /// Body yaw in degrees, normalized into [0, 360). Positive turns right.
    yaw: f32,
    /// Pivot pitch in degrees, positive looks up, always within the limits
    pitch: f32,
    /// Degrees of rotation per unit of look input
    pub look_strength: f32,
    max_look_up: f32,
    max_look_down: f32,
}

impl Default for LookRig {
    fn default() -> Self {
        Self::new(DEFAULT_LOOK_STRENGTH, DEFAULT_MAX_LOOK_UP, DEFAULT_MAX_LOOK_DOWN)
    }
}

impl LookRig {
    /// Limits are clamped into `[0, 90]` degrees.
    pub fn new(look_strength: f32, max_look_up: f32, max_look_down: f32) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            look_strength,
            max_look_up: max_look_up.clamp(0.0, 90.0),
            max_look_down: max_look_down.clamp(0.0, 90.0),
        }
    }

    #[inline]
    pub fn yaw_degrees(&self) -> f32 {
        self.yaw
    }

    /// Signed pitch in degrees (positive = up).
    #[inline]
    pub fn pitch_degrees(&self) -> f32 {
        self.pitch
    }

    /// Pitch in the 0–360° euler representation.
    #[inline]
    pub fn normalized_pitch(&self) -> f32 {
        normalize_degrees(self.pitch)
    }

    /// (max up, max down) in degrees
    #[inline]
    pub fn pitch_limits(&self) -> (f32, f32) {
        (self.max_look_up, self.max_look_down)
    }

    pub fn set_pitch_limits(&mut self, max_look_up: f32, max_look_down: f32) {
        self.max_look_up = max_look_up.clamp(0.0, 90.0);
        self.max_look_down = max_look_down.clamp(0.0, 90.0);
        self.pitch = self.pitch.clamp(-self.max_look_down, self.max_look_up);
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        self.yaw = normalize_degrees(yaw);
    }

    /// Set pitch from a signed angle, clamped to the limits.
    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch.clamp(-self.max_look_down, self.max_look_up);
    }

    /// Set pitch from a 0–360° euler angle (e.g. read back from a transform).
    pub fn set_normalized_pitch(&mut self, angle: f32) {
        let clamped = clamp_normalized_pitch(angle, self.max_look_up, self.max_look_down);
        self.set_pitch(signed_pitch(clamped));
    }

    /// Take yaw and pitch from a world pivot rotation set by the host (a
    /// respawn, a cutscene handing control back). Roll is dropped and the
    /// pitch is clamped to the limits.
    pub fn sync_from_pivot(&mut self, pivot_rotation: Quat) {
        let (yaw, pitch, _) = pivot_rotation.normalize().to_euler(EulerRot::YXZ);
        self.set_yaw(-yaw.to_degrees());
        self.set_normalized_pitch(normalize_degrees(pitch.to_degrees()));
    }

    /// Apply one look delta: `x` yaws the body, `y` pitches the pivot.
    pub fn apply_look(&mut self, delta: Vec2) {
        self.yaw = normalize_degrees(self.yaw + delta.x * self.look_strength);
        let pitch = self.pitch + delta.y * self.look_strength;
        self.pitch = pitch.clamp(-self.max_look_down, self.max_look_up);
    }

    /// Body orientation: yaw only, so the body stays upright.
    pub fn body_rotation(&self) -> Quat {
        Quat::from_rotation_y(-self.yaw.to_radians())
    }

    /// Pivot orientation relative to the body.
    pub fn pivot_local_rotation(&self) -> Quat {
        Quat::from_rotation_x(self.pitch.to_radians())
    }

    /// Pivot orientation in world space.
    pub fn pivot_rotation(&self) -> Quat {
        (self.body_rotation() * self.pivot_local_rotation()).normalize()
    }

    /// World pose of the look pivot mounted at `offset` above/around the body.
    pub fn pivot_transform(&self, body_position: Vec3, offset: Vec3) -> Transform {
        let body = Transform::new(body_position, self.body_rotation());
        Transform::new(body.transform_point(offset), self.pivot_rotation())
    }

    /// Reset orientation to looking straight ahead along -Z.
    pub fn reset_orientation(&mut self) {
        self.yaw = 0.0;
        self.pitch = 0.0;
    }
}
