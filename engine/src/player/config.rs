//! Controller configuration
//!
//! Everything a designer tunes lives here: the binding table, context names
//! and the movement, look and grab parameters. Loaded from JSON; missing
//! fields fall back to the defaults.
//!
//! ```json
//! {
//!   "keyboard_mouse_scheme": "KeyboardMouse",
//!   "movement": { "speed": 25.0, "max_speed": 6.0 },
//!   "grab": { "max_object_distance": 3.0 }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::grab::GrabTuning;
use super::movement_controller::MovementTuning;
use crate::camera::{DEFAULT_LOOK_STRENGTH, DEFAULT_MAX_LOOK_DOWN, DEFAULT_MAX_LOOK_UP};
use crate::input::{BindingContext, BindingRecord, ContextNames, HandlerKind, Trigger};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookTuning {
    pub look_strength: f32,
    pub max_look_up_angle: f32,
    pub max_look_down_angle: f32,
    /// Look pivot offset from the body origin. `None` leaves the controller
    /// without a pivot: look and movement are skipped until one is set.
    pub pivot_offset: Option<Vec3>,
}

impl Default for LookTuning {
    fn default() -> Self {
        Self {
            look_strength: DEFAULT_LOOK_STRENGTH,
            max_look_up_angle: DEFAULT_MAX_LOOK_UP,
            max_look_down_angle: DEFAULT_MAX_LOOK_DOWN,
            pivot_offset: Some(Vec3::new(0.0, 0.5, 0.0)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub bindings: Vec<BindingRecord>,
    pub contexts: ContextNames,
    /// Control scheme on which look requires the enable-look action held
    /// and grabbing aims along the pointer ray
    pub keyboard_mouse_scheme: String,
    pub movement: MovementTuning,
    pub look: LookTuning,
    pub grab: GrabTuning,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            bindings: default_bindings(),
            contexts: ContextNames::default(),
            keyboard_mouse_scheme: "KeyboardMouse".to_string(),
            movement: MovementTuning::default(),
            look: LookTuning::default(),
            grab: GrabTuning::default(),
        }
    }
}

/// Binding table matching the actions of [`crate::input::ActionMaps::first_person`].
pub fn default_bindings() -> Vec<BindingRecord> {
    use BindingContext::{Both, Manipulate, Player};
    use HandlerKind as H;
    vec![
        BindingRecord::new("Move", Trigger::Both, H::Move, Both),
        BindingRecord::new("Jump", Trigger::Performed, H::Jump, Player),
        BindingRecord::new("EnableLook", Trigger::Both, H::EnableLook, Both),
        BindingRecord::new("Look", Trigger::Both, H::Look, Both),
        BindingRecord::new("Grab", Trigger::Performed, H::Grab, Both),
        BindingRecord::new("MoveMode", Trigger::Both, H::EnableMoveMode, Manipulate),
        BindingRecord::new("ObjectMove", Trigger::Both, H::ObjectMove, Manipulate),
        BindingRecord::new("RotateMode", Trigger::Both, H::EnableRotateMode, Manipulate),
        BindingRecord::new("ObjectRotate", Trigger::Both, H::ObjectRotate, Manipulate),
    ]
}

impl ControllerConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("movement.speed", self.movement.speed)?;
        non_negative("movement.max_speed", self.movement.max_speed)?;
        non_negative("movement.jump_strength", self.movement.jump_strength)?;
        non_negative("movement.ground_ray_distance", self.movement.ground_ray_distance)?;
        non_negative("look.look_strength", self.look.look_strength)?;
        angle("look.max_look_up_angle", self.look.max_look_up_angle)?;
        angle("look.max_look_down_angle", self.look.max_look_down_angle)?;
        non_negative("grab.max_object_distance", self.grab.max_object_distance)?;
        non_negative("grab.move_object_speed", self.grab.move_object_speed)?;
        non_negative("grab.rotate_object_speed", self.grab.rotate_object_speed)?;
        angle("grab.grab_pitch_bias", self.grab.grab_pitch_bias)?;
        if !(0.0..=1.0).contains(&self.grab.facing_lerp) {
            return Err(ConfigError::Invalid {
                field: "grab.facing_lerp",
                reason: format!("{} is outside [0, 1]", self.grab.facing_lerp),
            });
        }
        if self.contexts.player == self.contexts.manipulate {
            return Err(ConfigError::Invalid {
                field: "contexts",
                reason: "player and manipulate contexts must differ".to_string(),
            });
        }
        Ok(())
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{value} must be a finite, non-negative number"),
        })
    }
}

fn angle(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=90.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{value} is outside [0, 90] degrees"),
        })
    }
}
