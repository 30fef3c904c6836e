//! Player Module
//!
//! First-person controller for a rigid-body player that can pick up and
//! manipulate objects.
//!
//! # Components
//!
//! - [`PlayerController`] - Binding dispatch, per-tick update, grab/release
//! - [`MovementController`] - Ground check, soft-capped movement force, jump
//! - [`ModeMachine`] - Move / MoveObject / RotateObject / MoveRotateObject
//! - [`GrabState`] - Held-object placement with ground correction
//! - [`ControllerConfig`] - JSON-loadable bindings and tuning

pub mod config;
pub mod controller;
pub mod grab;
pub mod mode;
pub mod movement_controller;

pub use config::{ConfigError, ControllerConfig, LookTuning, default_bindings};
pub use controller::{ControllerIntent, DebugRay, DebugRayKind, PlayerController, SharedInput};
pub use grab::{
    DEFAULT_FACING_LERP, DEFAULT_GRAB_PITCH_BIAS, DEFAULT_MAX_OBJECT_DISTANCE, DEFAULT_MOVE_OBJECT_SPEED,
    DEFAULT_ROTATE_OBJECT_SPEED, GrabState, GrabTuning, PlacementCorrection,
};
pub use mode::{ControllerMode, ModeMachine, ModeTrigger, next_mode};
pub use movement_controller::{
    DEFAULT_GROUND_RAY_DISTANCE, DEFAULT_JUMP_STRENGTH, DEFAULT_MAX_SPEED, DEFAULT_SPEED, MovementController,
    MovementTuning, camera_relative_direction, flatten, soft_cap_force,
};
