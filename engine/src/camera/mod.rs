//! Camera Module
//!
//! First-person look control.
//!
//! - [`LookRig`] - Body yaw + pivot pitch with a drift-proof pitch clamp

pub mod look_rig;

pub use look_rig::{
    DEFAULT_LOOK_STRENGTH, DEFAULT_MAX_LOOK_DOWN, DEFAULT_MAX_LOOK_UP, LookRig, clamp_normalized_pitch,
    normalize_degrees, signed_pitch,
};
