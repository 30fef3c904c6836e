//! Game Module
//!
//! Game-side worlds that build on top of the engine.

pub mod sandbox;

pub use sandbox::{Body, GROUND_LAYER, INTERACTABLE_LAYER, PLAYER_LAYER, SandboxWorld};
