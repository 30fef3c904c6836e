//! Grab Controller Library
//!
//! A first-person character controller core: movement, jumping, look control
//! and picking up / manipulating physical objects, driven by a data-driven
//! table of action bindings.
//!
//! The controller sits between two injected collaborators and owns neither:
//! an input source ([`input::InputSource`]) that fires named actions per
//! context, and a physics world ([`physics::PhysicsWorld`]) it queries and
//! pushes forces into.
//!
//! # Modules
//!
//! - [`input`] - Action maps and the binding registry (link/unlink per context)
//! - [`camera`] - Yaw/pitch look rig with a drift-free pitch clamp
//! - [`physics`] - The physics seam, interactable objects, ray/box queries
//! - [`player`] - Movement, mode machine, grab placement, the controller itself
//! - [`game`] - A headless sandbox world implementing the physics seam
//!
//! # Example
//!
//! ```ignore
//! use std::{cell::RefCell, rc::Rc};
//! use grab_controller::game::sandbox::SandboxWorld;
//! use grab_controller::input::{ActionEvent, ActionMaps, ActionValue};
//! use grab_controller::player::{ControllerConfig, PlayerController};
//! use glam::{Vec2, Vec3};
//!
//! let mut world = SandboxWorld::new().with_ground(0.0);
//! let player = world.spawn_player(Vec3::new(0.0, 1.0, 0.0));
//!
//! let maps = Rc::new(RefCell::new(ActionMaps::first_person()));
//! let mut controller = PlayerController::new(player, ControllerConfig::default(), maps.clone());
//! controller.enable();
//! controller.frame_update();
//!
//! // Walk forward for one physics step
//! let dispatches = maps.borrow().fire("Move", ActionEvent::performed(ActionValue::Axis2(Vec2::Y)));
//! controller.dispatch_all(&dispatches, &mut world);
//! controller.fixed_update(1.0 / 50.0, &mut world);
//! world.step(1.0 / 50.0);
//! ```

pub mod camera;
pub mod input;
pub mod physics;
pub mod player;

// Sandbox world (located in src/game/ directory)
#[path = "../../src/game/mod.rs"]
pub mod game;

pub use camera::LookRig;
pub use input::{ActionEvent, ActionMaps, ActionValue, BindingRecord, BindingRegistry, InputSource};
pub use physics::{EntityId, LayerMask, PhysicsWorld, Transform};
pub use player::{ConfigError, ControllerConfig, ControllerMode, PlayerController};
