//! Input Module
//!
//! Action-based input plumbing between an input source and the controller.
//! Nothing here knows about a windowing system: the host feeds action events
//! into an [`InputSource`] and forwards the resulting [`Dispatch`]es.
//!
//! # Example
//!
//! ```rust,ignore
//! use grab_controller::input::{ActionEvent, ActionMaps, ActionValue};
//! use glam::Vec2;
//!
//! let maps = ActionMaps::first_person();
//! // ... controller.enable(); controller.frame_update(); ...
//! let event = ActionEvent::performed(ActionValue::Axis2(Vec2::Y));
//! for dispatch in maps.fire("Move", event) {
//!     controller.dispatch(&dispatch, &mut world);
//! }
//! ```

pub mod action_maps;
pub mod bindings;

pub use action_maps::{ActionEvent, ActionMaps, ActionPhase, ActionValue, Dispatch, InputSource};
pub use bindings::{
    BindingContext, BindingRecord, BindingRegistry, ContextNames, HandlerKind, LinkError,
    LinkReport, LinkState, LinkedBinding, Trigger,
};
