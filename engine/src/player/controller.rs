//! Player Controller
//!
//! Ties the pieces together for one first-person body: binding dispatch,
//! the mode machine, look, movement and the held object.
//!
//! # Phases
//!
//! - [`PlayerController::frame_update`] once per rendered frame. Consumes a
//!   pending link request and any context switch that found the input
//!   source busy.
//! - [`PlayerController::dispatch`] for every [`Dispatch`] the input source
//!   produces. Handlers only write intent (plus grab/release and jump, which
//!   act immediately).
//! - [`PlayerController::fixed_update`] once per physics step. Reads intent
//!   and drives the world.
//!
//! # Usage
//!
//! ```rust,ignore
//! let maps = Rc::new(RefCell::new(ActionMaps::first_person()));
//! let mut controller = PlayerController::new(player, ControllerConfig::default(), maps.clone());
//! controller.enable();
//! controller.frame_update();
//!
//! let dispatches = maps.borrow().fire("Move", ActionEvent::performed(ActionValue::Axis2(Vec2::Y)));
//! controller.dispatch_all(&dispatches, &mut world);
//! controller.fixed_update(1.0 / 60.0, &mut world);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Quat, Vec2, Vec3};
use tracing::{debug, error, info, warn};

use super::config::ControllerConfig;
use super::grab::GrabState;
use super::mode::{ControllerMode, ModeMachine, ModeTrigger};
use super::movement_controller::MovementController;
use crate::camera::LookRig;
use crate::input::{ActionEvent, BindingRecord, BindingRegistry, Dispatch, HandlerKind, InputSource, LinkState};
use crate::physics::{EntityId, PhysicsWorld, Ray, Transform};

/// Input source handle shared between the host and its controllers.
pub type SharedInput = Rc<RefCell<dyn InputSource>>;

/// What the handlers have asked for since the last tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControllerIntent {
    pub move_direction: Vec2,
    pub look_delta: Vec2,
    pub look_enabled: bool,
    pub move_object_direction: Vec3,
    pub rotate_object_delta: Vec3,
    pub move_mode_held: bool,
    pub rotate_mode_held: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugRayKind {
    Ground,
    Grab,
    Placement,
}

/// A ray an external gizmo drawer can render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugRay {
    pub kind: DebugRayKind,
    pub origin: Vec3,
    pub direction: Vec3,
    pub length: f32,
}

pub struct PlayerController {
    entity: EntityId,
    config: ControllerConfig,
    input: SharedInput,
    registry: BindingRegistry,
    movement: MovementController,
    look: LookRig,
    modes: ModeMachine,
    grab: Option<GrabState>,
    intent: ControllerIntent,
    /// Context a grab or release asked for while the input source was borrowed
    pending_context: Option<String>,
    enabled: bool,
}

impl PlayerController {
    /// A disabled controller for the body `entity`. Call [`Self::enable`] to
    /// start receiving input.
    pub fn new(entity: EntityId, config: ControllerConfig, input: SharedInput) -> Self {
        let look = LookRig::new(
            config.look.look_strength,
            config.look.max_look_up_angle,
            config.look.max_look_down_angle,
        );
        Self {
            entity,
            registry: BindingRegistry::new(entity),
            movement: MovementController::new(config.movement),
            look,
            modes: ModeMachine::new(),
            grab: None,
            intent: ControllerIntent::default(),
            pending_context: None,
            enabled: false,
            config,
            input,
        }
    }

    #[inline]
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Live tuning. Changes apply from the next fixed update.
    pub fn config_mut(&mut self) -> &mut ControllerConfig {
        &mut self.config
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn grounded(&self) -> bool {
        self.movement.is_grounded()
    }

    /// World direction of the last movement push.
    #[inline]
    pub fn move_direction(&self) -> Vec3 {
        self.movement.world_direction()
    }

    #[inline]
    pub fn mode(&self) -> ControllerMode {
        self.modes.mode()
    }

    pub fn held(&self) -> Option<EntityId> {
        self.grab.as_ref().map(GrabState::held)
    }

    /// Nominal distance of the held object, zero when nothing is held.
    pub fn object_distance(&self) -> f32 {
        self.grab.as_ref().map_or(0.0, GrabState::object_distance)
    }

    pub fn grab_state(&self) -> Option<&GrabState> {
        self.grab.as_ref()
    }

    #[inline]
    pub fn intent(&self) -> ControllerIntent {
        self.intent
    }

    pub fn look(&self) -> &LookRig {
        &self.look
    }

    pub fn look_mut(&mut self) -> &mut LookRig {
        &mut self.look
    }

    pub fn registry(&self) -> &BindingRegistry {
        &self.registry
    }

    #[inline]
    pub fn link_state(&self) -> LinkState {
        self.registry.state()
    }

    /// Context switch still waiting for the input source, if any.
    pub fn pending_context(&self) -> Option<&str> {
        self.pending_context.as_deref()
    }

    /// Adopt an orientation the host put on the look pivot, e.g. after a
    /// respawn. The body is turned to the new yaw.
    pub fn set_look_rotation(&mut self, pivot_rotation: Quat, world: &mut dyn PhysicsWorld) {
        self.look.sync_from_pivot(pivot_rotation);
        world.set_rotation(self.entity, self.look.body_rotation());
    }

    /// Start listening. Linking happens on the next [`Self::frame_update`],
    /// once the input source has had a frame to come up. Calling it again
    /// after a failed link re-arms the link.
    pub fn enable(&mut self) {
        if self.enabled && self.registry.state() != LinkState::Failed {
            return;
        }
        self.enabled = true;
        self.registry.request_link();
        debug!(entity = self.entity.0, "controller enabled, link pending");
    }

    /// Stop listening: detach every handler and drop pending intent. A held
    /// object stays held.
    pub fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        match self.input.try_borrow_mut() {
            Ok(mut input) => {
                let detached = self.registry.unlink(&mut *input);
                debug!(entity = self.entity.0, detached, "controller disabled");
            }
            Err(_) => error!(entity = self.entity.0, "input source busy, cannot unlink on disable"),
        }
        let (move_held, rotate_held) = self.modes.triggers();
        self.intent = ControllerIntent {
            move_mode_held: move_held,
            rotate_mode_held: rotate_held,
            ..ControllerIntent::default()
        };
    }

    /// Replace the binding table. Already linked handlers are detached and
    /// the new table is linked in their place.
    pub fn set_linked_bindings(&mut self, records: Vec<BindingRecord>) {
        self.config.bindings = records;
        if self.registry.state() != LinkState::Linked {
            return;
        }
        let Ok(mut input) = self.input.try_borrow_mut() else {
            error!(entity = self.entity.0, "input source busy, bindings not relinked");
            return;
        };
        self.registry.unlink(&mut *input);
        if let Err(err) = self.registry.link(&self.config.bindings, &self.config.contexts, &mut *input) {
            warn!(error = %err, "relinking new bindings failed");
        }
    }

    /// Per-frame phase. Runs a queued context switch, then returns the link
    /// state after consuming any pending link request.
    pub fn frame_update(&mut self) -> LinkState {
        if let Some(context) = self.pending_context.take() {
            debug!(entity = self.entity.0, context = %context, "running deferred context switch");
            self.switch_context(&context);
        }
        if self.registry.state() != LinkState::Pending {
            return self.registry.state();
        }
        let Ok(mut input) = self.input.try_borrow_mut() else {
            // Still pending; try again next frame
            warn!(entity = self.entity.0, "input source busy during deferred link");
            return self.registry.state();
        };
        if let Some(Ok(report)) =
            self.registry
                .poll_pending(&self.config.bindings, &self.config.contexts, &mut *input)
        {
            info!(
                entity = self.entity.0,
                attached = report.attached,
                skipped = report.skipped,
                "controller bindings linked"
            );
        }
        self.registry.state()
    }

    /// Run the handler for one action callback. Dispatches for other owners
    /// and dispatches arriving while disabled are ignored.
    pub fn dispatch(&mut self, dispatch: &Dispatch, world: &mut dyn PhysicsWorld) {
        if dispatch.owner != self.entity || !self.enabled {
            return;
        }
        let event = dispatch.event;
        match dispatch.handler {
            HandlerKind::Move => self.on_move(event),
            HandlerKind::Jump => self.on_jump(event, world),
            HandlerKind::EnableLook => self.on_enable_look(event),
            HandlerKind::Look => self.on_look(event),
            HandlerKind::Grab => self.on_grab(event, world),
            HandlerKind::EnableMoveMode => self.on_enable_move_mode(event),
            HandlerKind::ObjectMove => self.on_object_move(event),
            HandlerKind::EnableRotateMode => self.on_enable_rotate_mode(event),
            HandlerKind::ObjectRotate => self.on_object_rotate(event),
        }
    }

    pub fn dispatch_all(&mut self, dispatches: &[Dispatch], world: &mut dyn PhysicsWorld) {
        for dispatch in dispatches {
            self.dispatch(dispatch, world);
        }
    }

    fn on_move(&mut self, event: ActionEvent) {
        self.intent.move_direction = if self.mode().allows_free_move() && event.is_performed() {
            event.value.read_vec2()
        } else {
            Vec2::ZERO
        };
    }

    fn on_jump(&mut self, event: ActionEvent, world: &mut dyn PhysicsWorld) {
        if !event.is_performed() {
            return;
        }
        if self.movement.try_jump(world, self.entity) {
            debug!(entity = self.entity.0, "jump");
        }
    }

    fn on_enable_look(&mut self, event: ActionEvent) {
        self.intent.look_enabled = event.is_performed();
        if !self.intent.look_enabled && self.is_keyboard_mouse() {
            self.intent.look_delta = Vec2::ZERO;
        }
    }

    fn on_look(&mut self, event: ActionEvent) {
        if !self.mode().allows_free_move() || event.is_canceled() {
            self.intent.look_delta = Vec2::ZERO;
            return;
        }
        // Mouse look only while the enable-look button is down
        if self.is_keyboard_mouse() && !self.intent.look_enabled {
            return;
        }
        self.intent.look_delta = event.value.read_vec2();
    }

    fn on_grab(&mut self, event: ActionEvent, world: &mut dyn PhysicsWorld) {
        if !event.is_performed() {
            return;
        }
        if self.grab.is_some() {
            self.release(world);
        } else {
            self.try_grab(world);
        }
    }

    fn on_enable_move_mode(&mut self, event: ActionEvent) {
        let on = event.is_performed();
        self.intent.move_mode_held = on;
        self.apply_mode_trigger(ModeTrigger::MoveObject(on));
    }

    fn on_object_move(&mut self, event: ActionEvent) {
        self.intent.move_object_direction = if self.mode().allows_object_move() && event.is_performed() {
            event.value.read_vec3()
        } else {
            Vec3::ZERO
        };
    }

    fn on_enable_rotate_mode(&mut self, event: ActionEvent) {
        let on = event.is_performed();
        self.intent.rotate_mode_held = on;
        self.apply_mode_trigger(ModeTrigger::RotateObject(on));
    }

    fn on_object_rotate(&mut self, event: ActionEvent) {
        self.intent.rotate_object_delta = if self.mode().allows_object_rotate() && event.is_performed() {
            event.value.read_vec3()
        } else {
            Vec3::ZERO
        };
    }

    fn apply_mode_trigger(&mut self, trigger: ModeTrigger) {
        let holding = self.grab.is_some();
        if let Some((from, to)) = self.modes.apply(trigger, holding) {
            debug!(entity = self.entity.0, ?from, ?to, "mode changed");
            self.clear_inactive_intent();
        }
    }

    /// Zero every intent the current mode does not allow.
    fn clear_inactive_intent(&mut self) {
        let mode = self.mode();
        if !mode.allows_free_move() {
            self.intent.move_direction = Vec2::ZERO;
            self.intent.look_delta = Vec2::ZERO;
        }
        if !mode.allows_object_move() {
            self.intent.move_object_direction = Vec3::ZERO;
        }
        if !mode.allows_object_rotate() {
            self.intent.rotate_object_delta = Vec3::ZERO;
        }
    }

    fn is_keyboard_mouse(&self) -> bool {
        match self.input.try_borrow() {
            Ok(input) => input.control_scheme().as_deref() == Some(self.config.keyboard_mouse_scheme.as_str()),
            Err(_) => false,
        }
    }

    fn pointer_ray(&self) -> Option<Ray> {
        self.input.try_borrow().ok().and_then(|input| input.pointer_ray())
    }

    fn pivot(&self, body_position: Vec3) -> Option<Transform> {
        self.config
            .look
            .pivot_offset
            .map(|offset| self.look.pivot_transform(body_position, offset))
    }

    /// Look for an interactable in reach and grab the nearest one.
    pub fn try_grab(&mut self, world: &mut dyn PhysicsWorld) -> bool {
        if self.grab.is_some() {
            return false;
        }
        let Some(body_position) = world.position(self.entity) else {
            warn!(entity = self.entity.0, "controller body missing from world");
            return false;
        };
        let Some(pivot) = self.pivot(body_position) else {
            error!(entity = self.entity.0, "look pivot not set, cannot grab");
            return false;
        };

        let max = self.config.grab.max_object_distance;
        let mask = self.config.grab.interactable_mask;
        let pointer = if self.is_keyboard_mouse() { self.pointer_ray() } else { None };
        let hit = match pointer {
            Some(ray) => {
                let reach = max + body_position.distance(ray.origin);
                world.raycast(ray, reach, mask)
            }
            None => {
                world
                    .box_cast_all(
                        pivot.position,
                        Vec3::new(max / 2.0, max / 2.0, 0.0),
                        self.look.body_rotation() * Vec3::NEG_Z,
                        pivot.rotation,
                        max,
                        mask,
                    )
                    .into_iter()
                    .filter(|hit| hit.entity.is_some_and(|e| e != self.entity))
                    .min_by(|a, b| a.distance.total_cmp(&b.distance))
            }
        };

        match hit.and_then(|hit| hit.entity) {
            Some(target) => self.grab_entity(target, world),
            None => {
                debug!(entity = self.entity.0, "nothing in reach to grab");
                false
            }
        }
    }

    /// Take hold of `target` if it is a free interactable.
    pub fn grab_entity(&mut self, target: EntityId, world: &mut dyn PhysicsWorld) -> bool {
        if self.grab.is_some() || target == self.entity {
            return false;
        }
        match world.interactable(target) {
            None => {
                debug!(target = target.0, "hit is not interactable");
                return false;
            }
            Some(object) if object.holder().is_some_and(|h| h != self.entity) => {
                debug!(target = target.0, "object already held by someone else");
                return false;
            }
            Some(_) => {}
        }
        let (Some(body_position), Some(target_position)) = (world.position(self.entity), world.position(target))
        else {
            return false;
        };
        let Some(pivot) = self.pivot(body_position) else {
            error!(entity = self.entity.0, "look pivot not set, cannot grab");
            return false;
        };

        let grab = GrabState::new(
            target,
            body_position.distance(target_position),
            self.config.grab.max_object_distance,
            self.config.grab.grab_pitch_bias,
            world.rotation(target).unwrap_or(Quat::IDENTITY),
        );
        let place = grab.placement_world(&pivot);
        let taken = world
            .interactable_mut(target)
            .is_some_and(|object| object.grab(self.entity, place));
        if !taken {
            return false;
        }
        world.set_collision_ignored(self.entity, target, true);
        info!(
            entity = self.entity.0,
            target = target.0,
            distance = grab.object_distance(),
            "grabbed object"
        );
        self.grab = Some(grab);

        let context = self.config.contexts.manipulate.clone();
        self.switch_context(&context);
        true
    }

    /// Let go of the held object. Returns false when nothing was held.
    pub fn release(&mut self, world: &mut dyn PhysicsWorld) -> bool {
        let Some(grab) = self.grab.take() else {
            return false;
        };
        let held = grab.held();
        if let Some(object) = world.interactable_mut(held) {
            object.release(self.entity);
        }
        world.set_collision_ignored(self.entity, held, false);
        info!(entity = self.entity.0, target = held.0, "released object");
        self.drop_grab();
        true
    }

    /// Mode and context reset shared by release and a vanished object.
    fn drop_grab(&mut self) {
        self.grab = None;
        self.modes.force_move();
        self.clear_inactive_intent();
        let context = self.config.contexts.player.clone();
        self.switch_context(&context);
    }

    /// Unlink, switch and relink. A busy input source defers the whole switch
    /// to the next frame; the latest request wins.
    fn switch_context(&mut self, context: &str) {
        let input = Rc::clone(&self.input);
        let Ok(mut input) = input.try_borrow_mut() else {
            warn!(entity = self.entity.0, context, "input source busy, context switch deferred");
            self.pending_context = Some(context.to_string());
            return;
        };
        self.pending_context = None;
        if self.registry.state() == LinkState::Linked {
            if let Err(err) =
                self.registry
                    .relink_for_context(&self.config.bindings, &self.config.contexts, &mut *input, context)
            {
                warn!(error = %err, context, "relink after context switch failed");
            }
        } else if !input.switch_context(context) {
            warn!(context, "cannot switch to unknown input context");
        }
    }

    fn sync_tuning(&mut self) {
        self.movement.tuning = self.config.movement;
        self.look.look_strength = self.config.look.look_strength;
        if self.look.pitch_limits() != (self.config.look.max_look_up_angle, self.config.look.max_look_down_angle) {
            self.look
                .set_pitch_limits(self.config.look.max_look_up_angle, self.config.look.max_look_down_angle);
        }
    }

    /// Fixed-rate physics phase.
    pub fn fixed_update(&mut self, dt: f32, world: &mut dyn PhysicsWorld) {
        if !self.enabled {
            return;
        }
        self.sync_tuning();
        let Some(body_position) = world.position(self.entity) else {
            warn!(entity = self.entity.0, "controller body missing from world");
            return;
        };

        self.movement.check_ground(world, body_position);

        if let Some(held) = self.held() {
            if world.interactable(held).is_none() {
                warn!(entity = self.entity.0, target = held.0, "held object vanished, dropping it");
                self.drop_grab();
            }
        }

        let has_pivot = self.config.look.pivot_offset.is_some();
        if !has_pivot {
            error!(entity = self.entity.0, "look pivot not set, skipping look and movement");
            self.movement.clear_direction();
        }

        if has_pivot && self.mode().allows_free_move() && self.intent.move_direction != Vec2::ZERO {
            let body_rotation = self.look.body_rotation();
            self.movement.apply_movement(
                world,
                self.entity,
                body_rotation * Vec3::NEG_Z,
                body_rotation * Vec3::X,
                self.intent.move_direction,
            );
        } else {
            self.movement.clear_direction();
        }

        let tuning = self.config.grab;
        let mode = self.mode();
        if let Some(grab) = self.grab.as_mut() {
            if mode.allows_object_move() && self.intent.move_object_direction != Vec3::ZERO {
                grab.translate(
                    self.intent.move_object_direction,
                    tuning.move_object_speed,
                    dt,
                    tuning.max_object_distance,
                );
            }
            if mode.allows_object_rotate() && self.intent.rotate_object_delta != Vec3::ZERO {
                grab.rotate(self.intent.rotate_object_delta, tuning.rotate_object_speed, dt);
            }
        }

        if !has_pivot {
            return;
        }

        if mode.allows_free_move() && self.intent.look_delta != Vec2::ZERO {
            self.look.apply_look(self.intent.look_delta);
            world.set_rotation(self.entity, self.look.body_rotation());
        }

        let Some(pivot) = self.pivot(body_position) else {
            return;
        };
        let ground_mask = self.config.movement.ground_mask;
        if let Some(grab) = self.grab.as_mut() {
            grab.clamp_distance(tuning.max_object_distance);
            grab.correct_for_ground(world, &pivot, ground_mask);
            grab.update_facing(&pivot, tuning.facing_lerp);
            let place = grab.placement_world(&pivot);
            if let Some(object) = world.interactable_mut(grab.held()) {
                object.update_desired_place(place);
            }
        }
    }

    /// Rays worth drawing for the current state.
    pub fn debug_rays(&self, world: &dyn PhysicsWorld) -> Vec<DebugRay> {
        let Some(body_position) = world.position(self.entity) else {
            return Vec::new();
        };
        let mut rays = vec![DebugRay {
            kind: DebugRayKind::Ground,
            origin: body_position,
            direction: Vec3::NEG_Y,
            length: self.config.movement.ground_ray_distance,
        }];
        let Some(pivot) = self.pivot(body_position) else {
            return rays;
        };

        match &self.grab {
            Some(grab) => {
                let to_place = pivot.rotation * grab.placement();
                rays.push(DebugRay {
                    kind: DebugRayKind::Placement,
                    origin: pivot.position,
                    direction: to_place.normalize_or_zero(),
                    length: to_place.length(),
                });
            }
            None => {
                let max = self.config.grab.max_object_distance;
                let pointer = if self.is_keyboard_mouse() { self.pointer_ray() } else { None };
                let ray = match pointer {
                    Some(ray) => DebugRay {
                        kind: DebugRayKind::Grab,
                        origin: ray.origin,
                        direction: ray.direction,
                        length: max + body_position.distance(ray.origin),
                    },
                    None => DebugRay {
                        kind: DebugRayKind::Grab,
                        origin: pivot.position,
                        direction: self.look.body_rotation() * Vec3::NEG_Z,
                        length: max,
                    },
                };
                rays.push(ray);
            }
        }
        rays
    }
}

impl std::fmt::Debug for PlayerController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerController")
            .field("entity", &self.entity)
            .field("enabled", &self.enabled)
            .field("mode", &self.mode())
            .field("held", &self.held())
            .field("link_state", &self.registry.state())
            .finish_non_exhaustive()
    }
}
