//! Controller Tests - Dispatch, Modes, Grab Placement
//!
//! End-to-end behavior of `PlayerController` driven through the first-person
//! action maps, against the sandbox world and a scripted world double.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glam::{Quat, Vec2, Vec3};
use grab_controller::game::sandbox::SandboxWorld;
use grab_controller::input::{ActionEvent, ActionMaps, ActionValue, Dispatch, HandlerKind, InputSource, LinkState};
use grab_controller::physics::{
    EntityId, ForceMode, InteractableObject, LayerMask, PhysicsWorld, Ray, RayHit,
};
use grab_controller::player::{
    ControllerConfig, ControllerMode, DebugRayKind, ModeTrigger, PlayerController, next_mode,
};

const DT: f32 = 0.02;

struct Rig {
    world: SandboxWorld,
    maps: Rc<RefCell<ActionMaps>>,
    controller: PlayerController,
    player: EntityId,
}

impl Rig {
    fn new(config: ControllerConfig) -> Self {
        let mut world = SandboxWorld::new().with_ground(0.0);
        let player = world.spawn_player(Vec3::new(0.0, 1.0, 0.0));
        let maps = Rc::new(RefCell::new(ActionMaps::first_person()));
        let mut controller = PlayerController::new(player, config, maps.clone());
        controller.enable();
        controller.frame_update();
        Self {
            world,
            maps,
            controller,
            player,
        }
    }

    fn with_crate(config: ControllerConfig, position: Vec3) -> (Self, EntityId) {
        let mut rig = Self::new(config);
        let crate_box = rig.world.spawn_interactable(position, Vec3::splat(0.25), 0.05);
        (rig, crate_box)
    }

    /// Fire an action through the maps and run every resulting dispatch.
    fn fire(&mut self, action: &str, event: ActionEvent) -> usize {
        let dispatches = self.maps.borrow().fire(action, event);
        self.controller.dispatch_all(&dispatches, &mut self.world);
        dispatches.len()
    }

    fn press(&mut self, action: &str, value: ActionValue) -> usize {
        self.fire(action, ActionEvent::performed(value))
    }

    fn release(&mut self, action: &str) -> usize {
        self.fire(action, ActionEvent::canceled(ActionValue::None))
    }

    fn tick(&mut self) {
        self.controller.fixed_update(DT, &mut self.world);
        self.world.step(DT);
    }

    fn context(&self) -> Option<String> {
        self.maps.borrow().current_context()
    }

    fn subscribers(&self) -> usize {
        self.maps.borrow().total_subscribers()
    }
}

fn button() -> ActionValue {
    ActionValue::Button(true)
}

fn keyboard_mouse(rig: &Rig) {
    rig.maps.borrow_mut().set_control_scheme(Some("KeyboardMouse"));
}

// ============================================================================
// Scripted World Double
// ============================================================================

const PLAYER: EntityId = EntityId(1);
const OBJECT: EntityId = EntityId(2);

/// Two bodies and a ground whose hit distance the test dictates.
struct ScriptedWorld {
    player: Vec3,
    object: Vec3,
    interactable: InteractableObject,
    ground_hit: Option<f32>,
    ignored: bool,
    /// (direction, orientation) of the last box cast
    last_box_cast: Cell<Option<(Vec3, Quat)>>,
}

impl ScriptedWorld {
    fn new(object: Vec3) -> Self {
        Self {
            player: Vec3::new(0.0, 1.0, 0.0),
            object,
            interactable: InteractableObject::new(0.0),
            ground_hit: None,
            ignored: false,
            last_box_cast: Cell::new(None),
        }
    }
}

impl PhysicsWorld for ScriptedWorld {
    fn raycast(&self, ray: Ray, max_distance: f32, mask: LayerMask) -> Option<RayHit> {
        if !mask.contains_layer(0) {
            return None;
        }
        self.ground_hit.filter(|d| *d <= max_distance).map(|distance| RayHit {
            entity: None,
            point: ray.at(distance),
            distance,
        })
    }

    fn box_cast_all(&self, _: Vec3, _: Vec3, direction: Vec3, orientation: Quat, _: f32, _: LayerMask) -> Vec<RayHit> {
        self.last_box_cast.set(Some((direction, orientation)));
        Vec::new()
    }

    fn position(&self, entity: EntityId) -> Option<Vec3> {
        match entity {
            PLAYER => Some(self.player),
            OBJECT => Some(self.object),
            _ => None,
        }
    }

    fn rotation(&self, entity: EntityId) -> Option<Quat> {
        self.position(entity).map(|_| Quat::IDENTITY)
    }

    fn set_rotation(&mut self, _: EntityId, _: Quat) {}

    fn velocity(&self, entity: EntityId) -> Option<Vec3> {
        self.position(entity).map(|_| Vec3::ZERO)
    }

    fn add_force(&mut self, _: EntityId, _: Vec3, _: ForceMode) {}

    fn set_collision_ignored(&mut self, _: EntityId, _: EntityId, ignored: bool) {
        self.ignored = ignored;
    }

    fn interactable(&self, entity: EntityId) -> Option<&InteractableObject> {
        (entity == OBJECT).then_some(&self.interactable)
    }

    fn interactable_mut(&mut self, entity: EntityId) -> Option<&mut InteractableObject> {
        if entity == OBJECT { Some(&mut self.interactable) } else { None }
    }
}

fn placement_length(controller: &PlayerController) -> f32 {
    controller.grab_state().unwrap().placement().length()
}

// ============================================================================
// Linking Lifecycle
// ============================================================================

#[test]
fn test_enable_links_on_next_frame() {
    let mut world = SandboxWorld::new().with_ground(0.0);
    let player = world.spawn_player(Vec3::new(0.0, 1.0, 0.0));
    let maps = Rc::new(RefCell::new(ActionMaps::first_person()));
    let mut controller = PlayerController::new(player, ControllerConfig::default(), maps.clone());

    controller.enable();
    assert_eq!(controller.link_state(), LinkState::Pending);
    assert_eq!(maps.borrow().total_subscribers(), 0);

    assert_eq!(controller.frame_update(), LinkState::Linked);
    assert_eq!(maps.borrow().total_subscribers(), 8);

    // Further frames change nothing
    controller.frame_update();
    assert_eq!(maps.borrow().total_subscribers(), 8);
}

#[test]
fn test_enable_rearms_failed_link() {
    let mut world = SandboxWorld::new();
    let player = world.spawn_player(Vec3::ZERO);
    let maps = Rc::new(RefCell::new(ActionMaps::first_person()));
    maps.borrow_mut().set_ready(false);
    let mut controller = PlayerController::new(player, ControllerConfig::default(), maps.clone());

    controller.enable();
    assert_eq!(controller.frame_update(), LinkState::Failed);

    maps.borrow_mut().set_ready(true);
    assert_eq!(controller.frame_update(), LinkState::Failed);
    assert_eq!(maps.borrow().total_subscribers(), 0);

    // Still enabled; a second enable re-arms the link
    assert!(controller.is_enabled());
    controller.enable();
    assert_eq!(controller.link_state(), LinkState::Pending);
    assert_eq!(controller.frame_update(), LinkState::Linked);
    assert_eq!(maps.borrow().total_subscribers(), 8);

    // Once linked, enable is a no-op
    controller.enable();
    assert_eq!(controller.link_state(), LinkState::Linked);
}

#[test]
fn test_disable_then_enable_relinks_after_failure() {
    let mut world = SandboxWorld::new();
    let player = world.spawn_player(Vec3::ZERO);
    let maps = Rc::new(RefCell::new(ActionMaps::first_person()));
    maps.borrow_mut().set_ready(false);
    let mut controller = PlayerController::new(player, ControllerConfig::default(), maps.clone());

    controller.enable();
    assert_eq!(controller.frame_update(), LinkState::Failed);

    maps.borrow_mut().set_ready(true);
    controller.disable();
    controller.enable();
    assert_eq!(controller.frame_update(), LinkState::Linked);
    assert_eq!(maps.borrow().total_subscribers(), 8);
}

#[test]
fn test_disable_unlinks_and_ignores_dispatch() {
    let mut rig = Rig::new(ControllerConfig::default());
    rig.controller.disable();
    assert_eq!(rig.subscribers(), 0);

    let dispatch = Dispatch {
        owner: rig.player,
        handler: HandlerKind::Move,
        event: ActionEvent::performed(ActionValue::Axis2(Vec2::Y)),
    };
    rig.controller.dispatch(&dispatch, &mut rig.world);
    assert_eq!(rig.controller.intent().move_direction, Vec2::ZERO);
}

#[test]
fn test_dispatch_for_other_owner_is_ignored() {
    let mut rig = Rig::new(ControllerConfig::default());
    let dispatch = Dispatch {
        owner: EntityId(999),
        handler: HandlerKind::Move,
        event: ActionEvent::performed(ActionValue::Axis2(Vec2::Y)),
    };
    rig.controller.dispatch(&dispatch, &mut rig.world);
    assert_eq!(rig.controller.intent().move_direction, Vec2::ZERO);
}

#[test]
fn test_set_linked_bindings_replaces_table() {
    use grab_controller::input::{BindingContext, BindingRecord, Trigger};

    let mut rig = Rig::new(ControllerConfig::default());
    rig.controller.set_linked_bindings(vec![BindingRecord::new(
        "Move",
        Trigger::Both,
        HandlerKind::Move,
        BindingContext::Both,
    )]);
    assert_eq!(rig.subscribers(), 2);
    assert_eq!(rig.press("Jump", button()), 0);
}

// ============================================================================
// Movement and Jump
// ============================================================================

#[test]
fn test_move_pushes_body_forward() {
    let mut rig = Rig::new(ControllerConfig::default());
    assert_eq!(rig.press("Move", ActionValue::Axis2(Vec2::Y)), 1);
    rig.tick();

    assert!(rig.controller.grounded());
    assert!((rig.controller.move_direction() - Vec3::NEG_Z).length() < 1e-5);
    assert!(rig.world.velocity(rig.player).unwrap().z < 0.0);

    rig.release("Move");
    rig.tick();
    assert_eq!(rig.controller.move_direction(), Vec3::ZERO);
}

#[test]
fn test_soft_cap_stops_pushing_at_max_speed() {
    let mut rig = Rig::new(ControllerConfig::default());
    {
        let body = rig.world.body_mut(rig.player).unwrap();
        body.drag = 0.0;
        body.velocity = Vec3::new(0.0, 0.0, -6.0);
    }
    rig.press("Move", ActionValue::Axis2(Vec2::Y));
    rig.tick();
    assert!((rig.world.velocity(rig.player).unwrap().z + 6.0).abs() < 1e-5);

    rig.world.body_mut(rig.player).unwrap().velocity = Vec3::new(0.0, 0.0, -2.5);
    rig.tick();
    assert!(rig.world.velocity(rig.player).unwrap().z < -2.5);
}

#[test]
fn test_move_follows_yaw() {
    let mut rig = Rig::new(ControllerConfig::default());
    rig.controller.look_mut().set_yaw(90.0);
    rig.press("Move", ActionValue::Axis2(Vec2::Y));
    rig.tick();
    // Yawed right: forward is +X
    assert!((rig.controller.move_direction() - Vec3::X).length() < 1e-5);
}

#[test]
fn test_jump_requires_ground_and_fires_once_per_edge() {
    let mut rig = Rig::new(ControllerConfig::default());
    rig.controller.fixed_update(DT, &mut rig.world);
    assert!(rig.controller.grounded());

    assert_eq!(rig.press("Jump", button()), 1);
    assert!((rig.world.velocity(rig.player).unwrap().y - 5.0).abs() < 1e-5);

    // Release edge is not bound and never jumps
    assert_eq!(rig.release("Jump"), 0);
    assert!((rig.world.velocity(rig.player).unwrap().y - 5.0).abs() < 1e-5);

    // Airborne
    {
        let body = rig.world.body_mut(rig.player).unwrap();
        body.transform.position.y = 5.0;
        body.velocity = Vec3::ZERO;
    }
    rig.controller.fixed_update(DT, &mut rig.world);
    assert!(!rig.controller.grounded());
    rig.press("Jump", button());
    assert_eq!(rig.world.velocity(rig.player).unwrap(), Vec3::ZERO);
}

#[test]
fn test_missing_pivot_skips_movement_without_panicking() {
    let mut config = ControllerConfig::default();
    config.look.pivot_offset = None;
    let mut rig = Rig::new(config);

    rig.press("Move", ActionValue::Axis2(Vec2::Y));
    rig.press("Look", ActionValue::Axis2(Vec2::new(10.0, 0.0)));
    rig.controller.fixed_update(DT, &mut rig.world);

    assert!(rig.controller.grounded());
    assert_eq!(rig.controller.move_direction(), Vec3::ZERO);
    assert_eq!(rig.world.velocity(rig.player).unwrap(), Vec3::ZERO);
    assert_eq!(rig.controller.look().yaw_degrees(), 0.0);
}

// ============================================================================
// Look
// ============================================================================

#[test]
fn test_pitch_clamp_holds_over_many_ticks() {
    let mut rig = Rig::new(ControllerConfig::default());
    rig.press("Look", ActionValue::Axis2(Vec2::new(0.0, 5.0)));
    for _ in 0..10_000 {
        rig.controller.fixed_update(DT, &mut rig.world);
        let pitch = rig.controller.look().pitch_degrees();
        assert!((-80.0..=80.0).contains(&pitch));
    }
    assert_eq!(rig.controller.look().pitch_degrees(), 80.0);

    rig.press("Look", ActionValue::Axis2(Vec2::new(0.0, -5.0)));
    for _ in 0..10_000 {
        rig.controller.fixed_update(DT, &mut rig.world);
    }
    assert_eq!(rig.controller.look().pitch_degrees(), -80.0);
}

#[test]
fn test_look_yaw_turns_body() {
    let mut rig = Rig::new(ControllerConfig::default());
    rig.press("Look", ActionValue::Axis2(Vec2::new(10.0, 0.0)));
    rig.controller.fixed_update(DT, &mut rig.world);

    assert!((rig.controller.look().yaw_degrees() - 1.0).abs() < 1e-5);
    let rotation = rig.world.rotation(rig.player).unwrap();
    assert!(rotation.angle_between(rig.controller.look().body_rotation()) < 1e-5);
}

#[test]
fn test_set_look_rotation_turns_body_and_clamps_pitch() {
    let mut rig = Rig::new(ControllerConfig::default());
    let pivot = Quat::from_rotation_y(-45f32.to_radians()) * Quat::from_rotation_x(-85f32.to_radians());
    rig.controller.set_look_rotation(pivot, &mut rig.world);

    assert!((rig.controller.look().yaw_degrees() - 45.0).abs() < 1e-3);
    assert!((rig.controller.look().pitch_degrees() - (-80.0)).abs() < 1e-3);
    let body = rig.world.rotation(rig.player).unwrap();
    assert!(body.abs_diff_eq(rig.controller.look().body_rotation(), 1e-5));
}

#[test]
fn test_keyboard_mouse_look_needs_enable_look() {
    let mut rig = Rig::new(ControllerConfig::default());
    keyboard_mouse(&rig);

    rig.press("Look", ActionValue::Axis2(Vec2::new(10.0, 0.0)));
    assert_eq!(rig.controller.intent().look_delta, Vec2::ZERO);

    rig.press("EnableLook", button());
    rig.press("Look", ActionValue::Axis2(Vec2::new(10.0, 0.0)));
    assert_eq!(rig.controller.intent().look_delta, Vec2::new(10.0, 0.0));

    rig.release("EnableLook");
    assert_eq!(rig.controller.intent().look_delta, Vec2::ZERO);
}

// ============================================================================
// Modes
// ============================================================================

#[test]
fn test_full_mode_table() {
    use ControllerMode::*;
    use ModeTrigger::{MoveObject as M, RotateObject as R};

    let table = [
        (Move, [MoveObject, Move, RotateObject, Move]),
        (MoveObject, [MoveObject, Move, MoveRotateObject, MoveObject]),
        (RotateObject, [MoveRotateObject, RotateObject, RotateObject, Move]),
        (MoveRotateObject, [MoveRotateObject, RotateObject, MoveRotateObject, MoveObject]),
    ];
    let triggers = [M(true), M(false), R(true), R(false)];

    for (current, expected) in table {
        for (trigger, want) in triggers.iter().zip(expected) {
            assert_eq!(next_mode(current, *trigger, true), want, "{current:?} + {trigger:?}");
        }
    }
}

#[test]
fn test_move_mode_requires_held_object() {
    let mut rig = Rig::new(ControllerConfig::default());
    let dispatch = Dispatch {
        owner: rig.player,
        handler: HandlerKind::EnableMoveMode,
        event: ActionEvent::performed(button()),
    };
    rig.controller.dispatch(&dispatch, &mut rig.world);
    assert_eq!(rig.controller.mode(), ControllerMode::Move);
}

#[test]
fn test_mode_gates_intent() {
    let (mut rig, _) = Rig::with_crate(ControllerConfig::default(), Vec3::new(0.0, 0.25, -2.5));
    rig.press("Grab", button());
    rig.press("Move", ActionValue::Axis2(Vec2::Y));
    assert_eq!(rig.controller.intent().move_direction, Vec2::Y);

    rig.press("MoveMode", button());
    assert_eq!(rig.controller.mode(), ControllerMode::MoveObject);
    assert_eq!(rig.controller.intent().move_direction, Vec2::ZERO);

    rig.press("Move", ActionValue::Axis2(Vec2::Y));
    assert_eq!(rig.controller.intent().move_direction, Vec2::ZERO);

    rig.press("ObjectMove", ActionValue::Axis3(Vec3::Z));
    assert_eq!(rig.controller.intent().move_object_direction, Vec3::Z);
    rig.press("ObjectRotate", ActionValue::Axis3(Vec3::Y));
    assert_eq!(rig.controller.intent().rotate_object_delta, Vec3::ZERO);
}

// ============================================================================
// Grab and Release
// ============================================================================

#[test]
fn test_grab_switches_context_and_suspends_gravity() {
    let (mut rig, crate_box) = Rig::with_crate(ControllerConfig::default(), Vec3::new(0.0, 0.25, -2.5));
    assert_eq!(rig.press("Grab", button()), 1);

    assert_eq!(rig.controller.held(), Some(crate_box));
    assert_eq!(rig.context().as_deref(), Some("Manipulate"));
    assert_eq!(rig.subscribers(), 15);
    assert_eq!(rig.subscribers(), rig.controller.registry().len());

    let object = rig.world.interactable(crate_box).unwrap();
    assert!(!object.gravity_enabled());
    assert_eq!(object.holder(), Some(rig.player));
    assert!(rig.world.is_collision_ignored(rig.player, crate_box));

    let expected = Vec3::new(0.0, 1.0, 0.0).distance(Vec3::new(0.0, 0.25, -2.5));
    assert!((rig.controller.object_distance() - expected).abs() < 1e-4);

    // Player-only actions are gone
    assert_eq!(rig.press("Jump", button()), 0);
}

#[test]
fn test_nothing_in_reach_keeps_player_context() {
    let (mut rig, _) = Rig::with_crate(ControllerConfig::default(), Vec3::new(0.0, 0.25, -10.0));
    rig.press("Grab", button());
    assert_eq!(rig.controller.held(), None);
    assert_eq!(rig.context().as_deref(), Some("Player"));
    assert_eq!(rig.subscribers(), 8);
}

#[test]
fn test_release_resets_mode_and_context() {
    let (mut rig, crate_box) = Rig::with_crate(ControllerConfig::default(), Vec3::new(0.0, 0.25, -2.5));
    rig.press("Grab", button());
    rig.press("MoveMode", button());
    rig.press("RotateMode", button());
    rig.press("ObjectRotate", ActionValue::Axis3(Vec3::Y));
    assert_eq!(rig.controller.mode(), ControllerMode::MoveRotateObject);

    rig.press("Grab", button());

    assert_eq!(rig.controller.mode(), ControllerMode::Move);
    assert_eq!(rig.controller.held(), None);
    assert_eq!(rig.context().as_deref(), Some("Player"));
    assert_eq!(rig.subscribers(), 8);
    assert_eq!(rig.controller.intent().rotate_object_delta, Vec3::ZERO);

    let object = rig.world.interactable(crate_box).unwrap();
    assert!(object.gravity_enabled());
    assert!(object.desired_place().is_none());
    assert!(!rig.world.is_collision_ignored(rig.player, crate_box));
}

#[test]
fn test_grab_while_source_borrowed_switches_context_next_frame() {
    let (mut rig, crate_box) = Rig::with_crate(ControllerConfig::default(), Vec3::new(0.0, 0.25, -2.5));

    // Host dispatches while still holding the maps borrow
    for dispatch in rig.maps.borrow().fire("Grab", ActionEvent::performed(button())) {
        rig.controller.dispatch(&dispatch, &mut rig.world);
    }
    assert_eq!(rig.controller.held(), Some(crate_box));
    assert_eq!(rig.controller.pending_context(), Some("Manipulate"));
    assert_eq!(rig.context().as_deref(), Some("Player"));

    rig.controller.frame_update();
    assert_eq!(rig.controller.pending_context(), None);
    assert_eq!(rig.context().as_deref(), Some("Manipulate"));
    assert_eq!(rig.subscribers(), 15);
    assert_eq!(rig.press("MoveMode", button()), 1);
    assert_eq!(rig.controller.mode(), ControllerMode::MoveObject);
}

#[test]
fn test_release_while_source_borrowed_restores_player_context_next_frame() {
    let (mut rig, _) = Rig::with_crate(ControllerConfig::default(), Vec3::new(0.0, 0.25, -2.5));
    rig.press("Grab", button());
    assert_eq!(rig.context().as_deref(), Some("Manipulate"));

    for dispatch in rig.maps.borrow().fire("Grab", ActionEvent::performed(button())) {
        rig.controller.dispatch(&dispatch, &mut rig.world);
    }
    assert_eq!(rig.controller.held(), None);
    assert_eq!(rig.controller.pending_context(), Some("Player"));

    // Still busy on the next frame: the switch stays queued
    {
        let _busy = rig.maps.borrow();
        rig.controller.frame_update();
    }
    assert_eq!(rig.controller.pending_context(), Some("Player"));

    rig.controller.frame_update();
    assert_eq!(rig.context().as_deref(), Some("Player"));
    assert_eq!(rig.subscribers(), 8);
    assert_eq!(rig.press("Jump", button()), 1);
}

#[test]
fn test_grab_and_release_in_one_borrow_keeps_latest_context() {
    let (mut rig, _) = Rig::with_crate(ControllerConfig::default(), Vec3::new(0.0, 0.25, -2.5));
    {
        let maps = rig.maps.borrow();
        for _ in 0..2 {
            for dispatch in maps.fire("Grab", ActionEvent::performed(button())) {
                rig.controller.dispatch(&dispatch, &mut rig.world);
            }
        }
    }
    assert_eq!(rig.controller.held(), None);
    assert_eq!(rig.controller.pending_context(), Some("Player"));

    rig.controller.frame_update();
    assert_eq!(rig.context().as_deref(), Some("Player"));
    assert_eq!(rig.subscribers(), 8);
}

#[test]
fn test_grab_box_cast_uses_pivot_orientation() {
    let maps = Rc::new(RefCell::new(ActionMaps::first_person()));
    let mut controller = PlayerController::new(PLAYER, ControllerConfig::default(), maps);
    let mut world = ScriptedWorld::new(Vec3::new(0.0, 1.0, -3.0));
    controller.look_mut().set_yaw(90.0);
    controller.look_mut().set_pitch(-20.0);

    assert!(!controller.try_grab(&mut world));
    let (direction, orientation) = world.last_box_cast.get().unwrap();
    let body_forward = controller.look().body_rotation() * Vec3::NEG_Z;
    assert!(direction.abs_diff_eq(body_forward, 1e-5));
    assert!(orientation.abs_diff_eq(controller.look().pivot_rotation(), 1e-5));
    assert!(!orientation.abs_diff_eq(controller.look().body_rotation(), 1e-3));
}

#[test]
fn test_object_held_by_someone_else_is_refused() {
    let (mut rig, crate_box) = Rig::with_crate(ControllerConfig::default(), Vec3::new(0.0, 0.25, -2.5));
    let other = EntityId(500);
    let place = grab_controller::physics::Transform::IDENTITY;
    assert!(rig.world.interactable_mut(crate_box).unwrap().grab(other, place));

    rig.press("Grab", button());
    assert_eq!(rig.controller.held(), None);
    assert_eq!(rig.context().as_deref(), Some("Player"));
}

#[test]
fn test_pointer_ray_reach_extends_by_camera_distance() {
    let (mut rig, crate_box) = Rig::with_crate(ControllerConfig::default(), Vec3::new(0.0, 1.5, -3.0));
    keyboard_mouse(&rig);
    // Third-person style camera 3 m behind the player
    rig.maps
        .borrow_mut()
        .set_pointer_ray(Some(Ray::new(Vec3::new(0.0, 1.5, 3.0), Vec3::NEG_Z)));

    rig.press("Grab", button());
    assert_eq!(rig.controller.held(), Some(crate_box));
}

#[test]
fn test_pointer_ray_out_of_reach() {
    let (mut rig, _) = Rig::with_crate(ControllerConfig::default(), Vec3::new(0.0, 1.5, -6.0));
    keyboard_mouse(&rig);
    // Reach is 4 m past the player; the crate is 5.75 m past it
    rig.maps
        .borrow_mut()
        .set_pointer_ray(Some(Ray::new(Vec3::new(0.0, 1.5, 3.0), Vec3::NEG_Z)));

    rig.press("Grab", button());
    assert_eq!(rig.controller.held(), None);
}

#[test]
fn test_held_object_follows_placement() {
    let (mut rig, crate_box) = Rig::with_crate(ControllerConfig::default(), Vec3::new(0.0, 0.25, -2.5));
    rig.press("Grab", button());
    for _ in 0..150 {
        rig.tick();
    }

    let place = rig.world.interactable(crate_box).unwrap().desired_place().unwrap();
    let actual = rig.world.position(crate_box).unwrap();
    let horizontal = Vec2::new(place.position.x - actual.x, place.position.z - actual.z);
    assert!(horizontal.length() < 0.05);
}

#[test]
fn test_object_move_changes_distance_within_limit() {
    let (mut rig, _) = Rig::with_crate(ControllerConfig::default(), Vec3::new(0.0, 0.25, -2.5));
    rig.press("Grab", button());
    rig.press("MoveMode", button());
    rig.press("ObjectMove", ActionValue::Axis3(Vec3::Z));
    for _ in 0..500 {
        rig.tick();
        assert!(rig.controller.object_distance() <= 4.0 + 1e-4);
    }
    assert!((rig.controller.object_distance() - 4.0).abs() < 1e-3);
}

#[test]
fn test_lowered_max_distance_clamps_without_turning() {
    let (mut rig, _) = Rig::with_crate(ControllerConfig::default(), Vec3::new(0.0, 0.25, -2.5));
    rig.press("Grab", button());
    let before = rig.controller.grab_state().unwrap().object_rotation();

    rig.controller.config_mut().grab.max_object_distance = 1.5;
    rig.controller.fixed_update(DT, &mut rig.world);

    let grab = rig.controller.grab_state().unwrap();
    assert!((grab.object_distance() - 1.5).abs() < 1e-4);
    assert!(grab.object_rotation().angle_between(before) < 1e-4);
}

#[test]
fn test_rotate_while_held_keeps_distance() {
    let (mut rig, _) = Rig::with_crate(ControllerConfig::default(), Vec3::new(0.0, 0.25, -2.5));
    rig.press("Grab", button());
    let distance = rig.controller.object_distance();
    let rotation = rig.controller.grab_state().unwrap().placement_rotation();

    rig.press("RotateMode", button());
    rig.press("ObjectRotate", ActionValue::Axis3(Vec3::Y));
    for _ in 0..10 {
        rig.tick();
    }

    let grab = rig.controller.grab_state().unwrap();
    assert!((grab.object_distance() - distance).abs() < 1e-5);
    assert!(grab.placement_rotation().angle_between(rotation) > 0.1);
}

#[test]
fn test_vanished_object_drops_grab() {
    let (mut rig, crate_box) = Rig::with_crate(ControllerConfig::default(), Vec3::new(0.0, 0.25, -2.5));
    rig.press("Grab", button());
    rig.press("MoveMode", button());
    rig.world.despawn(crate_box);

    rig.tick();
    assert_eq!(rig.controller.held(), None);
    assert_eq!(rig.controller.mode(), ControllerMode::Move);
    assert_eq!(rig.context().as_deref(), Some("Player"));
    assert_eq!(rig.subscribers(), 8);
}

// ============================================================================
// Ground Correction
// ============================================================================

#[test]
fn test_ground_clamp_pulls_in_and_releases() {
    let mut config = ControllerConfig::default();
    config.grab.max_object_distance = 5.0;
    let maps = Rc::new(RefCell::new(ActionMaps::first_person()));
    let mut controller = PlayerController::new(PLAYER, config, maps.clone());
    controller.enable();

    let mut world = ScriptedWorld::new(Vec3::new(0.0, 1.0, -6.0));
    assert!(controller.grab_entity(OBJECT, &mut world));
    assert!(world.ignored);
    assert!((controller.object_distance() - 5.0).abs() < 1e-5);

    controller.fixed_update(DT, &mut world);
    assert!((placement_length(&controller) - 5.0).abs() < 1e-4);

    world.ground_hit = Some(3.0);
    controller.fixed_update(DT, &mut world);
    assert!((placement_length(&controller) - 3.0).abs() < 1e-4);
    // Nominal distance is untouched by the correction
    assert!((controller.object_distance() - 5.0).abs() < 1e-5);

    world.ground_hit = None;
    controller.fixed_update(DT, &mut world);
    assert!((placement_length(&controller) - 5.0).abs() < 1e-4);
}

#[test]
fn test_ground_clamp_against_sandbox_plane() {
    let mut config = ControllerConfig::default();
    config.grab.max_object_distance = 5.0;
    let (mut rig, crate_box) = Rig::with_crate(config, Vec3::new(0.0, 0.25, -6.0));
    assert!(rig.controller.grab_entity(crate_box, &mut rig.world));

    // Pivot 1.5 m up, 30 degrees down: the ground plane is 3 m out
    rig.controller.fixed_update(DT, &mut rig.world);
    assert!((placement_length(&rig.controller) - 3.0).abs() < 1e-3);

    rig.world.set_ground(None);
    rig.controller.fixed_update(DT, &mut rig.world);
    assert!((placement_length(&rig.controller) - 5.0).abs() < 1e-3);
}

// ============================================================================
// Debug Rays
// ============================================================================

#[test]
fn test_debug_rays_follow_grab_state() {
    let (mut rig, _) = Rig::with_crate(ControllerConfig::default(), Vec3::new(0.0, 0.25, -2.5));
    let kinds: Vec<_> = rig.controller.debug_rays(&rig.world).iter().map(|r| r.kind).collect();
    assert_eq!(kinds, vec![DebugRayKind::Ground, DebugRayKind::Grab]);

    rig.press("Grab", button());
    let kinds: Vec<_> = rig.controller.debug_rays(&rig.world).iter().map(|r| r.kind).collect();
    assert_eq!(kinds, vec![DebugRayKind::Ground, DebugRayKind::Placement]);
}
