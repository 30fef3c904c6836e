//! Grab Sandbox - Headless Controller Demo
//!
//! Run with: `cargo run --bin grab_sandbox [config.json]`
//!
//! Drives one controller through a scripted session in the sandbox world:
//! walk up to a crate, look down, pick it up, push it away, spin it, drop it
//! and jump. Set `RUST_LOG=grab_controller=debug` to see binding and mode
//! traffic.

use std::cell::RefCell;
use std::env;
use std::rc::Rc;

use glam::{Quat, Vec2, Vec3};
use grab_controller::game::sandbox::SandboxWorld;
use grab_controller::input::{ActionEvent, ActionMaps, ActionValue};
use grab_controller::physics::PhysicsWorld;
use grab_controller::player::{ConfigError, ControllerConfig, PlayerController};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Physics step, 50 Hz
const FIXED_DT: f32 = 0.02;

/// One scripted input: fire `action` with `event` before tick `tick`.
struct Cue {
    tick: u32,
    action: &'static str,
    event: ActionEvent,
}

fn cue(tick: u32, action: &'static str, event: ActionEvent) -> Cue {
    Cue { tick, action, event }
}

fn press(value: ActionValue) -> ActionEvent {
    ActionEvent::performed(value)
}

fn release() -> ActionEvent {
    ActionEvent::canceled(ActionValue::None)
}

fn script() -> Vec<Cue> {
    vec![
        cue(0, "Move", press(ActionValue::Axis2(Vec2::Y))),
        cue(25, "Move", release()),
        cue(30, "Look", press(ActionValue::Axis2(Vec2::new(0.0, -50.0)))),
        cue(33, "Look", release()),
        cue(40, "Grab", press(ActionValue::Button(true))),
        cue(50, "MoveMode", press(ActionValue::Button(true))),
        cue(50, "ObjectMove", press(ActionValue::Axis3(Vec3::new(0.0, 0.5, 1.0)))),
        cue(80, "ObjectMove", release()),
        cue(80, "MoveMode", release()),
        cue(85, "RotateMode", press(ActionValue::Button(true))),
        cue(85, "ObjectRotate", press(ActionValue::Axis3(Vec3::Y))),
        cue(110, "ObjectRotate", release()),
        cue(110, "RotateMode", release()),
        cue(120, "Grab", press(ActionValue::Button(true))),
        cue(160, "Jump", press(ActionValue::Button(true))),
    ]
}

fn load_config() -> Result<ControllerConfig, ConfigError> {
    match env::args().nth(1) {
        Some(path) => {
            info!(%path, "loading controller config");
            ControllerConfig::load(path)
        }
        None => Ok(ControllerConfig::default()),
    }
}

fn main() -> Result<(), ConfigError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config()?;

    let mut world = SandboxWorld::new().with_ground(0.0);
    let player = world.spawn_player(Vec3::new(0.0, 1.0, 0.0));
    let crate_box = world.spawn_interactable(Vec3::new(0.0, 0.25, -4.0), Vec3::splat(0.25), 0.05);

    let maps = Rc::new(RefCell::new(ActionMaps::first_person()));
    let mut controller = PlayerController::new(player, config, maps.clone());
    controller.enable();
    // Start with the camera tipped slightly toward the floor
    controller.set_look_rotation(Quat::from_rotation_x(-10f32.to_radians()), &mut world);

    let cues = script();
    let last_tick = cues.iter().map(|c| c.tick).max().unwrap_or(0) + 40;
    for tick in 0..=last_tick {
        controller.frame_update();

        for c in cues.iter().filter(|c| c.tick == tick) {
            let dispatches = maps.borrow().fire(c.action, c.event);
            if dispatches.is_empty() {
                warn!(tick, action = c.action, "no handler listening");
            }
            controller.dispatch_all(&dispatches, &mut world);
        }

        controller.fixed_update(FIXED_DT, &mut world);
        world.step(FIXED_DT);

        if tick % 10 == 0 {
            let position = world.position(player).unwrap_or_default();
            let object = world.position(crate_box).unwrap_or_default();
            info!(
                tick,
                mode = ?controller.mode(),
                grounded = controller.grounded(),
                player = ?position,
                crate_position = ?object,
                held = controller.held().is_some(),
                distance = controller.object_distance(),
                "tick"
            );
        }
    }

    for ray in controller.debug_rays(&world) {
        info!(kind = ?ray.kind, origin = ?ray.origin, direction = ?ray.direction, length = ray.length, "debug ray");
    }
    info!(subscribers = maps.borrow().total_subscribers(), "session finished");
    Ok(())
}
