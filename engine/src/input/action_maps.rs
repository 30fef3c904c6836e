//! Action Maps
//!
//! The input/context source the controller links its handlers into. An
//! [`InputSource`] exposes named contexts ("action maps"), each holding named
//! actions with `performed`/`canceled` subscriber lists, plus the currently
//! active context and control scheme.
//!
//! [`ActionMaps`] is the in-crate implementation. Like a multicast delegate it
//! happily stores the same subscriber twice, so keeping subscriptions unique
//! is the caller's job (see [`super::bindings::BindingRegistry`]).

use glam::{Vec2, Vec3};

use super::bindings::{HandlerKind, LinkedBinding};
use crate::physics::{EntityId, Ray};

/// Which edge of an action fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionPhase {
    Performed,
    Canceled,
}

/// Value carried by an action event.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ActionValue {
    #[default]
    None,
    Button(bool),
    Axis2(Vec2),
    Axis3(Vec3),
}

impl ActionValue {
    /// Read as a 2D axis; anything else reads as zero.
    pub fn read_vec2(&self) -> Vec2 {
        match *self {
            ActionValue::Axis2(v) => v,
            ActionValue::Axis3(v) => v.truncate(),
            _ => Vec2::ZERO,
        }
    }

    /// Read as a 3D axis; a 2D axis is widened with z = 0.
    pub fn read_vec3(&self) -> Vec3 {
        match *self {
            ActionValue::Axis3(v) => v,
            ActionValue::Axis2(v) => v.extend(0.0),
            _ => Vec3::ZERO,
        }
    }
}

/// One action callback: the phase plus the value read at that moment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionEvent {
    pub phase: ActionPhase,
    pub value: ActionValue,
}

impl ActionEvent {
    pub fn performed(value: ActionValue) -> Self {
        Self {
            phase: ActionPhase::Performed,
            value,
        }
    }

    pub fn canceled(value: ActionValue) -> Self {
        Self {
            phase: ActionPhase::Canceled,
            value,
        }
    }

    #[inline]
    pub fn is_performed(&self) -> bool {
        self.phase == ActionPhase::Performed
    }

    #[inline]
    pub fn is_canceled(&self) -> bool {
        self.phase == ActionPhase::Canceled
    }
}

/// A handler invocation produced when a subscribed action fires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dispatch {
    pub owner: EntityId,
    pub handler: HandlerKind,
    pub event: ActionEvent,
}

/// The input/context collaborator the controller is given at construction.
pub trait InputSource {
    /// Names of all contexts, in index order. `None` until the source is ready.
    fn context_names(&self) -> Option<Vec<String>>;

    fn current_context(&self) -> Option<String>;

    /// Make `name` the current context. Returns false if no such context.
    fn switch_context(&mut self, name: &str) -> bool;

    fn control_scheme(&self) -> Option<String>;

    /// Ray from the camera through the pointer, when a pointer exists.
    fn pointer_ray(&self) -> Option<Ray>;

    /// Attach `binding.handler` for `owner`. Returns false if the action does
    /// not exist in that context.
    fn subscribe(&mut self, owner: EntityId, binding: &LinkedBinding) -> bool;

    /// Detach one matching subscription. Returns false if none was attached.
    fn unsubscribe(&mut self, owner: EntityId, binding: &LinkedBinding) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Subscriber {
    owner: EntityId,
    handler: HandlerKind,
}

#[derive(Debug, Clone)]
struct ActionSlot {
    name: String,
    performed: Vec<Subscriber>,
    canceled: Vec<Subscriber>,
}

impl ActionSlot {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            performed: Vec::new(),
            canceled: Vec::new(),
        }
    }

    fn list(&self, phase: ActionPhase) -> &Vec<Subscriber> {
        match phase {
            ActionPhase::Performed => &self.performed,
            ActionPhase::Canceled => &self.canceled,
        }
    }

    fn list_mut(&mut self, phase: ActionPhase) -> &mut Vec<Subscriber> {
        match phase {
            ActionPhase::Performed => &mut self.performed,
            ActionPhase::Canceled => &mut self.canceled,
        }
    }
}

#[derive(Debug, Clone)]
struct ActionMap {
    name: String,
    actions: Vec<ActionSlot>,
}

impl ActionMap {
    fn find(&self, action: &str) -> Option<&ActionSlot> {
        self.actions.iter().find(|a| a.name == action)
    }

    fn find_mut(&mut self, action: &str) -> Option<&mut ActionSlot> {
        self.actions.iter_mut().find(|a| a.name == action)
    }
}

/// Concrete named-context action table.
#[derive(Debug, Clone, Default)]
pub struct ActionMaps {
    maps: Vec<ActionMap>,
    current: Option<usize>,
    ready: bool,
    control_scheme: Option<String>,
    pointer_ray: Option<Ray>,
}

impl ActionMaps {
    /// An empty, ready action table.
    pub fn new() -> Self {
        Self {
            ready: true,
            ..Default::default()
        }
    }

    /// The two-context layout used by the first-person controller.
    ///
    /// - `Player`: Move, Jump, EnableLook, Look, Grab
    /// - `Manipulate`: Move, EnableLook, Look, Grab, MoveMode, ObjectMove,
    ///   RotateMode, ObjectRotate
    pub fn first_person() -> Self {
        let mut maps = Self::new();
        maps.add_map("Player", &["Move", "Jump", "EnableLook", "Look", "Grab"]);
        maps.add_map(
            "Manipulate",
            &[
                "Move",
                "EnableLook",
                "Look",
                "Grab",
                "MoveMode",
                "ObjectMove",
                "RotateMode",
                "ObjectRotate",
            ],
        );
        maps
    }

    /// Append a context. The first context added becomes current.
    pub fn add_map(&mut self, name: &str, actions: &[&str]) -> usize {
        self.maps.push(ActionMap {
            name: name.to_string(),
            actions: actions.iter().map(|a| ActionSlot::new(a)).collect(),
        });
        let index = self.maps.len() - 1;
        if self.current.is_none() {
            self.current = Some(index);
        }
        index
    }

    /// Mark the context list as loaded or not (simulates late initialization).
    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    pub fn set_control_scheme(&mut self, scheme: Option<&str>) {
        self.control_scheme = scheme.map(str::to_string);
    }

    pub fn set_pointer_ray(&mut self, ray: Option<Ray>) {
        self.pointer_ray = ray;
    }

    /// Number of attached subscribers for one action edge.
    pub fn subscriber_count(&self, context: usize, action: &str, phase: ActionPhase) -> usize {
        self.maps
            .get(context)
            .and_then(|m| m.find(action))
            .map_or(0, |a| a.list(phase).len())
    }

    /// Total attached subscribers across every context, action and edge.
    pub fn total_subscribers(&self) -> usize {
        self.maps
            .iter()
            .flat_map(|m| m.actions.iter())
            .map(|a| a.performed.len() + a.canceled.len())
            .sum()
    }

    /// Fire `action` in the current context, returning one dispatch per
    /// subscriber of that edge.
    pub fn fire(&self, action: &str, event: ActionEvent) -> Vec<Dispatch> {
        let Some(map) = self.current.and_then(|i| self.maps.get(i)) else {
            return Vec::new();
        };
        let Some(slot) = map.find(action) else {
            return Vec::new();
        };
        slot.list(event.phase)
            .iter()
            .map(|s| Dispatch {
                owner: s.owner,
                handler: s.handler,
                event,
            })
            .collect()
    }
}

impl InputSource for ActionMaps {
    fn context_names(&self) -> Option<Vec<String>> {
        if !self.ready {
            return None;
        }
        Some(self.maps.iter().map(|m| m.name.clone()).collect())
    }

    fn current_context(&self) -> Option<String> {
        if !self.ready {
            return None;
        }
        self.current
            .and_then(|i| self.maps.get(i))
            .map(|m| m.name.clone())
    }

    fn switch_context(&mut self, name: &str) -> bool {
        match self.maps.iter().position(|m| m.name == name) {
            Some(index) => {
                self.current = Some(index);
                true
            }
            None => false,
        }
    }

    fn control_scheme(&self) -> Option<String> {
        self.control_scheme.clone()
    }

    fn pointer_ray(&self) -> Option<Ray> {
        self.pointer_ray
    }

    fn subscribe(&mut self, owner: EntityId, binding: &LinkedBinding) -> bool {
        let Some(slot) = self
            .maps
            .get_mut(binding.context)
            .and_then(|m| m.find_mut(&binding.action))
        else {
            return false;
        };
        slot.list_mut(binding.phase).push(Subscriber {
            owner,
            handler: binding.handler,
        });
        true
    }

    fn unsubscribe(&mut self, owner: EntityId, binding: &LinkedBinding) -> bool {
        let Some(slot) = self
            .maps
            .get_mut(binding.context)
            .and_then(|m| m.find_mut(&binding.action))
        else {
            return false;
        };
        let list = slot.list_mut(binding.phase);
        let wanted = Subscriber {
            owner,
            handler: binding.handler,
        };
        match list.iter().position(|s| *s == wanted) {
            Some(index) => {
                list.remove(index);
                true
            }
            None => false,
        }
    }
}
