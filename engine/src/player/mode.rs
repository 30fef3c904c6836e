//! Controller Mode
//!
//! State machine deciding whether the player walks or manipulates a held
//! object. Two independent hold-style triggers drive it: "move object" and
//! "rotate object". Holding both at once is the only way into the combined
//! mode.
//!
//! | current          | move on    | move off     | rotate on        | rotate off |
//! |------------------|------------|--------------|------------------|------------|
//! | Move             | MoveObject*| -            | RotateObject     | -          |
//! | MoveObject       | -          | Move         | MoveRotateObject | -          |
//! | RotateObject     | MoveRotate | -            | -                | Move       |
//! | MoveRotateObject | -          | RotateObject | -                | MoveObject |
//!
//! `*` only while an object is held.

/// Active controller mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ControllerMode {
    /// Free movement and look
    #[default]
    Move,
    MoveObject,
    RotateObject,
    MoveRotateObject,
}

impl ControllerMode {
    pub const ALL: [ControllerMode; 4] = [
        ControllerMode::Move,
        ControllerMode::MoveObject,
        ControllerMode::RotateObject,
        ControllerMode::MoveRotateObject,
    ];

    /// Walking and looking are only processed in `Move`.
    #[inline]
    pub fn allows_free_move(self) -> bool {
        self == ControllerMode::Move
    }

    #[inline]
    pub fn allows_object_move(self) -> bool {
        matches!(self, ControllerMode::MoveObject | ControllerMode::MoveRotateObject)
    }

    #[inline]
    pub fn allows_object_rotate(self) -> bool {
        matches!(self, ControllerMode::RotateObject | ControllerMode::MoveRotateObject)
    }
}

/// One edge of a mode trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeTrigger {
    MoveObject(bool),
    RotateObject(bool),
}

/// Pure transition function for the table above.
pub fn next_mode(current: ControllerMode, trigger: ModeTrigger, holding: bool) -> ControllerMode {
    use ControllerMode::*;
    use ModeTrigger as T;

    match (current, trigger) {
        (Move, T::MoveObject(true)) if holding => MoveObject,
        (Move, T::RotateObject(true)) => RotateObject,
        (MoveObject, T::MoveObject(false)) => Move,
        (MoveObject, T::RotateObject(true)) => MoveRotateObject,
        (RotateObject, T::MoveObject(true)) => MoveRotateObject,
        (RotateObject, T::RotateObject(false)) => Move,
        (MoveRotateObject, T::MoveObject(false)) => RotateObject,
        (MoveRotateObject, T::RotateObject(false)) => MoveObject,
        (mode, _) => mode,
    }
}

/// Mode state plus the last seen level of each trigger (for display).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeMachine {
    mode: ControllerMode,
    move_held: bool,
    rotate_held: bool,
}

impl ModeMachine {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn mode(&self) -> ControllerMode {
        self.mode
    }

    /// (move-object held, rotate-object held)
    #[inline]
    pub fn triggers(&self) -> (bool, bool) {
        (self.move_held, self.rotate_held)
    }

    /// Feed one trigger edge. Returns `Some((from, to))` when the mode changed.
    pub fn apply(&mut self, trigger: ModeTrigger, holding: bool) -> Option<(ControllerMode, ControllerMode)> {
        match trigger {
            ModeTrigger::MoveObject(on) => self.move_held = on,
            ModeTrigger::RotateObject(on) => self.rotate_held = on,
        }
        let from = self.mode;
        self.mode = next_mode(from, trigger, holding);
        (from != self.mode).then_some((from, self.mode))
    }

    /// Drop back to `Move` no matter which triggers are still held.
    pub fn force_move(&mut self) {
        self.mode = ControllerMode::Move;
    }
}
