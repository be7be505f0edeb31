//! Buzzer button state machines.
//!
//! [`ButtonMachine`] owns the participant's [`ButtonState`]; [`LockToggle`]
//! owns the host's lock switch. Both follow the same rule: a local action may
//! predict the next state, the next server snapshot always wins.

use crate::protocol::ButtonState;

/// How a button state is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presentation {
    /// Button caption.
    pub label: &'static str,
    /// Border color.
    pub border: &'static str,
    /// Fill color.
    pub background: &'static str,
}

const OPEN: Presentation = Presentation {
    label: "BUZZ",
    border: "green",
    background: "lightgreen",
};
const BUZZED: Presentation = Presentation {
    label: "BUZZED",
    border: "red",
    background: "lightcoral",
};
const LOCKED: Presentation = Presentation {
    label: "LOCKED",
    border: "yellow",
    background: "lightyellow",
};
const DISCONNECTED: Presentation = Presentation {
    label: "LOST CONN",
    border: "yellow",
    background: "lightyellow",
};
const UNLOCKED: Presentation = Presentation {
    label: "UNLOCKED",
    border: "green",
    background: "lightgreen",
};

/// Presentation of a participant button state.
pub const fn presentation(state: ButtonState) -> Presentation {
    match state {
        ButtonState::Open => OPEN,
        ButtonState::Buzzed => BUZZED,
        ButtonState::Locked => LOCKED,
        ButtonState::Disconnected => DISCONNECTED,
    }
}

/// Presentation of the host's lock switch.
pub const fn lock_presentation(locked: bool) -> Presentation {
    if locked {
        LOCKED
    } else {
        UNLOCKED
    }
}

/// The participant's buzzer.
///
/// `Disconnected` is terminal: once entered, no server directive moves the
/// machine out of it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ButtonMachine {
    state: ButtonState,
}

impl ButtonMachine {
    /// A fresh machine in [`ButtonState::Open`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> ButtonState {
        self.state
    }

    /// Current presentation.
    pub fn presentation(&self) -> Presentation {
        presentation(self.state)
    }

    /// Local buzz. Accepted only from `Open`, in which case the state moves
    /// optimistically to `Buzzed` and the caller must send `BUZZ`.
    ///
    /// Returns `false` (and changes nothing) in every other state.
    pub fn try_buzz(&mut self) -> bool {
        if self.state != ButtonState::Open {
            return false;
        }
        self.state = ButtonState::Buzzed;
        true
    }

    /// Overwrite with a state the server declared. Ignored once disconnected.
    pub fn apply_server(&mut self, state: ButtonState) {
        if self.state != ButtonState::Disconnected {
            self.state = state;
        }
    }

    /// Transport closed abnormally.
    pub fn disconnect(&mut self) {
        self.state = ButtonState::Disconnected;
    }

    /// Whether the terminal state has been reached.
    pub fn is_disconnected(&self) -> bool {
        self.state == ButtonState::Disconnected
    }
}

/// The host's lock switch: optimistic flip, reconciled by the next `UPDATE`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockToggle {
    locked: bool,
}

impl LockToggle {
    /// An unlocked switch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the switch currently shows locked.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Flip locally. The caller sends `TOGGLE_LOCK`.
    pub fn toggle(&mut self) {
        self.locked = !self.locked;
    }

    /// Reconcile with the server: only `LOCKED` means locked.
    pub fn apply_server(&mut self, state: ButtonState) {
        self.locked = state == ButtonState::Locked;
    }

    /// Current presentation.
    pub fn presentation(&self) -> Presentation {
        lock_presentation(self.locked)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;

    #[test]
    fn presentation_table() {
        assert_eq!(presentation(ButtonState::Open).label, "BUZZ");
        assert_eq!(presentation(ButtonState::Open).border, "green");
        assert_eq!(presentation(ButtonState::Buzzed).background, "lightcoral");
        assert_eq!(presentation(ButtonState::Locked).label, "LOCKED");
        assert_eq!(presentation(ButtonState::Disconnected).label, "LOST CONN");
        assert_eq!(lock_presentation(true).label, "LOCKED");
        assert_eq!(lock_presentation(false).label, "UNLOCKED");
    }

    #[test]
    fn buzz_only_from_open() {
        let mut machine = ButtonMachine::new();
        assert!(machine.try_buzz());
        assert_eq!(machine.state(), ButtonState::Buzzed);
        assert!(!machine.try_buzz());
        assert_eq!(machine.state(), ButtonState::Buzzed);
    }

    #[test]
    fn buzz_rejected_while_locked() {
        let mut machine = ButtonMachine::new();
        machine.apply_server(ButtonState::Locked);
        assert!(!machine.try_buzz());
        assert_eq!(machine.state(), ButtonState::Locked);
    }

    #[test]
    fn server_overwrites_optimistic_buzz() {
        let mut machine = ButtonMachine::new();
        assert!(machine.try_buzz());
        machine.apply_server(ButtonState::Open);
        assert_eq!(machine.state(), ButtonState::Open);
    }

    #[test]
    fn disconnected_is_terminal() {
        let mut machine = ButtonMachine::new();
        machine.disconnect();
        machine.apply_server(ButtonState::Open);
        assert!(machine.is_disconnected());
        assert!(!machine.try_buzz());
        assert_eq!(machine.presentation().label, "LOST CONN");
    }

    #[test]
    fn lock_toggle_flips_then_reconciles() {
        let mut lock = LockToggle::new();
        lock.toggle();
        assert!(lock.is_locked());
        lock.apply_server(ButtonState::Open);
        assert!(!lock.is_locked());
        lock.apply_server(ButtonState::Locked);
        assert!(lock.is_locked());
    }
}
