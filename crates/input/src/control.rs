use serde::{Deserialize, Serialize};

/// A logical driving control. Key bindings resolve raw keys into these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Control {
    Forward,
    Backward,
    Left,
    Right,
}

impl Control {
    pub const ALL: [Control; 4] = [
        Control::Forward,
        Control::Backward,
        Control::Left,
        Control::Right,
    ];
}

/// Snapshot of which controls are held at the start of a tick.
///
/// `Copy` so the tick reads one frozen value; key events arriving mid-tick
/// only affect the next snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

impl ControlState {
    /// No controls held.
    pub const IDLE: ControlState = ControlState {
        forward: false,
        backward: false,
        left: false,
        right: false,
    };

    pub fn is_held(&self, control: Control) -> bool {
        match control {
            Control::Forward => self.forward,
            Control::Backward => self.backward,
            Control::Left => self.left,
            Control::Right => self.right,
        }
    }

    pub fn set(&mut self, control: Control, held: bool) {
        match control {
            Control::Forward => self.forward = held,
            Control::Backward => self.backward = held,
            Control::Left => self.left = held,
            Control::Right => self.right = held,
        }
    }

    /// Builder-style variant of [`ControlState::set`] with `held = true`.
    pub fn with(mut self, control: Control) -> Self {
        self.set(control, true);
        self
    }

    pub fn is_idle(&self) -> bool {
        *self == Self::IDLE
    }

    /// Parse a compact control string: `w`, `s`, `a`, `d` in any order,
    /// case-insensitive. Any other character is rejected.
    pub fn from_keys(keys: &str) -> Option<Self> {
        let mut state = Self::IDLE;
        for c in keys.chars() {
            let control = match c.to_ascii_lowercase() {
                'w' => Control::Forward,
                's' => Control::Backward,
                'a' => Control::Left,
                'd' => Control::Right,
                _ => return None,
            };
            state.set(control, true);
        }
        Some(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_holds_nothing() {
        let s = ControlState::default();
        assert!(s.is_idle());
        for c in Control::ALL {
            assert!(!s.is_held(c));
        }
    }

    #[test]
    fn with_sets_single_control() {
        let s = ControlState::IDLE.with(Control::Left);
        assert!(s.is_held(Control::Left));
        assert!(!s.is_held(Control::Right));
        assert!(!s.is_idle());
    }

    #[test]
    fn from_keys_parses_combinations() {
        let s = ControlState::from_keys("Wa").unwrap();
        assert!(s.forward && s.left);
        assert!(!s.backward && !s.right);
        assert_eq!(ControlState::from_keys(""), Some(ControlState::IDLE));
        assert_eq!(ControlState::from_keys("wx"), None);
    }

    #[test]
    fn snapshot_roundtrips_through_json() {
        let s = ControlState::IDLE.with(Control::Forward).with(Control::Right);
        let json = serde_json::to_string(&s).unwrap();
        let back: ControlState = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);
    }
}
