use serde::{Deserialize, Serialize};

use crate::control::Control;

/// Key identifier -> control table.
///
/// Keys are platform identifiers in browser style (`"w"`, `"ArrowUp"`) and are
/// matched case-insensitively. A control may have several keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub forward: Vec<String>,
    pub backward: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: vec!["w".into()],
            backward: vec!["s".into()],
            left: vec!["a".into()],
            right: vec!["d".into()],
        }
    }
}

impl KeyBindings {
    /// Bind an additional key to a control.
    pub fn with_key(mut self, control: Control, key: impl Into<String>) -> Self {
        self.keys_mut(control).push(key.into());
        self
    }

    /// Default bindings plus the four arrow keys.
    pub fn with_arrow_keys(self) -> Self {
        self.with_key(Control::Forward, "ArrowUp")
            .with_key(Control::Backward, "ArrowDown")
            .with_key(Control::Left, "ArrowLeft")
            .with_key(Control::Right, "ArrowRight")
    }

    pub fn keys(&self, control: Control) -> &[String] {
        match control {
            Control::Forward => &self.forward,
            Control::Backward => &self.backward,
            Control::Left => &self.left,
            Control::Right => &self.right,
        }
    }

    fn keys_mut(&mut self, control: Control) -> &mut Vec<String> {
        match control {
            Control::Forward => &mut self.forward,
            Control::Backward => &mut self.backward,
            Control::Left => &mut self.left,
            Control::Right => &mut self.right,
        }
    }

    /// Resolve a raw key identifier. First matching control in
    /// `Control::ALL` order wins if a key is bound twice.
    pub fn resolve(&self, key: &str) -> Option<Control> {
        let key = normalize_key(key);
        Control::ALL
            .into_iter()
            .find(|c| self.keys(*c).iter().any(|k| normalize_key(k) == key))
    }

    /// First control with no usable key, if any.
    pub fn unbound_control(&self) -> Option<Control> {
        Control::ALL
            .into_iter()
            .find(|c| self.keys(*c).iter().all(|k| k.trim().is_empty()))
    }
}

/// Canonical form used for held-key tracking and binding lookup.
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}
