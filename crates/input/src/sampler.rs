use std::collections::BTreeSet;

use crate::bindings::{KeyBindings, normalize_key};
use crate::control::ControlState;

/// Tracks held keys and produces per-tick `ControlState` snapshots.
///
/// Owned by the session that created it. Dropping the sampler releases every
/// held key, so no key state outlives its session.
#[derive(Debug)]
pub struct InputSampler {
    bindings: KeyBindings,
    /// Normalized identifiers of held keys that map to a control.
    held: BTreeSet<String>,
}

impl InputSampler {
    pub fn new(bindings: KeyBindings) -> Self {
        tracing::debug!("input sampler attached");
        Self {
            bindings,
            held: BTreeSet::new(),
        }
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    /// Record a key press. Returns `false` for keys with no binding.
    pub fn on_key_down(&mut self, key: &str) -> bool {
        if self.bindings.resolve(key).is_none() {
            tracing::trace!(key, "ignoring unbound key");
            return false;
        }
        self.held.insert(normalize_key(key));
        true
    }

    /// Record a key release. Releasing a key that was never pressed is a no-op.
    pub fn on_key_up(&mut self, key: &str) -> bool {
        self.held.remove(&normalize_key(key))
    }

    /// Release everything, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        if !self.held.is_empty() {
            tracing::debug!(count = self.held.len(), "releasing held keys");
        }
        self.held.clear();
    }

    /// Snapshot of the currently held controls.
    pub fn sample(&self) -> ControlState {
        let mut state = ControlState::IDLE;
        for key in &self.held {
            if let Some(control) = self.bindings.resolve(key) {
                state.set(control, true);
            }
        }
        state
    }

    pub fn held_key_count(&self) -> usize {
        self.held.len()
    }
}

impl Default for InputSampler {
    fn default() -> Self {
        Self::new(KeyBindings::default())
    }
}

impl Drop for InputSampler {
    fn drop(&mut self) {
        self.release_all();
        tracing::debug!("input sampler detached");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::Control;

    #[test]
    fn press_and_release() {
        let mut s = InputSampler::default();
        assert!(s.on_key_down("w"));
        assert!(s.sample().forward);
        assert!(s.on_key_up("w"));
        assert!(s.sample().is_idle());
    }

    #[test]
    fn case_insensitive_across_down_and_up() {
        let mut s = InputSampler::default();
        // Shift held on press, released before the key.
        s.on_key_down("W");
        assert!(s.sample().forward);
        s.on_key_up("w");
        assert!(!s.sample().forward);
    }

    #[test]
    fn unrecognized_keys_ignored() {
        let mut s = InputSampler::default();
        assert!(!s.on_key_down("x"));
        assert_eq!(s.held_key_count(), 0);
        assert!(s.sample().is_idle());
        assert!(!s.on_key_up("x"));
    }

    #[test]
    fn repeated_key_down_is_idempotent() {
        let mut s = InputSampler::default();
        s.on_key_down("a");
        s.on_key_down("a");
        assert_eq!(s.held_key_count(), 1);
        s.on_key_up("a");
        assert!(s.sample().is_idle());
    }

    #[test]
    fn control_held_while_any_bound_key_held() {
        let mut s = InputSampler::new(KeyBindings::default().with_arrow_keys());
        s.on_key_down("w");
        s.on_key_down("ArrowUp");
        s.on_key_up("w");
        assert!(s.sample().is_held(Control::Forward));
        s.on_key_up("ArrowUp");
        assert!(!s.sample().is_held(Control::Forward));
    }

    #[test]
    fn snapshot_is_frozen() {
        let mut s = InputSampler::default();
        s.on_key_down("d");
        let snap = s.sample();
        s.on_key_up("d");
        assert!(snap.right);
        assert!(!s.sample().right);
    }

    #[test]
    fn opposing_controls_both_reported() {
        let mut s = InputSampler::default();
        s.on_key_down("w");
        s.on_key_down("s");
        let snap = s.sample();
        assert!(snap.forward && snap.backward);
    }

    #[test]
    fn release_all_clears() {
        let mut s = InputSampler::default();
        s.on_key_down("w");
        s.on_key_down("a");
        s.release_all();
        assert!(s.sample().is_idle());
        assert_eq!(s.held_key_count(), 0);
    }
}
