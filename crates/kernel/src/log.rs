use citydrive_input::ControlState;
use serde::{Deserialize, Serialize};

use crate::vehicle::{VehicleController, VehicleState};

/// Per-tick record of the control snapshots fed to the controller.
///
/// Because `step` is pure, the initial state plus this log reproduces every
/// later state bit for bit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveLog {
    initial: VehicleState,
    controls: Vec<ControlState>,
}

impl DriveLog {
    pub fn new(initial: VehicleState) -> Self {
        Self {
            initial,
            controls: Vec::new(),
        }
    }

    pub fn record(&mut self, control: ControlState) {
        self.controls.push(control);
    }

    pub fn initial(&self) -> &VehicleState {
        &self.initial
    }

    pub fn controls(&self) -> &[ControlState] {
        &self.controls
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    /// Start over from a new initial state.
    pub fn clear(&mut self, initial: VehicleState) {
        self.initial = initial;
        self.controls.clear();
    }

    /// Re-run the recorded ticks and return the final state.
    pub fn replay(&self, controller: &VehicleController) -> VehicleState {
        self.controls
            .iter()
            .fold(self.initial, |state, control| controller.step(*control, &state))
    }
}

/// Errors from parsing a drive script.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("segment {index} ({segment:?}): unknown control key")]
    UnknownKey { index: usize, segment: String },
    #[error("segment {index} ({segment:?}): invalid tick count")]
    BadCount { index: usize, segment: String },
}

/// Expand a drive script into one control snapshot per tick.
///
/// A script is comma-separated `keys*ticks` segments, where `keys` is any
/// combination of `w`, `s`, `a`, `d` (empty for coasting) and `*ticks`
/// defaults to 1. Example: `w*30,wa*40,*20`.
pub fn parse_script(script: &str) -> Result<Vec<ControlState>, ScriptError> {
    let mut controls = Vec::new();
    for (index, segment) in script.split(',').enumerate() {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let (keys, count) = match segment.split_once('*') {
            Some((keys, count)) => {
                let count = count.trim().parse::<usize>().map_err(|_| ScriptError::BadCount {
                    index,
                    segment: segment.to_string(),
                })?;
                (keys.trim(), count)
            }
            None => (segment, 1),
        };
        let control = ControlState::from_keys(keys).ok_or_else(|| ScriptError::UnknownKey {
            index,
            segment: segment.to_string(),
        })?;
        controls.extend(std::iter::repeat_n(control, count));
    }
    Ok(controls)
}
