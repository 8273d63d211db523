use std::path::Path;

use citydrive_input::{Control, KeyBindings};
use serde::{Deserialize, Serialize};

use crate::camera::CameraRig;

/// Errors from configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be finite and greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("no key bound to {0:?}")]
    UnboundControl(Control),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tuning constants for the vehicle model. Units are world units and ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    pub max_speed: f64,
    pub acceleration: f64,
    pub deceleration: f64,
    /// Reverse top speed is `max_speed * reverse_speed_factor`.
    pub reverse_speed_factor: f64,
    pub steering_rate: f64,
    /// Steering rate while turning against the current steering sign.
    pub steering_rate_boosted: f64,
    pub steering_return_rate: f64,
    pub steering_to_heading_gain: f64,
    /// Below this absolute speed steering does not turn the vehicle.
    pub steering_speed_threshold: f64,
    pub tick_interval_ms: u64,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            max_speed: 0.2,
            acceleration: 0.01,
            deceleration: 0.005,
            reverse_speed_factor: 1.0 / 1.5,
            steering_rate: 0.03,
            steering_rate_boosted: 0.06,
            steering_return_rate: 0.02,
            steering_to_heading_gain: 0.025,
            steering_speed_threshold: 0.01,
            tick_interval_ms: 16,
        }
    }
}

impl VehicleConfig {
    /// Most negative speed the vehicle can reach.
    pub fn min_speed(&self) -> f64 {
        -self.max_speed * self.reverse_speed_factor
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("max_speed", self.max_speed)?;
        positive("acceleration", self.acceleration)?;
        positive("deceleration", self.deceleration)?;
        positive("reverse_speed_factor", self.reverse_speed_factor)?;
        in_range("steering_rate", self.steering_rate, f64::MIN_POSITIVE, 1.0)?;
        in_range(
            "steering_rate_boosted",
            self.steering_rate_boosted,
            f64::MIN_POSITIVE,
            1.0,
        )?;
        in_range(
            "steering_return_rate",
            self.steering_return_rate,
            f64::MIN_POSITIVE,
            1.0,
        )?;
        positive("steering_to_heading_gain", self.steering_to_heading_gain)?;
        in_range(
            "steering_speed_threshold",
            self.steering_speed_threshold,
            0.0,
            self.max_speed,
        )?;
        positive("tick_interval_ms", self.tick_interval_ms as f64)?;
        Ok(())
    }
}

/// Complete configuration for a driving session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    pub vehicle: VehicleConfig,
    pub camera: CameraRig,
    pub bindings: KeyBindings,
    /// Upper bound on ticks simulated for a single rendered frame.
    pub max_catch_up_ticks: u32,
    /// Keep every tick's controls in the session's `DriveLog` for replay.
    /// Off for interactive sessions.
    pub record_log: bool,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            vehicle: VehicleConfig::default(),
            camera: CameraRig::default(),
            bindings: KeyBindings::default(),
            max_catch_up_ticks: 8,
            record_log: true,
        }
    }
}

impl DriveConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded drive config");
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.vehicle.validate()?;
        self.camera.validate()?;
        if let Some(control) = self.bindings.unbound_control() {
            return Err(ConfigError::UnboundControl(control));
        }
        positive("max_catch_up_ticks", self.max_catch_up_ticks as f64)?;
        Ok(())
    }
}

pub(crate) fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

pub(crate) fn in_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), ConfigError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        DriveConfig::default().validate().unwrap();
    }

    #[test]
    fn negative_max_speed_rejected() {
        let config = VehicleConfig {
            max_speed: -0.2,
            ..VehicleConfig::default()
        };
        match config.validate() {
            Err(ConfigError::NotPositive { field, .. }) => assert_eq!(field, "max_speed"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn nan_rejected() {
        let config = VehicleConfig {
            deceleration: f64::NAN,
            ..VehicleConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive {
                field: "deceleration",
                ..
            })
        ));
    }

    #[test]
    fn steering_rate_above_one_rejected() {
        let config = VehicleConfig {
            steering_rate_boosted: 1.5,
            ..VehicleConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange {
                field: "steering_rate_boosted",
                ..
            })
        ));
    }

    #[test]
    fn threshold_above_max_speed_rejected() {
        let config = VehicleConfig {
            steering_speed_threshold: 0.5,
            ..VehicleConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_tick_interval_rejected() {
        let config = VehicleConfig {
            tick_interval_ms: 0,
            ..VehicleConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive {
                field: "tick_interval_ms",
                ..
            })
        ));
    }

    #[test]
    fn min_speed_uses_reverse_factor() {
        let config = VehicleConfig::default();
        assert!((config.min_speed() + 0.2 / 1.5).abs() < 1e-12);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config =
            DriveConfig::from_json_str(r#"{"vehicle": {"max_speed": 0.5}}"#).unwrap();
        assert_eq!(config.vehicle.max_speed, 0.5);
        assert_eq!(config.vehicle.acceleration, 0.01);
        assert_eq!(config.camera, CameraRig::default());
        assert_eq!(config.max_catch_up_ticks, 8);
        assert!(config.record_log);
    }

    #[test]
    fn invalid_json_values_rejected() {
        let err = DriveConfig::from_json_str(r#"{"camera": {"smoothing": 0.0}}"#).unwrap_err();
        assert!(err.to_string().contains("smoothing"));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = DriveConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn empty_binding_rejected() {
        let err =
            DriveConfig::from_json_str(r#"{"bindings": {"right": []}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::UnboundControl(Control::Right)));
    }

    #[test]
    fn json_roundtrip_preserves_config() {
        let config = DriveConfig::default();
        let json = config.to_json_pretty().unwrap();
        assert_eq!(DriveConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = DriveConfig::load("/nonexistent/citydrive.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
