use serde::{Deserialize, Serialize};

use crate::error::StabilizerError;

/// Per-session stabilizer configuration. Fixed once a `Stabilizer` is built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StabilizerCfg {
    /// Max observations retained in the sliding window.
    pub window_capacity: usize,
    /// Minimum smoothed confidence (percent) for a confident verdict.
    pub confidence_threshold: f32,
    /// Smoothed confidence (percent) below which the tick is `Unrecognized`.
    pub unrecognized_threshold: f32,
    /// Same-label samples required in the window before any verdict is trusted.
    pub confirm_majority: usize,
    /// Label treated as "no gesture present" (case-insensitive).
    pub no_gesture_label: Option<String>,
    /// Keep the last confirmed label across `reset()`.
    pub retain_stable_label_on_reset: bool,
}

impl Default for StabilizerCfg {
    fn default() -> Self {
        Self {
            window_capacity: 15,
            confidence_threshold: 60.0,
            unrecognized_threshold: 15.0,
            confirm_majority: 10,
            no_gesture_label: None,
            retain_stable_label_on_reset: false,
        }
    }
}

impl StabilizerCfg {
    /// Parse a JSON config document. Missing fields take their defaults.
    pub fn from_json_str(s: &str) -> Result<Self, StabilizerError> {
        let cfg: StabilizerCfg =
            serde_json::from_str(s).map_err(|e| StabilizerError::InvalidConfig(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn with_no_gesture_label(mut self, label: impl Into<String>) -> Self {
        self.no_gesture_label = Some(label.into());
        self
    }

    pub fn validate(&self) -> Result<(), StabilizerError> {
        let invalid = |msg: String| -> Result<(), StabilizerError> { Err(StabilizerError::InvalidConfig(msg)) };

        if self.window_capacity == 0 {
            return invalid("window_capacity must be at least 1".into());
        }
        if self.confirm_majority == 0 || self.confirm_majority > self.window_capacity {
            return invalid(format!(
                "confirm_majority must be in 1..={} (got {})",
                self.window_capacity, self.confirm_majority
            ));
        }
        for (name, v) in [
            ("confidence_threshold", self.confidence_threshold),
            ("unrecognized_threshold", self.unrecognized_threshold),
        ] {
            if !v.is_finite() || !(0.0..=100.0).contains(&v) {
                return invalid(format!("{name} must be a percentage in [0, 100] (got {v})"));
            }
        }
        if self.unrecognized_threshold > self.confidence_threshold {
            return invalid(format!(
                "unrecognized_threshold ({}) exceeds confidence_threshold ({})",
                self.unrecognized_threshold, self.confidence_threshold
            ));
        }
        Ok(())
    }
}
