//! Runtime settings for the driver and geometry tolerance.
//!
//! Settings are plain JSON. Missing fields fall back to the defaults in
//! [`crate::constants`]:
//!
//! ```json
//! { "epsilon": 0.0005, "max_steps": 256 }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DEFAULT_EPSILON, DEFAULT_MAX_STEPS};
use crate::numeric::Tolerance;

/// Reasons settings cannot be used.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The text was not valid settings JSON.
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    /// The tolerance was zero, negative or not finite.
    #[error("epsilon must be positive and finite, got {0}")]
    InvalidEpsilon(f64),
    /// The step limit was zero.
    #[error("max_steps must be at least 1")]
    ZeroSteps,
}

/// Tunables shared by geometry comparisons and the driver.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhysicsSettings {
    /// Absolute tolerance for point and displacement comparisons.
    pub epsilon: f64,
    /// Upper bound on driver iterations per resolution.
    pub max_steps: usize,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

impl PhysicsSettings {
    /// Parse and validate settings from JSON text.
    ///
    /// # Errors
    /// Returns [`SettingsError`] when the JSON is malformed or a value is out
    /// of range.
    ///
    /// # Examples
    /// ```
    /// use pointplane::config::PhysicsSettings;
    /// let settings = PhysicsSettings::from_json_str(r#"{ "max_steps": 16 }"#)?;
    /// assert_eq!(settings.max_steps, 16);
    /// assert_eq!(settings.epsilon, 0.0005);
    /// # Ok::<(), pointplane::config::SettingsError>(())
    /// ```
    pub fn from_json_str(text: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(text)?;
        settings.validate()
    }

    /// Check that every value is in range.
    ///
    /// # Errors
    /// Returns [`SettingsError::InvalidEpsilon`] or
    /// [`SettingsError::ZeroSteps`].
    pub fn validate(self) -> Result<Self, SettingsError> {
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(SettingsError::InvalidEpsilon(self.epsilon));
        }
        if self.max_steps == 0 {
            return Err(SettingsError::ZeroSteps);
        }
        Ok(self)
    }

    /// The configured tolerance.
    #[must_use]
    pub fn tolerance(&self) -> Tolerance {
        Tolerance::new(self.epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn empty_object_uses_defaults() {
        let settings = PhysicsSettings::from_json_str("{}").expect("defaults are valid");
        assert_eq!(settings, PhysicsSettings::default());
    }

    #[rstest]
    #[case::zero_epsilon(r#"{ "epsilon": 0.0 }"#)]
    #[case::negative_epsilon(r#"{ "epsilon": -1.0 }"#)]
    #[case::zero_steps(r#"{ "max_steps": 0 }"#)]
    #[case::unknown_field(r#"{ "gravity": 9.8 }"#)]
    #[case::not_json("epsilon = 1")]
    fn bad_settings_are_rejected(#[case] text: &str) {
        assert!(PhysicsSettings::from_json_str(text).is_err());
    }

    #[test]
    fn parse_errors_keep_their_source() {
        let error = PhysicsSettings::from_json_str("[").expect_err("truncated input");
        assert!(matches!(error, SettingsError::Parse(_)));
        assert!(error.to_string().starts_with("failed to parse settings"));
    }
}
