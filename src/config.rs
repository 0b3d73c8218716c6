//! # Processor Configuration
//!
//! Tunables of the processing stages, loadable from a YAML document with
//! kebab-case keys. Every key is optional.
//!
//! ```yaml
//! up-limit: 21        # stem/curve direction threshold
//! max-steps: 16       # subdivision steps walked per measure
//! reverse-voices: false
//! close-final-repeat: false  # end marker closes a right repeat on the last measure
//! ```

use serde::Deserialize;

use crate::error::ScoreError;
use crate::model::UP_LIMIT;

/// Default number of subdivision steps per measure
pub const MAX_STEPS: usize = 16;

/// Raw configuration for YAML deserialization
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawConfig {
    pub up_limit: Option<i32>,
    pub max_steps: Option<usize>,
    pub reverse_voices: Option<bool>,
    pub close_final_repeat: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorConfig {
    /// Heights below this limit get an upward stem
    pub up_limit: i32,
    /// Number of steps the voice synchronizer walks per measure
    pub max_steps: usize,
    /// Emit voices last-declared first
    pub reverse_voices: bool,
    /// Carry a right repeat on the last measure onto the end marker
    pub close_final_repeat: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            up_limit: UP_LIMIT,
            max_steps: MAX_STEPS,
            reverse_voices: false,
            close_final_repeat: false,
        }
    }
}

impl ProcessorConfig {
    pub fn from_yaml(content: &str) -> Result<Self, ScoreError> {
        let raw: RawConfig =
            serde_yaml::from_str(content).map_err(|e| ScoreError::ConfigError(e.to_string()))?;
        Self::from_raw(raw)
    }

    pub fn from_raw(raw: RawConfig) -> Result<Self, ScoreError> {
        let defaults = Self::default();

        let max_steps = raw.max_steps.unwrap_or(defaults.max_steps);
        if max_steps == 0 {
            return Err(ScoreError::ConfigError(
                "max-steps must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            up_limit: raw.up_limit.unwrap_or(defaults.up_limit),
            max_steps,
            reverse_voices: raw.reverse_voices.unwrap_or(defaults.reverse_voices),
            close_final_repeat: raw
                .close_final_repeat
                .unwrap_or(defaults.close_final_repeat),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProcessorConfig::default();
        assert_eq!(config.up_limit, 21);
        assert_eq!(config.max_steps, 16);
        assert!(!config.reverse_voices);
        assert!(!config.close_final_repeat);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ProcessorConfig::from_yaml("reverse-voices: true").unwrap();
        assert!(config.reverse_voices);
        assert_eq!(config.up_limit, 21);
        assert_eq!(config.max_steps, 16);
    }

    #[test]
    fn test_full_yaml() {
        let config = ProcessorConfig::from_yaml("up-limit: 18\nmax-steps: 24\n").unwrap();
        assert_eq!(config.up_limit, 18);
        assert_eq!(config.max_steps, 24);
    }

    #[test]
    fn test_close_final_repeat_opt_in() {
        let config = ProcessorConfig::from_yaml("close-final-repeat: true").unwrap();
        assert!(config.close_final_repeat);
        assert!(!config.reverse_voices);
    }

    #[test]
    fn test_zero_steps_rejected() {
        let result = ProcessorConfig::from_yaml("max-steps: 0");
        match result {
            Err(ScoreError::ConfigError(message)) => assert!(message.contains("max-steps")),
            other => panic!("Expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = ProcessorConfig::from_yaml("upper-limit: 3");
        assert!(matches!(result, Err(ScoreError::ConfigError(_))));
    }
}
