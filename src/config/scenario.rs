//! Throttle configuration and transmission scenarios.
//!
//! A scenario is a JSON document naming the region, the modulation
//! parameters and a list of attempted transmissions. Replaying it runs every
//! attempt through a fresh [`Throttle`] in order.
//!
//! # Example
//!
//! ```
//! use lora_throttle::config::Scenario;
//!
//! let scenario = Scenario::from_json(r#"{
//!     "region": "US915",
//!     "attempts": [
//!         { "at": 0, "frequency": 902300000, "duration_ms": 300 },
//!         { "at": 1000, "frequency": 902300000, "duration_ms": 200 }
//!     ]
//! }"#).unwrap();
//!
//! let outcomes = scenario.replay();
//! assert!(outcomes[0].allowed);
//! assert!(!outcomes[1].allowed);
//! ```

use crate::lora::{LoRaParams, ParamsError, Region, Throttle};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Region and modulation settings for one device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Regulatory region.
    pub region: Region,
    /// Modulation used to derive airtime when an attempt has no explicit
    /// duration.
    pub params: LoRaParams,
}

impl ThrottleConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.params.validate().map_err(ConfigError::InvalidParams)
    }

    /// Create an empty throttle for this configuration.
    pub fn throttle(&self) -> Throttle {
        Throttle::new(self.region)
    }
}

/// A transmission the device wants to make.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    /// Monotonic timestamp in milliseconds.
    pub at: i64,
    /// Channel identifier.
    pub frequency: u32,
    /// Payload size in bytes, used when `duration_ms` is absent.
    #[serde(default)]
    pub payload_len: usize,
    /// Explicit airtime in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
}

impl Attempt {
    /// Airtime of this attempt under `params`.
    pub fn airtime(&self, params: &LoRaParams) -> f64 {
        self.duration_ms
            .unwrap_or_else(|| params.time_on_air_ms(self.payload_len))
    }
}

/// Result of replaying one attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    /// The attempt that was evaluated.
    pub attempt: Attempt,
    /// Airtime used for the decision.
    pub duration_ms: f64,
    /// Whether the throttle allowed (and recorded) the transmission.
    pub allowed: bool,
}

/// A configuration plus an ordered list of attempts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(flatten)]
    pub config: ThrottleConfig,
    #[serde(default)]
    pub attempts: Vec<Attempt>,
}

impl Scenario {
    /// Parse and validate a scenario from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let scenario: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        scenario.config.validate()?;
        Ok(scenario)
    }

    /// Load and validate a scenario from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        let scenario = Self::from_json(&json)?;
        info!(
            "Loaded {} attempt(s) for {} from {:?}",
            scenario.attempts.len(),
            scenario.config.region,
            path
        );
        Ok(scenario)
    }

    /// Run every attempt through a fresh throttle, recording allowed ones.
    pub fn replay(&self) -> Vec<Outcome> {
        let mut throttle = self.config.throttle();
        self.attempts
            .iter()
            .map(|attempt| {
                let duration_ms = attempt.airtime(&self.config.params);
                let allowed = throttle.can_send(attempt.at, attempt.frequency, duration_ms);
                if allowed {
                    throttle.track_sent(attempt.at, attempt.frequency, duration_ms);
                }
                debug!(
                    "t={} f={} {:.3}ms -> {}",
                    attempt.at,
                    attempt.frequency,
                    duration_ms,
                    if allowed { "allowed" } else { "throttled" }
                );
                Outcome {
                    attempt: *attempt,
                    duration_ms,
                    allowed,
                }
            })
            .collect()
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Reading the file failed.
    Io(String),
    /// The JSON was malformed or had the wrong shape.
    Parse(String),
    /// Modulation parameters failed validation.
    InvalidParams(ParamsError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "failed to read config: {}", msg),
            Self::Parse(msg) => write!(f, "invalid config: {}", msg),
            Self::InvalidParams(e) => write!(f, "invalid LoRa parameters: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidParams(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::atomic::{AtomicU32, Ordering};

    static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

    fn unique_scenario_path() -> std::path::PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let pid = std::process::id();
        env::temp_dir().join(format!("lora-throttle-test-{}-{}.json", pid, id))
    }

    #[test]
    fn test_defaults_when_fields_missing() {
        let scenario = Scenario::from_json("{}").unwrap();
        assert_eq!(scenario.config, ThrottleConfig::default());
        assert!(scenario.attempts.is_empty());
        assert!(scenario.replay().is_empty());
    }

    #[test]
    fn test_parse_full_scenario() {
        let scenario = Scenario::from_json(
            r#"{
                "region": "EU868",
                "params": { "spreading_factor": 9, "bandwidth_hz": 250000 },
                "attempts": [
                    { "at": 0, "frequency": 868100000, "payload_len": 20 }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(scenario.config.region, Region::Eu868);
        assert_eq!(scenario.config.params.spreading_factor, 9);
        assert_eq!(scenario.config.params.bandwidth_hz, 250_000);
        assert_eq!(scenario.config.params.coding_rate, 5);
        assert_eq!(scenario.attempts[0].payload_len, 20);
        assert_eq!(scenario.attempts[0].duration_ms, None);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let result = Scenario::from_json(r#"{ "params": { "bandwidth_hz": 0 } }"#);
        assert_eq!(
            result,
            Err(ConfigError::InvalidParams(ParamsError::ZeroBandwidth))
        );
    }

    #[test]
    fn test_region_case_insensitive() {
        let scenario = Scenario::from_json(r#"{ "region": "Us915" }"#).unwrap();
        assert_eq!(scenario.config.region, Region::Us915);
        assert_eq!(scenario.config.region, "Us915".parse::<Region>().unwrap());
    }

    #[test]
    fn test_unknown_region_rejected() {
        let result = Scenario::from_json(r#"{ "region": "AS923" }"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_replay_uses_params_for_airtime() {
        let scenario = Scenario::from_json(
            r#"{
                "region": "US915",
                "attempts": [
                    { "at": 0, "frequency": 1, "payload_len": 10 },
                    { "at": 0, "frequency": 1, "duration_ms": 500 }
                ]
            }"#,
        )
        .unwrap();

        let outcomes = scenario.replay();
        assert!((outcomes[0].duration_ms - 41.216).abs() < 1e-9);
        assert!(outcomes[0].allowed);
        assert_eq!(outcomes[1].duration_ms, 500.0);
        assert!(!outcomes[1].allowed);
    }

    #[test]
    fn test_replay_only_records_allowed() {
        let scenario = Scenario::from_json(
            r#"{
                "region": "US915",
                "attempts": [
                    { "at": 0, "frequency": 1, "duration_ms": 400 },
                    { "at": 100, "frequency": 1, "duration_ms": 400 },
                    { "at": 100, "frequency": 2, "duration_ms": 400 }
                ]
            }"#,
        )
        .unwrap();

        let allowed: Vec<bool> = scenario.replay().iter().map(|o| o.allowed).collect();
        assert_eq!(allowed, vec![true, false, true]);
    }

    #[test]
    fn test_load_from_file() {
        let path = unique_scenario_path();
        fs::write(&path, r#"{ "region": "US915", "attempts": [] }"#).unwrap();

        let scenario = Scenario::load(&path).unwrap();
        assert_eq!(scenario.config.region, Region::Us915);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_file() {
        let path = unique_scenario_path();
        assert!(matches!(Scenario::load(&path), Err(ConfigError::Io(_))));
    }
}
