//! Throttle configuration management.
//!
//! Compile-time defaults come from the `region-*` cargo features (see
//! [`Region::default`](crate::lora::Region)). Runtime configuration is loaded
//! from JSON scenario files.
//!
//! # Components
//!
//! - [`scenario`] - Region/modulation settings and replayable transmission
//!   scenarios

mod scenario;

pub use scenario::{Attempt, ConfigError, Outcome, Scenario, ThrottleConfig};
