//! LoRa region configuration.
//!
//! This module provides the regulatory constants for each supported band and
//! the per-region rules the throttle evaluates. EU868 limits the fraction of
//! an hour a transmitter may occupy a channel (duty cycle). US915 caps the
//! total occupancy in any 20-second window (dwell time).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Absolute cap on a single transmission, and on aggregate US915 dwell time.
pub const MAX_DWELL_TIME_MS: u64 = 400;

/// Rolling window for US915 dwell-time accounting.
pub const DWELL_TIME_WINDOW_MS: u64 = 20_000;

/// Rolling window for EU868 duty-cycle accounting (one hour).
pub const DUTY_CYCLE_WINDOW_MS: u64 = 3_600_000;

/// EU868 duty-cycle ceiling as a fraction of the window. Exclusive.
pub const DUTY_CYCLE_LIMIT: f64 = 0.01;

/// Frequency band region.
///
/// Fixed for the lifetime of a [`Throttle`](super::Throttle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Region {
    /// EU 863-870 MHz band (1% duty cycle per hour)
    Eu868,
    /// US 902-928 MHz band (400ms dwell time per 20s)
    Us915,
}

/// How a region bounds accumulated airtime inside its window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Limit {
    /// Accumulated airtime must stay strictly below `ratio` of the window.
    DutyCycle { ratio: f64 },
    /// Accumulated airtime must not exceed `max_ms`.
    DwellTime { max_ms: f64 },
}

/// Per-region compliance parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionRules {
    /// History retention and query window in milliseconds.
    pub window_ms: u64,
    /// Bound applied to the airtime accumulated inside the window.
    pub limit: Limit,
}

const EU868_RULES: RegionRules = RegionRules {
    window_ms: DUTY_CYCLE_WINDOW_MS,
    limit: Limit::DutyCycle {
        ratio: DUTY_CYCLE_LIMIT,
    },
};

const US915_RULES: RegionRules = RegionRules {
    window_ms: DWELL_TIME_WINDOW_MS,
    limit: Limit::DwellTime {
        max_ms: MAX_DWELL_TIME_MS as f64,
    },
};

impl Region {
    /// Get the compliance rules for this region.
    pub fn rules(self) -> RegionRules {
        match self {
            Self::Eu868 => EU868_RULES,
            Self::Us915 => US915_RULES,
        }
    }

    /// Get the history retention window for this region in milliseconds.
    pub fn window_ms(self) -> u64 {
        self.rules().window_ms
    }

    /// Canonical band name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Eu868 => "EU868",
            Self::Us915 => "US915",
        }
    }
}

impl RegionRules {
    /// Start of the accounting window for a query at `at_time`.
    ///
    /// Dwell-time regions shift the window forward by the proposed duration so
    /// the proposed transmission's own end lines up with the window end.
    pub fn query_cutoff(&self, at_time: i64, duration: f64) -> f64 {
        let start = at_time as f64 - self.window_ms as f64;
        match self.limit {
            Limit::DutyCycle { .. } => start,
            Limit::DwellTime { .. } => start + duration,
        }
    }

    /// Whether `accumulated` prior airtime plus `duration` stays within limit.
    pub fn permits(&self, accumulated: f64, duration: f64) -> bool {
        let total = accumulated + duration;
        match self.limit {
            Limit::DutyCycle { ratio } => total / (self.window_ms as f64) < ratio,
            Limit::DwellTime { max_ms } => total <= max_ms,
        }
    }
}

impl Default for Region {
    fn default() -> Self {
        #[cfg(feature = "region-us915")]
        return Self::Us915;
        #[cfg(not(feature = "region-us915"))]
        Self::Eu868
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown region name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRegion(pub String);

impl fmt::Display for UnknownRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown region: {} (expected EU868 or US915)", self.0)
    }
}

impl std::error::Error for UnknownRegion {}

impl FromStr for Region {
    type Err = UnknownRegion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EU868" => Ok(Self::Eu868),
            "US915" => Ok(Self::Us915),
            _ => Err(UnknownRegion(s.to_string())),
        }
    }
}

impl TryFrom<String> for Region {
    type Error = UnknownRegion;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Region> for String {
    fn from(region: Region) -> Self {
        region.name().to_string()
    }
}

/// Unit for the diagnostic constant accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
}

impl TimeUnit {
    /// Convert a millisecond quantity into this unit.
    pub fn convert_millis(self, ms: u64) -> f64 {
        let ms = ms as f64;
        match self {
            Self::Microseconds => ms * 1_000.0,
            Self::Milliseconds => ms,
            Self::Seconds => ms / 1_000.0,
            Self::Minutes => ms / 60_000.0,
        }
    }
}

/// US915 dwell-time window expressed in `unit`.
pub fn dwell_time_period(unit: TimeUnit) -> f64 {
    unit.convert_millis(DWELL_TIME_WINDOW_MS)
}

/// Per-transmission dwell-time cap expressed in `unit`.
pub fn max_dwell_time(unit: TimeUnit) -> f64 {
    unit.convert_millis(MAX_DWELL_TIME_MS)
}
