//! LoRa regulatory airtime throttling.
//!
//! This module contains:
//! - [`config`]: Region rules and regulatory constants
//! - [`airtime`]: Time-on-air calculation for LoRa packets
//! - [`history`]: Transmission history and dwell-time accounting
//! - [`throttle`]: Per-device compliance checks
//! - [`shared`]: Mutex-guarded throttle for multi-threaded transmit paths

mod airtime;
mod config;
mod history;
mod shared;
mod throttle;

pub use airtime::{
    low_data_rate_optimize, time_on_air, LoRaParams, ParamsError, BANDWIDTH_HZ, CODING_RATE,
    PREAMBLE_LENGTH, SPREADING_FACTOR,
};
pub use config::{
    dwell_time_period, max_dwell_time, Limit, Region, RegionRules, TimeUnit, UnknownRegion,
    DUTY_CYCLE_LIMIT, DUTY_CYCLE_WINDOW_MS, DWELL_TIME_WINDOW_MS, MAX_DWELL_TIME_MS,
};
pub use history::{dwell_time, History, TransmissionRecord};
pub use shared::SharedThrottle;
pub use throttle::Throttle;
