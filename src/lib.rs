//! Regulatory time-on-air throttling for LoRa transmitters.
//!
//! Tracks a rolling per-device history of transmissions and answers whether a
//! proposed transmission would break the EU868 duty-cycle or US915 dwell-time
//! limit. The library is synchronous and never touches hardware or clocks;
//! the code that drives the radio supplies timestamps and calls in for
//! decisions.

pub mod config;
pub mod lora;

// Re-export commonly used items
pub use config::{ConfigError, Scenario, ThrottleConfig};
pub use lora::{
    time_on_air, LoRaParams, ParamsError, Region, SharedThrottle, Throttle, TransmissionRecord,
};
