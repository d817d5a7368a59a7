//! Per-device regulatory throttle.
//!
//! A [`Throttle`] owns the transmission history of one radio and answers
//! whether a proposed transmission would break its region's limit. Timestamps
//! are caller-supplied monotonic milliseconds; the throttle never reads a
//! clock.
//!
//! # Example
//!
//! ```
//! use lora_throttle::lora::{LoRaParams, Region, Throttle};
//!
//! let mut throttle = Throttle::new(Region::Us915);
//! let params = LoRaParams::default();
//! let freq = 902_300_000;
//!
//! let airtime = params.time_on_air_ms(20);
//! if throttle.can_send(0, freq, airtime) {
//!     // ... key the radio ...
//!     throttle.track_sent(0, freq, airtime);
//! }
//! assert_eq!(throttle.len(), 1);
//! ```

use super::airtime::{LoRaParams, ParamsError};
use super::config::{Region, MAX_DWELL_TIME_MS};
use super::history::{History, TransmissionRecord};
use log::debug;

/// Throttle state for a single device.
#[derive(Debug, Clone)]
pub struct Throttle {
    region: Region,
    history: History,
}

impl Throttle {
    /// Create a throttle with empty history.
    pub fn new(region: Region) -> Self {
        Self {
            region,
            history: History::new(),
        }
    }

    /// Region this throttle enforces.
    pub fn region(&self) -> Region {
        self.region
    }

    /// Retained transmissions, newest first.
    pub fn history(&self) -> impl Iterator<Item = &TransmissionRecord> {
        self.history.iter()
    }

    /// Number of retained transmissions.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Whether no transmissions are retained.
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Record a transmission that went on air.
    ///
    /// Must be called for every real transmission, otherwise later
    /// [`can_send`](Self::can_send) calls under-count air usage.
    pub fn track_sent(&mut self, sent_at: i64, frequency: u32, duration: f64) {
        debug!(
            "{} track: {:.3}ms on {} at {}",
            self.region, duration, frequency, sent_at
        );
        self.history.push(
            TransmissionRecord::new(sent_at, frequency, duration),
            self.region.window_ms(),
        );
    }

    /// Record a transmission, computing its airtime from `params`.
    pub fn track_sent_with(
        &mut self,
        sent_at: i64,
        frequency: u32,
        params: &LoRaParams,
        payload_len: usize,
    ) -> Result<f64, ParamsError> {
        params.validate()?;
        let duration = params.time_on_air_ms(payload_len);
        self.track_sent(sent_at, frequency, duration);
        Ok(duration)
    }

    /// Whether a transmission of `duration` ms on `frequency` at `at_time`
    /// stays within the region's limit.
    pub fn can_send(&self, at_time: i64, frequency: u32, duration: f64) -> bool {
        if duration > MAX_DWELL_TIME_MS as f64 {
            debug!(
                "{} reject: {:.3}ms exceeds {}ms per transmission",
                self.region, duration, MAX_DWELL_TIME_MS
            );
            return false;
        }

        let rules = self.region.rules();
        let cutoff = rules.query_cutoff(at_time, duration);
        let accumulated = self.history.dwell_time(cutoff, frequency);
        let allowed = rules.permits(accumulated, duration);

        if !allowed {
            debug!(
                "{} reject: {:.3}ms accumulated + {:.3}ms on {} at {}",
                self.region, accumulated, duration, frequency, at_time
            );
        }
        allowed
    }

    /// Like [`can_send`](Self::can_send), computing airtime from `params`.
    pub fn can_send_with(
        &self,
        at_time: i64,
        frequency: u32,
        params: &LoRaParams,
        payload_len: usize,
    ) -> Result<bool, ParamsError> {
        params.validate()?;
        Ok(self.can_send(at_time, frequency, params.time_on_air_ms(payload_len)))
    }

    /// Airtime on `frequency` inside the region window ending at `at_time`.
    pub fn airtime_used(&self, at_time: i64, frequency: u32) -> f64 {
        let cutoff = at_time as f64 - self.region.window_ms() as f64;
        self.history.dwell_time(cutoff, frequency)
    }
}
