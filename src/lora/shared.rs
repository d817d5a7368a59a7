//! Thread-safe throttle handle.
//!
//! [`Throttle`] is single-writer by construction. When the transmit path and
//! a diagnostics task need the same device state, wrap it in a
//! [`SharedThrottle`] so the permission check and the history update happen
//! under one lock.

use super::config::Region;
use super::throttle::Throttle;
use log::warn;
use std::sync::{Arc, Mutex, MutexGuard};

/// Cloneable handle to one device's throttle state.
#[derive(Debug, Clone)]
pub struct SharedThrottle {
    inner: Arc<Mutex<Throttle>>,
}

impl SharedThrottle {
    /// Create a shared throttle with empty history.
    pub fn new(region: Region) -> Self {
        Self::from(Throttle::new(region))
    }

    fn lock(&self) -> MutexGuard<'_, Throttle> {
        // Handle poisoned mutex - recover by taking the inner value
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Throttle mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Check and, if allowed, record the transmission atomically.
    ///
    /// Returns `true` if the caller may key the radio now.
    pub fn try_transmit(&self, at_time: i64, frequency: u32, duration: f64) -> bool {
        let mut throttle = self.lock();
        if throttle.can_send(at_time, frequency, duration) {
            throttle.track_sent(at_time, frequency, duration);
            true
        } else {
            false
        }
    }

    /// See [`Throttle::can_send`].
    pub fn can_send(&self, at_time: i64, frequency: u32, duration: f64) -> bool {
        self.lock().can_send(at_time, frequency, duration)
    }

    /// See [`Throttle::track_sent`].
    pub fn track_sent(&self, sent_at: i64, frequency: u32, duration: f64) {
        self.lock().track_sent(sent_at, frequency, duration);
    }

    /// Region of the wrapped throttle.
    pub fn region(&self) -> Region {
        self.lock().region()
    }

    /// Copy of the current state for read-only inspection.
    pub fn snapshot(&self) -> Throttle {
        self.lock().clone()
    }
}

impl From<Throttle> for SharedThrottle {
    fn from(throttle: Throttle) -> Self {
        Self {
            inner: Arc::new(Mutex::new(throttle)),
        }
    }
}
