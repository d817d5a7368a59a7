//! LoRa time-on-air calculation.
//!
//! Calculates the transmission duration for a LoRa packet from its payload
//! size and modulation parameters, using the Semtech modem formula with CRC
//! always enabled.
//!
//! # Example
//!
//! ```
//! use lora_throttle::lora::{time_on_air, LoRaParams};
//!
//! // SF7, 125 kHz, 4/5, 8 preamble symbols, explicit header, 10 bytes
//! let ms = time_on_air(125_000, 7, 5, 8, true, 10);
//! assert!((ms - 41.216).abs() < 1e-9);
//!
//! let params = LoRaParams::default();
//! assert_eq!(params.time_on_air_ms(10), ms);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Spreading factor (SF7 - balanced range/speed).
pub const SPREADING_FACTOR: u8 = 7;

/// Bandwidth in Hz (125 kHz - standard LoRa).
pub const BANDWIDTH_HZ: u32 = 125_000;

/// Coding rate denominator (5 = 4/5 coding rate).
pub const CODING_RATE: u8 = 5;

/// Preamble length in symbols.
pub const PREAMBLE_LENGTH: u16 = 8;

/// Bandwidth at or below which high spreading factors need LDRO.
const LDRO_MAX_BANDWIDTH_HZ: u32 = 125_000;

/// Lowest spreading factor that needs LDRO.
const LDRO_MIN_SPREADING_FACTOR: u8 = 11;

/// Calculate LoRa packet airtime in milliseconds.
///
/// # Arguments
///
/// * `bandwidth` - Bandwidth in Hz
/// * `spreading_factor` - Spreading factor (6-12)
/// * `code_rate` - Coding rate denominator (5-8 for 4/5 to 4/8)
/// * `preamble_symbols` - Programmed preamble length
/// * `explicit_header` - Whether explicit header mode is used
/// * `payload_len` - Payload size in bytes
///
/// Inputs are not validated. A zero bandwidth yields an infinite or NaN
/// duration; use [`LoRaParams::validate`] at API boundaries.
pub fn time_on_air(
    bandwidth: u32,
    spreading_factor: u8,
    code_rate: u8,
    preamble_symbols: u16,
    explicit_header: bool,
    payload_len: usize,
) -> f64 {
    let sf = spreading_factor as f64;
    let bw = bandwidth as f64;

    // T_sym = 2^SF / BW (in seconds)
    let t_sym = 2.0_f64.powf(sf) / bw;

    let ldo = if low_data_rate_optimize(bandwidth, spreading_factor) {
        1.0
    } else {
        0.0
    };
    let eh = if explicit_header { 1.0 } else { 0.0 };

    // 8*PL - 4*SF + 28 + 16*CRC - 20*IH
    let numerator = 8.0 * payload_len as f64 - 4.0 * sf + 28.0 + 16.0 - 20.0 * (1.0 - eh);
    let denominator = 4.0 * (sf - 2.0 * ldo);

    let raw = (numerator / denominator).ceil() * code_rate as f64;
    let payload_symbols = 8.0 + raw.max(0.0);

    t_sym * (4.25 + preamble_symbols as f64 + payload_symbols) * 1000.0
}

/// Whether low data rate optimization applies (SF11/SF12 at or below 125kHz).
pub fn low_data_rate_optimize(bandwidth: u32, spreading_factor: u8) -> bool {
    bandwidth <= LDRO_MAX_BANDWIDTH_HZ && spreading_factor >= LDRO_MIN_SPREADING_FACTOR
}

/// LoRa modulation parameters for airtime calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoRaParams {
    /// Spreading factor (6-12)
    pub spreading_factor: u8,
    /// Bandwidth in Hz (typically 125000, 250000, or 500000)
    pub bandwidth_hz: u32,
    /// Coding rate denominator (5-8 for 4/5 to 4/8)
    pub coding_rate: u8,
    /// Preamble length in symbols (typically 8)
    pub preamble_symbols: u16,
    /// Whether explicit header mode is used
    pub explicit_header: bool,
}

impl Default for LoRaParams {
    fn default() -> Self {
        Self {
            spreading_factor: SPREADING_FACTOR,
            bandwidth_hz: BANDWIDTH_HZ,
            coding_rate: CODING_RATE,
            preamble_symbols: PREAMBLE_LENGTH,
            explicit_header: true,
        }
    }
}

impl LoRaParams {
    /// Check if low data rate optimization is in effect.
    pub fn low_data_rate_optimize(&self) -> bool {
        low_data_rate_optimize(self.bandwidth_hz, self.spreading_factor)
    }

    /// Calculate symbol duration in milliseconds.
    pub fn symbol_duration_ms(&self) -> f64 {
        2.0_f64.powi(self.spreading_factor as i32) / self.bandwidth_hz as f64 * 1000.0
    }

    /// Airtime in milliseconds for a payload of `payload_len` bytes.
    pub fn time_on_air_ms(&self, payload_len: usize) -> f64 {
        time_on_air(
            self.bandwidth_hz,
            self.spreading_factor,
            self.coding_rate,
            self.preamble_symbols,
            self.explicit_header,
            payload_len,
        )
    }

    /// Validate the parameters.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.bandwidth_hz == 0 {
            return Err(ParamsError::ZeroBandwidth);
        }
        if !(6..=12).contains(&self.spreading_factor) {
            return Err(ParamsError::SpreadingFactorOutOfRange(
                self.spreading_factor,
            ));
        }
        if !(5..=8).contains(&self.coding_rate) {
            return Err(ParamsError::CodeRateOutOfRange(self.coding_rate));
        }
        Ok(())
    }
}

/// Invalid modulation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamsError {
    /// Bandwidth must be non-zero.
    ZeroBandwidth,
    /// Spreading factor outside 6-12.
    SpreadingFactorOutOfRange(u8),
    /// Coding rate denominator outside 5-8.
    CodeRateOutOfRange(u8),
}

impl fmt::Display for ParamsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroBandwidth => write!(f, "bandwidth must be greater than 0 Hz"),
            Self::SpreadingFactorOutOfRange(sf) => {
                write!(f, "spreading factor {} outside 6-12", sf)
            }
            Self::CodeRateOutOfRange(cr) => {
                write!(f, "coding rate denominator {} outside 5-8", cr)
            }
        }
    }
}

impl std::error::Error for ParamsError {}
