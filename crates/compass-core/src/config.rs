//! Tunable constants for the compass screen
//!
//! Loaded by the host (the simulator reads TOML) and validated before the
//! view model is built. Missing fields fall back to [`CompassConfig::default`].

use embassy_time::Duration;
use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::heading::HeadingConvention;

/// Magnetometer sample delivery interval
pub const DEFAULT_UPDATE_INTERVAL_MS: u32 = 100;

/// Needle transition after each sample
pub const DEFAULT_ROTATION_DURATION_MS: u32 = 150;

/// One leg of the decorative halo pulse (a full cycle is two legs)
pub const DEFAULT_PULSE_PERIOD_MS: u32 = 1600;

/// Earth's field is roughly 25-65 µT at the surface; outside this band the
/// reading is probably distorted by nearby metal or an uncalibrated sensor.
pub const DEFAULT_MAGNITUDE_LOW: f32 = 20.0;
pub const DEFAULT_MAGNITUDE_HIGH: f32 = 70.0;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("calibration band is empty or non-finite: low {low}, high {high}")]
    EmptyCalibrationBand { low: f32, high: f32 },
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },
}

/// Accepted range of field magnitudes, inclusive on both ends
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct MagnitudeBand {
    pub low: f32,
    pub high: f32,
}

impl MagnitudeBand {
    pub fn contains(&self, magnitude: f32) -> bool {
        (self.low..=self.high).contains(&magnitude)
    }
}

impl Default for MagnitudeBand {
    fn default() -> Self {
        Self {
            low: DEFAULT_MAGNITUDE_LOW,
            high: DEFAULT_MAGNITUDE_HIGH,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct CompassConfig {
    pub update_interval_ms: u32,
    pub rotation_duration_ms: u32,
    pub pulse_period_ms: u32,
    pub convention: HeadingConvention,
    pub calibration_band: MagnitudeBand,
}

impl Default for CompassConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: DEFAULT_UPDATE_INTERVAL_MS,
            rotation_duration_ms: DEFAULT_ROTATION_DURATION_MS,
            pulse_period_ms: DEFAULT_PULSE_PERIOD_MS,
            convention: HeadingConvention::default(),
            calibration_band: MagnitudeBand::default(),
        }
    }
}

impl CompassConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let band = self.calibration_band;
        if !band.low.is_finite() || !band.high.is_finite() || band.low >= band.high {
            return Err(ConfigError::EmptyCalibrationBand {
                low: band.low,
                high: band.high,
            });
        }

        let durations = [
            ("update_interval_ms", self.update_interval_ms),
            ("rotation_duration_ms", self.rotation_duration_ms),
            ("pulse_period_ms", self.pulse_period_ms),
        ];
        for (field, value) in durations {
            if value == 0 {
                return Err(ConfigError::ZeroDuration { field });
            }
        }

        Ok(())
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms as u64)
    }

    pub fn rotation_duration(&self) -> Duration {
        Duration::from_millis(self.rotation_duration_ms as u64)
    }

    pub fn pulse_period(&self) -> Duration {
        Duration::from_millis(self.pulse_period_ms as u64)
    }
}
