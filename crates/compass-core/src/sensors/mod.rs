//! Magnetometer abstraction and the sample stream built on top of it

mod simulated;
mod stream;

pub use simulated::{SimulatedAvailability, SimulatedMagnetometer, SimulatedProbe};
pub use stream::{SensorStream, Subscription};

use core::future::Future;

use embassy_time::Duration;
use thiserror_no_std::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensorError {
    #[error("{sensor} is not present on this device")]
    Unavailable { sensor: &'static str },
    #[error("{sensor} capability probe failed: {details}")]
    ProbeFailed {
        sensor: &'static str,
        details: &'static str,
    },
    #[error("{sensor} failed to {operation}: {details}")]
    ReadFailed {
        sensor: &'static str,
        operation: &'static str,
        details: &'static str,
    },
}

/// One raw magnetic-field reading along the device axes.
///
/// Units are whatever the sensor reports (µT for the simulated one).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VectorSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl VectorSample {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn magnitude(&self) -> f32 {
        libm::sqrtf(self.x * self.x + self.y * self.y + self.z * self.z)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Platform magnetometer.
///
/// The capability probe returns an owned future so it can be held as a
/// cancellable task while the sensor itself stays borrowed by the stream.
pub trait Magnetometer {
    type Probe: Future<Output = Result<bool, SensorError>> + 'static;

    /// Ask the platform whether a magnetometer exists.
    fn is_available(&self) -> Self::Probe;

    /// Requested delivery interval; the sensor may round it.
    fn set_update_interval(&mut self, interval: Duration);

    /// Take one reading.
    fn read(&mut self) -> Result<VectorSample, SensorError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn magnitude_of_axis_aligned_samples() {
        assert_abs_diff_eq!(VectorSample::new(3.0, 4.0, 0.0).magnitude(), 5.0);
        assert_abs_diff_eq!(VectorSample::new(0.0, 0.0, -40.0).magnitude(), 40.0);
    }

    #[test]
    fn non_finite_components_are_detected() {
        assert!(VectorSample::new(1.0, 2.0, 3.0).is_finite());
        assert!(!VectorSample::new(f32::NAN, 2.0, 3.0).is_finite());
        assert!(!VectorSample::new(1.0, f32::INFINITY, 3.0).is_finite());
    }
}
