//! Synthetic magnetometer for the desktop simulator and tests
//!
//! Produces a field of constant strength whose horizontal direction follows a
//! virtual device heading. The heading can be turned by hand, left to spin on
//! its own, or disturbed to push the magnitude out of the plausible band.

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use embassy_time::Duration;
use log::info;

use super::{Magnetometer, SensorError, VectorSample};
use crate::config::DEFAULT_UPDATE_INTERVAL_MS;
use crate::heading::{HeadingConvention, normalize_degrees};

const SENSOR_NAME: &str = "simulated magnetometer";

/// Typical total field strength at mid latitudes (µT)
const DEFAULT_FIELD_STRENGTH_UT: f32 = 48.0;

/// Dip of the field below the horizon
const DEFAULT_INCLINATION_DEG: f32 = 60.0;

/// Field multiplier while interference is on; lands well above the band
const INTERFERENCE_GAIN: f32 = 2.0;

/// Peak hand-jitter added to each reading
const WOBBLE_DEG: f32 = 0.8;

/// What the capability probe reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimulatedAvailability {
    #[default]
    Available,
    Unavailable,
    /// The probe itself errors out
    ProbeFails,
}

/// Capability probe that stays pending for a fixed number of polls.
pub struct SimulatedProbe {
    polls_remaining: u8,
    outcome: Result<bool, SensorError>,
}

impl Future for SimulatedProbe {
    type Output = Result<bool, SensorError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if this.polls_remaining == 0 {
            return Poll::Ready(this.outcome.clone());
        }

        this.polls_remaining -= 1;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

pub struct SimulatedMagnetometer {
    convention: HeadingConvention,
    availability: SimulatedAvailability,
    probe_latency_polls: u8,
    heading_deg: f32,
    spin_deg_per_sec: f32,
    field_strength: f32,
    inclination_deg: f32,
    interference: bool,
    interval: Duration,
    ticks: u32,
}

impl SimulatedMagnetometer {
    pub fn new(convention: HeadingConvention) -> Self {
        Self {
            convention,
            availability: SimulatedAvailability::Available,
            probe_latency_polls: 0,
            heading_deg: 0.0,
            spin_deg_per_sec: 0.0,
            field_strength: DEFAULT_FIELD_STRENGTH_UT,
            inclination_deg: DEFAULT_INCLINATION_DEG,
            interference: false,
            interval: Duration::from_millis(DEFAULT_UPDATE_INTERVAL_MS as u64),
            ticks: 0,
        }
    }

    pub fn with_availability(mut self, availability: SimulatedAvailability) -> Self {
        self.availability = availability;
        self
    }

    /// Number of polls the capability probe stays pending before resolving
    pub fn with_probe_latency(mut self, polls: u8) -> Self {
        self.probe_latency_polls = polls;
        self
    }

    pub fn with_heading(mut self, heading_deg: f32) -> Self {
        self.heading_deg = normalize_degrees(heading_deg);
        self
    }

    pub fn with_spin_rate(mut self, deg_per_sec: f32) -> Self {
        self.spin_deg_per_sec = deg_per_sec;
        self
    }

    pub fn with_field_strength(mut self, strength: f32) -> Self {
        self.field_strength = strength;
        self
    }

    /// Takes effect on the next probe and read
    pub fn set_availability(&mut self, availability: SimulatedAvailability) {
        self.availability = availability;
    }

    pub fn availability(&self) -> SimulatedAvailability {
        self.availability
    }

    pub fn heading(&self) -> f32 {
        self.heading_deg
    }

    pub fn set_heading(&mut self, heading_deg: f32) {
        self.heading_deg = normalize_degrees(heading_deg);
    }

    pub fn rotate_by(&mut self, deg: f32) {
        self.set_heading(self.heading_deg + deg);
    }

    pub fn spin_rate(&self) -> f32 {
        self.spin_deg_per_sec
    }

    pub fn set_spin_rate(&mut self, deg_per_sec: f32) {
        self.spin_deg_per_sec = deg_per_sec;
    }

    pub fn interference(&self) -> bool {
        self.interference
    }

    pub fn set_interference(&mut self, enabled: bool) {
        if self.interference != enabled {
            info!("Simulated interference {}", if enabled { "on" } else { "off" });
        }
        self.interference = enabled;
    }

    pub fn set_convention(&mut self, convention: HeadingConvention) {
        self.convention = convention;
    }

    /// Field strength the next reading will report
    pub fn effective_strength(&self) -> f32 {
        if self.interference {
            self.field_strength * INTERFERENCE_GAIN
        } else {
            self.field_strength
        }
    }
}

impl Magnetometer for SimulatedMagnetometer {
    type Probe = SimulatedProbe;

    fn is_available(&self) -> Self::Probe {
        let outcome = match self.availability {
            SimulatedAvailability::Available => Ok(true),
            SimulatedAvailability::Unavailable => Ok(false),
            SimulatedAvailability::ProbeFails => Err(SensorError::ProbeFailed {
                sensor: SENSOR_NAME,
                details: "platform capability query rejected",
            }),
        };

        SimulatedProbe {
            polls_remaining: self.probe_latency_polls,
            outcome,
        }
    }

    fn set_update_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    fn read(&mut self) -> Result<VectorSample, SensorError> {
        if self.availability != SimulatedAvailability::Available {
            return Err(SensorError::Unavailable {
                sensor: SENSOR_NAME,
            });
        }

        self.ticks = self.ticks.wrapping_add(1);
        let dt_secs = self.interval.as_micros() as f32 / 1_000_000.0;
        self.rotate_by(self.spin_deg_per_sec * dt_secs);

        let wobble = WOBBLE_DEG * libm::sinf(self.ticks as f32 * 0.9);
        let strength = self.effective_strength();
        let inclination = self.inclination_deg.to_radians();
        let horizontal = strength * libm::cosf(inclination);

        let (x, y) = self
            .convention
            .horizontal_components(self.heading_deg + wobble, horizontal);
        let z = -strength * libm::sinf(inclination);

        Ok(VectorSample::new(x, y, z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heading::{heading_from_vector, shortest_delta};
    use approx::assert_abs_diff_eq;

    #[test]
    fn readings_follow_device_heading() {
        let mut sensor = SimulatedMagnetometer::new(HeadingConvention::EastReferenced)
            .with_heading(135.0);

        let sample = sensor.read().unwrap();
        let heading = heading_from_vector(HeadingConvention::EastReferenced, sample.x, sample.y);

        assert!(shortest_delta(heading, 135.0).abs() <= WOBBLE_DEG + 0.01);
        assert_abs_diff_eq!(sample.magnitude(), DEFAULT_FIELD_STRENGTH_UT, epsilon = 1e-3);
    }

    #[test]
    fn spin_advances_per_interval() {
        let mut sensor = SimulatedMagnetometer::new(HeadingConvention::NorthReferenced)
            .with_heading(350.0)
            .with_spin_rate(100.0);
        sensor.set_update_interval(Duration::from_millis(200));

        sensor.read().unwrap();
        assert_abs_diff_eq!(sensor.heading(), 10.0, epsilon = 1e-3);
    }

    #[test]
    fn interference_leaves_band() {
        let mut sensor = SimulatedMagnetometer::new(HeadingConvention::default());
        sensor.set_interference(true);

        let sample = sensor.read().unwrap();
        assert!(sample.magnitude() > 90.0);
    }

    #[test]
    fn unavailable_sensor_refuses_reads() {
        let mut sensor = SimulatedMagnetometer::new(HeadingConvention::default())
            .with_availability(SimulatedAvailability::Unavailable);

        assert_eq!(
            sensor.read(),
            Err(SensorError::Unavailable {
                sensor: SENSOR_NAME
            })
        );
        assert_eq!(embassy_futures::block_on(sensor.is_available()), Ok(false));
    }

    #[test]
    fn probe_latency_counts_polls() {
        let sensor = SimulatedMagnetometer::new(HeadingConvention::default()).with_probe_latency(2);
        let mut probe = sensor.is_available();

        assert!(embassy_futures::poll_once(&mut probe).is_pending());
        assert!(embassy_futures::poll_once(&mut probe).is_pending());
        assert_eq!(embassy_futures::poll_once(&mut probe), Poll::Ready(Ok(true)));
    }
}
