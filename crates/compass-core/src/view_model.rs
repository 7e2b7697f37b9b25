//! View state for the compass screen
//!
//! [`CompassViewModel`] owns the sensor stream and turns raw field vectors
//! into what the dial shows: a heading, a cardinal label, a smoothed needle
//! rotation and an optional calibration hint.
//!
//! # Lifecycle
//!
//! ```text
//! mount() ──► Uninitialized ──probe false/error──► Unavailable (terminal)
//!                   │
//!                   └──probe true──► Active (updates on every sample)
//! ```
//!
//! `unmount()` abandons a pending probe and cancels the subscription no
//! matter which state it is called from.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::future::Future;
use core::pin::Pin;
use core::task::Poll;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::Instant;
use log::{debug, info, warn};

use crate::animation::{AnimatedValue, Easing, Pulse};
use crate::config::CompassConfig;
use crate::heading::{
    Cardinal, cardinal_from_heading, heading_from_vector, normalize_degrees, shortest_delta,
};
use crate::sensors::{Magnetometer, SensorStream, Subscription, VectorSample};

/// Shown while the field magnitude is outside the calibration band
pub const CALIBRATION_HINT: &str = "Interference: move device in a figure 8";

/// Samples buffered between the listener and the next update
const SAMPLE_INBOX_DEPTH: usize = 8;

/// Settled rotations past this many degrees are folded back by whole turns
const ROTATION_REBASE_LIMIT_DEG: f32 = 360.0 * 16.0;

type SampleInbox = Channel<NoopRawMutex, VectorSample, SAMPLE_INBOX_DEPTH>;

type AvailabilityProbe = Pin<Box<dyn Future<Output = bool>>>;

/// Result of the magnetometer capability check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Availability {
    #[default]
    Unknown,
    Unavailable,
    Available,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompassPhase {
    /// Waiting for the capability probe
    Uninitialized,
    /// No magnetometer; terminal for this mount
    Unavailable,
    /// Subscribed and processing samples
    Active,
}

/// Everything the view needs for one frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CompassSnapshot {
    pub availability: Availability,
    /// Rounded heading in `0..360`, `None` before the first sample
    pub heading: Option<u16>,
    pub cardinal: Option<Cardinal>,
    /// Unwrapped needle rotation in degrees
    pub rotation: f32,
    pub calibration_hint: Option<&'static str>,
    /// Decorative halo level in `[0, 1]`
    pub pulse: f32,
}

pub struct CompassViewModel<M: Magnetometer> {
    config: CompassConfig,
    stream: SensorStream<M>,
    phase: CompassPhase,
    mounted: bool,
    probe: Option<AvailabilityProbe>,
    subscription: Option<Subscription>,
    inbox: Rc<SampleInbox>,
    heading: Option<f32>,
    rotation: AnimatedValue,
    calibration_hint: Option<&'static str>,
    pulse: Pulse,
}

impl<M: Magnetometer> CompassViewModel<M> {
    pub fn new(magnetometer: M, config: CompassConfig) -> Self {
        let mut stream = SensorStream::new(magnetometer);
        stream.configure(config.update_interval());

        Self {
            config,
            stream,
            phase: CompassPhase::Uninitialized,
            mounted: false,
            probe: None,
            subscription: None,
            inbox: Rc::new(Channel::new()),
            heading: None,
            rotation: AnimatedValue::new(0.0),
            calibration_hint: None,
            pulse: Pulse::new(config.pulse_period(), Easing::EaseInOut),
        }
    }

    /// Start a fresh display lifetime and kick off the capability probe.
    pub fn mount(&mut self) {
        if self.mounted {
            debug!("Compass already mounted");
            return;
        }

        info!("Compass mounted, probing magnetometer");
        self.mounted = true;
        self.phase = CompassPhase::Uninitialized;
        self.heading = None;
        self.calibration_hint = None;
        self.rotation.set(0.0);
        let probe: AvailabilityProbe = Box::pin(self.stream.check_availability());
        self.probe = Some(probe);
    }

    /// Release the sensor. Safe to call in any state, including before the
    /// probe has resolved.
    pub fn unmount(&mut self) {
        self.probe = None;
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
        while self.inbox.try_receive().is_ok() {}
        self.pulse.stop();

        if self.mounted {
            info!("Compass unmounted");
        }
        self.mounted = false;
    }

    /// Advance probe, sensor delivery and animations to `now`.
    pub fn update(&mut self, now: Instant) {
        if !self.mounted {
            return;
        }

        self.pulse.start(now);
        self.poll_probe(now);

        if self.phase == CompassPhase::Active {
            self.stream.pump(now);
            while let Ok(sample) = self.inbox.try_receive() {
                self.apply_sample(sample, now);
            }
        }
    }

    fn poll_probe(&mut self, now: Instant) {
        let Some(probe) = self.probe.as_mut() else {
            return;
        };

        let Poll::Ready(available) = embassy_futures::poll_once(probe.as_mut()) else {
            return;
        };
        self.probe = None;

        if available {
            self.activate(now);
        } else {
            info!("Magnetometer unavailable, compass disabled");
            self.phase = CompassPhase::Unavailable;
        }
    }

    fn activate(&mut self, now: Instant) {
        self.stream.configure(self.config.update_interval());

        let inbox = self.inbox.clone();
        let subscription = self.stream.subscribe(move |sample| {
            if inbox.try_send(sample).is_err() {
                warn!("Compass inbox full, dropping sample");
            }
        });

        self.subscription = Some(subscription);
        self.phase = CompassPhase::Active;
        info!(
            "Magnetometer active at {} ms interval",
            self.config.update_interval_ms
        );
        debug!("Compass activated at {} ms", now.as_millis());
    }

    /// Fold one reading into the view state.
    pub fn apply_sample(&mut self, sample: VectorSample, now: Instant) {
        if !sample.is_finite() {
            warn!("Dropping non-finite magnetometer sample {:?}", sample);
            return;
        }

        let heading = heading_from_vector(self.config.convention, sample.x, sample.y);

        let mut current = self.rotation.value_at(now);
        if libm::fabsf(current) >= ROTATION_REBASE_LIMIT_DEG && self.rotation.is_settled(now) {
            debug!("Rebasing needle rotation from {}", current);
            current = normalize_degrees(current);
            self.rotation.set(current);
        }
        let delta = shortest_delta(normalize_degrees(current), heading);
        self.rotation.animate_to(
            current + delta,
            self.config.rotation_duration(),
            Easing::EaseOut,
            now,
        );

        self.heading = Some(heading);

        let magnitude = sample.magnitude();
        self.calibration_hint = if self.config.calibration_band.contains(magnitude) {
            None
        } else {
            Some(CALIBRATION_HINT)
        };
    }

    pub fn snapshot(&self, now: Instant) -> CompassSnapshot {
        let availability = match self.phase {
            CompassPhase::Uninitialized => Availability::Unknown,
            CompassPhase::Unavailable => Availability::Unavailable,
            CompassPhase::Active => Availability::Available,
        };

        CompassSnapshot {
            availability,
            heading: self.heading.map(|h| (libm::roundf(h) as u16) % 360),
            cardinal: self.heading.map(cardinal_from_heading),
            rotation: self.rotation.value_at(now),
            calibration_hint: self.calibration_hint,
            pulse: self.pulse.value_at(now),
        }
    }

    pub fn phase(&self) -> CompassPhase {
        self.phase
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Heading of the last accepted sample
    pub fn heading(&self) -> Option<f32> {
        self.heading
    }

    /// Where the needle is heading, ignoring the transition in progress
    pub fn rotation_target(&self) -> f32 {
        self.rotation.target()
    }

    pub fn config(&self) -> &CompassConfig {
        &self.config
    }

    pub fn stream(&self) -> &SensorStream<M> {
        &self.stream
    }

    pub fn magnetometer_mut(&mut self) -> &mut M {
        self.stream.magnetometer_mut()
    }
}

impl<M: Magnetometer> Drop for CompassViewModel<M> {
    fn drop(&mut self) {
        self.unmount();
    }
}
