//! Interval-driven sample delivery with cancellable subscriptions

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;
use core::future::Future;

use embassy_time::{Duration, Instant};
use log::{debug, error, warn};

use super::{Magnetometer, VectorSample};
use crate::config::DEFAULT_UPDATE_INTERVAL_MS;

/// Upper bound on overdue deliveries replayed in one pump after a stall
const MAX_CATCH_UP_TICKS: u8 = 4;

struct Listener {
    active: Rc<Cell<bool>>,
    on_sample: Box<dyn FnMut(VectorSample)>,
}

/// Handle to a registered listener.
///
/// Cancelling is idempotent and takes effect before the next delivery.
/// Dropping the handle cancels it, so a subscription can never outlive its
/// owner.
pub struct Subscription {
    active: Rc<Cell<bool>>,
}

impl Subscription {
    pub fn cancel(&self) {
        if self.active.replace(false) {
            debug!("Magnetometer subscription cancelled");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Delivers magnetometer readings to subscribers at a fixed interval.
///
/// The host calls [`pump`](Self::pump) from its loop; listeners run
/// synchronously inside it, in registration order.
pub struct SensorStream<M: Magnetometer> {
    magnetometer: M,
    interval: Duration,
    next_due: Option<Instant>,
    listeners: Vec<Listener>,
}

impl<M: Magnetometer> SensorStream<M> {
    pub fn new(magnetometer: M) -> Self {
        Self {
            magnetometer,
            interval: Duration::from_millis(DEFAULT_UPDATE_INTERVAL_MS as u64),
            next_due: None,
            listeners: Vec::new(),
        }
    }

    /// Probe the platform for a magnetometer.
    ///
    /// A failing probe resolves to `false`. The returned future owns
    /// everything it needs, so dropping it abandons the check.
    pub fn check_availability(&self) -> impl Future<Output = bool> + 'static {
        let probe = self.magnetometer.is_available();
        async move {
            match probe.await {
                Ok(available) => available,
                Err(e) => {
                    warn!("Magnetometer probe failed, treating as unavailable: {}", e);
                    false
                }
            }
        }
    }

    /// Set the delivery interval.
    ///
    /// With listeners already active the new interval applies from the next
    /// delivery onwards. A zero interval is raised to one tick.
    pub fn configure(&mut self, interval: Duration) {
        let interval = if interval.as_ticks() == 0 {
            warn!("Zero magnetometer interval, using one tick");
            Duration::from_ticks(1)
        } else {
            interval
        };
        debug!("Magnetometer interval set to {} ms", interval.as_millis());
        self.interval = interval;
        self.magnetometer.set_update_interval(interval);
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Register `on_sample`. Delivery starts on the next pump.
    pub fn subscribe<F>(&mut self, on_sample: F) -> Subscription
    where
        F: FnMut(VectorSample) + 'static,
    {
        if self.listener_count() == 0 {
            // Fresh start: no catch-up for time spent idle
            self.next_due = None;
        }

        let active = Rc::new(Cell::new(true));
        self.listeners.push(Listener {
            active: active.clone(),
            on_sample: Box::new(on_sample),
        });
        debug!("Magnetometer listener added ({} total)", self.listeners.len());

        Subscription { active }
    }

    /// Number of listeners that have not been cancelled
    pub fn listener_count(&self) -> usize {
        self.listeners.iter().filter(|l| l.active.get()).count()
    }

    /// Deliver every reading that has come due by `now`.
    pub fn pump(&mut self, now: Instant) {
        self.listeners.retain(|l| l.active.get());
        if self.listeners.is_empty() {
            self.next_due = None;
            return;
        }

        let mut due = self.next_due.unwrap_or(now);
        let mut delivered = 0u8;

        while due <= now && delivered < MAX_CATCH_UP_TICKS {
            self.deliver_one();
            due += self.interval;
            delivered += 1;
        }

        if due <= now {
            debug!("Magnetometer fell behind, resyncing schedule");
            due = now + self.interval;
        }
        self.next_due = Some(due);
    }

    fn deliver_one(&mut self) {
        let sample = match self.magnetometer.read() {
            Ok(sample) => sample,
            Err(e) => {
                error!("Magnetometer read skipped: {}", e);
                return;
            }
        };

        for listener in self.listeners.iter_mut() {
            // A listener may have been cancelled earlier in this same pump
            if listener.active.get() {
                (listener.on_sample)(sample);
            }
        }
    }

    pub fn magnetometer(&self) -> &M {
        &self.magnetometer
    }

    pub fn magnetometer_mut(&mut self) -> &mut M {
        &mut self.magnetometer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heading::HeadingConvention;
    use crate::sensors::{SensorError, SimulatedAvailability, SimulatedMagnetometer};
    use alloc::collections::VecDeque;
    use alloc::vec;
    use core::cell::RefCell;

    /// Replays a fixed list of readings, then reports read failures.
    struct Scripted {
        readings: VecDeque<Result<VectorSample, SensorError>>,
    }

    impl Scripted {
        fn new(readings: Vec<Result<VectorSample, SensorError>>) -> Self {
            Self {
                readings: readings.into(),
            }
        }
    }

    impl Magnetometer for Scripted {
        type Probe = core::future::Ready<Result<bool, SensorError>>;

        fn is_available(&self) -> Self::Probe {
            core::future::ready(Ok(true))
        }

        fn set_update_interval(&mut self, _interval: Duration) {}

        fn read(&mut self) -> Result<VectorSample, SensorError> {
            self.readings.pop_front().unwrap_or(Err(SensorError::ReadFailed {
                sensor: "scripted",
                operation: "read",
                details: "script exhausted",
            }))
        }
    }

    fn sample(x: f32) -> VectorSample {
        VectorSample::new(x, 0.0, 0.0)
    }

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    fn recorder() -> (Rc<RefCell<Vec<f32>>>, impl FnMut(VectorSample) + 'static) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |s: VectorSample| sink.borrow_mut().push(s.x))
    }

    #[test]
    fn delivers_in_order_at_interval() {
        let mut stream = SensorStream::new(Scripted::new(vec![
            Ok(sample(1.0)),
            Ok(sample(2.0)),
            Ok(sample(3.0)),
        ]));
        stream.configure(Duration::from_millis(100));

        let (seen, listener) = recorder();
        let _subscription = stream.subscribe(listener);

        stream.pump(at(0));
        stream.pump(at(50));
        stream.pump(at(100));
        stream.pump(at(200));

        assert_eq!(*seen.borrow(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn cancel_stops_delivery_and_is_idempotent() {
        let mut stream = SensorStream::new(Scripted::new(vec![Ok(sample(1.0)), Ok(sample(2.0))]));
        let (seen, listener) = recorder();
        let subscription = stream.subscribe(listener);

        stream.pump(at(0));
        subscription.cancel();
        subscription.cancel();
        assert!(!subscription.is_active());

        stream.pump(at(1_000));
        assert_eq!(*seen.borrow(), vec![1.0]);
        assert_eq!(stream.listener_count(), 0);
    }

    #[test]
    fn dropping_subscription_cancels() {
        let mut stream = SensorStream::new(Scripted::new(vec![Ok(sample(1.0))]));
        let (seen, listener) = recorder();
        drop(stream.subscribe(listener));

        stream.pump(at(0));
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn read_errors_skip_a_tick() {
        let failure = SensorError::ReadFailed {
            sensor: "scripted",
            operation: "read",
            details: "bus glitch",
        };
        let mut stream = SensorStream::new(Scripted::new(vec![
            Ok(sample(1.0)),
            Err(failure),
            Ok(sample(3.0)),
        ]));
        stream.configure(Duration::from_millis(100));
        let (seen, listener) = recorder();
        let _subscription = stream.subscribe(listener);

        for ms in [0, 100, 200] {
            stream.pump(at(ms));
        }
        assert_eq!(*seen.borrow(), vec![1.0, 3.0]);
    }

    #[test]
    fn stall_catch_up_is_bounded() {
        let readings = (0..20).map(|i| Ok(sample(i as f32))).collect();
        let mut stream = SensorStream::new(Scripted::new(readings));
        stream.configure(Duration::from_millis(100));
        let (seen, listener) = recorder();
        let _subscription = stream.subscribe(listener);

        stream.pump(at(0));
        stream.pump(at(1_000));
        assert_eq!(seen.borrow().len(), 1 + MAX_CATCH_UP_TICKS as usize);

        // Schedule resynced to now + interval
        stream.pump(at(1_050));
        assert_eq!(seen.borrow().len(), 1 + MAX_CATCH_UP_TICKS as usize);
        stream.pump(at(1_100));
        assert_eq!(seen.borrow().len(), 2 + MAX_CATCH_UP_TICKS as usize);
    }

    #[test]
    fn zero_interval_is_raised_to_one_tick() {
        let readings = (0..10).map(|i| Ok(sample(i as f32))).collect();
        let mut stream = SensorStream::new(Scripted::new(readings));
        stream.configure(Duration::from_ticks(0));
        assert_eq!(stream.interval(), Duration::from_ticks(1));

        let (seen, listener) = recorder();
        let _subscription = stream.subscribe(listener);

        // Repeated pumps at the same instant deliver once
        stream.pump(at(5));
        stream.pump(at(5));
        stream.pump(at(5));
        assert_eq!(*seen.borrow(), vec![0.0]);
    }

    #[test]
    fn idle_without_listeners() {
        let mut stream = SensorStream::new(Scripted::new(vec![Ok(sample(1.0))]));
        stream.pump(at(0));
        assert_eq!(stream.magnetometer().readings.len(), 1);
    }

    #[test]
    fn probe_failure_reads_as_unavailable() {
        let magnetometer = SimulatedMagnetometer::new(HeadingConvention::default())
            .with_availability(SimulatedAvailability::ProbeFails);
        let stream = SensorStream::new(magnetometer);

        let result = embassy_futures::block_on(stream.check_availability());
        assert!(!result);
    }
}
