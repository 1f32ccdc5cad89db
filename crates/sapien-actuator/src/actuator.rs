//! Rate-limited actuator - debounced, single-flight hardware writes
//!
//! Requests land in a single-slot watch channel; only the newest angle is
//! ever written. A scheduler task owns the debounce timer and hands writes to
//! a worker, which runs the driver call on the blocking pool and then holds
//! the in-flight flag through the cooldown.
//!
//! ```text
//!  Idle --request--> Debouncing --timer, idle writer--> Writing --cooldown--> Idle
//!                     ^      |
//!                     +------+ request resets timer; timer firing while busy
//!                              waits for the writer, then re-arms
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, trace, warn};

use crate::{ActuatorConfig, DebounceTimer, DriverError, ElevationDriver};

/// Observable actuator phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorPhase {
    Idle,
    Debouncing,
    Writing,
}

/// Outcome of one hardware write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActuationReport {
    Confirmed { angle: i32 },
    Failed { angle: i32, error: DriverError },
}

#[derive(Clone, Debug, Default)]
pub struct ActuatorStats {
    pub requests: u64,
    pub clamped_requests: u64,
    pub writes_attempted: u64,
    pub writes_confirmed: u64,
    pub writes_failed: u64,
    /// Timer expiries deferred because a write was still in flight
    pub deferred_while_busy: u64,
}

#[derive(Debug, Default)]
struct ActuatorState {
    last_confirmed_angle: Option<i32>,
    sensor_angle: Option<i32>,
    in_flight: bool,
    debouncing: bool,
    stats: ActuatorStats,
}

struct Shared<D> {
    driver: D,
    config: ActuatorConfig,
    state: Mutex<ActuatorState>,
    reports: broadcast::Sender<ActuationReport>,
}

impl<D: ElevationDriver> Shared<D> {
    fn set_debouncing(&self, debouncing: bool) {
        self.state.lock().debouncing = debouncing;
    }

    /// Claim the single write slot
    fn try_begin_write(&self) -> bool {
        let mut state = self.state.lock();
        if state.in_flight {
            state.stats.deferred_while_busy += 1;
            return false;
        }
        state.in_flight = true;
        state.debouncing = false;
        state.stats.writes_attempted += 1;
        true
    }

    fn write(&self, angle: i32) -> Result<(), DriverError> {
        if !self.driver.is_running() {
            return Err(DriverError::DeviceNotReady);
        }
        self.driver.set_elevation_angle(angle)
    }

    fn record(&self, angle: i32, result: &Result<(), DriverError>) {
        let report = {
            let mut state = self.state.lock();
            match result {
                Ok(()) => {
                    state.last_confirmed_angle = Some(angle);
                    state.stats.writes_confirmed += 1;
                    ActuationReport::Confirmed { angle }
                }
                Err(error) => {
                    state.stats.writes_failed += 1;
                    ActuationReport::Failed {
                        angle,
                        error: error.clone(),
                    }
                }
            }
        };

        match &report {
            ActuationReport::Confirmed { angle } => info!(angle, "elevation angle set"),
            ActuationReport::Failed { angle, error } => {
                warn!(angle, %error, "set elevation failed")
            }
        }

        // No subscribers is fine
        let _ = self.reports.send(report);
    }
}

/// Clears the in-flight flag however the worker exits
struct InFlightGuard<D: ElevationDriver> {
    shared: Arc<Shared<D>>,
}

impl<D: ElevationDriver> Drop for InFlightGuard<D> {
    fn drop(&mut self) {
        self.shared.state.lock().in_flight = false;
    }
}

/// Debounced, single-flight setter for a slow hardware angle.
///
/// Must be created from within a Tokio runtime.
pub struct RateLimitedActuator<D: ElevationDriver> {
    shared: Arc<Shared<D>>,
    requests: watch::Sender<Option<i32>>,
    scheduler: JoinHandle<()>,
}

impl<D: ElevationDriver> RateLimitedActuator<D> {
    pub fn new(driver: D) -> Self {
        Self::with_config(driver, ActuatorConfig::default())
    }

    pub fn with_config(driver: D, config: ActuatorConfig) -> Self {
        let (reports, _) = broadcast::channel(config.report_capacity.max(1));
        let shared = Arc::new(Shared {
            driver,
            config,
            state: Mutex::new(ActuatorState::default()),
            reports,
        });

        let (requests, rx) = watch::channel(None);
        let scheduler = tokio::spawn(run_scheduler(Arc::clone(&shared), rx));

        RateLimitedActuator {
            shared,
            requests,
            scheduler,
        }
    }

    /// Ask for a new angle. Later requests replace earlier unwritten ones.
    pub fn request_elevation(&self, angle: i32) {
        let clamped = self.shared.config.clamp_angle(angle);
        {
            let mut state = self.shared.state.lock();
            state.stats.requests += 1;
            state.debouncing = true;
            if clamped != angle {
                state.stats.clamped_requests += 1;
            }
        }
        if clamped != angle {
            debug!(requested = angle, clamped, "elevation request clamped");
        }

        self.requests.send_replace(Some(clamped));
    }

    /// Angle to display: the last confirmed write, or the hardware's own
    /// reading (read once, then cached) if nothing was written yet.
    pub fn current_angle(&self) -> Result<i32, DriverError> {
        {
            let state = self.shared.state.lock();
            if let Some(angle) = state.last_confirmed_angle.or(state.sensor_angle) {
                return Ok(angle);
            }
        }

        let angle = self.shared.driver.elevation_angle()?;
        self.shared.state.lock().sensor_angle = Some(angle);
        Ok(angle)
    }

    pub fn last_confirmed_angle(&self) -> Option<i32> {
        self.shared.state.lock().last_confirmed_angle
    }

    pub fn is_in_flight(&self) -> bool {
        self.shared.state.lock().in_flight
    }

    pub fn phase(&self) -> ActuatorPhase {
        let state = self.shared.state.lock();
        if state.debouncing {
            ActuatorPhase::Debouncing
        } else if state.in_flight {
            ActuatorPhase::Writing
        } else {
            ActuatorPhase::Idle
        }
    }

    pub fn stats(&self) -> ActuatorStats {
        self.shared.state.lock().stats.clone()
    }

    pub fn config(&self) -> &ActuatorConfig {
        &self.shared.config
    }

    pub fn driver(&self) -> &D {
        &self.shared.driver
    }

    /// Write outcomes, for collaborators that surface failures
    pub fn subscribe(&self) -> broadcast::Receiver<ActuationReport> {
        self.shared.reports.subscribe()
    }

    /// Stop accepting requests, write any pending one, and wait for the
    /// last write's cooldown to finish.
    pub async fn shutdown(self) {
        let RateLimitedActuator {
            requests,
            scheduler,
            ..
        } = self;
        drop(requests);

        if let Err(e) = scheduler.await {
            warn!("actuator scheduler ended abnormally: {}", e);
        }
    }
}

type WriteHandle = JoinHandle<Result<(), DriverError>>;

async fn join_writer(writer: &mut Option<WriteHandle>) -> Result<Result<(), DriverError>, JoinError> {
    match writer {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

async fn run_scheduler<D: ElevationDriver>(
    shared: Arc<Shared<D>>,
    mut requests: watch::Receiver<Option<i32>>,
) {
    let mut timer = DebounceTimer::new(shared.config.debounce);
    let mut writer: Option<WriteHandle> = None;
    // Set when the timer fired during a write; the retry waits for the join
    let mut retry_after_write = false;
    let mut open = true;

    loop {
        if !open && !timer.is_armed() && writer.is_none() {
            break;
        }

        tokio::select! {
            changed = requests.changed(), if open => match changed {
                Ok(()) => {
                    timer.reset();
                    shared.set_debouncing(true);
                    trace!("debounce timer reset");
                }
                // Handle dropped; a pending request still gets written
                Err(_) => open = false,
            },
            () = timer.fired(), if timer.is_armed() => {
                let latest = *requests.borrow_and_update();
                let Some(angle) = latest else {
                    shared.set_debouncing(false);
                    continue;
                };

                if shared.try_begin_write() {
                    debug!(angle, "dispatching elevation write");
                    writer = Some(tokio::spawn(write_and_cool_down(Arc::clone(&shared), angle)));
                } else {
                    trace!(angle, "write in flight, deferring until cooldown ends");
                    retry_after_write = true;
                }
            },
            joined = join_writer(&mut writer), if writer.is_some() => {
                writer = None;
                let busy = matches!(joined, Ok(Err(DriverError::DeviceBusy)));
                if let Err(e) = joined {
                    warn!("elevation writer aborted: {}", e);
                }

                if (busy || retry_after_write) && !timer.is_armed() {
                    if busy {
                        debug!("driver busy, rescheduling last request");
                    }
                    timer.reset();
                    shared.set_debouncing(true);
                }
                retry_after_write = false;
            },
        }
    }

    shared.set_debouncing(false);
    trace!("actuator scheduler stopped");
}

async fn write_and_cool_down<D: ElevationDriver>(
    shared: Arc<Shared<D>>,
    angle: i32,
) -> Result<(), DriverError> {
    let _guard = InFlightGuard {
        shared: Arc::clone(&shared),
    };

    let blocking = Arc::clone(&shared);
    let result = match tokio::task::spawn_blocking(move || blocking.write(angle)).await {
        Ok(result) => result,
        Err(e) => Err(DriverError::Other(format!("driver call panicked: {}", e))),
    };
    shared.record(angle, &result);

    // Unconditional, even after a fast failure
    tokio::time::sleep(shared.config.min_write_spacing).await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimulatedDriver;
    use std::time::Duration;

    fn fast_config() -> ActuatorConfig {
        ActuatorConfig {
            debounce: Duration::from_millis(100),
            min_write_spacing: Duration::from_millis(300),
            ..ActuatorConfig::default()
        }
    }

    fn actuator() -> RateLimitedActuator<Arc<SimulatedDriver>> {
        RateLimitedActuator::with_config(Arc::new(SimulatedDriver::new(0)), fast_config())
    }

    async fn wait_until_idle<D: ElevationDriver>(actuator: &RateLimitedActuator<D>) {
        for _ in 0..500 {
            if actuator.phase() == ActuatorPhase::Idle {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("actuator never went idle");
    }

    #[tokio::test]
    async fn test_burst_coalesces_to_last_request() {
        let actuator = actuator();

        actuator.request_elevation(10);
        tokio::time::sleep(Duration::from_millis(20)).await;
        actuator.request_elevation(10);
        tokio::time::sleep(Duration::from_millis(20)).await;
        actuator.request_elevation(25);
        assert_eq!(actuator.phase(), ActuatorPhase::Debouncing);

        wait_until_idle(&actuator).await;

        let writes = actuator.driver().writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].angle, 25);
        assert_eq!(actuator.last_confirmed_angle(), Some(25));
        assert_eq!(actuator.stats().requests, 3);
    }

    #[tokio::test]
    async fn test_writes_are_spaced_and_never_overlap() {
        let driver = Arc::new(SimulatedDriver::new(0).with_latency(Duration::from_millis(30)));
        let actuator = RateLimitedActuator::with_config(Arc::clone(&driver), fast_config());

        // Keep requesting new angles faster than the cooldown allows
        for angle in 0..8 {
            actuator.request_elevation(angle);
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        wait_until_idle(&actuator).await;

        let writes = driver.writes();
        assert!(writes.len() >= 2);
        for pair in writes.windows(2) {
            let gap = pair[1].started_at - pair[0].started_at;
            assert!(gap >= Duration::from_millis(300), "gap {:?}", gap);
        }
        assert_eq!(driver.overlapping_writes(), 0);
        // The final intent is never dropped
        assert_eq!(writes.last().map(|w| w.angle), Some(7));
        assert!(actuator.stats().deferred_while_busy > 0);
    }

    #[tokio::test]
    async fn test_failure_clears_in_flight() {
        let actuator = actuator();
        let mut reports = actuator.subscribe();
        actuator.driver().fail_next(DriverError::Disconnected);

        actuator.request_elevation(5);
        let report = reports.recv().await.unwrap();
        assert_eq!(
            report,
            ActuationReport::Failed {
                angle: 5,
                error: DriverError::Disconnected
            }
        );
        wait_until_idle(&actuator).await;
        assert!(!actuator.is_in_flight());
        assert_eq!(actuator.last_confirmed_angle(), None);

        actuator.request_elevation(6);
        assert_eq!(
            reports.recv().await.unwrap(),
            ActuationReport::Confirmed { angle: 6 }
        );
        assert_eq!(actuator.driver().write_count(), 2);
        assert_eq!(actuator.last_confirmed_angle(), Some(6));
    }

    #[tokio::test]
    async fn test_failed_write_still_cools_down() {
        let actuator = actuator();
        actuator.driver().fail_next(DriverError::InvalidAngle(5));

        actuator.request_elevation(5);
        tokio::time::sleep(Duration::from_millis(150)).await;
        actuator.request_elevation(7);
        wait_until_idle(&actuator).await;

        let writes = actuator.driver().writes();
        assert_eq!(writes.len(), 2);
        assert!(writes[1].started_at - writes[0].started_at >= Duration::from_millis(300));
        assert_eq!(actuator.stats().writes_failed, 1);
        assert_eq!(actuator.stats().writes_confirmed, 1);
    }

    #[tokio::test]
    async fn test_busy_driver_is_retried() {
        let actuator = actuator();
        let mut reports = actuator.subscribe();
        actuator.driver().fail_next(DriverError::DeviceBusy);

        actuator.request_elevation(12);

        assert!(matches!(
            reports.recv().await.unwrap(),
            ActuationReport::Failed {
                error: DriverError::DeviceBusy,
                ..
            }
        ));
        assert_eq!(
            reports.recv().await.unwrap(),
            ActuationReport::Confirmed { angle: 12 }
        );
    }

    #[tokio::test]
    async fn test_stopped_device_is_not_written() {
        let actuator = actuator();
        let mut reports = actuator.subscribe();
        actuator.driver().set_running(false);

        actuator.request_elevation(3);

        assert_eq!(
            reports.recv().await.unwrap(),
            ActuationReport::Failed {
                angle: 3,
                error: DriverError::DeviceNotReady
            }
        );
        assert_eq!(actuator.driver().write_count(), 0);
    }

    #[tokio::test]
    async fn test_request_is_clamped() {
        let actuator = actuator();

        actuator.request_elevation(90);
        wait_until_idle(&actuator).await;

        assert_eq!(actuator.driver().writes()[0].angle, 27);
        assert_eq!(actuator.stats().clamped_requests, 1);
    }

    #[tokio::test]
    async fn test_current_angle_reads_sensor_once() {
        let driver = Arc::new(SimulatedDriver::new(-4));
        let actuator = RateLimitedActuator::with_config(Arc::clone(&driver), fast_config());

        assert_eq!(actuator.current_angle(), Ok(-4));

        // Cached: a stopped sensor no longer matters
        driver.set_running(false);
        assert_eq!(actuator.current_angle(), Ok(-4));

        driver.set_running(true);
        actuator.request_elevation(8);
        wait_until_idle(&actuator).await;
        assert_eq!(actuator.current_angle(), Ok(8));
    }

    #[tokio::test]
    async fn test_shutdown_flushes_pending_request() {
        let driver = Arc::new(SimulatedDriver::new(0));
        let actuator = RateLimitedActuator::with_config(Arc::clone(&driver), fast_config());

        actuator.request_elevation(14);
        actuator.shutdown().await;

        assert_eq!(driver.write_count(), 1);
        assert_eq!(driver.writes()[0].angle, 14);
    }

    #[tokio::test]
    async fn test_zero_debounce_waits_for_cooldown() {
        let driver = Arc::new(SimulatedDriver::new(0));
        let config = ActuatorConfig {
            debounce: Duration::ZERO,
            min_write_spacing: Duration::from_millis(500),
            ..ActuatorConfig::default()
        };
        let actuator = RateLimitedActuator::with_config(Arc::clone(&driver), config);

        actuator.request_elevation(1);
        tokio::time::sleep(Duration::from_millis(50)).await;
        actuator.request_elevation(2);
        tokio::time::sleep(Duration::from_millis(350)).await;

        assert_eq!(driver.write_count(), 1);
        assert_eq!(actuator.stats().deferred_while_busy, 1);

        wait_until_idle(&actuator).await;
        let writes = driver.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[1].angle, 2);
        assert!(writes[1].started_at - writes[0].started_at >= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_idle_without_requests() {
        let actuator = actuator();

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(actuator.phase(), ActuatorPhase::Idle);
        assert_eq!(actuator.driver().write_count(), 0);
    }
}
