//! Hardware driver boundary
//!
//! The motor driver is an external collaborator. Calls are synchronous and
//! may block for as long as the motor takes to move, so the actuator only
//! ever invokes them from the blocking pool.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use thiserror::Error;

/// Errors reported by an elevation driver
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    #[error("Device not ready")]
    DeviceNotReady,

    #[error("Device busy")]
    DeviceBusy,

    #[error("Device disconnected")]
    Disconnected,

    #[error("Angle out of range: {0}")]
    InvalidAngle(i32),

    #[error("Driver error: {0}")]
    Other(String),
}

/// Synchronous access to an elevation motor
pub trait ElevationDriver: Send + Sync + 'static {
    /// Whether the device is streaming and accepts writes
    fn is_running(&self) -> bool {
        true
    }

    /// Current angle reported by the hardware (degrees)
    fn elevation_angle(&self) -> Result<i32, DriverError>;

    /// Move the motor; returns once the hardware accepted the angle
    fn set_elevation_angle(&self, angle: i32) -> Result<(), DriverError>;
}

impl<T: ElevationDriver + ?Sized> ElevationDriver for Arc<T> {
    fn is_running(&self) -> bool {
        (**self).is_running()
    }

    fn elevation_angle(&self) -> Result<i32, DriverError> {
        (**self).elevation_angle()
    }

    fn set_elevation_angle(&self, angle: i32) -> Result<(), DriverError> {
        (**self).set_elevation_angle(angle)
    }
}

/// A write observed by [`SimulatedDriver`]
#[derive(Debug, Clone, Copy)]
pub struct RecordedWrite {
    pub angle: i32,
    pub started_at: Instant,
    pub accepted: bool,
}

#[derive(Debug)]
struct SimulatedState {
    angle: i32,
    running: bool,
    scripted_failures: Vec<DriverError>,
    writes: Vec<RecordedWrite>,
    in_write: bool,
    overlapping_writes: u32,
}

/// In-process motor used by tests and dry runs.
///
/// Records every write and can be scripted to fail.
#[derive(Debug)]
pub struct SimulatedDriver {
    state: Mutex<SimulatedState>,
    write_latency: std::time::Duration,
}

impl SimulatedDriver {
    pub fn new(initial_angle: i32) -> Self {
        SimulatedDriver {
            state: Mutex::new(SimulatedState {
                angle: initial_angle,
                running: true,
                scripted_failures: Vec::new(),
                writes: Vec::new(),
                in_write: false,
                overlapping_writes: 0,
            }),
            write_latency: std::time::Duration::ZERO,
        }
    }

    /// Simulate a motor that takes `latency` to settle
    pub fn with_latency(mut self, latency: std::time::Duration) -> Self {
        self.write_latency = latency;
        self
    }

    /// Fail the next write with `error`. Failures queue in order.
    pub fn fail_next(&self, error: DriverError) {
        self.state.lock().scripted_failures.push(error);
    }

    pub fn set_running(&self, running: bool) {
        self.state.lock().running = running;
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.state.lock().writes.clone()
    }

    pub fn write_count(&self) -> usize {
        self.state.lock().writes.len()
    }

    /// Number of times a write started while another was still running
    pub fn overlapping_writes(&self) -> u32 {
        self.state.lock().overlapping_writes
    }
}

impl ElevationDriver for SimulatedDriver {
    fn is_running(&self) -> bool {
        self.state.lock().running
    }

    fn elevation_angle(&self) -> Result<i32, DriverError> {
        let state = self.state.lock();
        if !state.running {
            return Err(DriverError::DeviceNotReady);
        }
        Ok(state.angle)
    }

    fn set_elevation_angle(&self, angle: i32) -> Result<(), DriverError> {
        let failure = {
            let mut state = self.state.lock();
            if state.in_write {
                state.overlapping_writes += 1;
            }
            state.in_write = true;
            if state.scripted_failures.is_empty() {
                None
            } else {
                Some(state.scripted_failures.remove(0))
            }
        };

        let started_at = Instant::now();
        if !self.write_latency.is_zero() {
            std::thread::sleep(self.write_latency);
        }

        let mut state = self.state.lock();
        state.in_write = false;
        state.writes.push(RecordedWrite {
            angle,
            started_at,
            accepted: failure.is_none(),
        });

        match failure {
            Some(error) => Err(error),
            None => {
                state.angle = angle;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_write() {
        let driver = SimulatedDriver::new(0);

        driver.set_elevation_angle(12).unwrap();
        assert_eq!(driver.elevation_angle(), Ok(12));
        assert_eq!(driver.write_count(), 1);
        assert!(driver.writes()[0].accepted);
    }

    #[test]
    fn test_scripted_failure_keeps_angle() {
        let driver = SimulatedDriver::new(3);
        driver.fail_next(DriverError::Disconnected);

        assert_eq!(driver.set_elevation_angle(10), Err(DriverError::Disconnected));
        assert_eq!(driver.elevation_angle(), Ok(3));
        assert!(!driver.writes()[0].accepted);

        assert!(driver.set_elevation_angle(10).is_ok());
    }

    #[test]
    fn test_stopped_device() {
        let driver = SimulatedDriver::new(0);
        driver.set_running(false);

        assert!(!driver.is_running());
        assert_eq!(driver.elevation_angle(), Err(DriverError::DeviceNotReady));
    }
}
