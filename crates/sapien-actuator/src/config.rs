//! Actuator configuration

use std::time::Duration;

/// Rate limiting and range settings for one actuator
#[derive(Clone, Debug, PartialEq)]
pub struct ActuatorConfig {
    /// Quiet period after the last request before a write is attempted
    pub debounce: Duration,
    /// Cooldown after each write before the next may start
    pub min_write_spacing: Duration,
    /// Lowest angle the hardware accepts (degrees)
    pub min_angle: i32,
    /// Highest angle the hardware accepts (degrees)
    pub max_angle: i32,
    /// Buffered reports per subscriber
    pub report_capacity: usize,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        // Sensor tilt motor: >= 1s apart, <= 15 writes per 20s
        ActuatorConfig {
            debounce: Duration::from_millis(200),
            min_write_spacing: Duration::from_millis(1350),
            min_angle: -27,
            max_angle: 27,
            report_capacity: 16,
        }
    }
}

impl ActuatorConfig {
    /// Clamp an angle into the supported range
    pub fn clamp_angle(&self, angle: i32) -> i32 {
        angle.clamp(self.min_angle, self.max_angle)
    }

    /// Upper bound on writes within `window` under this configuration
    pub fn max_writes_in(&self, window: Duration) -> u64 {
        if self.min_write_spacing.is_zero() {
            return u64::MAX;
        }
        (window.as_nanos() / self.min_write_spacing.as_nanos()) as u64 + 1
    }
}
