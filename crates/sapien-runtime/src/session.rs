//! SAPIEN Session - one operator, one robot, one sensor

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::info;

use sapien_actuator::{
    ActuationReport, ActuatorStats, DriverError, ElevationDriver, RateLimitedActuator,
};
use sapien_core::{JointFrame, Limb, LimbStatus};
use sapien_gesture::{DispatchStats, Dispatcher, GestureFired, GestureSink};

use crate::{ConfigError, SessionConfig};

/// Gesture dispatch and elevation control for one session.
///
/// `on_frame` may be called from any thread; frames are dispatched one at a
/// time behind a lock. Must be created from within a Tokio runtime.
pub struct Session<D: ElevationDriver, S: GestureSink> {
    dispatcher: Mutex<Dispatcher<S>>,
    actuator: RateLimitedActuator<D>,
}

impl<D: ElevationDriver, S: GestureSink> Session<D, S> {
    pub fn new(config: SessionConfig, driver: D, sink: S) -> Result<Self, ConfigError> {
        config.validate()?;

        let dispatcher = Dispatcher::with_thresholds(config.gestures.clone(), sink);
        let actuator =
            RateLimitedActuator::with_config(driver, config.actuator.to_actuator_config());

        info!(
            debounce = ?config.actuator.debounce,
            spacing = ?config.actuator.min_write_spacing,
            "session started"
        );

        Ok(Session {
            dispatcher: Mutex::new(dispatcher),
            actuator,
        })
    }

    /// Inbound sensor tick
    pub fn on_frame(&self, frame: &JointFrame) -> Vec<GestureFired> {
        self.dispatcher.lock().dispatch(frame)
    }

    /// Inbound elevation request from the operator UI
    pub fn request_elevation(&self, angle: i32) {
        self.actuator.request_elevation(angle);
    }

    /// Angle to show in the UI
    pub fn current_angle(&self) -> Result<i32, DriverError> {
        self.actuator.current_angle()
    }

    pub fn limb_status(&self, limb: Limb) -> LimbStatus {
        self.dispatcher.lock().limb_status(limb)
    }

    pub fn actuator(&self) -> &RateLimitedActuator<D> {
        &self.actuator
    }

    pub fn subscribe_actuation(&self) -> broadcast::Receiver<ActuationReport> {
        self.actuator.subscribe()
    }

    pub fn dispatch_stats(&self) -> DispatchStats {
        self.dispatcher.lock().stats().clone()
    }

    pub fn actuator_stats(&self) -> ActuatorStats {
        self.actuator.stats()
    }

    /// Reset limb status and let the actuator finish its last request
    pub async fn shutdown(self) {
        let Session {
            dispatcher,
            actuator,
        } = self;

        let stats = {
            let mut dispatcher = dispatcher.lock();
            dispatcher.reset();
            dispatcher.stats().clone()
        };
        actuator.shutdown().await;

        info!(
            frames = stats.frames,
            gestures = stats.gestures_fired,
            "session closed"
        );
    }
}
