//! Gesture Dispatcher - runs the command registry against each frame

use std::time::{Duration, Instant};

use tracing::debug;

use sapien_core::{JointFrame, Limb, LimbStatus, LimbTracker};

use crate::{GestureCommand, GestureFired, GestureSink, GestureThresholds};

#[derive(Clone, Debug, Default)]
pub struct DispatchStats {
    pub frames: u64,
    pub gestures_fired: u64,
    pub last_dispatch_duration: Duration,
}

/// Owns limb status for a session and feeds frames through the registry.
///
/// Dispatch takes `&mut self`, so frames are processed one at a time. Callers
/// with several frame producers must serialize access themselves.
pub struct Dispatcher<S: GestureSink> {
    registry: Vec<GestureCommand>,
    thresholds: GestureThresholds,
    limbs: LimbTracker,
    sink: S,
    stats: DispatchStats,
}

impl<S: GestureSink> Dispatcher<S> {
    /// Dispatcher over the default registry and thresholds
    pub fn new(sink: S) -> Self {
        Self::with_thresholds(GestureThresholds::default(), sink)
    }

    pub fn with_thresholds(thresholds: GestureThresholds, sink: S) -> Self {
        Dispatcher {
            registry: GestureCommand::registry().to_vec(),
            thresholds,
            limbs: LimbTracker::new(),
            sink,
            stats: DispatchStats::default(),
        }
    }

    /// Replace the registry; commands are evaluated in the given order
    pub fn with_registry(mut self, registry: Vec<GestureCommand>) -> Self {
        self.registry = registry;
        self
    }

    /// Run every command against `frame`, in registry order.
    ///
    /// A matching command executes before the next one is evaluated, so a
    /// later command for the same limb sees the updated status.
    pub fn dispatch(&mut self, frame: &JointFrame) -> Vec<GestureFired> {
        let start = Instant::now();
        let mut fired = Vec::new();

        for command in &self.registry {
            if command.should_handle(frame, &self.limbs, &self.thresholds) {
                fired.push(command.execute(frame.sequence, &mut self.limbs, &self.sink));
            }
        }

        self.stats.frames += 1;
        self.stats.gestures_fired += fired.len() as u64;
        self.stats.last_dispatch_duration = start.elapsed();

        if !fired.is_empty() {
            debug!(seq = frame.sequence, count = fired.len(), "frame dispatched");
        }
        fired
    }

    pub fn limb_status(&self, limb: Limb) -> LimbStatus {
        self.limbs.status(limb)
    }

    pub fn limbs(&self) -> &LimbTracker {
        &self.limbs
    }

    pub fn thresholds(&self) -> &GestureThresholds {
        &self.thresholds
    }

    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    /// Session teardown: every limb back to its initial status
    pub fn reset(&mut self) {
        self.limbs.reset();
    }
}
