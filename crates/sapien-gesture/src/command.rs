//! Gesture commands
//!
//! Every recognizable pose is one variant of [`GestureCommand`]. A command is
//! a pure predicate over a joint frame plus an action that moves its limb to a
//! new status and tells the robot about it.

use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use sapien_core::{angle, JointFrame, JointName, Limb, LimbStatus, LimbTracker, SapienResult};

use crate::GestureThresholds;

/// A recognized gesture, handed to the robot controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureFired {
    /// Limb that moved
    pub limb: Limb,
    /// Status before the gesture
    pub previous: LimbStatus,
    /// Status after the gesture
    pub status: LimbStatus,
    /// Sensor tick that triggered it
    pub sequence: u64,
}

/// Outbound robot-control collaborator.
///
/// Calls are fire-and-forget; the gesture engine never waits for the robot
/// to acknowledge a movement.
pub trait GestureSink: Send {
    fn on_gesture_fired(&self, event: GestureFired);
}

impl GestureSink for mpsc::UnboundedSender<GestureFired> {
    fn on_gesture_fired(&self, event: GestureFired) {
        if self.send(event).is_err() {
            warn!(limb = %event.limb, status = %event.status, "robot controller channel closed");
        }
    }
}

/// Plain robot callback, also covers `Box<dyn Fn(GestureFired) + Send>`
impl<F: Fn(GestureFired) + Send> GestureSink for F {
    fn on_gesture_fired(&self, event: GestureFired) {
        self(event)
    }
}

/// Joints that make up one arm
#[derive(Debug, Clone, Copy)]
struct ArmJoints {
    elbow: JointName,
    hand: JointName,
}

impl ArmJoints {
    fn for_limb(limb: Limb) -> Self {
        match limb {
            Limb::LeftArm => ArmJoints {
                elbow: JointName::ElbowLeft,
                hand: JointName::HandLeft,
            },
            Limb::RightArm => ArmJoints {
                elbow: JointName::ElbowRight,
                hand: JointName::HandRight,
            },
        }
    }

    /// Angle between the upper arm and the torso, pivoted at the shoulder
    /// center. 0 hangs along the body, 180 points straight up.
    fn shoulder_angle(&self, frame: &JointFrame) -> SapienResult<f64> {
        let shoulder_center = frame.joint(JointName::ShoulderCenter)?;
        angle(
            frame.joint(self.elbow)?,
            frame.joint(JointName::Spine)?,
            shoulder_center,
        )
    }

    /// Angle at the elbow between forearm and upper arm. 180 is straight.
    fn elbow_angle(&self, frame: &JointFrame) -> SapienResult<f64> {
        angle(
            frame.joint(self.hand)?,
            frame.joint(JointName::ShoulderCenter)?,
            frame.joint(self.elbow)?,
        )
    }
}

/// Recognizable arm poses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureCommand {
    LeftArmIn,
    LeftArmOut,
    LeftArmUp,
    LeftArmDown,
    RightArmIn,
    RightArmOut,
    RightArmUp,
    RightArmDown,
}

impl GestureCommand {
    /// Default registry, in dispatch order
    pub fn registry() -> &'static [GestureCommand] {
        &[
            GestureCommand::LeftArmIn,
            GestureCommand::LeftArmOut,
            GestureCommand::LeftArmUp,
            GestureCommand::LeftArmDown,
            GestureCommand::RightArmIn,
            GestureCommand::RightArmOut,
            GestureCommand::RightArmUp,
            GestureCommand::RightArmDown,
        ]
    }

    pub fn limb(&self) -> Limb {
        match self {
            Self::LeftArmIn | Self::LeftArmOut | Self::LeftArmUp | Self::LeftArmDown => {
                Limb::LeftArm
            }
            Self::RightArmIn | Self::RightArmOut | Self::RightArmUp | Self::RightArmDown => {
                Limb::RightArm
            }
        }
    }

    /// Status the limb ends up in after this command executes
    pub fn target(&self) -> LimbStatus {
        match self {
            Self::LeftArmIn | Self::RightArmIn => LimbStatus::In,
            Self::LeftArmOut | Self::RightArmOut => LimbStatus::Out,
            Self::LeftArmUp | Self::RightArmUp => LimbStatus::Up,
            Self::LeftArmDown | Self::RightArmDown => LimbStatus::Down,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LeftArmIn => "left-arm-in",
            Self::LeftArmOut => "left-arm-out",
            Self::LeftArmUp => "left-arm-up",
            Self::LeftArmDown => "left-arm-down",
            Self::RightArmIn => "right-arm-in",
            Self::RightArmOut => "right-arm-out",
            Self::RightArmUp => "right-arm-up",
            Self::RightArmDown => "right-arm-down",
        }
    }

    /// Should this command fire for `frame`?
    ///
    /// Never fires while the limb already holds the target status. Missing
    /// joints and degenerate geometry fail closed.
    pub fn should_handle(
        &self,
        frame: &JointFrame,
        limbs: &LimbTracker,
        thresholds: &GestureThresholds,
    ) -> bool {
        if limbs.is(self.limb(), self.target()) {
            return false;
        }

        match self.matches_pose(frame, thresholds) {
            Ok(matched) => matched,
            Err(e) => {
                trace!(command = self.as_str(), seq = frame.sequence, "pose not evaluated: {}", e);
                false
            }
        }
    }

    fn matches_pose(&self, frame: &JointFrame, t: &GestureThresholds) -> SapienResult<bool> {
        let arm = ArmJoints::for_limb(self.limb());
        let shoulder = arm.shoulder_angle(frame)?;

        let matched = match self.target() {
            LimbStatus::In => shoulder <= t.arm_in,
            LimbStatus::Down => shoulder > t.arm_in && shoulder <= t.arm_down,
            LimbStatus::Up => shoulder >= t.arm_up,
            LimbStatus::Out => {
                (t.arm_out_min..=t.arm_out_max).contains(&shoulder)
                    && arm.elbow_angle(frame)? >= t.elbow_straight
            }
        };
        Ok(matched)
    }

    /// Move the limb to the target status and notify the robot
    pub fn execute(
        &self,
        sequence: u64,
        limbs: &mut LimbTracker,
        sink: &dyn GestureSink,
    ) -> GestureFired {
        let status = self.target();
        let previous = limbs.set(self.limb(), status);

        let event = GestureFired {
            limb: self.limb(),
            previous,
            status,
            sequence,
        };
        debug!(command = self.as_str(), %previous, %status, seq = sequence, "gesture fired");

        sink.on_gesture_fired(event);
        event
    }
}
